//! Stop-word set used by keyword extraction. Covers articles,
//! prepositions, pronouns, auxiliaries, high-frequency verbs and adverbs,
//! contractions, and the navigation chrome words that dominate scraped
//! page text.

use std::collections::HashSet;
use std::sync::LazyLock;

pub static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORD_LIST.iter().copied().collect());

/// True if the token is in the stop-word set
pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

static STOPWORD_LIST: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "each", "every",
    "either", "neither", "some", "any", "no", "all", "both", "few", "many",
    "much", "more", "most", "other", "others", "another", "such", "what",
    "which", "whose", "several", "certain", "various", "enough",
    "whatever", "own", "same", "i", "me", "my", "mine", "myself", "we",
    "us", "our", "ours", "ourselves", "you", "your", "yours", "yourself",
    "yourselves", "he", "him", "his", "himself", "she", "her", "hers",
    "herself", "it", "its", "itself", "they", "them", "their", "theirs",
    "themselves", "who", "whom", "one", "ones", "somebody", "someone",
    "something", "anybody", "anyone", "anything", "everybody", "everyone",
    "everything", "nobody", "nothing", "none", "about", "above", "across",
    "after", "against", "along", "amid", "among", "around", "at", "before",
    "behind", "below", "beneath", "beside", "besides", "between", "beyond",
    "by", "concerning", "despite", "down", "during", "except", "for",
    "from", "in", "inside", "into", "near", "of", "off", "on", "onto",
    "out", "outside", "over", "past", "per", "regarding", "since",
    "through", "throughout", "till", "to", "toward", "towards", "under",
    "underneath", "until", "unto", "up", "upon", "via", "with", "within",
    "without", "and", "but", "or", "nor", "so", "yet", "although",
    "because", "however", "moreover", "nevertheless", "nonetheless",
    "therefore", "thus", "whereas", "while", "unless", "whether", "if",
    "then", "than", "as", "once", "though", "hence", "meanwhile",
    "otherwise", "plus", "versus", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did",
    "doing", "done", "will", "would", "shall", "should", "can", "could",
    "may", "might", "must", "ought", "need", "dare", "get", "got", "go",
    "going", "went", "make", "made", "take", "took", "taken", "come",
    "came", "see", "saw", "seen", "know", "known", "think", "thought",
    "look", "looked", "want", "wanted", "give", "gave", "given", "use",
    "used", "using", "find", "found", "tell", "told", "ask", "asked",
    "work", "worked", "seem", "seemed", "feel", "felt", "try", "tried",
    "leave", "left", "keep", "kept", "put", "say", "said", "let", "mean",
    "means", "meant", "show", "shown", "turn", "turned", "start",
    "started", "help", "helped", "run", "ran", "move", "moved", "believe",
    "bring", "brought", "happen", "happened", "provide", "provided", "sit",
    "stand", "lose", "lost", "pay", "paid", "meet", "include", "included",
    "including", "continue", "continued", "set", "learn", "learned",
    "change", "changed", "lead", "led", "understand", "understood",
    "watch", "watched", "follow", "followed", "stop", "stopped", "speak",
    "allow", "allowed", "add", "added", "spend", "spent", "grow", "open",
    "opened", "walk", "walked", "win", "won", "offer", "offered",
    "remember", "appear", "appeared", "buy", "bought", "wait", "waited",
    "serve", "served", "send", "sent", "expect", "expected", "stay",
    "stayed", "fall", "fell", "cut", "reach", "reached", "remain",
    "remained", "suggest", "require", "required", "report", "decide",
    "pull", "call", "called", "not", "now", "here", "there", "when",
    "where", "why", "how", "again", "further", "only", "very", "too",
    "also", "just", "even", "still", "already", "soon", "later", "ago",
    "ever", "never", "always", "often", "sometimes", "usually", "rarely",
    "almost", "quite", "rather", "really", "simply", "actually",
    "basically", "certainly", "clearly", "currently", "directly",
    "especially", "exactly", "finally", "generally", "instead", "likely",
    "mainly", "maybe", "mostly", "nearly", "necessarily", "obviously",
    "particularly", "perhaps", "possibly", "probably", "quickly",
    "recently", "relatively", "respectively", "significantly", "similarly",
    "specifically", "typically", "ultimately", "together", "away", "back",
    "forth", "else", "etc", "eg", "ie", "vs", "okay", "ok", "yes",
    "anyway", "anywhere", "everywhere", "somewhere", "nowhere", "indeed",
    "namely", "overall", "elsewhere", "new", "old", "good", "great",
    "high", "low", "small", "large", "big", "long", "short", "little",
    "right", "wrong", "early", "late", "young", "important", "public",
    "private", "bad", "able", "best", "better", "worse", "worst", "sure",
    "real", "whole", "full", "easy", "hard", "simple", "main", "top",
    "first", "second", "third", "last", "next", "previous", "different",
    "similar", "common", "general", "specific", "available", "possible",
    "recent", "current", "entire", "single", "major", "minor", "key",
    "today", "tomorrow", "yesterday", "day", "days", "week", "weeks",
    "month", "months", "year", "years", "time", "times", "date", "hour",
    "hours", "minute", "minutes", "seconds", "morning", "evening", "night",
    "monday", "friday", "sunday", "january", "march", "april", "june",
    "july", "august", "october", "november", "december", "click", "home",
    "homepage", "page", "pages", "site", "sites", "website", "websites",
    "web", "online", "link", "links", "login", "logout", "signin",
    "signout", "signup", "register", "subscribe", "unsubscribe",
    "newsletter", "menu", "nav", "navigation", "search", "share",
    "comment", "comments", "reply", "post", "posts", "prev", "skip",
    "content", "contents", "sidebar", "footer", "header", "copyright",
    "rights", "reserved", "privacy", "policy", "terms", "conditions",
    "cookie", "cookies", "consent", "accept", "decline", "settings",
    "preferences", "account", "profile", "contact", "email", "mail", "faq",
    "info", "information", "less", "view", "loading", "load", "error",
    "404", "javascript", "browser", "mobile", "desktop", "app", "apps",
    "update", "updates", "updated", "following", "followers", "like",
    "likes", "liked", "tweet", "pin", "save", "saved", "bookmark",
    "bookmarks", "print", "download", "upload", "submit", "cancel",
    "close", "read", "reading", "welcome", "please", "thanks", "thank",
    "hello", "hi", "free", "sign", "log", "join", "learnmore", "readmore",
    "sitemap", "feedback", "advertisement", "advertising", "sponsored",
    "related", "featured", "popular", "trending", "latest", "archive",
    "category", "categories", "tag", "tags", "tagged", "author", "authors",
    "admin", "user", "users", "username", "password", "support", "center",
    "language", "english", "ain't", "aren't", "can't", "couldn't",
    "didn't", "doesn't", "don't", "hadn't", "hasn't", "haven't", "he'd",
    "he'll", "he's", "here's", "how's", "i'd", "i'll", "i'm", "i've",
    "isn't", "it'd", "it'll", "it's", "let's", "mightn't", "mustn't",
    "shan't", "she'd", "she'll", "she's", "shouldn't", "that's", "there's",
    "they'd", "they'll", "they're", "they've", "wasn't", "we'd", "we'll",
    "we're", "we've", "weren't", "what's", "when's", "where's", "who'd",
    "who'll", "who's", "why's", "won't", "wouldn't", "you'd", "you'll",
    "you're", "you've",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_size_is_roughly_seven_hundred() {
        let size = STOPWORDS.len();
        assert!(size > 600, "stop-word set too small: {}", size);
        assert!(size < 800, "stop-word set too large: {}", size);
    }

    #[test]
    fn test_common_words_present() {
        for word in ["the", "and", "click", "homepage", "don't", "with"] {
            assert!(is_stopword(word), "{} should be a stop word", word);
        }
    }

    #[test]
    fn test_content_words_absent() {
        for word in ["rust", "pharmaceutical", "recipe", "kubernetes"] {
            assert!(!is_stopword(word), "{} should not be a stop word", word);
        }
    }
}
