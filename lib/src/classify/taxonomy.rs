//! Built-in weighted taxonomy consumed by the rule classifier, plus the
//! known-domain table and the preset parent links used when categories are
//! created lazily.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// One scored taxonomy entry. Declaration order breaks score ties.
pub struct CategoryRule {
    pub name: &'static str,
    pub weight: i64,
    pub keywords: &'static [&'static str],
    pub url_patterns: &'static [&'static str],
    pub content_indicators: &'static [&'static str],
    pub exclusions: &'static [&'static str],
    /// Match keywords on word boundaries instead of substrings
    pub require_word_boundary: bool,
}

/// Root categories seeded by `ensure_defaults`
pub const ROOT_CATEGORIES: &[&str] = &[
    "Technology",
    "News & Media",
    "Shopping",
    "Finance",
    "Education & Reference",
    "Entertainment",
    "Health & Fitness",
    "Travel",
    "Home & Garden",
];

/// Parent links for non-root presets, applied when a preset category is
/// created lazily by name
pub static PRESET_PARENTS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("Web Development", "Technology"),
        ("Pharmaceutical Companies", "Health & Fitness"),
    ])
});

/// Exact-host table mapped to taxonomy entry names; a hit is worth a flat
/// 15 points for that entry
pub static DOMAIN_TABLE: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("github.com", "Web Development"),
        ("gitlab.com", "Web Development"),
        ("bitbucket.org", "Web Development"),
        ("stackoverflow.com", "Web Development"),
        ("crates.io", "Web Development"),
        ("npmjs.com", "Web Development"),
        ("pypi.org", "Web Development"),
        ("techcrunch.com", "Technology"),
        ("theverge.com", "Technology"),
        ("arstechnica.com", "Technology"),
        ("wired.com", "Technology"),
        ("nytimes.com", "News & Media"),
        ("bbc.com", "News & Media"),
        ("bbc.co.uk", "News & Media"),
        ("cnn.com", "News & Media"),
        ("reuters.com", "News & Media"),
        ("theguardian.com", "News & Media"),
        ("news.ycombinator.com", "Technology"),
        ("amazon.com", "Shopping"),
        ("ebay.com", "Shopping"),
        ("etsy.com", "Shopping"),
        ("walmart.com", "Shopping"),
        ("coinbase.com", "Finance"),
        ("fidelity.com", "Finance"),
        ("investing.com", "Finance"),
        ("bloomberg.com", "Finance"),
        ("wikipedia.org", "Education & Reference"),
        ("en.wikipedia.org", "Education & Reference"),
        ("coursera.org", "Education & Reference"),
        ("udemy.com", "Education & Reference"),
        ("edx.org", "Education & Reference"),
        ("khanacademy.org", "Education & Reference"),
        ("youtube.com", "Entertainment"),
        ("netflix.com", "Entertainment"),
        ("spotify.com", "Entertainment"),
        ("twitch.tv", "Entertainment"),
        ("imdb.com", "Entertainment"),
        ("webmd.com", "Health & Fitness"),
        ("mayoclinic.org", "Health & Fitness"),
        ("healthline.com", "Health & Fitness"),
        ("novartis.com", "Pharmaceutical Companies"),
        ("pfizer.com", "Pharmaceutical Companies"),
        ("roche.com", "Pharmaceutical Companies"),
        ("astrazeneca.com", "Pharmaceutical Companies"),
        ("booking.com", "Travel"),
        ("airbnb.com", "Travel"),
        ("expedia.com", "Travel"),
        ("tripadvisor.com", "Travel"),
        ("ikea.com", "Home & Garden"),
        ("homedepot.com", "Home & Garden"),
        ("houzz.com", "Home & Garden"),
    ])
});

pub static DEFAULT_TAXONOMY: &[CategoryRule] = &[
    CategoryRule {
        name: "Web Development",
        weight: 3,
        keywords: &[
            "programming", "developer", "software", "code", "coding", "github",
            "gitlab", "api", "sdk", "framework", "library", "javascript",
            "typescript", "python", "rust", "golang", "frontend", "backend",
            "database", "devops", "docker", "kubernetes", "compiler",
        ],
        url_patterns: &[
            r"github\.com",
            r"gitlab\.com",
            r"bitbucket\.org",
            r"stackoverflow\.com",
            r"stackexchange\.com",
            r"^https?://docs?\.",
            r"^https?://developer\.",
            r"crates\.io",
            r"npmjs\.com",
            r"pypi\.org",
        ],
        content_indicators: &["pull request", "code review", "open source", "command line", "getting started"],
        exclusions: &[],
        require_word_boundary: false,
    },
    CategoryRule {
        name: "Technology",
        weight: 2,
        keywords: &[
            "tech", "technology", "gadget", "hardware", "computer", "laptop",
            "smartphone", "ai", "robotics", "startup", "innovation", "cloud",
            "chip", "semiconductor",
        ],
        url_patterns: &[r"techcrunch\.com", r"wired\.com", r"arstechnica\.com", r"theverge\.com"],
        content_indicators: &["artificial intelligence", "product launch", "silicon valley"],
        exclusions: &[],
        require_word_boundary: true,
    },
    CategoryRule {
        name: "News & Media",
        weight: 2,
        keywords: &[
            "news", "headlines", "journalism", "breaking", "politics",
            "election", "world", "media", "press", "opinion",
        ],
        url_patterns: &[
            r"nytimes\.com",
            r"bbc\.(com|co\.uk)",
            r"cnn\.com",
            r"reuters\.com",
            r"theguardian\.com",
            r"washingtonpost\.com",
        ],
        content_indicators: &["breaking news", "live updates", "press release"],
        exclusions: &[],
        require_word_boundary: false,
    },
    CategoryRule {
        name: "Shopping",
        weight: 2,
        keywords: &[
            "shop", "shopping", "store", "price", "deal", "deals", "discount",
            "coupon", "cart", "checkout", "marketplace", "outlet",
        ],
        url_patterns: &[r"amazon\.", r"ebay\.", r"etsy\.com", r"aliexpress\.com"],
        content_indicators: &["add to cart", "free shipping", "in stock"],
        exclusions: &[],
        require_word_boundary: false,
    },
    CategoryRule {
        name: "Finance",
        weight: 3,
        keywords: &[
            "finance", "financial", "investing", "investment", "stocks",
            "etf", "crypto", "cryptocurrency", "banking", "mortgage", "loan",
            "budget", "retirement", "dividend", "portfolio",
        ],
        url_patterns: &[r"coinbase\.com", r"fidelity\.com", r"vanguard\.com", r"bloomberg\.com", r"investing\.com"],
        content_indicators: &["interest rate", "stock market", "personal finance"],
        exclusions: &[],
        require_word_boundary: false,
    },
    CategoryRule {
        name: "Education & Reference",
        weight: 2,
        keywords: &[
            "learning", "course", "courses", "tutorial", "university",
            "college", "lecture", "encyclopedia", "dictionary", "reference",
            "study", "curriculum", "textbook",
        ],
        url_patterns: &[
            r"coursera\.org",
            r"udemy\.com",
            r"edx\.org",
            r"khanacademy\.org",
            r"wikipedia\.org",
            r"\.edu(/|$)",
        ],
        content_indicators: &["online course", "study guide", "learning path"],
        exclusions: &[],
        require_word_boundary: false,
    },
    CategoryRule {
        name: "Entertainment",
        weight: 2,
        keywords: &[
            "movie", "movies", "film", "tv", "series", "show", "music",
            "song", "album", "game", "games", "gaming", "video", "stream",
            "streaming", "anime", "podcast", "concert",
        ],
        url_patterns: &[
            r"youtube\.com",
            r"youtu\.be",
            r"netflix\.com",
            r"spotify\.com",
            r"twitch\.tv",
            r"imdb\.com",
            r"hulu\.com",
        ],
        content_indicators: &["watch now", "official trailer", "new season"],
        exclusions: &[],
        require_word_boundary: true,
    },
    CategoryRule {
        name: "Health & Fitness",
        weight: 2,
        keywords: &[
            "health", "fitness", "workout", "exercise", "nutrition", "diet",
            "wellness", "yoga", "medical", "medicine", "doctor", "symptoms",
            "therapy", "sleep",
        ],
        url_patterns: &[r"webmd\.com", r"mayoclinic\.org", r"healthline\.com", r"nih\.gov"],
        content_indicators: &["weight loss", "mental health", "healthy eating"],
        exclusions: &[],
        require_word_boundary: false,
    },
    CategoryRule {
        name: "Pharmaceutical Companies",
        weight: 3,
        keywords: &[
            "pharmaceutical", "pharma", "biotech", "novartis", "pfizer",
            "roche", "merck", "bayer", "astrazeneca", "sanofi", "gsk",
            "medicines", "vaccine", "vaccines", "clinical", "oncology",
        ],
        url_patterns: &[
            r"novartis\.com",
            r"pfizer\.com",
            r"roche\.com",
            r"merck\.com",
            r"bayer\.com",
            r"astrazeneca\.com",
            r"sanofi\.com",
            r"gsk\.com",
        ],
        content_indicators: &["clinical trial", "drug development", "fda approval", "pipeline"],
        exclusions: &[],
        require_word_boundary: false,
    },
    CategoryRule {
        name: "Travel",
        weight: 2,
        keywords: &[
            "travel", "trip", "flight", "flights", "hotel", "hotels",
            "vacation", "destination", "tour", "itinerary", "airline",
            "cruise", "backpacking",
        ],
        url_patterns: &[
            r"booking\.com",
            r"airbnb\.",
            r"expedia\.com",
            r"tripadvisor\.com",
            r"lonelyplanet\.com",
        ],
        content_indicators: &["travel guide", "things to do", "best time to visit"],
        exclusions: &[],
        require_word_boundary: false,
    },
    CategoryRule {
        name: "Home & Garden",
        weight: 2,
        keywords: &[
            "home", "house", "garden", "gardening", "diy", "furniture",
            "decor", "kitchen", "renovation", "interior", "plants", "lawn",
            "tools", "paint",
        ],
        url_patterns: &[r"ikea\.com", r"homedepot\.com", r"lowes\.com", r"houzz\.com"],
        content_indicators: &["home improvement", "interior design", "step by step"],
        // Pharma marketing leans on "home", "care" and "family"; these
        // phrases force the score to zero so medical content cannot land
        // here
        exclusions: &[
            "pharmaceutical",
            "pharma",
            "biotech",
            "novartis",
            "pfizer",
            "roche",
            "bayer",
            "astrazeneca",
            "clinical trial",
            "medicines",
        ],
        require_word_boundary: false,
    },
];

/// The taxonomy entry for a preset name, if one exists
pub fn rule_for(name: &str) -> Option<&'static CategoryRule> {
    DEFAULT_TAXONOMY.iter().find(|rule| rule.name == name)
}

/// Compiled URL patterns, one vector per taxonomy entry, in declaration
/// order
pub static COMPILED_URL_PATTERNS: LazyLock<Vec<Vec<Regex>>> = LazyLock::new(|| {
    DEFAULT_TAXONOMY
        .iter()
        .map(|rule| {
            rule.url_patterns
                .iter()
                .map(|p| Regex::new(p).expect("taxonomy url pattern must compile"))
                .collect()
        })
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_roots() {
        assert_eq!(ROOT_CATEGORIES.len(), 9);
    }

    #[test]
    fn test_preset_parents_are_roots() {
        for parent in PRESET_PARENTS.values() {
            assert!(ROOT_CATEGORIES.contains(parent), "{} is not a root", parent);
        }
    }

    #[test]
    fn test_domain_table_names_exist_in_taxonomy() {
        for name in DOMAIN_TABLE.values() {
            assert!(rule_for(name).is_some(), "{} has no taxonomy entry", name);
        }
    }

    #[test]
    fn test_url_patterns_compile() {
        assert_eq!(COMPILED_URL_PATTERNS.len(), DEFAULT_TAXONOMY.len());
    }
}
