//! Curated term tables consumed by keyword extraction: two-word compound
//! terms kept whole, domain-specific terms whose scores are doubled, and
//! the host/path hint table mapping URL patterns to topical tags.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Two-word phrases treated as single keywords
pub static COMPOUND_TERMS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| COMPOUND_TERM_LIST.iter().copied().collect());

static COMPOUND_TERM_LIST: &[&str] = &[
    "machine learning",
    "artificial intelligence",
    "deep learning",
    "neural network",
    "data science",
    "computer science",
    "software engineering",
    "web development",
    "web design",
    "graphic design",
    "user experience",
    "user interface",
    "open source",
    "version control",
    "operating system",
    "programming language",
    "cloud computing",
    "search engine",
    "mobile app",
    "code review",
    "unit testing",
    "continuous integration",
    "project management",
    "supply chain",
    "remote work",
    "job search",
    "social media",
    "real estate",
    "climate change",
    "stock market",
    "personal finance",
    "credit card",
    "interest rate",
    "mutual fund",
    "mental health",
    "weight loss",
    "home improvement",
    "interior design",
    "video game",
    "board game",
    "science fiction",
    "national park",
    "travel guide",
    "road trip",
    "recipe collection",
    "meal plan",
    "clinical trial",
    "drug development",
];

/// Domain-specific terms whose frequency score is doubled
pub static DOMAIN_TERMS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| DOMAIN_TERM_LIST.iter().copied().collect());

static DOMAIN_TERM_LIST: &[&str] = &[
    "programming", "software", "developer", "development", "code", "coding",
    "api", "database", "framework", "algorithm", "server", "frontend",
    "backend", "fullstack", "devops", "kubernetes", "docker", "linux",
    "terminal", "javascript", "typescript", "python", "rust", "golang",
    "java", "react", "tutorial", "documentation", "repository", "github",
    "opensource", "compiler", "debugging", "encryption", "security",
    "crypto", "cryptocurrency", "bitcoin", "blockchain", "investment",
    "investing", "budget", "budgeting", "finance", "financial", "banking",
    "mortgage", "insurance", "retirement", "taxes", "fitness", "nutrition",
    "recipe", "recipes", "cooking", "baking", "workout", "yoga",
    "meditation", "wellness", "medicine", "medical", "pharmaceutical",
    "pharma", "clinical", "vaccine", "biotech", "therapy", "diagnosis",
    "travel", "hotel", "flight", "itinerary", "destination", "hiking",
    "camping", "gardening", "garden", "furniture", "renovation", "decor",
    "diy", "woodworking", "streaming", "podcast", "cinema", "movie",
    "music", "gaming", "esports", "anime", "university", "course",
    "lecture", "research", "journal", "science", "physics", "chemistry",
    "biology", "history", "economics", "philosophy", "photography",
    "fashion", "shopping", "deals", "coupon", "marketplace", "auction",
];

/// A host/path pattern mapped to a topical tag
pub struct DomainHint {
    pub pattern: &'static str,
    pub tag: &'static str,
}

static DOMAIN_HINT_TABLE: &[DomainHint] = &[
    DomainHint { pattern: r"github\.com|gitlab\.com|bitbucket\.org", tag: "development" },
    DomainHint { pattern: r"stackoverflow\.com|stackexchange\.com", tag: "development" },
    DomainHint { pattern: r"^docs\.|^developer\.|devdocs\.io|crates\.io|npmjs\.com|pypi\.org", tag: "development" },
    DomainHint { pattern: r"youtube\.com|youtu\.be|vimeo\.com|twitch\.tv", tag: "video" },
    DomainHint { pattern: r"netflix\.com|hulu\.com|spotify\.com|imdb\.com", tag: "entertainment" },
    DomainHint { pattern: r"recipe|allrecipes\.com|foodnetwork\.com|epicurious\.com|seriouseats\.com", tag: "food" },
    DomainHint { pattern: r"amazon\.|ebay\.|etsy\.com|aliexpress\.com|walmart\.com", tag: "shopping" },
    DomainHint { pattern: r"news|nytimes\.com|bbc\.|cnn\.com|reuters\.com|theguardian\.com", tag: "news" },
    DomainHint { pattern: r"coursera\.org|udemy\.com|edx\.org|khanacademy\.org|\.edu(/|$)", tag: "education" },
    DomainHint { pattern: r"wikipedia\.org|britannica\.com", tag: "reference" },
    DomainHint { pattern: r"booking\.com|airbnb\.|expedia\.com|tripadvisor\.com|lonelyplanet\.com", tag: "travel" },
    DomainHint { pattern: r"webmd\.com|mayoclinic\.org|nih\.gov|healthline\.com", tag: "health" },
    DomainHint { pattern: r"bank|paypal\.com|investing\.com|coinbase\.com|fidelity\.com", tag: "finance" },
    DomainHint { pattern: r"reddit\.com|twitter\.com|x\.com|facebook\.com|instagram\.com|linkedin\.com", tag: "social" },
];

/// Compiled hint table; patterns are matched against "host/path"
pub static DOMAIN_HINTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    DOMAIN_HINT_TABLE
        .iter()
        .map(|hint| {
            (
                Regex::new(hint.pattern).expect("domain hint pattern must compile"),
                hint.tag,
            )
        })
        .collect()
});
