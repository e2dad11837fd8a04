//! Built-in crawler signature and verified-domain lists.
//!
//! These are the fallbacks when the operator has not configured custom
//! lists. Signatures are matched as lowercase substrings of the
//! User-Agent; domains are matched as hostname suffixes after rDNS.

/// Search-engine crawler User-Agent signatures.
const SEARCH_SIGNATURES: &[&str] = &[
    "googlebot",
    "bingbot",
    "slurp",
    "duckduckbot",
    "baiduspider",
    "yandexbot",
    "applebot",
];

/// Generative-AI and LLM-training crawler User-Agent signatures.
const AI_SIGNATURES: &[&str] = &[
    "gptbot",
    "chatgpt-user",
    "oai-searchbot",
    "google-extended",
    "ccbot",
    "claudebot",
    "claude-web",
    "anthropic-ai",
    "perplexitybot",
    "facebookbot",
    "youbot",
    "diffbot",
    "bytespider",
    "imagesiftbot",
    "cohere-ai",
    "omgilibot",
    "omgili",
    "amazonbot",
    "applebot-extended",
];

/// Verified rDNS/fDNS suffixes for search-engine crawlers.
const SEARCH_DOMAINS: &[&str] = &[
    ".googlebot.com",
    ".google.com",
    ".search.msn.com",
    ".crawl.yahoo.net",
    ".baidu.com",
    ".yandex.com",
    ".applebot.apple.com",
];

/// Verified rDNS/fDNS suffixes for AI crawlers.
const AI_DOMAINS: &[&str] = &[
    ".openai.com",
    ".commoncrawl.org",
    ".anthropic.com",
    ".claude.ai",
    ".perplexity.ai",
    ".you.com",
    ".diffbot.com",
    ".bytedance.com",
    ".cohere.ai",
    ".omgili.com",
    ".amazon.com",
    ".apple.com",
];

/// The default User-Agent signature list.
pub fn default_signatures() -> Vec<String> {
    SEARCH_SIGNATURES
        .iter()
        .chain(AI_SIGNATURES)
        .map(|s| s.to_string())
        .collect()
}

/// The default verified-domain suffix list.
pub fn default_verified_domains() -> Vec<String> {
    SEARCH_DOMAINS
        .iter()
        .chain(AI_DOMAINS)
        .map(|s| s.to_string())
        .collect()
}
