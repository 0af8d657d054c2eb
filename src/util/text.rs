use std::collections::HashSet;

/// Words that carry no topical signal in a headline.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "into",
    "is", "it", "its", "new", "of", "on", "or", "over", "says", "than", "that", "the", "their",
    "this", "to", "under", "was", "will", "with", "after", "amid", "about", "more", "could",
    "would", "what", "when", "while",
];

/// Cleans a feed-supplied title for single-line markdown output.
///
/// Control characters are dropped and any run of whitespace (including
/// embedded newlines) collapses to a single space.
///
/// # Examples
///
/// ```
/// use bionews::util::clean_title;
///
/// assert_eq!(clean_title("  FDA\n approves\tdrug \u{7}"), "FDA approves drug");
/// ```
pub fn clean_title(s: &str) -> String {
    s.split_whitespace()
        .map(|word| word.chars().filter(|c| !c.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes the characters that would end a markdown link label early.
pub fn escape_link_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Extracts the significant words of a headline: lowercased, longer than
/// three characters, stopwords removed.
///
/// # Examples
///
/// ```
/// use bionews::util::extract_keywords;
///
/// let words = extract_keywords("Pfizer announces new drug trial");
/// assert!(words.contains("pfizer"));
/// assert!(!words.contains("new"));
/// ```
pub fn extract_keywords(title: &str) -> HashSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 3 && !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Jaccard similarity of the keyword sets of two headlines, in `[0, 1]`.
///
/// Two headlines without any significant words score 0.
pub fn keyword_similarity(a: &str, b: &str) -> f64 {
    let ka = extract_keywords(a);
    let kb = extract_keywords(b);
    let union = ka.union(&kb).count();
    if union == 0 {
        return 0.0;
    }
    ka.intersection(&kb).count() as f64 / union as f64
}
