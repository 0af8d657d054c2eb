//! Deterministic headline classifier used when feed categories are not
//! trusted and no LLM is available.

use crate::article::{ArticleRecord, Category};

/// Keywords per section, checked in [`Category::ALL`] order. The first
/// section with a hit wins. Multi-word entries match as whole phrases.
const RULES: &[(Category, &[&str])] = &[
    (
        Category::Regulatory,
        &[
            "fda", "ema", "mhra", "regulatory", "regulator", "regulators", "approval",
            "approvals", "approve", "approves", "approved", "rejects", "rejected", "clearance",
            "cleared", "authorization", "crl", "complete response", "breakthrough designation",
            "orphan drug", "fast track",
        ],
    ),
    (
        Category::Clinical,
        &[
            "phase", "trial", "trials", "study", "studies", "data", "efficacy", "results",
            "research", "researchers", "therapy", "therapies", "patients", "preclinical",
            "readout", "endpoint", "vaccine", "vaccines",
        ],
    ),
    (
        Category::Deals,
        &[
            "raise", "raises", "raised", "funding", "financing", "merger", "mergers", "deal",
            "deals", "acquisition", "acquisitions", "acquire", "acquires", "acquired", "buyout",
            "ipo", "licensing", "partnership", "collaboration", "series a", "series b",
            "series c",
        ],
    ),
    (
        Category::Company,
        &[
            "ceo", "cfo", "executive", "executives", "layoff", "layoffs", "hire", "hires",
            "hired", "appoints", "appointed", "resigns", "restructuring", "steps down",
            "job cuts",
        ],
    ),
    (
        Category::Policy,
        &[
            "trump", "biden", "congress", "senate", "medicare", "medicaid", "legislation",
            "policy", "policies", "tariff", "tariffs", "administration", "lawmakers", "hhs",
            "white house", "drug pricing",
        ],
    ),
    (
        Category::Market,
        &[
            "market", "markets", "forecast", "industry", "spending", "trend", "trends",
            "outlook", "billion", "analysts", "sales", "revenue", "stocks", "shares",
        ],
    ),
];

/// Companies whose name alone marks a headline as company news.
const COMPANY_NAMES: &[&str] = &[
    "pfizer", "moderna", "gilead", "regeneron", "amgen", "biogen", "vertex", "abbvie",
    "novartis", "roche", "merck", "bms", "bristol myers", "astrazeneca", "sanofi", "gsk",
    "glaxosmithkline", "lilly", "eli lilly", "johnson & johnson", "j&j", "takeda", "bayer",
    "novo nordisk", "illumina", "genentech",
];

/// Lowercases and replaces punctuation with spaces, keeping `&` and `$`,
/// then pads with spaces so phrases can be matched on word boundaries.
fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '&' || c == '$' {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    format!(" {} ", mapped.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn matches_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|kw| haystack.contains(&normalize(kw)))
}

/// Classifies a headline into a digest section.
///
/// # Examples
///
/// ```
/// use bionews::article::Category;
/// use bionews::categorize::keyword_category;
///
/// assert_eq!(keyword_category("FDA approves new drug"), Category::Regulatory);
/// assert_eq!(keyword_category("Random headline here"), Category::Company);
/// ```
pub fn keyword_category(title: &str) -> Category {
    let text = normalize(title);

    for (category, keywords) in RULES {
        if matches_any(&text, keywords) {
            return *category;
        }
    }

    // Dollar amounts read as money raised
    if text.split_whitespace().any(|w| w.starts_with('$')) {
        return Category::Deals;
    }

    if matches_any(&text, COMPANY_NAMES) {
        return Category::Company;
    }

    Category::FALLBACK
}

/// Reassigns every record's category from its title.
pub fn categorize_by_keywords(records: &mut [ArticleRecord]) {
    for record in records.iter_mut() {
        record.category = keyword_category(&record.title).as_str().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regulatory_fda() {
        assert_eq!(keyword_category("FDA approves new drug"), Category::Regulatory);
        assert_eq!(
            keyword_category("Drug gets regulatory approval"),
            Category::Regulatory
        );
        assert_eq!(keyword_category("EMA rejects application"), Category::Regulatory);
    }

    #[test]
    fn test_clinical_research() {
        assert_eq!(
            keyword_category("Phase 3 trial shows results"),
            Category::Clinical
        );
        assert_eq!(
            keyword_category("Study finds new efficacy data"),
            Category::Clinical
        );
        assert_eq!(
            keyword_category("Therapy shows promise in research"),
            Category::Clinical
        );
    }

    #[test]
    fn test_deals_finance() {
        assert_eq!(keyword_category("Company raises $100M"), Category::Deals);
        assert_eq!(keyword_category("Merger deal announced"), Category::Deals);
        assert_eq!(keyword_category("Acquisition of startup"), Category::Deals);
        assert_eq!(keyword_category("IPO pricing announced"), Category::Deals);
    }

    #[test]
    fn test_dollar_amount_alone_is_deals() {
        assert_eq!(keyword_category("Startup lands $50M"), Category::Deals);
    }

    #[test]
    fn test_company_news() {
        assert_eq!(keyword_category("CEO steps down"), Category::Company);
        assert_eq!(keyword_category("Company layoffs announced"), Category::Company);
        assert_eq!(keyword_category("Executive hire at firm"), Category::Company);
    }

    #[test]
    fn test_policy_politics() {
        assert_eq!(
            keyword_category("Trump administration policy"),
            Category::Policy
        );
        assert_eq!(keyword_category("Congress debates Medicare"), Category::Policy);
        assert_eq!(keyword_category("New legislation proposed"), Category::Policy);
    }

    #[test]
    fn test_market_insights() {
        assert_eq!(keyword_category("Market forecast for 2025"), Category::Market);
        assert_eq!(keyword_category("Industry spending trends"), Category::Market);
        assert_eq!(keyword_category("Billion dollar outlook"), Category::Market);
    }

    #[test]
    fn test_company_name_fallback() {
        assert_eq!(keyword_category("Pfizer announces something"), Category::Company);
        assert_eq!(keyword_category("Moderna updates investors"), Category::Company);
        assert_eq!(keyword_category("Johnson & Johnson reorganizes"), Category::Company);
    }

    #[test]
    fn test_default_category() {
        assert_eq!(keyword_category("Random headline here"), Category::Company);
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        // "marketing" must not hit "market", "datapoint" must not hit "data"
        assert_eq!(keyword_category("Marketing datapoint"), Category::Company);
    }

    #[test]
    fn test_categorize_by_keywords_rewrites_records() {
        use chrono::Utc;
        let mut records = vec![ArticleRecord::new(
            "FDA approves new drug",
            "https://example.com/a",
            Utc::now(),
            "S",
            "Market Insights",
        )];
        categorize_by_keywords(&mut records);
        assert_eq!(records[0].category, "Regulatory & FDA");
    }
}
