//! Optional LLM passes over the collected headlines: assigning digest
//! sections and shortening titles. Every failure here is recoverable; the
//! digest is still produced from the unmodified records.

use thiserror::Error;

use crate::article::{ArticleRecord, Category};

pub mod remote;

pub use remote::RemoteLlmProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("LLM request timed out")]
    Timeout,
    #[error("LLM API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("LLM response has no choices")]
    EmptyResponse,
}

/// Core trait for chat-completion providers.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;
}

#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub model: String,
}

/// What the model decided for one headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep(Category),
    Skip,
}

fn categorize_prompt(records: &[ArticleRecord]) -> String {
    let items = records
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {} — {}", i + 1, r.title, r.source))
        .collect::<Vec<_>>()
        .join("\n");
    let categories = Category::ALL
        .iter()
        .map(|c| format!("   - {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Analyze these biotech/pharma headlines:\n\n\
         1. Identify duplicate stories (same event covered by different sources)\n\
         2. For duplicates, mark all but the best/most detailed version as \"SKIP\"\n\
         3. Categorize remaining items into EXACTLY one of these categories:\n\
         {categories}\n\n\
         Mark opinion pieces or off-topic items as \"SKIP\".\n\n\
         Items:\n{items}\n\n\
         Format your response with ONLY the category name or SKIP, one per line:\n\
         1. {}\n2. SKIP\n3. {}\netc.",
        Category::Regulatory,
        Category::Clinical,
    )
}

/// Maps a free-form answer onto a section: exact name first, then any
/// significant word of a section name, else [`Category::FALLBACK`].
fn parse_category_answer(answer: &str) -> Verdict {
    if answer.to_uppercase().contains("SKIP") {
        return Verdict::Skip;
    }
    if let Some(category) = Category::from_name(answer) {
        return Verdict::Keep(category);
    }

    let lowered = answer.to_lowercase();
    let partial = Category::ALL.into_iter().find(|c| {
        c.as_str()
            .to_lowercase()
            .split_whitespace()
            .filter(|w| w.len() > 2)
            .any(|w| lowered.contains(w))
    });
    match partial {
        Some(category) => Verdict::Keep(category),
        None => {
            tracing::warn!(answer = %answer, fallback = %Category::FALLBACK, "No category match");
            Verdict::Keep(Category::FALLBACK)
        }
    }
}

/// Parses the model's answer into one verdict per item.
///
/// Numbered lines (`"3. Deals & Finance"`) are matched by number; unnumbered
/// lines by position. Items the model did not answer for get `None`.
pub fn parse_category_response(text: &str, count: usize) -> Vec<Option<Verdict>> {
    let mut verdicts = vec![None; count];
    let lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    for (position, line) in lines.enumerate() {
        let (index, answer) = match line.split_once(". ") {
            Some((num, rest)) => match num.trim().parse::<usize>() {
                Ok(n) if n >= 1 => (n - 1, rest.trim()),
                _ => (position, line),
            },
            None => (position, line),
        };
        if let Some(slot) = verdicts.get_mut(index) {
            *slot = Some(parse_category_answer(answer));
        }
    }

    verdicts
}

/// Asks the model to assign a section to every record and to flag duplicate
/// or off-topic stories, which are removed. Records the model skipped over
/// keep their current category.
pub async fn categorize_with_llm(
    provider: &dyn LlmProvider,
    records: Vec<ArticleRecord>,
) -> Result<Vec<ArticleRecord>, LlmError> {
    if records.is_empty() {
        return Ok(records);
    }

    let response = provider
        .generate(LlmRequest {
            prompt: categorize_prompt(&records),
            max_tokens: None,
            temperature: Some(0.2),
        })
        .await?;

    let verdicts = parse_category_response(&response.content, records.len());
    let before = records.len();
    let kept: Vec<ArticleRecord> = records
        .into_iter()
        .zip(verdicts)
        .filter_map(|(mut record, verdict)| match verdict {
            Some(Verdict::Skip) => None,
            Some(Verdict::Keep(category)) => {
                record.category = category.as_str().to_string();
                Some(record)
            }
            None => Some(record),
        })
        .collect();

    tracing::info!(
        model = %response.model,
        kept = kept.len(),
        skipped = before - kept.len(),
        "Categorized items with LLM"
    );
    Ok(kept)
}

/// Rewrites each title in at most ten words. A failed rewrite keeps the
/// original title.
pub async fn shorten_titles(provider: &dyn LlmProvider, records: &mut [ArticleRecord]) {
    let mut shortened = 0usize;
    for record in records.iter_mut() {
        let request = LlmRequest {
            prompt: format!(
                "Rewrite this headline in ≤10 words, keep the core idea:\n{}",
                record.title
            ),
            max_tokens: Some(32),
            temperature: Some(0.3),
        };
        match provider.generate(request).await {
            Ok(response) if !response.content.is_empty() => {
                record.title = response.content;
                shortened += 1;
            }
            Ok(_) => {
                tracing::warn!(title = %record.title, "Empty rewrite, keeping original title");
            }
            Err(e) => {
                tracing::warn!(title = %record.title, error = %e, "Title rewrite failed");
            }
        }
    }
    tracing::info!(shortened, total = records.len(), "Shortened titles");
}
