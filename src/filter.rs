//! Deduplicator: collapses repeated links within a run, drops anything
//! already published, and optionally merges the same story reported by
//! several sources.

use std::collections::HashMap;

use crate::article::ArticleRecord;
use crate::storage::SeenSet;
use crate::util::keyword_similarity;

/// Collapses records sharing an id into one, keeping the newest.
///
/// The survivor takes the position of the first occurrence, so the output
/// preserves input order. On equal timestamps the first record wins.
pub fn dedup_batch(records: Vec<ArticleRecord>) -> Vec<ArticleRecord> {
    let mut slot_by_id: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<ArticleRecord> = Vec::with_capacity(records.len());

    for record in records {
        match slot_by_id.get(&record.id) {
            Some(&slot) => {
                if record.published_at > out[slot].published_at {
                    out[slot] = record;
                }
            }
            None => {
                slot_by_id.insert(record.id.clone(), out.len());
                out.push(record);
            }
        }
    }

    out
}

/// Drops records already present in `seen`, preserving input order.
pub fn filter_unseen(records: Vec<ArticleRecord>, seen: &SeenSet) -> Vec<ArticleRecord> {
    records
        .into_iter()
        .filter(|r| !seen.contains(&r.id))
        .collect()
}

/// Treats headlines from different sources whose keyword overlap reaches
/// `threshold` as one story and keeps the newer report.
///
/// A threshold of zero (or below) disables merging.
pub fn merge_similar(records: Vec<ArticleRecord>, threshold: f64) -> Vec<ArticleRecord> {
    if threshold <= 0.0 {
        return records;
    }

    let mut out: Vec<ArticleRecord> = Vec::with_capacity(records.len());
    for record in records {
        let duplicate_of = out.iter().position(|kept| {
            kept.source != record.source
                && keyword_similarity(&kept.title, &record.title) >= threshold
        });
        match duplicate_of {
            Some(slot) => {
                tracing::debug!(
                    kept = %out[slot].title,
                    other = %record.title,
                    "Merging same story from different sources"
                );
                if record.published_at > out[slot].published_at {
                    out[slot] = record;
                }
            }
            None => out.push(record),
        }
    }
    out
}

/// Result of the dedup chain.
#[derive(Debug, Default)]
pub struct Deduplicated {
    /// Records to put in the digest, in input order.
    pub fresh: Vec<ArticleRecord>,
    /// Ids of unseen records folded into another source's report of the same
    /// story. They are marked seen alongside the digest so they do not
    /// resurface on the next run.
    pub absorbed: Vec<String>,
}

/// Runs the full dedup chain and logs how many records each stage removed.
pub fn deduplicate(
    records: Vec<ArticleRecord>,
    seen: &SeenSet,
    similar_title_threshold: f64,
) -> Deduplicated {
    let collected = records.len();
    let unique = dedup_batch(records);
    let unique_count = unique.len();
    let unseen = filter_unseen(unique, seen);
    let unseen_ids: Vec<String> = unseen.iter().map(|r| r.id.clone()).collect();
    let fresh = merge_similar(unseen, similar_title_threshold);

    let absorbed: Vec<String> = unseen_ids
        .into_iter()
        .filter(|id| !fresh.iter().any(|r| &r.id == id))
        .collect();

    tracing::info!(
        collected,
        duplicates = collected - unique_count,
        already_seen = unique_count - fresh.len() - absorbed.len(),
        merged = absorbed.len(),
        remaining = fresh.len(),
        "Deduplicated items"
    );
    Deduplicated { fresh, absorbed }
}
