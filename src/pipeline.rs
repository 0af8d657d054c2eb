//! One digest run: Feed Reader → Deduplicator → categorize/shorten →
//! Digest Formatter → Publisher.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secrecy::SecretString;
use std::time::Duration;

use crate::article::ArticleRecord;
use crate::categorize::categorize_by_keywords;
use crate::config::{CategorizeMode, Config, EmptyPolicy, TrackerMode};
use crate::digest::to_markdown;
use crate::feed::{collect_all, load_feeds, EntryFilter};
use crate::filter::deduplicate;
use crate::llm::{self, LlmProvider, RemoteLlmProvider};
use crate::publish::{digest_title, GitHubPublisher, Publication, PublishError, Publisher, Target};
use crate::storage::SeenSet;

/// Per-invocation switches that do not belong in the config file.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Render and write the digest but neither publish nor touch the seen set.
    pub dry_run: bool,
    /// Reference time for the freshness window and the issue title.
    pub now: DateTime<Utc>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            now: Utc::now(),
        }
    }
}

/// What a run did.
#[derive(Debug)]
pub struct RunSummary {
    pub collected: usize,
    pub failed_feeds: usize,
    /// Records rendered into the digest.
    pub items: Vec<ArticleRecord>,
    pub markdown: String,
    pub publication: Option<Publication>,
    /// Ids added to the seen set.
    pub newly_seen: usize,
}

pub struct Pipeline {
    config: Config,
    client: reqwest::Client,
    publisher: Option<Box<dyn Publisher>>,
    llm: Option<Box<dyn LlmProvider>>,
}

impl Pipeline {
    /// Builds the HTTP client, publisher and LLM provider from `config`.
    ///
    /// A missing tracker repo or token is not an error here; it only fails
    /// a run that actually has to publish.
    pub fn from_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        let publisher = build_publisher(&config, &client);
        let llm = config.llm.api_key.as_ref().map(|key| {
            Box::new(
                RemoteLlmProvider::new(
                    client.clone(),
                    config.llm.api_url.clone(),
                    SecretString::from(key.clone()),
                    config.llm.model.clone(),
                )
                .with_timeout(Duration::from_secs(config.llm.timeout_secs)),
            ) as Box<dyn LlmProvider>
        });

        Ok(Self {
            config,
            client,
            publisher,
            llm,
        })
    }

    /// Replaces the publisher (tests, alternative trackers).
    pub fn with_publisher(mut self, publisher: Box<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Replaces the LLM provider.
    pub fn with_llm(mut self, llm: Box<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the whole digest once.
    ///
    /// Everything that survived deduplication is marked seen once the run
    /// has published (or, for a run whose items were all dropped by the
    /// model, decided not to), so the same stories are not reconsidered.
    ///
    /// Feed failures are logged and skipped. Failing to load the feeds file
    /// or the seen set, to write the digest, or to publish aborts the run;
    /// in every failure case the seen set on disk is left untouched.
    pub async fn run(&self, options: RunOptions) -> Result<RunSummary> {
        let config = &self.config;

        let feeds = load_feeds(&config.feeds_path).with_context(|| {
            format!("Failed to load feeds from {}", config.feeds_path.display())
        })?;
        let mut seen = SeenSet::load(&config.seen_path)?;

        let hours = i64::try_from(config.freshness_hours).unwrap_or(i64::MAX);
        let window = ChronoDuration::try_hours(hours).unwrap_or(ChronoDuration::MAX);
        let filter = EntryFilter {
            cutoff: options
                .now
                .checked_sub_signed(window)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            max_items: config.max_items_per_source,
        };
        let report = collect_all(
            &self.client,
            &feeds,
            filter,
            Duration::from_secs(config.fetch_timeout_secs),
        )
        .await;
        let collected = report.records.len();
        let failed_feeds = report.failures.len();

        let deduped = deduplicate(report.records, &seen, config.similar_title_threshold);
        // Everything considered this run is retired once published, including
        // records folded into another report or skipped by the model
        let mut retired: Vec<String> = deduped.fresh.iter().map(|r| r.id.clone()).collect();
        retired.extend(deduped.absorbed);

        let mut items = self.categorize(deduped.fresh).await;
        if config.llm.shorten_titles {
            match &self.llm {
                Some(provider) => llm::shorten_titles(provider.as_ref(), &mut items).await,
                None => tracing::warn!("No LLM API key configured, skipping title shortening"),
            }
        }

        tracing::info!(items = items.len(), "Rendering digest");
        let markdown = to_markdown(&items, config.freshness_hours);
        tokio::fs::write(&config.output_path, &markdown)
            .await
            .with_context(|| {
                format!("Failed to write digest to {}", config.output_path.display())
            })?;
        tracing::info!(path = %config.output_path.display(), "Digest written");

        let mut summary = RunSummary {
            collected,
            failed_feeds,
            items,
            markdown,
            publication: None,
            newly_seen: 0,
        };

        if options.dry_run {
            tracing::info!("Dry run, not publishing");
            return Ok(summary);
        }

        let title = digest_title(&config.tracker.title_prefix, options.now.date_naive());
        if !summary.items.is_empty() {
            summary.publication = Some(self.publish(&title, &summary.markdown).await?);
        } else {
            match config.tracker.empty_policy {
                EmptyPolicy::Skip => tracing::info!("No new items, nothing to publish"),
                EmptyPolicy::Notice => {
                    summary.publication = Some(self.publish(&title, &summary.markdown).await?);
                }
            }
        }

        // Nothing new at all: the seen set stays as it was
        if retired.is_empty() {
            return Ok(summary);
        }

        summary.newly_seen = seen.extend(retired);
        seen.save(&config.seen_path)
            .context("Failed to save the seen set")?;

        Ok(summary)
    }

    async fn categorize(&self, mut items: Vec<ArticleRecord>) -> Vec<ArticleRecord> {
        match self.config.categorize {
            CategorizeMode::Feed => items,
            CategorizeMode::Keywords => {
                categorize_by_keywords(&mut items);
                items
            }
            CategorizeMode::Llm => {
                let Some(provider) = &self.llm else {
                    tracing::warn!("No LLM API key configured, using keyword categorization");
                    categorize_by_keywords(&mut items);
                    return items;
                };
                // The LLM pass consumes the records, keep a copy for the fallback
                match llm::categorize_with_llm(provider.as_ref(), items.clone()).await {
                    Ok(categorized) => categorized,
                    Err(e) => {
                        tracing::warn!(error = %e, "LLM categorization failed, using keywords");
                        categorize_by_keywords(&mut items);
                        items
                    }
                }
            }
        }
    }

    async fn publish(&self, title: &str, body: &str) -> Result<Publication> {
        let publisher = self.publisher.as_ref().ok_or_else(|| {
            PublishError::NotConfigured("set tracker.repo and GITHUB_TOKEN".to_string())
        })?;
        let publication = publisher
            .publish(title, body)
            .await
            .context("Failed to publish digest")?;
        Ok(publication)
    }
}

fn build_publisher(config: &Config, client: &reqwest::Client) -> Option<Box<dyn Publisher>> {
    let tracker = &config.tracker;
    let (Some(repo), Some(token)) = (&tracker.repo, &tracker.token) else {
        tracing::debug!("Tracker repo or token missing, publishing disabled");
        return None;
    };

    // Comment mode always carries an issue number once the config validated
    let target = match tracker.mode {
        TrackerMode::Issue => Target::NewIssue,
        TrackerMode::Comment => Target::Comment {
            issue_number: tracker.issue_number?,
        },
    };

    Some(Box::new(
        GitHubPublisher::new(
            client.clone(),
            tracker.api_url.clone(),
            repo.clone(),
            SecretString::from(token.clone()),
            target,
        )
        .with_labels(tracker.labels.clone())
        .with_timeout(Duration::from_secs(tracker.timeout_secs)),
    ))
}
