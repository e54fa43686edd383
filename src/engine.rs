//! Analysis engine
//!
//! Owns the compiled taxonomy and limits, and runs the metrics aggregator,
//! the content classifier and the samplers over one normalized message set.
//! Every run builds fresh accumulators; results are plain values.

use crate::classify::{ClassificationSnapshot, ContentClassifier};
use crate::config::{Config, LimitsConfig, SamplingConfig};
use crate::error::{PulseError, Result};
use crate::metrics::{MetricsAggregator, MetricsSnapshot};
use crate::normalize::{normalize_all, Message};
use crate::sampler;
use crate::summary::{PayloadBuilder, SummaryContext, SummaryRequest, Summarizer, SummarySlot};
use crate::taxonomy::Taxonomy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Both snapshots from one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub metrics: MetricsSnapshot,
    pub classification: ClassificationSnapshot,
}

pub struct Engine {
    taxonomy: Taxonomy,
    limits: LimitsConfig,
    sampling: SamplingConfig,
}

impl Engine {
    pub fn new(taxonomy: Taxonomy, limits: LimitsConfig, sampling: SamplingConfig) -> Self {
        Self {
            taxonomy,
            limits,
            sampling,
        }
    }

    /// Engine with the configured (or built-in) taxonomy
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.load_taxonomy()?,
            config.limits.clone(),
            config.sampling.clone(),
        ))
    }

    /// Engine with the built-in taxonomy and default limits
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(
            Taxonomy::builtin()?,
            LimitsConfig::default(),
            SamplingConfig::default(),
        ))
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// Analyze normalized messages; recency windows end at `now`
    pub fn analyze(&self, messages: &[Message], now: DateTime<Utc>) -> Result<Analysis> {
        ensure_not_empty(messages)?;

        Ok(Analysis {
            metrics: self.metrics(messages, now),
            classification: self.classify(messages),
        })
    }

    /// Normalize a raw record sequence and analyze it
    pub fn analyze_records(
        &self,
        records: &Value,
        source: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Analysis> {
        let messages = normalize_all(records, source)?;
        self.analyze(&messages, now)
    }

    /// Run metrics and classification as independent blocking tasks
    pub async fn analyze_concurrent(
        self: Arc<Self>,
        messages: Arc<[Message]>,
        now: DateTime<Utc>,
    ) -> Result<Analysis> {
        ensure_not_empty(&messages)?;

        let metrics_task = {
            let engine = Arc::clone(&self);
            let messages = Arc::clone(&messages);
            tokio::task::spawn_blocking(move || engine.metrics(&messages, now))
        };
        let classify_task = {
            let engine = Arc::clone(&self);
            let messages = Arc::clone(&messages);
            tokio::task::spawn_blocking(move || engine.classify(&messages))
        };

        let (metrics, classification) = tokio::try_join!(metrics_task, classify_task)
            .map_err(|e| PulseError::Other(anyhow::anyhow!("analysis task failed: {}", e)))?;

        Ok(Analysis {
            metrics,
            classification,
        })
    }

    pub fn metrics(&self, messages: &[Message], now: DateTime<Utc>) -> MetricsSnapshot {
        MetricsAggregator::new(&self.taxonomy.channels, self.limits.top_contributors)
            .aggregate(messages, now)
    }

    pub fn classify(&self, messages: &[Message]) -> ClassificationSnapshot {
        ContentClassifier::new(&self.taxonomy, &self.limits).classify(messages)
    }

    /// Bounded sample for the dashboard
    pub fn dashboard_sample<'m>(&self, messages: &'m [Message]) -> Vec<&'m Message> {
        sampler::sample(messages, self.sampling.dashboard_max)
    }

    /// Payload and headline metrics for the summarizer
    pub fn summary_request(&self, messages: &[Message], metrics: &MetricsSnapshot) -> SummaryRequest {
        SummaryRequest {
            context: SummaryContext::from(metrics),
            payload: PayloadBuilder::new(&self.taxonomy, &self.limits, &self.sampling)
                .build(messages),
        }
    }

    /// Ask the summarizer for a narrative report; failures stay in the slot
    pub fn summarize(
        &self,
        summarizer: &dyn Summarizer,
        messages: &[Message],
        metrics: &MetricsSnapshot,
    ) -> SummarySlot {
        let request = self.summary_request(messages, metrics);
        tracing::debug!(
            summarizer = summarizer.name(),
            sample = request.payload.sample_size,
            "Requesting summary"
        );
        SummarySlot::from_result(summarizer.summarize(&request))
    }
}

fn ensure_not_empty(messages: &[Message]) -> Result<()> {
    if messages.is_empty() {
        return Err(PulseError::EmptyResult(
            "the record sequence produced no messages".to_string(),
        ));
    }
    Ok(())
}
