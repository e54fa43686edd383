//! Summarizer boundary
//!
//! The engine never talks to a generative model itself. It builds a bounded
//! [`SummaryPayload`] for an external [`Summarizer`] and parses whatever comes
//! back into a [`SummaryReport`]. Failures on that side land in a
//! [`SummarySlot`] and never touch the locally computed snapshots.

use crate::classify::{QuestionExtractor, WordFrequencyEntry};
use crate::config::{LimitsConfig, SamplingConfig};
use crate::error::{PulseError, Result};
use crate::metrics::MetricsSnapshot;
use crate::normalize::Message;
use crate::ranking::{truncate_chars, RankedCounter};
use crate::sampler;
use crate::taxonomy::Taxonomy;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Bounded data handed to the summarizer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPayload {
    /// Messages in the summary sample
    pub sample_size: usize,
    /// "[channel] author: text" lines joined by newlines
    pub message_block: String,
    pub common_words: Vec<WordFrequencyEntry>,
    /// Questions detected in the sample, before the head cut
    pub question_total: usize,
    /// "[channel] [author]: text" lines, at most `question_head`
    pub questions: Vec<String>,
}

impl SummaryPayload {
    /// Common words rendered as `word(count)`
    pub fn common_words_rendered(&self) -> Vec<String> {
        self.common_words
            .iter()
            .map(|w| format!("{}({})", w.word, w.count))
            .collect()
    }
}

/// Headline metrics the summarizer gets alongside the payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryContext {
    pub date_range: String,
    pub users: usize,
    pub daily_average: u64,
}

impl From<&MetricsSnapshot> for SummaryContext {
    fn from(metrics: &MetricsSnapshot) -> Self {
        Self {
            date_range: metrics.date_range_label(),
            users: metrics.users,
            daily_average: metrics.daily_average,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRequest {
    pub context: SummaryContext,
    pub payload: SummaryPayload,
}

/// Builds [`SummaryPayload`]s from the full message set
pub struct PayloadBuilder<'a> {
    taxonomy: &'a Taxonomy,
    limits: &'a LimitsConfig,
    sampling: &'a SamplingConfig,
}

impl<'a> PayloadBuilder<'a> {
    pub fn new(
        taxonomy: &'a Taxonomy,
        limits: &'a LimitsConfig,
        sampling: &'a SamplingConfig,
    ) -> Self {
        Self {
            taxonomy,
            limits,
            sampling,
        }
    }

    pub fn build(&self, messages: &[Message]) -> SummaryPayload {
        let sampling = self.sampling;
        let sample = sampler::sample(messages, sampling.summary_max);

        let lines: Vec<String> = sample
            .iter()
            .map(|m| {
                format!(
                    "[{}] {}: {}",
                    m.channel_label,
                    m.author,
                    truncate_chars(&m.text, sampling.line_chars)
                )
            })
            .collect();
        let message_block = truncate_chars(&lines.join("\n"), sampling.block_chars);

        let extractor = QuestionExtractor::new(self.taxonomy, self.limits);
        let questions: Vec<String> = extractor
            .prioritize(sample.iter().copied())
            .into_iter()
            .map(|m| {
                format!(
                    "[{}] [{}]: {}",
                    m.channel_label,
                    m.author,
                    truncate_chars(&m.text, sampling.question_chars)
                )
            })
            .collect();
        let question_total = questions.len();

        SummaryPayload {
            sample_size: sample.len(),
            message_block,
            common_words: self.common_words(&sample),
            question_total,
            questions: questions.into_iter().take(sampling.question_head).collect(),
        }
    }

    /// Raw tokens longer than three characters from the head of each message,
    /// seen more than `word_min_count` times and not on the summary stop list
    fn common_words(&self, sample: &[&Message]) -> Vec<WordFrequencyEntry> {
        let mut counter: RankedCounter<String> = RankedCounter::new();
        for message in sample {
            let head = truncate_chars(&message.lowered_text(), self.sampling.word_prefix_chars);
            for token in head.split_whitespace().filter(|t| t.chars().count() > 3) {
                counter.increment(token.to_string());
            }
        }

        counter
            .into_ranked(None)
            .into_iter()
            .filter(|(word, count)| {
                *count > self.sampling.word_min_count
                    && !self.taxonomy.summary_stop_words.contains(word)
            })
            .take(self.sampling.word_head)
            .map(|(word, count)| WordFrequencyEntry { word, count })
            .collect()
    }
}

/// External narrative summarizer
pub trait Summarizer: Send + Sync {
    fn summarize(&self, request: &SummaryRequest) -> Result<SummaryReport>;

    fn name(&self) -> &str;
}

/// Replays a summarizer response saved to disk
pub struct SavedResponseSummarizer {
    path: PathBuf,
}

impl SavedResponseSummarizer {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Summarizer for SavedResponseSummarizer {
    fn summarize(&self, _request: &SummaryRequest) -> Result<SummaryReport> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| PulseError::Io {
            source: e,
            context: format!("Failed to read summarizer response: {:?}", self.path),
        })?;
        parse_summary_response(&raw)
    }

    fn name(&self) -> &str {
        "saved-response"
    }
}

/// Outcome of the optional summarizer step
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SummarySlot {
    #[default]
    NotRequested,
    Ready { report: SummaryReport },
    Failed { reason: String },
}

impl SummarySlot {
    /// Absorb a summarizer result; errors become `Failed`
    pub fn from_result(result: Result<SummaryReport>) -> Self {
        match result {
            Ok(report) => Self::Ready { report },
            Err(e) => {
                tracing::warn!("Summarizer failed, continuing without summary: {}", e);
                Self::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn report(&self) -> Option<&SummaryReport> {
        match self {
            Self::Ready { report } => Some(report),
            _ => None,
        }
    }
}

/// Structured summarizer result; every field is optional on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SummaryReport {
    #[serde(deserialize_with = "lenient_score")]
    pub health_score: Option<f64>,
    pub health_explanation: String,
    pub positive_trends: Vec<String>,
    pub concerns: Vec<String>,
    pub key_topics: Vec<KeyTopic>,
    pub customer_questions: Vec<CustomerQuestion>,
    pub mod_performance: Option<ModPerformance>,
    pub room_for_improvement: Vec<Improvement>,
    pub sentiment: String,
    pub recommendations: Vec<String>,
    pub wow_insight: String,
}

/// Topic either as a bare label or with details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyTopic {
    Label(String),
    Detailed {
        topic: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        volume: String,
        #[serde(default)]
        count: Option<u64>,
    },
}

impl KeyTopic {
    pub fn label(&self) -> &str {
        match self {
            Self::Label(label) => label,
            Self::Detailed { topic, .. } => topic,
        }
    }
}

/// Question either as bare text or with details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CustomerQuestion {
    Text(String),
    Detailed {
        question: String,
        #[serde(default)]
        frequency: String,
        #[serde(default)]
        answered: String,
        #[serde(default)]
        count: Option<u64>,
    },
}

impl CustomerQuestion {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Detailed { question, .. } => question,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModPerformance {
    pub overall_rating: String,
    pub response_time: String,
    pub strengths: Vec<String>,
    pub areas_to_improve: Vec<String>,
    pub coverage: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Improvement {
    pub area: String,
    pub priority: String,
    pub action: String,
    pub impact: String,
}

/// Health scores arrive as numbers or numeric strings
fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Parse a raw model response, tolerating markdown code fences
pub fn parse_summary_response(raw: &str) -> Result<SummaryReport> {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(PulseError::Summarizer("empty response".to_string()));
    }

    serde_json::from_str(cleaned).map_err(|e| PulseError::Json {
        source: e,
        context: "Malformed summarizer response".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_record;
    use serde_json::json;

    fn msg(channel: &str, author: &str, content: &str) -> Message {
        normalize_record(
            &json!({"author": {"username": author}, "content": content}),
            Some(channel),
        )
    }

    #[test]
    fn test_payload_lines_and_questions() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let sampling = SamplingConfig {
            question_head: 1,
            ..SamplingConfig::default()
        };
        let builder = PayloadBuilder::new(&taxonomy, &limits, &sampling);

        let messages = vec![
            msg("General", "ann", "how do payouts work?"),
            msg("questions", "bob", "where is the dashboard?"),
            msg("payouts", "cat", "paid today"),
        ];
        let payload = builder.build(&messages);

        assert_eq!(payload.sample_size, 3);
        assert_eq!(
            payload.message_block,
            "[General] ann: how do payouts work?\n[questions] bob: where is the dashboard?\n[payouts] cat: paid today"
        );
        assert_eq!(payload.question_total, 2);
        // the questions-channel item leads even though it came second
        assert_eq!(payload.questions, vec!["[questions] [bob]: where is the dashboard?"]);
    }

    #[test]
    fn test_payload_questions_follow_priority_order() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let sampling = SamplingConfig::default();
        let builder = PayloadBuilder::new(&taxonomy, &limits, &sampling);

        let messages = vec![
            msg("general", "g", "how do payouts work?"),
            msg("questions", "q", "where is the dashboard?"),
            msg("general", "h", "anyone around?"),
        ];
        let payload = builder.build(&messages);

        assert_eq!(
            payload.questions,
            vec![
                "[questions] [q]: where is the dashboard?",
                "[general] [g]: how do payouts work?",
                "[general] [h]: anyone around?",
            ]
        );

        let report = QuestionExtractor::new(&taxonomy, &limits).extract(&messages);
        let authors: Vec<&str> = report.prioritized.iter().map(|e| e.author.as_str()).collect();
        assert_eq!(authors, vec!["q", "g", "h"]);
    }

    #[test]
    fn test_payload_is_bounded() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let sampling = SamplingConfig {
            summary_max: 10,
            block_chars: 100,
            ..SamplingConfig::default()
        };
        let builder = PayloadBuilder::new(&taxonomy, &limits, &sampling);

        let messages: Vec<Message> = (0..100)
            .map(|i| msg("general", "u", &format!("message number {}", i)))
            .collect();
        let payload = builder.build(&messages);

        assert_eq!(payload.sample_size, 10);
        assert_eq!(payload.message_block.chars().count(), 100);
    }

    #[test]
    fn test_common_words_threshold_and_stop_list() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let sampling = SamplingConfig::default();
        let builder = PayloadBuilder::new(&taxonomy, &limits, &sampling);

        let mut messages: Vec<Message> = (0..5)
            .map(|_| msg("general", "u", "payout that rocks"))
            .collect();
        messages.push(msg("general", "u", "rare words only"));
        let payload = builder.build(&messages);

        let words: Vec<&str> = payload.common_words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(words, vec!["payout", "rocks"]);
        assert_eq!(payload.common_words_rendered()[0], "payout(5)");
    }

    #[test]
    fn test_parse_fenced_response() {
        let raw = "```json\n{\"healthScore\": \"7\", \"positiveTrends\": [\"growth\"], \
                   \"keyTopics\": [\"Payouts\", {\"topic\": \"KYC\", \"count\": 4}], \
                   \"customerQuestions\": [{\"question\": \"When?\"}]}\n```";
        let report = parse_summary_response(raw).unwrap();

        assert_eq!(report.health_score, Some(7.0));
        assert_eq!(report.positive_trends, vec!["growth"]);
        assert_eq!(report.key_topics[0].label(), "Payouts");
        assert_eq!(report.key_topics[1].label(), "KYC");
        assert_eq!(report.customer_questions[0].text(), "When?");
        assert!(report.recommendations.is_empty());
    }

    #[test]
    fn test_malformed_response_becomes_failed_slot() {
        let slot = SummarySlot::from_result(parse_summary_response("Sorry, I cannot help"));
        assert!(matches!(slot, SummarySlot::Failed { .. }));
        assert!(slot.report().is_none());

        let slot = SummarySlot::from_result(parse_summary_response("   "));
        assert!(matches!(slot, SummarySlot::Failed { .. }));
    }
}
