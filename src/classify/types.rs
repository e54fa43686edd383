// Output types for content classification
use crate::normalize::Message;
use crate::ranking::{truncate_chars, RankedLabel};
use serde::Serialize;
use std::collections::BTreeMap;

/// Truncated message kept as an example
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub author: String,
    pub text: String,
    /// Lower-cased channel name
    pub channel: String,
}

impl Example {
    pub fn from_message(message: &Message, max_chars: usize) -> Self {
        Self {
            author: message.author.clone(),
            text: truncate_chars(&message.text, max_chars),
            channel: message.channel.clone(),
        }
    }
}

/// Topic with its hit count and examples
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicEntry {
    pub topic: String,
    pub count: u64,
    pub examples: Vec<Example>,
}

impl From<RankedLabel<Example>> for TopicEntry {
    fn from(ranked: RankedLabel<Example>) -> Self {
        Self {
            topic: ranked.label,
            count: ranked.count,
            examples: ranked.examples,
        }
    }
}

/// Support theme among detected questions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionThemeEntry {
    pub theme: String,
    pub count: u64,
    pub examples: Vec<Example>,
}

impl From<RankedLabel<Example>> for QuestionThemeEntry {
    fn from(ranked: RankedLabel<Example>) -> Self {
        Self {
            theme: ranked.label,
            count: ranked.count,
            examples: ranked.examples,
        }
    }
}

/// Positive/negative counts with example lists
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentProfile {
    pub positive: u64,
    pub negative: u64,
    /// positive / max(1, negative)
    pub ratio: f64,
    pub praises: Vec<Example>,
    pub complaints: Vec<Example>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WordFrequencyEntry {
    pub word: String,
    pub count: u64,
}

/// Question detection results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionReport {
    /// All detected questions
    pub total: usize,
    /// Priority-channel questions first, then the rest, each in encounter order
    pub prioritized: Vec<Example>,
    pub themes: Vec<QuestionThemeEntry>,
}

/// Content classification for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationSnapshot {
    pub total_processed: usize,
    pub topics: Vec<TopicEntry>,
    pub question_count: usize,
    pub priority_questions: Vec<Example>,
    pub question_themes: Vec<QuestionThemeEntry>,
    pub sentiment: SentimentProfile,
    pub top_words: Vec<WordFrequencyEntry>,
    /// Messages per lower-cased channel
    pub channel_activity: BTreeMap<String, u64>,
    pub staff_messages: Vec<Example>,
    pub customer_messages: usize,
}

impl ClassificationSnapshot {
    /// Topics with at least one hit
    pub fn active_topics(&self) -> impl Iterator<Item = &TopicEntry> {
        self.topics.iter().filter(|t| t.count > 0)
    }
}
