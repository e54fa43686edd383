//! Content classification
//!
//! Keyword-taxonomy topic detection, lexicon sentiment counting, staff and
//! customer segmentation, word-frequency profiling and (via
//! [`QuestionExtractor`]) support-question extraction. Messages in
//! specialized channels are skipped for topics, sentiment and themes but
//! still count toward word frequency, staff split and channel activity.

mod questions;
mod types;

pub use questions::QuestionExtractor;
pub use types::{
    ClassificationSnapshot, Example, QuestionReport, QuestionThemeEntry, SentimentProfile,
    TopicEntry, WordFrequencyEntry,
};

use crate::config::LimitsConfig;
use crate::normalize::Message;
use crate::ranking::{CappedList, ExampleTally, RankedCounter};
use crate::taxonomy::Taxonomy;
use ahash::HashSet;
use std::collections::BTreeMap;

/// Tokens must be longer than this to be counted
const MIN_WORD_LEN: usize = 3;

/// Produces [`ClassificationSnapshot`]s
pub struct ContentClassifier<'a> {
    taxonomy: &'a Taxonomy,
    limits: &'a LimitsConfig,
}

impl<'a> ContentClassifier<'a> {
    pub fn new(taxonomy: &'a Taxonomy, limits: &'a LimitsConfig) -> Self {
        Self { taxonomy, limits }
    }

    pub fn classify(&self, messages: &[Message]) -> ClassificationSnapshot {
        let limits = self.limits;

        let mut topics: ExampleTally<Example> = ExampleTally::new(limits.topic_examples);
        for topic in &self.taxonomy.topics {
            topics.seed(&topic.label);
        }

        let mut positive = 0u64;
        let mut negative = 0u64;
        let mut praises = CappedList::new(limits.sentiment_examples);
        let mut complaints = CappedList::new(limits.sentiment_examples);
        let mut words: RankedCounter<String> = RankedCounter::new();
        let mut channel_activity: BTreeMap<String, u64> = BTreeMap::new();
        let mut staff = CappedList::new(limits.staff_examples);
        let mut customers = 0usize;

        for message in messages {
            let lowered = message.lowered_text();
            *channel_activity.entry(message.channel.clone()).or_insert(0) += 1;

            if self.taxonomy.is_staff(&message.author, &message.roles) {
                if !staff.is_full() {
                    staff.push(Example::from_message(message, limits.staff_chars));
                }
            } else {
                customers += 1;
            }

            for word in frequency_tokens(&lowered, &self.taxonomy.stop_words) {
                words.increment(word);
            }

            if self.taxonomy.channels.is_specialized(&message.channel) {
                continue;
            }

            for topic in self.taxonomy.topics.iter().filter(|t| t.matches(&lowered)) {
                topics.record(&topic.label, || {
                    Example::from_message(message, limits.example_chars)
                });
            }

            if self.taxonomy.sentiment.is_positive(&lowered) {
                positive += 1;
                if !praises.is_full() {
                    praises.push(Example::from_message(message, limits.example_chars));
                }
            }
            if self.taxonomy.sentiment.is_negative(&lowered) {
                negative += 1;
                if !complaints.is_full() {
                    complaints.push(Example::from_message(message, limits.example_chars));
                }
            }
        }

        let questions = QuestionExtractor::new(self.taxonomy, limits).extract(messages);

        let top_words = words
            .into_ranked(Some(limits.top_words))
            .into_iter()
            .map(|(word, count)| WordFrequencyEntry { word, count })
            .collect();

        tracing::debug!(
            messages = messages.len(),
            positive,
            negative,
            questions = questions.total,
            "Classified messages"
        );

        ClassificationSnapshot {
            total_processed: messages.len(),
            topics: topics.into_ranked().into_iter().map(TopicEntry::from).collect(),
            question_count: questions.total,
            priority_questions: questions.prioritized,
            question_themes: questions.themes,
            sentiment: SentimentProfile {
                positive,
                negative,
                ratio: positive as f64 / negative.max(1) as f64,
                praises: praises.into_vec(),
                complaints: complaints.into_vec(),
            },
            top_words,
            channel_activity,
            staff_messages: staff.into_vec(),
            customer_messages: customers,
        }
    }
}

/// Whitespace tokens of lower-cased text that qualify for the word profile
///
/// A raw token must be longer than three characters and not purely numeric;
/// after stripping everything but `a-z` it must still be longer than three
/// characters and not be a stop word.
pub fn frequency_tokens<'t>(
    lowered: &'t str,
    stop_words: &'t HashSet<String>,
) -> impl Iterator<Item = String> + 't {
    lowered
        .split_whitespace()
        .filter(|raw| raw.chars().count() > MIN_WORD_LEN)
        .filter(|raw| !raw.chars().all(|c| c.is_ascii_digit()))
        .map(|raw| raw.chars().filter(char::is_ascii_lowercase).collect::<String>())
        .filter(move |clean| clean.len() > MIN_WORD_LEN && !stop_words.contains(clean))
}
