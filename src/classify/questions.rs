// Question detection and support-theme bucketing
use crate::classify::types::{Example, QuestionReport, QuestionThemeEntry};
use crate::config::LimitsConfig;
use crate::normalize::Message;
use crate::ranking::ExampleTally;
use crate::taxonomy::Taxonomy;

/// Detects support questions in question-like channels and buckets them
/// into themes. Theme membership is multi-label.
pub struct QuestionExtractor<'a> {
    taxonomy: &'a Taxonomy,
    limits: &'a LimitsConfig,
}

impl<'a> QuestionExtractor<'a> {
    pub fn new(taxonomy: &'a Taxonomy, limits: &'a LimitsConfig) -> Self {
        Self { taxonomy, limits }
    }

    /// True if the message sits in a question channel and reads like a question
    pub fn is_question(&self, message: &Message) -> bool {
        self.taxonomy.channels.is_question_channel(&message.channel)
            && self.taxonomy.is_question(&message.lowered_text())
    }

    /// Detected questions, priority channels first, each group in encounter order
    pub fn prioritize<'m>(&self, messages: impl IntoIterator<Item = &'m Message>) -> Vec<&'m Message> {
        let detected = messages.into_iter().filter(|m| self.is_question(m)).collect();
        self.order_by_priority(detected)
    }

    fn order_by_priority<'m>(&self, detected: Vec<&'m Message>) -> Vec<&'m Message> {
        let (mut ordered, rest): (Vec<&Message>, Vec<&Message>) = detected
            .into_iter()
            .partition(|m| self.taxonomy.channels.is_priority(&m.channel));
        ordered.extend(rest);
        ordered
    }

    /// Prioritized question list plus theme tally. Only channel-gated
    /// detections are themed.
    pub fn extract(&self, messages: &[Message]) -> QuestionReport {
        let mut detected = Vec::new();
        let mut themes: ExampleTally<Example> = ExampleTally::new(self.limits.theme_examples);

        for message in messages {
            if !self.taxonomy.channels.is_question_channel(&message.channel) {
                continue;
            }
            let lowered = message.lowered_text();
            if !self.taxonomy.is_question(&lowered) {
                continue;
            }
            detected.push(message);

            for theme in self.taxonomy.themes.iter().filter(|t| t.matches(&lowered)) {
                themes.record(&theme.label, || {
                    Example::from_message(message, self.limits.example_chars)
                });
            }
        }

        let total = detected.len();
        let prioritized: Vec<Example> = self
            .order_by_priority(detected)
            .into_iter()
            .map(|m| Example::from_message(m, self.limits.question_chars))
            .collect();
        tracing::debug!(total, "Detected questions");

        QuestionReport {
            total,
            prioritized,
            themes: themes
                .into_ranked()
                .into_iter()
                .map(QuestionThemeEntry::from)
                .collect(),
        }
    }
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
    fn test_priority_ordering() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let extractor = QuestionExtractor::new(&taxonomy, &limits);

        let messages = vec![
            msg("general", "g1", "how do I reset my password?"),
            msg("questions", "q1", "when is the payout?"),
            msg("general", "g2", "anyone know the rules"),
            msg("questions", "q2", "need help with kyc"),
            msg("announcements", "a1", "what is new?"),
            msg("trading-general", "t1", "why is this chart red?"),
        ];
        let report = extractor.extract(&messages);

        assert_eq!(report.total, 4);
        let authors: Vec<&str> = report.prioritized.iter().map(|q| q.author.as_str()).collect();
        assert_eq!(authors, vec!["q1", "q2", "g1", "g2"]);
    }

    #[test]
    fn test_themes_are_multi_label_and_capped() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let extractor = QuestionExtractor::new(&taxonomy, &limits);

        let mut messages = vec![msg(
            "questions",
            "u",
            "can i withdraw money after passing phase 1?",
        )];
        for i in 0..8 {
            messages.push(msg("general", "v", &format!("login error number {}?", i)));
        }
        let report = extractor.extract(&messages);

        let theme = |name: &str| report.themes.iter().find(|t| t.theme == name).unwrap();
        assert_eq!(theme("Payouts/Withdrawals").count, 1);
        assert_eq!(theme("Challenge/Evaluation").count, 1);
        assert_eq!(theme("Rules Clarification").count, 1);
        assert_eq!(theme("Account Access").count, 8);
        assert_eq!(theme("Account Access").examples.len(), limits.theme_examples);
        assert_eq!(report.themes[0].count, 8);
    }

    #[test]
    fn test_question_text_truncated() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let extractor = QuestionExtractor::new(&taxonomy, &limits);

        let long = format!("why {}", "x".repeat(1000));
        let report = extractor.extract(&[msg("questions", "u", &long)]);
        assert_eq!(report.prioritized[0].text.chars().count(), limits.question_chars);
    }

    #[test]
    fn test_is_question_respects_channel() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let extractor = QuestionExtractor::new(&taxonomy, &limits);

        assert!(extractor.is_question(&msg("general-chat", "u", "is this live?")));
        assert!(!extractor.is_question(&msg("payouts", "u", "is this live?")));
        assert!(!extractor.is_question(&msg("trading-floor", "u", "is this live?")));
    }

    #[test]
    fn test_prioritize_matches_extract_order() {
        let taxonomy = Taxonomy::builtin().unwrap();
        let limits = LimitsConfig::default();
        let extractor = QuestionExtractor::new(&taxonomy, &limits);

        let messages = vec![
            msg("general", "g1", "how do payouts work?"),
            msg("payouts", "p1", "when?"),
            msg("questions", "q1", "where is the dashboard?"),
            msg("general", "g2", "is kyc required?"),
        ];
        let ordered: Vec<&str> = extractor
            .prioritize(&messages)
            .iter()
            .map(|m| m.author.as_str())
            .collect();
        assert_eq!(ordered, vec!["q1", "g1", "g2"]);

        let report = extractor.extract(&messages);
        let extracted: Vec<&str> = report.prioritized.iter().map(|q| q.author.as_str()).collect();
        assert_eq!(extracted, ordered);
    }
}
