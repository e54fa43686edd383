//! Plain-text analytics report
//!
//! Renders the snapshots (and the narrative summary, when one is ready)
//! into the shareable text layout. Rendering only reads its inputs.

use crate::engine::Analysis;
use crate::summary::{SummaryReport, SummarySlot};
use chrono::{DateTime, Utc};

const TITLE: &str = "COMMUNITY ANALYTICS REPORT";
const RULE: &str = "==================================================";
const SECTION_RULE: &str = "------------------------------";

/// Renders [`Analysis`] results as text
pub struct TextReport<'a> {
    analysis: &'a Analysis,
    summary: &'a SummarySlot,
    generated_at: DateTime<Utc>,
}

impl<'a> TextReport<'a> {
    pub fn new(analysis: &'a Analysis, summary: &'a SummarySlot, generated_at: DateTime<Utc>) -> Self {
        Self {
            analysis,
            summary,
            generated_at,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let metrics = &self.analysis.metrics;

        line(&mut out, TITLE);
        line(&mut out, RULE);
        line(
            &mut out,
            format!("Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        );
        line(&mut out, format!("Date Range: {}", metrics.date_range_label()));
        line(&mut out, "");

        section(&mut out, "KEY METRICS");
        line(&mut out, format!("Total Messages: {}", metrics.total));
        line(&mut out, format!("Active Users: {}", metrics.users));
        line(
            &mut out,
            format!("Active Traders (Trading Floor): {}", metrics.specialized_participants),
        );
        line(&mut out, format!("Channels: {}", metrics.channels));
        line(&mut out, format!("Daily Average: {}", metrics.daily_average));
        line(&mut out, format!("Peak Hours: {}", metrics.peak_block.label));
        line(&mut out, format!("Last 7 Days: {}", metrics.last_7_days));
        line(&mut out, format!("Last 30 Days: {}", metrics.last_30_days));
        line(&mut out, "");

        match self.summary {
            SummarySlot::Ready { report } => write_summary(&mut out, report),
            SummarySlot::Failed { reason } => {
                line(&mut out, format!("AI summary unavailable: {}", reason));
                line(&mut out, "");
            }
            SummarySlot::NotRequested => {}
        }

        section(&mut out, "TOP CONTRIBUTORS");
        for (i, contributor) in metrics.top_contributors.iter().enumerate() {
            line(
                &mut out,
                format!(
                    "{}. {}: {} ({:.1}%)",
                    i + 1,
                    contributor.name,
                    contributor.count,
                    contributor.percentage
                ),
            );
        }
        line(&mut out, "");

        let classification = &self.analysis.classification;
        section(&mut out, "TOPIC BREAKDOWN");
        let mut any_topic = false;
        for (i, topic) in classification.active_topics().enumerate() {
            any_topic = true;
            line(&mut out, format!("{}. {}: {}", i + 1, topic.topic, topic.count));
        }
        if !any_topic {
            line(&mut out, "(no topic matches)");
        }
        line(&mut out, "");

        section(&mut out, "SUPPORT QUESTIONS");
        line(&mut out, format!("Detected: {}", classification.question_count));
        for (i, theme) in classification.question_themes.iter().enumerate() {
            line(&mut out, format!("{}. {}: {}", i + 1, theme.theme, theme.count));
        }
        line(&mut out, "");

        section(&mut out, "SENTIMENT");
        let sentiment = &classification.sentiment;
        line(&mut out, format!("Positive: {}", sentiment.positive));
        line(&mut out, format!("Negative: {}", sentiment.negative));
        line(&mut out, format!("Ratio: {:.2}", sentiment.ratio));

        out
    }
}

fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

fn section(out: &mut String, title: &str) {
    line(out, title);
    line(out, SECTION_RULE);
}

fn numbered<'s>(out: &mut String, items: impl IntoIterator<Item = &'s str>) {
    for (i, item) in items.into_iter().enumerate() {
        line(out, format!("{}. {}", i + 1, item));
    }
}

fn write_summary(out: &mut String, report: &SummaryReport) {
    match report.health_score {
        Some(score) => line(out, format!("HEALTH SCORE: {}/10", score)),
        None => line(out, "HEALTH SCORE: N/A"),
    }
    if !report.health_explanation.is_empty() {
        line(out, &report.health_explanation);
    }
    line(out, "");

    section(out, "POSITIVE TRENDS");
    numbered(out, report.positive_trends.iter().map(String::as_str));
    line(out, "");

    section(out, "CONCERNS");
    numbered(out, report.concerns.iter().map(String::as_str));
    line(out, "");

    section(out, "TOP TOPICS");
    numbered(out, report.key_topics.iter().map(|t| t.label()));
    line(out, "");

    section(out, "CUSTOMER QUESTIONS");
    numbered(out, report.customer_questions.iter().map(|q| q.text()));
    line(out, "");

    section(out, "RECOMMENDATIONS");
    numbered(out, report.recommendations.iter().map(String::as_str));
    line(out, "");

    section(out, "KEY INSIGHT");
    line(out, &report.wow_insight);
    line(out, "");
}
