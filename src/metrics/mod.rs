//! Engagement metrics
//!
//! Single pass over normalized messages producing totals, recency windows,
//! the two-hour activity histogram and the contributor ranking.

use crate::normalize::Message;
use crate::ranking::RankedCounter;
use crate::taxonomy::ChannelRules;
use ahash::{HashSet, HashSetExt};
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::Serialize;

const HOURS_PER_BLOCK: usize = 2;
const BLOCK_COUNT: usize = 24 / HOURS_PER_BLOCK;
const MILLIS_PER_DAY: i64 = 86_400_000;

/// One two-hour slot of the activity histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityBlock {
    /// e.g. "08-10"
    pub label: String,
    pub count: u64,
}

/// Ranked contributor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub name: String,
    pub count: u64,
    /// Share of all messages, rounded to one decimal place
    pub percentage: f64,
}

/// Engagement metrics for one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total: usize,
    pub users: usize,
    /// Distinct authors seen in specialized (trading-floor) channels
    pub specialized_participants: usize,
    pub channels: usize,
    pub last_7_days: usize,
    pub last_30_days: usize,
    pub daily_average: u64,
    /// Messages whose timestamp parsed; equals the histogram sum
    pub timestamped: usize,
    pub activity_blocks: Vec<ActivityBlock>,
    pub peak_block: ActivityBlock,
    pub top_contributors: Vec<Contributor>,
    pub earliest: Option<DateTime<Utc>>,
    pub latest: Option<DateTime<Utc>>,
}

impl MetricsSnapshot {
    /// "YYYY-MM-DD - YYYY-MM-DD", or "N/A" without timestamps
    pub fn date_range_label(&self) -> String {
        match (self.earliest, self.latest) {
            (Some(first), Some(last)) => format!(
                "{} - {}",
                first.format("%Y-%m-%d"),
                last.format("%Y-%m-%d")
            ),
            _ => "N/A".to_string(),
        }
    }

    /// Sum over the activity histogram
    pub fn bucketed_total(&self) -> u64 {
        self.activity_blocks.iter().map(|b| b.count).sum()
    }
}

/// Computes [`MetricsSnapshot`]s
pub struct MetricsAggregator<'a> {
    channels: &'a ChannelRules,
    top_contributors: usize,
}

impl<'a> MetricsAggregator<'a> {
    pub fn new(channels: &'a ChannelRules, top_contributors: usize) -> Self {
        Self {
            channels,
            top_contributors,
        }
    }

    /// Aggregate metrics relative to `now` (recency windows end at `now`)
    pub fn aggregate(&self, messages: &[Message], now: DateTime<Utc>) -> MetricsSnapshot {
        let week_ago = now - Duration::days(7);
        let month_ago = now - Duration::days(30);

        let mut users = HashSet::new();
        let mut channels = HashSet::new();
        let mut specialized = HashSet::new();
        let mut contributors: RankedCounter<String> = RankedCounter::new();
        let mut hourly = [0u64; 24];
        let (mut last_7, mut last_30, mut timestamped) = (0usize, 0usize, 0usize);
        let mut earliest: Option<DateTime<Utc>> = None;
        let mut latest: Option<DateTime<Utc>> = None;

        for message in messages {
            users.insert(message.author.as_str());
            channels.insert(message.channel_label.as_str());
            contributors.increment(message.author.clone());

            if self.channels.is_specialized(&message.channel) {
                specialized.insert(message.author.as_str());
            }

            let Some(ts) = message.timestamp else {
                continue;
            };

            timestamped += 1;
            hourly[ts.hour() as usize] += 1;
            if ts >= week_ago {
                last_7 += 1;
            }
            if ts >= month_ago {
                last_30 += 1;
            }
            earliest = Some(earliest.map_or(ts, |e| e.min(ts)));
            latest = Some(latest.map_or(ts, |l| l.max(ts)));
        }

        let activity_blocks = fold_blocks(&hourly);
        let peak_block = peak_block(&activity_blocks);

        let day_span = match (earliest, latest) {
            (Some(first), Some(last)) => {
                let millis = (last - first).num_milliseconds();
                ((millis + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY).max(1)
            }
            _ => 1,
        };

        let total = messages.len();
        let daily_average = (total as f64 / day_span as f64).round() as u64;

        let top_contributors = contributors
            .into_ranked(Some(self.top_contributors))
            .into_iter()
            .map(|(name, count)| Contributor {
                percentage: round_one_decimal(count as f64 / total.max(1) as f64 * 100.0),
                name,
                count,
            })
            .collect();

        tracing::debug!(
            total,
            timestamped,
            users = users.len(),
            day_span,
            "Aggregated engagement metrics"
        );

        MetricsSnapshot {
            total,
            users: users.len(),
            specialized_participants: specialized.len(),
            channels: channels.len(),
            last_7_days: last_7,
            last_30_days: last_30,
            daily_average,
            timestamped,
            activity_blocks,
            peak_block,
            top_contributors,
            earliest,
            latest,
        }
    }
}

/// Fold 24 hourly counts into 12 labelled two-hour blocks
fn fold_blocks(hourly: &[u64; 24]) -> Vec<ActivityBlock> {
    (0..BLOCK_COUNT)
        .map(|i| {
            let start = i * HOURS_PER_BLOCK;
            ActivityBlock {
                label: format!("{:02}-{:02}", start, start + HOURS_PER_BLOCK),
                count: hourly[start..start + HOURS_PER_BLOCK].iter().sum(),
            }
        })
        .collect()
}

/// Highest block by strict greater-than scan; the earliest block wins ties
fn peak_block(blocks: &[ActivityBlock]) -> ActivityBlock {
    let mut peak = &blocks[0];
    for block in &blocks[1..] {
        if block.count > peak.count {
            peak = block;
        }
    }
    peak.clone()
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
