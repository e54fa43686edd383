// Integration tests for the analysis engine over realistic record sets
use chatpulse::config::{LimitsConfig, SamplingConfig};
use chatpulse::normalize::{normalize_all, Message};
use chatpulse::summary::{SavedResponseSummarizer, SummarySlot};
use chatpulse::taxonomy::Taxonomy;
use chatpulse::{Engine, PulseError};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// 5 trading-floor messages by alice, 5 general messages by bob (3 questions)
fn trading_floor_records() -> Value {
    let mut records = Vec::new();
    for i in 0..5 {
        records.push(json!({
            "author": {"username": "alice"},
            "channel": "trading-floor",
            "content": format!("great long entry on NQ number {}", i),
            "timestamp": format!("2024-05-3{}T0{}:15:00Z", i % 2, i),
        }));
    }
    for content in [
        "how do payouts work?",
        "is the server down?",
        "anyone seen the new dashboard?",
        "gm everyone",
        "nice session today",
    ] {
        records.push(json!({
            "author": {"username": "bob"},
            "channel": "general",
            "content": content,
            "timestamp": "2024-05-31T14:30:00Z",
        }));
    }
    Value::Array(records)
}

fn large_messages(count: usize) -> Vec<Message> {
    let records: Vec<Value> = (0..count)
        .map(|i| {
            let roles: Vec<&str> = if i % 9 == 0 { vec!["Moderator"] } else { vec![] };
            json!({
                "author": {"username": format!("user{}", i % 37), "roles": roles},
                "content": format!("great payout but terrible login error, how do I fix it? #{}", i),
                "timestamp": format!("2024-05-{:02}T{:02}:00:00Z", 1 + i % 28, i % 24),
            })
        })
        .collect();
    normalize_all(&Value::Array(records), Some("questions")).unwrap()
}

#[test]
fn test_trading_floor_scenario() {
    let engine = Engine::with_defaults().unwrap();
    let analysis = engine
        .analyze_records(&trading_floor_records(), None, now())
        .unwrap();

    assert_eq!(analysis.metrics.total, 10);
    assert_eq!(analysis.metrics.users, 2);
    assert_eq!(analysis.metrics.specialized_participants, 1);
    assert_eq!(analysis.metrics.channels, 2);
    assert_eq!(analysis.classification.question_count, 3);
    assert_eq!(analysis.classification.total_processed, 10);

    // trading-floor chatter never reaches topics or sentiment
    assert_eq!(analysis.classification.sentiment.positive, 1);
    assert_eq!(analysis.classification.channel_activity["trading-floor"], 5);
    assert_eq!(analysis.classification.channel_activity["general"], 5);
}

#[test]
fn test_contributor_and_bucket_invariants() {
    let engine = Engine::with_defaults().unwrap();
    let mut records = trading_floor_records();
    if let Value::Array(items) = &mut records {
        items.push(json!({"username": "carol", "content": "no clock on this one"}));
        items.push(json!({"username": "dave", "content": "bad clock", "timestamp": "not a date"}));
    }
    let analysis = engine.analyze_records(&records, None, now()).unwrap();
    let metrics = &analysis.metrics;

    assert_eq!(metrics.total, 12);
    assert_eq!(metrics.timestamped, 10);
    assert_eq!(metrics.bucketed_total(), 10);
    assert!(metrics.bucketed_total() < metrics.total as u64);

    let contributor_sum: u64 = metrics.top_contributors.iter().map(|c| c.count).sum();
    assert!(contributor_sum <= metrics.total as u64);
    let percentage_sum: f64 = metrics.top_contributors.iter().map(|c| c.percentage).sum();
    assert!(percentage_sum <= 100.0 + 0.5);
}

#[test]
fn test_all_timestamps_fill_buckets() {
    let engine = Engine::with_defaults().unwrap();
    let analysis = engine
        .analyze_records(&trading_floor_records(), None, now())
        .unwrap();
    assert_eq!(analysis.metrics.bucketed_total(), 10);
}

#[test]
fn test_idempotent_runs() {
    let engine = Engine::with_defaults().unwrap();
    let messages = large_messages(500);

    let first = engine.analyze(&messages, now()).unwrap();
    let second = engine.analyze(&messages, now()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_caps_on_large_input() {
    let engine = Engine::with_defaults().unwrap();
    let messages = large_messages(3_000);
    let analysis = engine.analyze(&messages, now()).unwrap();
    let classification = &analysis.classification;

    assert!(classification.topics.iter().all(|t| t.examples.len() <= 15));
    assert!(classification.question_themes.iter().all(|t| t.examples.len() <= 5));
    assert_eq!(classification.sentiment.praises.len(), 30);
    assert_eq!(classification.sentiment.complaints.len(), 30);
    assert!(classification.staff_messages.len() <= 50);
    assert_eq!(classification.question_count, 3_000);
    assert_eq!(analysis.metrics.top_contributors.len(), 10);
}

#[test]
fn test_empty_input_is_empty_result() {
    let engine = Engine::with_defaults().unwrap();
    assert!(matches!(
        engine.analyze(&[], now()),
        Err(PulseError::EmptyResult(_))
    ));
    assert!(matches!(
        engine.analyze_records(&json!([]), None, now()),
        Err(PulseError::EmptyResult(_))
    ));
}

#[test]
fn test_invalid_input_shape() {
    let engine = Engine::with_defaults().unwrap();
    assert!(matches!(
        engine.analyze_records(&json!("not records"), None, now()),
        Err(PulseError::InvalidInput(_))
    ));
}

#[test]
fn test_summary_payload_bounds() {
    let engine = Engine::new(
        Taxonomy::builtin().unwrap(),
        LimitsConfig::default(),
        SamplingConfig {
            summary_max: 100,
            question_head: 12,
            ..SamplingConfig::default()
        },
    );
    let messages = large_messages(1_000);
    let metrics = engine.metrics(&messages, now());
    let request = engine.summary_request(&messages, &metrics);

    assert_eq!(request.payload.sample_size, 100);
    assert_eq!(request.payload.question_total, 100);
    assert_eq!(request.payload.questions.len(), 12);
    assert!(request.payload.message_block.chars().count() <= 25_000);
    assert!(request.payload.common_words.len() <= 30);
    assert_eq!(request.context.users, 37);
}

#[test]
fn test_saved_summary_response() {
    let engine = Engine::with_defaults().unwrap();
    let messages = normalize_all(&trading_floor_records(), None).unwrap();
    let metrics = engine.metrics(&messages, now());

    let mut good = tempfile::NamedTempFile::new().unwrap();
    write!(
        good,
        "```json\n{{\"healthScore\": \"7\", \"concerns\": [\"slow replies\"]}}\n```"
    )
    .unwrap();
    let slot = engine.summarize(
        &SavedResponseSummarizer::new(good.path().to_path_buf()),
        &messages,
        &metrics,
    );
    let report = slot.report().unwrap();
    assert_eq!(report.health_score, Some(7.0));
    assert_eq!(report.concerns, vec!["slow replies".to_string()]);

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    write!(bad, "I could not produce JSON today").unwrap();
    let slot = engine.summarize(
        &SavedResponseSummarizer::new(bad.path().to_path_buf()),
        &messages,
        &metrics,
    );
    assert!(matches!(slot, SummarySlot::Failed { .. }));
}

#[tokio::test]
async fn test_concurrent_matches_sequential() {
    let engine = Arc::new(Engine::with_defaults().unwrap());
    let messages = large_messages(2_000);

    let sequential = engine.analyze(&messages, now()).unwrap();
    let shared: Arc<[Message]> = messages.into();
    let concurrent = Arc::clone(&engine)
        .analyze_concurrent(Arc::clone(&shared), now())
        .await
        .unwrap();

    assert_eq!(sequential, concurrent);
}

#[tokio::test]
async fn test_concurrent_independent_runs() {
    let engine = Arc::new(Engine::with_defaults().unwrap());
    let a: Arc<[Message]> = large_messages(300).into();
    let b: Arc<[Message]> = normalize_all(&trading_floor_records(), None).unwrap().into();

    let (left, right) = tokio::join!(
        Arc::clone(&engine).analyze_concurrent(a, now()),
        Arc::clone(&engine).analyze_concurrent(b, now()),
    );

    assert_eq!(left.unwrap().metrics.total, 300);
    assert_eq!(right.unwrap().classification.question_count, 3);
}

#[tokio::test]
async fn test_concurrent_empty_input() {
    let engine = Arc::new(Engine::with_defaults().unwrap());
    let empty: Arc<[Message]> = Vec::new().into();
    assert!(matches!(
        engine.analyze_concurrent(empty, now()).await,
        Err(PulseError::EmptyResult(_))
    ));
}
