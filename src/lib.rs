//! Chatpulse - Community Chat Analytics
//!
//! Turns exported chat transcripts into engagement metrics, topic and
//! sentiment classification, support-question themes and bounded samples
//! for an optional narrative summarizer. All classification is rule-based
//! over a configurable taxonomy.

pub mod classify;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod normalize;
pub mod ranking;
pub mod report;
pub mod sampler;
pub mod summary;
pub mod taxonomy;

pub use engine::{Analysis, Engine};
pub use error::{PulseError, Result};
