//! Keyword taxonomy registry for configuration-driven classification
//!
//! This module provides:
//! - Topic and question-theme taxonomies (ordered label -> keyword lists)
//! - Sentiment lexicons, stop words and staff role names
//! - Channel naming rules (specialized, question and priority channels)
//! - Pre-compiled question detection patterns
//!
//! The built-in taxonomy lives in `config-templates/taxonomy.toml` and is
//! compiled into the binary; a replacement file can be loaded at runtime.

use crate::error::{PulseError, Result};
use ahash::{HashSet, HashSetExt};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default taxonomy installed by `config init`
pub const BUILTIN_TAXONOMY: &str = include_str!("../../config-templates/taxonomy.toml");

/// A labelled keyword list as written in the taxonomy file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Question detection pattern as written in the taxonomy file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPatternConfig {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    pub specialized: Vec<String>,
    pub question: Vec<String>,
    pub priority: Vec<String>,
}

/// Taxonomy file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub summary_stop_words: Vec<String>,
    #[serde(default)]
    pub staff_roles: Vec<String>,
    pub channels: ChannelsConfig,
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub question_pattern: Vec<QuestionPatternConfig>,
    #[serde(default)]
    pub topic: Vec<CategoryConfig>,
    #[serde(default)]
    pub theme: Vec<CategoryConfig>,
}

impl TaxonomyConfig {
    /// Parse the taxonomy compiled into the binary
    pub fn builtin() -> Result<Self> {
        Ok(toml::from_str(BUILTIN_TAXONOMY)?)
    }
}

/// Category with lower-cased keywords ready for substring matching
#[derive(Debug, Clone)]
pub struct Category {
    pub label: String,
    pub keywords: Vec<String>,
}

impl Category {
    /// True if any keyword occurs in the already lower-cased text
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|kw| lowered.contains(kw.as_str()))
    }
}

/// Positive and negative word lists
#[derive(Debug, Clone)]
pub struct SentimentLexicon {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

impl SentimentLexicon {
    pub fn is_positive(&self, lowered: &str) -> bool {
        self.positive.iter().any(|w| lowered.contains(w.as_str()))
    }

    pub fn is_negative(&self, lowered: &str) -> bool {
        self.negative.iter().any(|w| lowered.contains(w.as_str()))
    }
}

/// Channel naming rules, all substring based
#[derive(Debug, Clone)]
pub struct ChannelRules {
    pub specialized: Vec<String>,
    pub question: Vec<String>,
    pub priority: Vec<String>,
}

impl ChannelRules {
    /// Trading-floor style channel: counted in metrics, skipped by classification
    pub fn is_specialized(&self, channel: &str) -> bool {
        contains_any(channel, &self.specialized)
    }

    /// Channel where question detection runs
    pub fn is_question_channel(&self, channel: &str) -> bool {
        contains_any(channel, &self.question) && !self.is_specialized(channel)
    }

    /// Channel whose questions are listed first
    pub fn is_priority(&self, channel: &str) -> bool {
        contains_any(channel, &self.priority)
    }
}

fn contains_any(channel: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| channel.contains(n.as_str()))
}

/// Compiled question pattern
#[derive(Debug, Clone)]
pub struct CompiledQuestionPattern {
    pub name: String,
    pub regex: Regex,
}

/// Taxonomy registry with all lists normalized and patterns pre-compiled
#[derive(Debug, Clone)]
pub struct Taxonomy {
    /// Topic taxonomy in declaration order
    pub topics: Vec<Category>,
    /// Question-theme taxonomy in declaration order
    pub themes: Vec<Category>,
    pub sentiment: SentimentLexicon,
    pub stop_words: HashSet<String>,
    pub summary_stop_words: HashSet<String>,
    pub staff_roles: Vec<String>,
    pub channels: ChannelRules,
    pub question_patterns: Vec<CompiledQuestionPattern>,
}

impl Taxonomy {
    /// Built-in taxonomy from `config-templates/taxonomy.toml`
    pub fn builtin() -> Result<Self> {
        Self::from_config(TaxonomyConfig::builtin()?)
    }

    /// Load a taxonomy file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PulseError::Io {
            source: e,
            context: format!("Failed to read taxonomy file: {:?}", path),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TaxonomyConfig = toml::from_str(content)?;
        Self::from_config(config)
    }

    /// Build the registry from a parsed taxonomy configuration
    pub fn from_config(config: TaxonomyConfig) -> Result<Self> {
        let question_patterns = config
            .question_pattern
            .iter()
            .map(|qp| {
                RegexBuilder::new(&qp.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| CompiledQuestionPattern {
                        name: qp.name.clone(),
                        regex,
                    })
                    .map_err(|e| {
                        PulseError::Config(format!(
                            "Invalid question pattern '{}': {}",
                            qp.name, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let topics = compile_categories(&config.topic, "topic")?;
        let themes = compile_categories(&config.theme, "theme")?;

        Ok(Self {
            topics,
            themes,
            sentiment: SentimentLexicon {
                positive: lowercase_all(&config.sentiment.positive),
                negative: lowercase_all(&config.sentiment.negative),
            },
            stop_words: to_set(&config.stop_words),
            summary_stop_words: to_set(&config.summary_stop_words),
            staff_roles: lowercase_all(&config.staff_roles),
            channels: ChannelRules {
                specialized: lowercase_all(&config.channels.specialized),
                question: lowercase_all(&config.channels.question),
                priority: lowercase_all(&config.channels.priority),
            },
            question_patterns,
        })
    }

    /// True if any question pattern matches the text
    pub fn is_question(&self, text: &str) -> bool {
        self.question_patterns.iter().any(|p| p.regex.is_match(text))
    }

    /// True if any staff role name occurs in a role tag or in the author name
    pub fn is_staff<'a>(&self, author: &str, roles: impl IntoIterator<Item = &'a String>) -> bool {
        let author = author.to_lowercase();
        let roles: Vec<&String> = roles.into_iter().collect();
        self.staff_roles.iter().any(|role| {
            author.contains(role.as_str()) || roles.iter().any(|r| r.contains(role.as_str()))
        })
    }
}

fn compile_categories(categories: &[CategoryConfig], kind: &str) -> Result<Vec<Category>> {
    let mut seen = HashSet::new();
    categories
        .iter()
        .map(|c| {
            if !seen.insert(c.label.clone()) {
                return Err(PulseError::Config(format!(
                    "Duplicate {} label '{}'",
                    kind, c.label
                )));
            }
            Ok(Category {
                label: c.label.clone(),
                keywords: lowercase_all(&c.keywords),
            })
        })
        .collect()
}

fn lowercase_all(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|w| w.to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn to_set(words: &[String]) -> HashSet<String> {
    lowercase_all(words).into_iter().collect()
}
