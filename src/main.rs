use chatpulse::cli::{Cli, Commands, ConfigAction};
use chatpulse::config::Config;
use chatpulse::error::{PulseError, Result};
use chatpulse::normalize::{load_sources, LoadedSources, Message};
use chatpulse::ranking::truncate_chars;
use chatpulse::report::TextReport;
use chatpulse::summary::{SavedResponseSummarizer, SummarySlot};
use chatpulse::taxonomy::BUILTIN_TAXONOMY;
use chatpulse::{Analysis, Engine};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Initialize logging
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze { files, json, now } => {
            cmd_analyze(cli.config, &files, json, now.as_deref())?;
        }
        Commands::Report {
            files,
            output,
            summary,
        } => {
            cmd_report(cli.config, &files, output, summary)?;
        }
        Commands::Sample { files, max } => {
            cmd_sample(cli.config, &files, max)?;
        }
        Commands::Payload { files } => {
            cmd_payload(cli.config, &files)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "chatpulse=debug"
    } else {
        "chatpulse=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_analyze(
    config_path: Option<PathBuf>,
    files: &[PathBuf],
    json: bool,
    now: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Arc::new(Engine::from_config(&config)?);
    let now = parse_now(now)?;
    let loaded = load_sources(files)?;

    let messages: Arc<[Message]> = loaded.messages.into();
    let rt = tokio::runtime::Runtime::new().map_err(|e| PulseError::Io {
        source: e,
        context: "Failed to create tokio runtime".to_string(),
    })?;
    let analysis = rt.block_on(Arc::clone(&engine).analyze_concurrent(messages, now))?;

    if json {
        println!("{}", to_json(&analysis, "Failed to serialize analysis")?);
        return Ok(());
    }

    print_overview(&analysis, &loaded.files);
    Ok(())
}

fn print_overview(analysis: &Analysis, files: &[String]) {
    let metrics = &analysis.metrics;
    let classification = &analysis.classification;

    println!("Chatpulse Analysis");
    println!("==================");
    println!("\nSources: {}", files.join(", "));
    println!("Date range: {}", metrics.date_range_label());
    println!("\nMessages:       {}", metrics.total);
    println!("Users:          {}", metrics.users);
    println!("Traders:        {}", metrics.specialized_participants);
    println!("Channels:       {}", metrics.channels);
    println!("Daily average:  {}", metrics.daily_average);
    println!("Last 7 days:    {}", metrics.last_7_days);
    println!("Last 30 days:   {}", metrics.last_30_days);
    println!("Peak block:     {} ({})", metrics.peak_block.label, metrics.peak_block.count);

    println!("\nTop contributors:");
    for contributor in &metrics.top_contributors {
        println!(
            "  {:<24} {:>6}  {:>5.1}%",
            contributor.name, contributor.count, contributor.percentage
        );
    }

    println!("\nTopics:");
    for topic in classification.active_topics() {
        println!("  {:<24} {:>6}", topic.topic, topic.count);
    }

    println!(
        "\nQuestions: {} ({} themes)",
        classification.question_count,
        classification.question_themes.len()
    );
    for theme in &classification.question_themes {
        println!("  {:<24} {:>6}", theme.theme, theme.count);
    }

    let sentiment = &classification.sentiment;
    println!(
        "\nSentiment: {} positive / {} negative (ratio {:.2})",
        sentiment.positive, sentiment.negative, sentiment.ratio
    );
    println!(
        "Staff messages sampled: {}, customer messages: {}",
        classification.staff_messages.len(),
        classification.customer_messages
    );
}

fn cmd_report(
    config_path: Option<PathBuf>,
    files: &[PathBuf],
    output: Option<PathBuf>,
    summary: Option<PathBuf>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::from_config(&config)?;
    let loaded = load_sources(files)?;
    let now = Utc::now();

    let analysis = engine.analyze(&loaded.messages, now)?;
    let slot = match summary {
        Some(path) => engine.summarize(
            &SavedResponseSummarizer::new(path),
            &loaded.messages,
            &analysis.metrics,
        ),
        None => SummarySlot::NotRequested,
    };

    let text = TextReport::new(&analysis, &slot, now).render();
    match output {
        Some(path) => {
            std::fs::write(&path, text).map_err(|e| PulseError::Io {
                source: e,
                context: format!("Failed to write report: {:?}", path),
            })?;
            println!("✓ Report written to: {}", path.display());
        }
        None => print!("{}", text),
    }

    Ok(())
}

fn cmd_sample(config_path: Option<PathBuf>, files: &[PathBuf], max: Option<usize>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(max) = max {
        config.sampling.dashboard_max = max;
    }
    let engine = Engine::from_config(&config)?;
    let LoadedSources { messages, .. } = load_sources(files)?;

    for message in engine.dashboard_sample(&messages) {
        println!(
            "[{}] {}: {}",
            message.channel_label,
            message.author,
            truncate_chars(&message.text, config.sampling.line_chars)
        );
    }

    Ok(())
}

fn cmd_payload(config_path: Option<PathBuf>, files: &[PathBuf]) -> Result<()> {
    let config = load_config(config_path)?;
    let engine = Engine::from_config(&config)?;
    let loaded = load_sources(files)?;

    let metrics = engine.metrics(&loaded.messages, Utc::now());
    let request = engine.summary_request(&loaded.messages, &metrics);
    println!("{}", to_json(&request, "Failed to serialize payload")?);

    Ok(())
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            println!("{}", to_json(&config, "Failed to serialize config")?);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            config.load_taxonomy()?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            let config_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&config_dir).map_err(|e| PulseError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", config_dir),
            })?;

            let taxonomy_path = config_dir.join("taxonomy.toml");
            if force || !taxonomy_path.exists() {
                std::fs::write(&taxonomy_path, BUILTIN_TAXONOMY).map_err(|e| PulseError::Io {
                    source: e,
                    context: format!("Failed to write taxonomy.toml: {:?}", taxonomy_path),
                })?;
            }

            let mut config = Config::default();
            config.taxonomy.file = Some(taxonomy_path.clone());
            config.save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
            println!("✓ Taxonomy installed at: {}", taxonomy_path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::debug!(
            "Config file not found, using defaults. Run 'chatpulse config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        return Ok(config);
    }

    Config::load(&path)
}

fn parse_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PulseError::InvalidInput(format!("invalid --now '{}': {}", raw, e))),
        None => Ok(Utc::now()),
    }
}

fn to_json<T: serde::Serialize>(value: &T, context: &str) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| PulseError::Json {
        source: e,
        context: context.to_string(),
    })
}
