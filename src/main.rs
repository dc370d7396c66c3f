use anyhow::{Context, Result, anyhow};
use asrsweep::audio::load_wav;
use asrsweep::cli::{Cli, Commands, split_values};
use asrsweep::config::Config;
use asrsweep::filter::FilterRegistry;
use asrsweep::options::{OptionSet, PipelineOptions, overlay};
use asrsweep::pipeline::plan_chunks;
use asrsweep::stt::WhisperFactory;
use asrsweep::sweep::{EntryOutcome, Orchestrator, SweepReport, SweepSettings, SweepSpec};
use asrsweep::vad::EnergyActivityModel;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);
    tracing::debug!(version = %asrsweep::version_string(), "Starting asrsweep");

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Sweep {
            corpus,
            param,
            values,
        } => {
            let spec = SweepSpec::new(param, split_values(values));
            let orchestrator = build_orchestrator(&config, &cli)?;
            let report = orchestrator.sweep(corpus, &spec)?;
            print_summary(&report, cli.quiet);
        }
        Commands::Run { corpus, overrides } => {
            let requested = option_set(overrides);
            let orchestrator = build_orchestrator(&config, &cli)?;
            let report = orchestrator.run(corpus, &requested)?;
            print_summary(&report, cli.quiet);
        }
        Commands::Vad { audio, overrides } => {
            print_chunks(&config, audio, overrides)?;
        }
        Commands::Options => {
            let defaults = config.default_options()?;
            println!("{}", serde_json::to_string_pretty(&defaults)?);
        }
        Commands::Completions { shell } => {
            clap_complete::generate(
                *shell,
                &mut Cli::command(),
                "asrsweep",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`/`--quiet`.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("asrsweep={}", cli.log_level())));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Command-line flags
/// 2. Environment variables (ASRSWEEP_*)
/// 3. Custom config path from CLI (--config), or ~/.config/asrsweep/config.toml
/// 4. Built-in defaults
fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&Config::default_path())?,
    };
    let mut config = config.with_env_overrides();

    if let Some(dir) = &cli.output_dir {
        config.sweep.output_dir = dir.clone();
    }
    if let Some(language) = &cli.language {
        config.options.insert("language", language.as_str());
    }
    if let Some(model) = &cli.model {
        config.engine.model_path = Some(model.clone());
    }
    Ok(config)
}

fn build_orchestrator(config: &Config, cli: &Cli) -> Result<Orchestrator> {
    let defaults = config.default_options()?;
    let registry = FilterRegistry::from_config(&config.filter)?;

    let mut settings = SweepSettings::from_config(&config.sweep)?;
    if cli.timeout.is_some() {
        settings.timeout = cli.timeout;
    }

    let model_path = config.engine.model_path.clone().ok_or_else(|| {
        anyhow!("No model configured. Pass --model, set ASRSWEEP_MODEL or [engine].model_path")
    })?;
    let factory = WhisperFactory::new(model_path, config.engine.threads)?;

    Ok(Orchestrator::new(
        defaults,
        registry,
        Arc::new(EnergyActivityModel::default()),
        Arc::new(factory),
        settings,
    ))
}

fn option_set(overrides: &[(String, Value)]) -> OptionSet {
    overrides.iter().cloned().collect()
}

fn print_chunks(config: &Config, audio: &Path, overrides: &[(String, Value)]) -> Result<()> {
    let (effective, _) = overlay(&option_set(overrides), &config.default_options()?);
    let options = PipelineOptions::from_option_set(&effective)?;

    let samples =
        load_wav(audio).with_context(|| format!("Failed to load {}", audio.display()))?;
    let chunks = plan_chunks(&samples, &options.vad, &EnergyActivityModel::default())?;

    println!("{}", serde_json::to_string_pretty(&chunks)?);
    Ok(())
}

fn print_summary(report: &SweepReport, quiet: bool) {
    if quiet {
        return;
    }

    let written = report.written().count();
    let failed = report.failed().count();

    eprintln!();
    eprintln!(
        "{} {} ({} files x {} values)",
        "Sweep".bold(),
        report.parameter.cyan(),
        report
            .entries
            .iter()
            .map(|e| &e.audio)
            .collect::<std::collections::BTreeSet<_>>()
            .len(),
        report
            .entries
            .iter()
            .map(|e| e.value.to_string())
            .collect::<std::collections::BTreeSet<_>>()
            .len(),
    );

    for entry in &report.entries {
        match &entry.outcome {
            EntryOutcome::Written { artifact } => eprintln!(
                "  {} {} = {}  {} kept, {} dropped, {}ms  {}",
                "ok".green(),
                entry.parameter,
                entry.value,
                entry.kept,
                entry.dropped,
                entry.elapsed_ms,
                artifact.display().dimmed(),
            ),
            EntryOutcome::Failed { error } => eprintln!(
                "  {} {} = {}  {}  {}",
                "failed".red(),
                entry.parameter,
                entry.value,
                entry.audio.display(),
                error.dimmed(),
            ),
        }
    }

    eprintln!();
    if failed == 0 {
        eprintln!("{} {} artifacts written", "Done:".green().bold(), written);
    } else {
        eprintln!(
            "{} {} artifacts written, {} failed",
            "Done:".yellow().bold(),
            written,
            failed
        );
    }
    eprintln!("Artifacts in {}", report.output_dir.display());
}
