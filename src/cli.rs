//! Command-line interface for asrsweep
//!
//! Provides argument parsing using clap derive macros.

use crate::options::parse_value;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// One-variable-at-a-time ASR hyperparameter sweeps
#[derive(Parser, Debug)]
#[command(
    name = "asrsweep",
    version,
    about = "VAD chunking, hallucination filtering and ASR hyperparameter sweeps"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory artifacts and reports are written to
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Default transcription language (e.g. ko, en, ja)
    #[arg(long, global = true, value_name = "LANG")]
    pub language: Option<String>,

    /// Path to a ggml Whisper model file
    #[arg(long, global = true, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Per-file deadline. Examples: 90, 30s, 5m, 1h30m
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,
}

impl Cli {
    /// Default log filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Parse a per-file deadline.
///
/// Bare numbers are seconds; anything else goes through `humantime`.
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Parse a `KEY=VALUE` override.
fn parse_assignment(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing option name in '{}'", s));
    }
    Ok((key.to_string(), parse_value(raw)))
}

/// Split a candidate list on commas that are not inside brackets, braces or
/// quotes, so `0.0,[0.0,0.2]` yields two candidates.
pub fn split_values(raw: &str) -> Vec<Value> {
    let mut values = Vec::new();
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in raw.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            '[' | '{' if !quoted => depth += 1,
            ']' | '}' if !quoted => depth = depth.saturating_sub(1),
            ',' if !quoted && depth == 0 => {
                values.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    values.push(&raw[start..]);

    values
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .map(parse_value)
        .collect()
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Try every candidate value of one option on every corpus file
    Sweep {
        /// Audio file or directory searched recursively
        #[arg(long, value_name = "PATH")]
        corpus: PathBuf,

        /// Option to vary (e.g. vad_onset, beam_size)
        #[arg(long, value_name = "NAME")]
        param: String,

        /// Comma-separated candidate values (JSON literals or bare strings)
        #[arg(long, value_name = "V1,V2,...")]
        values: String,
    },

    /// Run the corpus once, optionally changing a single option
    Run {
        /// Audio file or directory searched recursively
        #[arg(long, value_name = "PATH")]
        corpus: PathBuf,

        /// Option override (at most one may differ from the defaults)
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        overrides: Vec<(String, Value)>,
    },

    /// Print the speech chunks found in an audio file
    Vad {
        /// WAV file to analyse
        #[arg(long, value_name = "FILE")]
        audio: PathBuf,

        /// Option override applied before chunking
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_assignment)]
        overrides: Vec<(String, Value)>,
    },

    /// Print the effective default options as JSON
    Options,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}
