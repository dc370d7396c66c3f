//! Comparison runs and single-parameter sweeps over a corpus.
//!
//! Each configuration variant differs from the defaults in at most one
//! option. Variants run one after another; every variant gets its own engine,
//! which is released before the next one is built. Per-file failures are
//! logged and recorded in the report, configuration errors abort.

use crate::audio::load_wav;
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::filter::FilterRegistry;
use crate::options::{
    OptionDelta, OptionGroup, OptionSet, PipelineOptions, is_truthy, option_group, resolve,
    values_equal,
};
use crate::pipeline::{Dispatch, transcribe_audio};
use crate::stt::{Transcriber, TranscriberFactory};
use crate::sweep::corpus::{CorpusFile, discover};
use crate::sweep::layout::{Artifact, ArtifactStore, RunLabel};
use crate::sweep::supervisor::run_with_deadline;
use crate::vad::ActivityModel;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runtime sweep settings, resolved from [`SweepConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSettings {
    pub output_dir: PathBuf,
    pub audio_extension: String,
    pub timeout: Option<Duration>,
    pub dispatch: Dispatch,
}

impl SweepSettings {
    pub fn from_config(config: &SweepConfig) -> Result<Self> {
        Ok(Self {
            output_dir: config.output_dir.clone(),
            audio_extension: config.audio_extension.clone(),
            timeout: config.timeout()?,
            dispatch: config.dispatch,
        })
    }
}

/// One parameter and the candidate values to try for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpec {
    pub parameter: String,
    pub values: Vec<Value>,
}

impl SweepSpec {
    pub fn new(parameter: &str, values: Vec<Value>) -> Self {
        Self {
            parameter: parameter.to_string(),
            values,
        }
    }
}

/// How one file fared under one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    Written { artifact: PathBuf },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub audio: PathBuf,
    pub parameter: String,
    pub value: Value,
    #[serde(flatten)]
    pub outcome: EntryOutcome,
    pub elapsed_ms: u64,
    pub chunks: usize,
    pub kept: usize,
    pub dropped: usize,
}

impl SweepEntry {
    pub fn is_written(&self) -> bool {
        matches!(self.outcome, EntryOutcome::Written { .. })
    }
}

/// Summary of a sweep or comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    pub parameter: String,
    /// Partition of `parameter`; absent for baselines and extension keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<OptionGroup>,
    pub corpus: PathBuf,
    pub output_dir: PathBuf,
    /// The default option set every variant was compared against.
    pub defaults: OptionSet,
    pub entries: Vec<SweepEntry>,
}

impl SweepReport {
    pub fn written(&self) -> impl Iterator<Item = &SweepEntry> {
        self.entries.iter().filter(|e| e.is_written())
    }

    pub fn failed(&self) -> impl Iterator<Item = &SweepEntry> {
        self.entries.iter().filter(|e| !e.is_written())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

/// One fully resolved configuration variant.
#[derive(Debug, Clone)]
struct Variant {
    /// Option name recorded in artifacts.
    parameter: String,
    /// Effective value of that option.
    value: Value,
    label: RunLabel,
    effective: OptionSet,
    options: PipelineOptions,
}

/// Holds a variant's engine; the engine is released when the guard drops.
struct EngineGuard {
    engine: Arc<dyn Transcriber>,
    label: RunLabel,
}

impl EngineGuard {
    fn handle(&self) -> Arc<dyn Transcriber> {
        Arc::clone(&self.engine)
    }
}

impl Drop for EngineGuard {
    fn drop(&mut self) {
        tracing::debug!(
            variant = %self.label,
            model = self.engine.model_name(),
            "Released engine"
        );
    }
}

/// Drives comparison runs over a corpus.
pub struct Orchestrator {
    defaults: OptionSet,
    registry: Arc<FilterRegistry>,
    activity: Arc<dyn ActivityModel>,
    factory: Arc<dyn TranscriberFactory>,
    settings: SweepSettings,
}

impl Orchestrator {
    pub fn new(
        defaults: OptionSet,
        registry: FilterRegistry,
        activity: Arc<dyn ActivityModel>,
        factory: Arc<dyn TranscriberFactory>,
        settings: SweepSettings,
    ) -> Self {
        Self {
            defaults,
            registry: Arc::new(registry),
            activity,
            factory,
            settings,
        }
    }

    pub fn defaults(&self) -> &OptionSet {
        &self.defaults
    }

    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// Where a report called `name` is saved.
    pub fn report_path(&self, name: &str) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("{}.json", crate::options::encode_component(name)))
    }

    /// Try every candidate value of one parameter on every corpus file.
    ///
    /// All candidates are validated and labelled before any audio is touched.
    pub fn sweep(&self, corpus: &Path, spec: &SweepSpec) -> Result<SweepReport> {
        let variants = self.plan_sweep(spec)?;
        let report = self.execute(corpus, &spec.parameter, &variants)?;
        report.save(&self.report_path(&format!("sweep-{}", spec.parameter)))?;
        Ok(report)
    }

    /// Run the corpus once with a sparse override of at most one option.
    ///
    /// With no effective change the run is labelled `defaults/baseline`.
    pub fn run(&self, corpus: &Path, requested: &OptionSet) -> Result<SweepReport> {
        let (effective, delta) = resolve(requested, &self.defaults)?;
        let variant = self.variant(effective, &delta)?;
        let report = self.execute(corpus, &variant.parameter, std::slice::from_ref(&variant))?;
        report.save(&self.report_path(&format!(
            "run-{}-{}",
            variant.label.parameter(),
            variant.label.value()
        )))?;
        Ok(report)
    }

    fn variant(&self, effective: OptionSet, delta: &OptionDelta) -> Result<Variant> {
        let options = PipelineOptions::from_option_set(&effective)?;
        self.registry.lookup(&options.asr.language)?;

        let (parameter, value) = match delta.single() {
            Some(change) => (change.key.clone(), change.new.clone()),
            None => (
                crate::defaults::BASELINE_PARAMETER.to_string(),
                Value::String(crate::defaults::BASELINE_VALUE.to_string()),
            ),
        };

        Ok(Variant {
            parameter,
            value,
            label: RunLabel::from_delta(delta),
            effective,
            options,
        })
    }

    fn plan_sweep(&self, spec: &SweepSpec) -> Result<Vec<Variant>> {
        if spec.parameter.trim().is_empty() {
            return Err(SweepError::ConfigInvalidValue {
                key: "param".to_string(),
                message: "parameter name must not be empty".to_string(),
            });
        }
        if spec.values.is_empty() {
            return Err(SweepError::ConfigInvalidValue {
                key: "values".to_string(),
                message: "at least one candidate value is required".to_string(),
            });
        }

        let mut variants = Vec::with_capacity(spec.values.len());
        let mut seen: HashMap<RunLabel, &Value> = HashMap::new();

        for candidate in &spec.values {
            let requested = OptionSet::new().with(&spec.parameter, candidate.clone());
            let (effective, delta) = resolve(&requested, &self.defaults)?;

            let value = effective
                .get(&spec.parameter)
                .cloned()
                .unwrap_or_else(|| candidate.clone());
            if !is_truthy(candidate) && !values_equal(candidate, &value) {
                tracing::warn!(
                    parameter = %spec.parameter,
                    candidate = %candidate,
                    effective = %value,
                    "Falsy candidate keeps the default value"
                );
            }

            let mut variant = self.variant(effective, &delta)?;
            // Candidates equal to the default are still filed under the
            // swept parameter so every candidate has a directory.
            variant.parameter = spec.parameter.clone();
            variant.label = RunLabel::new(&spec.parameter, &value);
            variant.value = value;

            if let Some(first) = seen.get(&variant.label) {
                return Err(SweepError::LayoutCollision {
                    label: variant.label.to_string(),
                    first: first.to_string(),
                    second: candidate.to_string(),
                });
            }
            seen.insert(variant.label.clone(), candidate);
            variants.push(variant);
        }

        Ok(variants)
    }

    fn execute(&self, corpus: &Path, parameter: &str, variants: &[Variant]) -> Result<SweepReport> {
        let files = discover(corpus, &self.settings.audio_extension)?;
        if files.is_empty() {
            tracing::warn!(corpus = %corpus.display(), "No audio files found");
        }

        let store = ArtifactStore::new(&self.settings.output_dir);
        let mut report = SweepReport {
            parameter: parameter.to_string(),
            group: option_group(parameter),
            corpus: corpus.to_path_buf(),
            output_dir: self.settings.output_dir.clone(),
            defaults: self.defaults.clone(),
            entries: Vec::with_capacity(files.len() * variants.len()),
        };

        for variant in variants {
            tracing::info!(variant = %variant.label, files = files.len(), "Acquiring engine");
            let guard = match self.factory.create(&variant.options) {
                Ok(engine) => EngineGuard {
                    engine,
                    label: variant.label.clone(),
                },
                Err(e) if e.is_config_error() => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        parameter = %variant.parameter,
                        value = %variant.value,
                        error = %e,
                        "Engine unavailable, skipping variant"
                    );
                    for file in &files {
                        report.entries.push(failed_entry(file, variant, &e, Duration::ZERO));
                    }
                    continue;
                }
            };

            for file in &files {
                let started = Instant::now();
                let entry = match self.process_file(file, variant, &guard, &store) {
                    Ok(entry) => entry,
                    Err(e) if e.is_config_error() => return Err(e),
                    Err(e) => {
                        tracing::warn!(
                            file = %file.path.display(),
                            parameter = %variant.parameter,
                            value = %variant.value,
                            error = %e,
                            "Skipping file"
                        );
                        failed_entry(file, variant, &e, started.elapsed())
                    }
                };
                report.entries.push(entry);
            }
        }

        Ok(report)
    }

    fn process_file(
        &self,
        file: &CorpusFile,
        variant: &Variant,
        guard: &EngineGuard,
        store: &ArtifactStore,
    ) -> Result<SweepEntry> {
        let started = Instant::now();
        let item = file.path.display().to_string();

        let path = file.path.clone();
        let options = variant.options.clone();
        let activity = Arc::clone(&self.activity);
        let registry = Arc::clone(&self.registry);
        let engine = guard.handle();
        let dispatch = self.settings.dispatch;

        let outcome = run_with_deadline(&item, self.settings.timeout, move || {
            let samples = load_wav(&path)?;
            transcribe_audio(
                &samples,
                &options,
                activity.as_ref(),
                engine.as_ref(),
                &registry,
                dispatch,
            )
        })?;

        let artifact = Artifact {
            audio: file.path.clone(),
            parameter: variant.parameter.clone(),
            value: variant.value.clone(),
            options: variant.effective.clone(),
            transcript: outcome.transcript,
        };
        let written = store.write(&file.basename, &variant.label, &artifact)?;

        let elapsed = started.elapsed();
        tracing::info!(
            file = %file.path.display(),
            variant = %variant.label,
            kept = outcome.kept,
            dropped = outcome.dropped,
            elapsed_ms = elapsed.as_millis() as u64,
            "Wrote artifact"
        );

        Ok(SweepEntry {
            audio: file.path.clone(),
            parameter: variant.parameter.clone(),
            value: variant.value.clone(),
            outcome: EntryOutcome::Written { artifact: written },
            elapsed_ms: elapsed.as_millis() as u64,
            chunks: outcome.chunks,
            kept: outcome.kept,
            dropped: outcome.dropped,
        })
    }
}

fn failed_entry(file: &CorpusFile, variant: &Variant, error: &SweepError, elapsed: Duration) -> SweepEntry {
    SweepEntry {
        audio: file.path.clone(),
        parameter: variant.parameter.clone(),
        value: variant.value.clone(),
        outcome: EntryOutcome::Failed {
            error: error.to_string(),
        },
        elapsed_ms: elapsed.as_millis() as u64,
        chunks: 0,
        kept: 0,
        dropped: 0,
    }
}
