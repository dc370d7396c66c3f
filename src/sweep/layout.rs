//! Output layout: `{output_dir}/{audio_basename}/{parameter}/{value}.json`.

use crate::defaults;
use crate::error::{Result, SweepError};
use crate::options::{OptionDelta, OptionSet, encode_component, value_label, values_equal};
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const ARTIFACT_EXTENSION: &str = "json";

/// Directory and file name for one configuration variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunLabel {
    parameter: String,
    value: String,
}

impl RunLabel {
    pub fn new(parameter: &str, value: &Value) -> Self {
        Self {
            parameter: encode_component(parameter),
            value: value_label(value),
        }
    }

    /// Label for a run that changes nothing.
    pub fn baseline() -> Self {
        Self {
            parameter: defaults::BASELINE_PARAMETER.to_string(),
            value: defaults::BASELINE_VALUE.to_string(),
        }
    }

    /// Label for a validated delta of at most one change.
    pub fn from_delta(delta: &OptionDelta) -> Self {
        match delta.single() {
            Some(change) => Self::new(&change.key, &change.new),
            None => Self::baseline(),
        }
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for RunLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.parameter, self.value)
    }
}

/// Where the artifact for `basename` under `label` lives.
pub fn artifact_path(output_dir: &Path, basename: &str, label: &RunLabel) -> PathBuf {
    output_dir
        .join(basename)
        .join(label.parameter())
        .join(format!("{}.{}", label.value(), ARTIFACT_EXTENSION))
}

/// Persisted result of one file under one configuration variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Source audio file.
    pub audio: PathBuf,
    /// Changed option, or the baseline marker.
    pub parameter: String,
    /// Effective value of the changed option.
    pub value: Value,
    /// Full effective option set, for reproduction and for the writer.
    pub options: OptionSet,
    pub transcript: Transcript,
}

impl Artifact {
    /// Whether `other` records the same run (same source, option and value).
    fn same_run(&self, other: &Artifact) -> bool {
        self.audio == other.audio
            && self.parameter == other.parameter
            && values_equal(&self.value, &other.value)
    }
}

/// Writes artifacts under a root directory, refusing to clobber other runs.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, basename: &str, label: &RunLabel) -> PathBuf {
        artifact_path(&self.root, basename, label)
    }

    /// Read back an artifact.
    pub fn read(path: &Path) -> Result<Artifact> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Persist `artifact`, creating directories as needed.
    ///
    /// An existing file at the target is only replaced when it records the
    /// same run; anything else is an [`SweepError::ArtifactConflict`].
    pub fn write(&self, basename: &str, label: &RunLabel, artifact: &Artifact) -> Result<PathBuf> {
        let path = self.path_for(basename, label);

        if path.exists() {
            let conflict = |message: String| SweepError::ArtifactConflict {
                path: path.display().to_string(),
                message,
            };
            let existing = Self::read(&path)
                .map_err(|e| conflict(format!("existing file is not a readable artifact ({})", e)))?;
            if !existing.same_run(artifact) {
                return Err(conflict(format!(
                    "it holds {} = {} for {}",
                    existing.parameter,
                    existing.value,
                    existing.audio.display()
                )));
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target and rename so readers never see a partial file.
        let partial = path.with_extension("json.partial");
        fs::write(&partial, serde_json::to_vec_pretty(artifact)?)?;
        fs::rename(&partial, &path)?;

        Ok(path)
    }
}
