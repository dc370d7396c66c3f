//! Corpus sweeps: discovery, per-variant execution and artifact layout.

pub mod corpus;
pub mod layout;
pub mod orchestrator;
pub mod supervisor;

pub use corpus::{CorpusFile, discover};
pub use layout::{Artifact, ArtifactStore, RunLabel, artifact_path};
pub use orchestrator::{
    EntryOutcome, Orchestrator, SweepEntry, SweepReport, SweepSettings, SweepSpec,
};
pub use supervisor::run_with_deadline;
