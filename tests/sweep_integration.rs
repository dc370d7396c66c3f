//! End-to-end sweeps over a small WAV corpus with a mock engine.

use asrsweep::config::Config;
use asrsweep::filter::FilterRegistry;
use asrsweep::options::{OptionSet, PipelineOptions};
use asrsweep::pipeline::Dispatch;
use asrsweep::stt::{MockFactory, MockTranscriber};
use asrsweep::sweep::{ArtifactStore, EntryOutcome, Orchestrator, SweepSettings, SweepSpec};
use asrsweep::vad::EnergyActivityModel;
use asrsweep::SweepError;
use serde_json::json;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Marker amplitude for speech in the file the engine chokes on.
const POISON: i16 = 7777;

fn write_wav(path: &Path, sample_rate: u32, channels: u16, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// `silence, speech, silence, speech, silence` in seconds at 16 kHz.
fn recording(level: i16) -> Vec<i16> {
    let mut samples = Vec::new();
    for (secs, loud) in [(0.5, false), (1.0, true), (0.5, false), (1.0, true), (0.5, false)] {
        let n = (secs * 16000.0) as usize;
        samples.extend(std::iter::repeat_n(if loud { level } else { 0 }, n));
    }
    samples
}

struct Workspace {
    _dir: TempDir,
    corpus: PathBuf,
    output: PathBuf,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(corpus.join("nested")).unwrap();
    write_wav(&corpus.join("first.wav"), 16000, 1, &recording(POISON));
    write_wav(&corpus.join("nested/second.wav"), 16000, 1, &recording(9000));
    let output = dir.path().join("output");
    Workspace {
        _dir: dir,
        corpus,
        output,
    }
}

fn orchestrator(output: &Path, factory: Arc<MockFactory>, language: &str) -> Orchestrator {
    let defaults = PipelineOptions::default()
        .to_option_set()
        .unwrap()
        .with("language", language);
    Orchestrator::new(
        defaults,
        FilterRegistry::builtin().unwrap(),
        Arc::new(EnergyActivityModel::default()),
        factory,
        SweepSettings {
            output_dir: output.to_path_buf(),
            audio_extension: "wav".to_string(),
            timeout: None,
            dispatch: Dispatch::Segment,
        },
    )
}

#[test]
fn test_vad_onset_sweep_writes_distinct_artifacts() {
    let ws = workspace();
    let factory = Arc::new(MockFactory::new(
        MockTranscriber::new("mock").with_response("회의를 시작하겠습니다"),
    ));
    let orch = orchestrator(&ws.output, Arc::clone(&factory), "ko");

    let spec = SweepSpec::new("vad_onset", vec![json!(0.3), json!(0.5), json!(0.7)]);
    let report = orch.sweep(&ws.corpus, &spec).unwrap();

    assert_eq!(report.entries.len(), 6);
    assert_eq!(report.failed().count(), 0, "unexpected failures: {:?}", report.entries);

    let paths: HashSet<PathBuf> = report
        .entries
        .iter()
        .map(|e| match &e.outcome {
            EntryOutcome::Written { artifact } => artifact.clone(),
            other => panic!("Expected artifact, got {:?}", other),
        })
        .collect();
    assert_eq!(paths.len(), 6, "artifact paths must be distinct");

    for basename in ["first", "second"] {
        for value in ["0.3", "0.5", "0.7"] {
            let path = ws
                .output
                .join(basename)
                .join("vad_onset")
                .join(format!("{}.json", value));
            let artifact = ArtifactStore::read(&path).unwrap();
            assert_eq!(artifact.parameter, "vad_onset");
            assert_eq!(artifact.options.get("vad_onset"), Some(&artifact.value));
            assert_eq!(artifact.transcript.len(), 2, "one segment per speech interval");
            assert!(artifact.transcript.is_ordered());
        }
    }

    assert_eq!(factory.created().len(), 3, "one engine per value");
    assert_eq!(factory.peak_live(), 1, "engines must not overlap");
    assert_eq!(factory.live(), 0);
}

#[test]
fn test_one_failing_file_leaves_the_rest_of_the_sweep_intact() {
    let ws = workspace();
    let factory = Arc::new(MockFactory::from_fn(|options| {
        let engine = MockTranscriber::new("mock").with_response("hello");
        if options.vad.vad_onset == 0.7 {
            Ok(engine.with_failure_when(|audio| audio.contains(&POISON)))
        } else {
            Ok(engine)
        }
    }));
    let orch = orchestrator(&ws.output, factory, "en");

    let spec = SweepSpec::new("vad_onset", vec![json!(0.3), json!(0.5), json!(0.7)]);
    let report = orch.sweep(&ws.corpus, &spec).unwrap();

    assert_eq!(report.written().count(), 5);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].audio.ends_with("first.wav"));

    assert!(!ws.output.join("first/vad_onset/0.7.json").exists());
    for value in ["0.3", "0.5", "0.7"] {
        assert!(ws.output.join(format!("second/vad_onset/{}.json", value)).exists());
    }
}

#[test]
fn test_hallucinated_segments_do_not_reach_artifacts() {
    let ws = workspace();
    let factory = Arc::new(MockFactory::new(
        MockTranscriber::new("mock").with_response("시청해주셔서 감사합니다."),
    ));
    let orch = orchestrator(&ws.output, factory, "ko");

    let report = orch.run(&ws.corpus, &OptionSet::new()).unwrap();

    for entry in &report.entries {
        assert_eq!(entry.kept, 0);
        assert_eq!(entry.dropped, 2);
    }
    let artifact = ArtifactStore::read(&ws.output.join("first/defaults/baseline.json")).unwrap();
    assert!(artifact.transcript.is_empty());
}

#[test]
fn test_two_changed_options_is_a_configuration_error() {
    let ws = workspace();
    let factory = Arc::new(MockFactory::new(MockTranscriber::new("mock")));
    let orch = orchestrator(&ws.output, Arc::clone(&factory), "en");

    let requested = OptionSet::new().with("vad_onset", 0.3).with("beam_size", 10);
    match orch.run(&ws.corpus, &requested) {
        Err(SweepError::MultipleChanges { keys }) => {
            assert_eq!(keys, vec!["vad_onset".to_string(), "beam_size".to_string()]);
        }
        other => panic!("Expected MultipleChanges, got {:?}", other.map(|r| r.entries.len())),
    }
    assert!(factory.created().is_empty());
    assert!(!ws.output.exists());
}

#[test]
fn test_candidates_sharing_a_directory_are_rejected_up_front() {
    let ws = workspace();
    let factory = Arc::new(MockFactory::new(MockTranscriber::new("mock")));
    let orch = orchestrator(&ws.output, Arc::clone(&factory), "en");

    // Both are falsy, fall back to the default 0.0 and would share
    // temperature/0.0.json.
    let spec = SweepSpec::new("temperature", vec![json!(0.0), json!(false)]);
    let err = orch.sweep(&ws.corpus, &spec).unwrap_err();

    assert!(matches!(err, SweepError::LayoutCollision { .. }), "got {:?}", err);
    assert!(factory.created().is_empty());
}

#[test]
fn test_resampled_stereo_corpus_is_transcribed() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();

    // 8 kHz stereo: both channels carry the same speech burst.
    let mono: Vec<i16> = recording(9000).into_iter().step_by(2).collect();
    let stereo: Vec<i16> = mono.iter().flat_map(|&s| [s, s]).collect();
    write_wav(&corpus.join("phone.wav"), 8000, 2, &stereo);

    let output = dir.path().join("out");
    let factory = Arc::new(MockFactory::new(MockTranscriber::new("mock").with_response("hi")));
    let orch = orchestrator(&output, factory, "en");

    let report = orch
        .sweep(&corpus, &SweepSpec::new("temperature", vec![json!(0.2)]))
        .unwrap();

    assert_eq!(report.written().count(), 1);
    let artifact = ArtifactStore::read(&output.join("phone/temperature/0.2.json")).unwrap();
    assert_eq!(artifact.transcript.len(), 2);
}

/// PCM16 mono header that declares a zero sample rate.
fn zero_rate_wav(samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    bytes
}

#[test]
fn test_zero_sample_rate_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    write_wav(&corpus.join("good.wav"), 16000, 1, &recording(9000));
    fs::write(corpus.join("zero.wav"), zero_rate_wav(&[100, 200, 300, 400])).unwrap();

    let output = dir.path().join("out");
    let factory = Arc::new(MockFactory::new(MockTranscriber::new("mock").with_response("hi")));
    let orch = orchestrator(&output, factory, "en");

    let report = orch
        .sweep(&corpus, &SweepSpec::new("temperature", vec![json!(0.2)]))
        .unwrap();

    assert_eq!(report.written().count(), 1);
    let failed: Vec<_> = report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].audio.ends_with("zero.wav"));
    match &failed[0].outcome {
        EntryOutcome::Failed { error } => {
            assert!(error.contains("zero sample rate"), "got {}", error)
        }
        other => panic!("Expected failure, got {:?}", other),
    }
    assert!(output.join("good/temperature/0.2.json").exists());
}

#[test]
fn test_config_file_drives_orchestrator_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[options]
language = "en"
beam_size = 3

[sweep]
output_dir = "runs"
timeout = "2m"
dispatch = "segment"
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let defaults = config.default_options().unwrap();
    let settings = SweepSettings::from_config(&config.sweep).unwrap();

    assert_eq!(defaults.get("beam_size"), Some(&json!(3)));
    assert_eq!(defaults.get("language"), Some(&json!("en")));
    assert_eq!(defaults.get("vad_offset"), Some(&json!(0.363)));
    assert_eq!(settings.output_dir, PathBuf::from("runs"));
    assert_eq!(settings.timeout, Some(std::time::Duration::from_secs(120)));
    assert_eq!(settings.dispatch, Dispatch::Segment);
}
