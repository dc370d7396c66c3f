use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, SweepError};
use crate::options::PipelineOptions;
use crate::transcript::TranscriptSegment;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (real Whisper vs mock).
pub trait Transcriber: Send + Sync {
    /// Transcribe audio samples into timed segments.
    ///
    /// # Arguments
    /// * `audio` - Audio samples as 16-bit PCM at 16kHz mono
    ///
    /// # Returns
    /// Segments with times relative to the start of `audio`, or an error
    fn transcribe(&self, audio: &[i16]) -> Result<Vec<TranscriptSegment>>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across worker threads.
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[i16]) -> Result<Vec<TranscriptSegment>> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Builds an engine configured for one effective option set.
///
/// The sweep asks for a fresh engine per configuration variant and drops it
/// before asking for the next one.
pub trait TranscriberFactory: Send + Sync {
    fn create(&self, options: &PipelineOptions) -> Result<Arc<dyn Transcriber>>;
}

type AudioPredicate = Arc<dyn Fn(&[i16]) -> bool + Send + Sync>;

/// Mock transcriber for testing
#[derive(Clone)]
pub struct MockTranscriber {
    model_name: String,
    response: String,
    segments: Option<Vec<TranscriptSegment>>,
    should_fail: bool,
    fail_when: Option<AudioPredicate>,
    delay: Option<Duration>,
    _live: Option<Arc<LiveToken>>,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            segments: None,
            should_fail: false,
            fail_when: None,
            delay: None,
            _live: None,
        }
    }

    /// Configure the mock to return one segment spanning the whole input
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self.segments = None;
        self
    }

    /// Configure the mock to return fixed segments regardless of input
    pub fn with_segments(mut self, segments: Vec<TranscriptSegment>) -> Self {
        self.segments = Some(segments);
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to fail only for audio matching `predicate`
    pub fn with_failure_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&[i16]) -> bool + Send + Sync + 'static,
    {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    /// Configure the mock to block for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, audio: &[i16]) -> Result<Vec<TranscriptSegment>> {
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }

        let predicate_hit = self.fail_when.as_ref().is_some_and(|f| f(audio));
        if self.should_fail || predicate_hit {
            return Err(SweepError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }

        if let Some(segments) = &self.segments {
            return Ok(segments.clone());
        }

        let duration = audio.len() as f64 / SAMPLE_RATE as f64;
        if duration <= 0.0 {
            return Ok(Vec::new());
        }
        Ok(vec![TranscriptSegment::new(0.0, duration, self.response.clone())])
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

/// Decrements the factory's live-engine count when the last clone drops.
struct LiveToken(Arc<AtomicUsize>);

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

type Builder = Box<dyn Fn(&PipelineOptions) -> Result<MockTranscriber> + Send + Sync>;

/// Mock factory for testing
///
/// Records every option set it was asked for and tracks how many engines it
/// handed out are still alive.
pub struct MockFactory {
    build: Builder,
    created: Mutex<Vec<PipelineOptions>>,
    live: Arc<AtomicUsize>,
    peak_live: AtomicUsize,
}

impl MockFactory {
    /// Factory handing out clones of `transcriber`
    pub fn new(transcriber: MockTranscriber) -> Self {
        Self::from_fn(move |_| Ok(transcriber.clone()))
    }

    /// Factory deciding per option set what to hand out
    pub fn from_fn<F>(build: F) -> Self
    where
        F: Fn(&PipelineOptions) -> Result<MockTranscriber> + Send + Sync + 'static,
    {
        Self {
            build: Box::new(build),
            created: Mutex::new(Vec::new()),
            live: Arc::new(AtomicUsize::new(0)),
            peak_live: AtomicUsize::new(0),
        }
    }

    /// Option sets passed to `create`, in call order
    pub fn created(&self) -> Vec<PipelineOptions> {
        self.created
            .lock()
            .map(|created| created.clone())
            .unwrap_or_default()
    }

    /// Engines created and not yet dropped
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Largest number of engines alive at the same time
    pub fn peak_live(&self) -> usize {
        self.peak_live.load(Ordering::SeqCst)
    }
}

impl TranscriberFactory for MockFactory {
    fn create(&self, options: &PipelineOptions) -> Result<Arc<dyn Transcriber>> {
        if let Ok(mut created) = self.created.lock() {
            created.push(options.clone());
        }

        let mut transcriber = (self.build)(options)?;

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_live.fetch_max(live, Ordering::SeqCst);
        transcriber._live = Some(Arc::new(LiveToken(Arc::clone(&self.live))));

        Ok(Arc::new(transcriber))
    }
}
