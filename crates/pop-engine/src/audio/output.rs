use super::error::AudioError;
use super::pcm::AudioBuffer;
use super::service::AudioConfig;

/// Handle to one sound started on an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u32);

/// Lifecycle of an output context. Browsers start contexts suspended until a user gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

/// A short synthesized sine sweep with an exponential gain envelope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Chirp {
    pub start_hz: f32,
    pub end_hz: f32,
    pub start_gain: f32,
    pub end_gain: f32,
    /// Seconds.
    pub duration: f64,
}

impl Chirp {
    /// The pop sound: 660 → 880 Hz over 100 ms, gain 0.05 → 0.01.
    pub const CELEBRATION: Chirp = Chirp {
        start_hz: 660.0,
        end_hz: 880.0,
        start_gain: 0.05,
        end_gain: 0.01,
        duration: 0.1,
    };
}

/// One audio output device/context. Times are seconds on the output's own clock.
pub trait AudioOutput {
    fn state(&self) -> ContextState;

    /// Ask a suspended context to run. May complete asynchronously.
    fn resume(&mut self) -> Result<(), AudioError>;

    fn current_time(&self) -> f64;

    /// Start `buffer` at `when` on the output clock, or right away for `None`.
    fn start(&mut self, buffer: &AudioBuffer, when: Option<f64>) -> Result<SourceId, AudioError>;

    /// Stop a source early. Stopping one that already ended may fail.
    fn stop(&mut self, source: SourceId) -> Result<(), AudioError>;

    /// Forget a source that ended on its own.
    fn release(&mut self, _source: SourceId) {}

    /// Play a synthesized chirp right away.
    fn chirp(&mut self, chirp: &Chirp) -> Result<(), AudioError>;
}

/// Creates the output context on first use.
pub type OutputFactory = Box<dyn FnMut(&AudioConfig) -> Result<Box<dyn AudioOutput>, AudioError>>;
