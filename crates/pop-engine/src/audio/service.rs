use std::cell::Cell;
use std::rc::Rc;

use super::error::AudioError;
use super::output::{AudioOutput, Chirp, ContextState, OutputFactory, SourceId};
use super::pcm::{decode_base64, decode_pcm16, AudioBuffer};

/// Format of the PCM the speech collaborator hands us, and of the output context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24_000,
            channels: 1,
        }
    }
}

/// How a buffer is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayMode {
    /// Start now, on top of whatever is playing.
    Immediate,
    /// Start when everything queued before it has finished.
    Queued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Pending,
    /// Played to the end.
    Finished,
    /// Cut short by `stop_all`.
    Cancelled,
}

/// Completion signal for one `play_buffer` call.
#[derive(Debug, Clone)]
pub struct Completion(Rc<Cell<PlaybackState>>);

impl Completion {
    fn pending() -> Self {
        Self(Rc::new(Cell::new(PlaybackState::Pending)))
    }

    /// A completion that has already finished (nothing was played).
    pub fn resolved() -> Self {
        Self(Rc::new(Cell::new(PlaybackState::Finished)))
    }

    fn set(&self, state: PlaybackState) {
        self.0.set(state);
    }

    pub fn state(&self) -> PlaybackState {
        self.0.get()
    }

    /// True only once the sound has played to its natural end.
    pub fn is_finished(&self) -> bool {
        self.state() == PlaybackState::Finished
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == PlaybackState::Cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.state() == PlaybackState::Pending
    }
}

struct ActiveSource {
    id: SourceId,
    ends_at: f64,
    completion: Completion,
}

/// Single owner of sound output.
///
/// The output context is opened lazily through the factory on the first
/// `resume`. Queued playback is a strict FIFO timeline tracked by
/// `next_start_time`; immediate playback overlays it. `stop_all` is the only
/// way to interrupt anything.
pub struct AudioService {
    config: AudioConfig,
    factory: OutputFactory,
    output: Option<Box<dyn AudioOutput>>,
    next_start_time: f64,
    active: Vec<ActiveSource>,
}

impl AudioService {
    pub fn new(config: AudioConfig, factory: OutputFactory) -> Self {
        Self {
            config,
            factory,
            output: None,
            next_start_time: 0.0,
            active: Vec::new(),
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Whether an output context exists.
    pub fn is_ready(&self) -> bool {
        self.output.is_some()
    }

    /// Open the output if needed and make sure it is running. Idempotent.
    pub fn resume(&mut self) -> Result<(), AudioError> {
        if self.output.is_none() {
            match (self.factory)(&self.config) {
                Ok(output) => {
                    log::info!("audio output opened ({} Hz)", self.config.sample_rate);
                    self.output = Some(output);
                }
                Err(err) => {
                    log::warn!("audio output unavailable: {}", err);
                    return Err(err);
                }
            }
        }
        let output = self.output.as_mut().ok_or(AudioError::Uninitialized)?;
        if output.state() == ContextState::Suspended {
            output.resume()?;
        }
        Ok(())
    }

    /// Base64 to raw bytes. No side effects.
    pub fn decode(&self, encoded: &str) -> Result<Vec<u8>, AudioError> {
        decode_base64(encoded)
    }

    /// Decode PCM in the configured format.
    pub fn decode_audio_data(&mut self, bytes: &[u8]) -> Result<AudioBuffer, AudioError> {
        let AudioConfig { sample_rate, channels } = self.config;
        self.decode_audio_data_with(bytes, sample_rate, channels)
    }

    /// Decode little-endian 16-bit PCM. Fails with `Uninitialized` when no output context can be opened.
    pub fn decode_audio_data_with(
        &mut self,
        bytes: &[u8],
        sample_rate: u32,
        channels: u16,
    ) -> Result<AudioBuffer, AudioError> {
        if let Err(err) = self.resume() {
            log::debug!("resume before decode failed: {}", err);
        }
        if self.output.is_none() {
            return Err(AudioError::Uninitialized);
        }
        decode_pcm16(bytes, sample_rate, channels)
    }

    /// Play a decoded buffer. Without an output this is a no-op and the
    /// returned completion is already finished.
    pub fn play_buffer(&mut self, buffer: &AudioBuffer, mode: PlayMode) -> Completion {
        if let Err(err) = self.resume() {
            log::debug!("resume before playback failed: {}", err);
        }
        let Some(output) = self.output.as_mut() else {
            return Completion::resolved();
        };

        let now = output.current_time();
        let duration = buffer.duration();
        let (when, start) = match mode {
            PlayMode::Immediate => (None, now),
            PlayMode::Queued => {
                let start = self.next_start_time.max(now);
                (Some(start), start)
            }
        };

        match output.start(buffer, when) {
            Ok(id) => {
                if mode == PlayMode::Queued {
                    self.next_start_time = start + duration;
                }
                let completion = Completion::pending();
                self.active.push(ActiveSource {
                    id,
                    ends_at: start + duration,
                    completion: completion.clone(),
                });
                completion
            }
            Err(err) => {
                log::warn!("failed to start audio source: {}", err);
                Completion::resolved()
            }
        }
    }

    /// Decode base64 PCM and queue it.
    pub fn play_pcm(&mut self, encoded: &str) -> Result<Completion, AudioError> {
        let bytes = self.decode(encoded)?;
        let buffer = self.decode_audio_data(&bytes)?;
        Ok(self.play_buffer(&buffer, PlayMode::Queued))
    }

    /// Retire sources whose scheduled end has passed on the output clock.
    pub fn pump(&mut self) {
        let Some(output) = self.output.as_mut() else {
            return;
        };
        let now = output.current_time();
        self.active.retain(|source| {
            if source.ends_at <= now {
                source.completion.set(PlaybackState::Finished);
                output.release(source.id);
                false
            } else {
                true
            }
        });
    }

    /// Stop every active sound and rewind the queue cursor to now.
    pub fn stop_all(&mut self) {
        // Sounds that already ran out count as finished, not cancelled.
        self.pump();
        let Some(output) = self.output.as_mut() else {
            self.active.clear();
            return;
        };
        for source in self.active.drain(..) {
            if let Err(err) = output.stop(source.id) {
                log::trace!("ignoring stop of {:?}: {}", source.id, err);
            }
            source.completion.set(PlaybackState::Cancelled);
        }
        self.next_start_time = output.current_time();
    }

    /// The short pop chirp. Independent of narration and the queue.
    pub fn play_celebration_sound(&mut self) {
        if let Err(err) = self.resume() {
            log::debug!("resume before chirp failed: {}", err);
        }
        let Some(output) = self.output.as_mut() else {
            return;
        };
        if let Err(err) = output.chirp(&Chirp::CELEBRATION) {
            log::warn!("celebration chirp failed: {}", err);
        }
    }

    /// Number of sounds started and not yet retired or stopped.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Where the next queued sound would start, before clamping to now.
    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ManualOutput;
    use base64::{engine::general_purpose, Engine as _};

    fn service() -> (AudioService, ManualOutput) {
        let out = ManualOutput::new();
        let svc = AudioService::new(AudioConfig::default(), out.factory());
        (svc, out)
    }

    fn broken() -> AudioService {
        AudioService::new(
            AudioConfig::default(),
            Box::new(|_: &AudioConfig| -> Result<Box<dyn AudioOutput>, AudioError> {
                Err(AudioError::Backend("no audio device".into()))
            }),
        )
    }

    fn secs(s: f64) -> AudioBuffer {
        AudioBuffer::silence(24_000, s)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn resume_opens_once_and_wakes_suspended_context() {
        let out = ManualOutput::suspended();
        let mut svc = AudioService::new(AudioConfig::default(), out.factory());
        assert!(!svc.is_ready());
        svc.resume().unwrap();
        svc.resume().unwrap();
        assert!(svc.is_ready());
        assert_eq!(out.opened(), 1);
        assert_eq!(out.context_state(), ContextState::Running);
    }

    #[test]
    fn missing_output_makes_playback_a_no_op() {
        let mut svc = broken();
        assert!(svc.resume().is_err());
        assert!(matches!(svc.decode_audio_data(&[0, 0]), Err(AudioError::Uninitialized)));
        let done = svc.play_buffer(&secs(1.0), PlayMode::Queued);
        assert!(done.is_finished());
        svc.play_celebration_sound();
        svc.stop_all();
        assert_eq!(svc.active_count(), 0);
    }

    #[test]
    fn queued_sounds_play_back_to_back() {
        let (mut svc, out) = service();
        svc.play_buffer(&secs(0.5), PlayMode::Queued);
        svc.play_buffer(&secs(0.25), PlayMode::Queued);
        let started = out.started();
        assert!(approx(started[0].start, 0.0));
        assert!(started[1].start >= started[0].start + 0.5 - 1e-9);
        assert!(approx(svc.next_start_time(), 0.75));
    }

    #[test]
    fn queue_restarts_at_now_after_going_idle() {
        let (mut svc, out) = service();
        svc.play_buffer(&secs(0.5), PlayMode::Queued);
        out.advance(2.0);
        svc.play_buffer(&secs(0.5), PlayMode::Queued);
        assert!(approx(out.started()[1].start, 2.0));
    }

    #[test]
    fn immediate_sounds_ignore_the_queue() {
        let (mut svc, out) = service();
        svc.play_buffer(&secs(3.0), PlayMode::Queued);
        svc.play_buffer(&secs(1.0), PlayMode::Immediate);
        assert!(approx(out.started()[1].start, 0.0));
        assert!(approx(svc.next_start_time(), 3.0));
    }

    #[test]
    fn pump_finishes_sounds_that_ran_out() {
        let (mut svc, out) = service();
        let first = svc.play_buffer(&secs(0.5), PlayMode::Queued);
        let second = svc.play_buffer(&secs(0.5), PlayMode::Queued);
        out.advance(0.6);
        svc.pump();
        assert!(first.is_finished());
        assert_eq!(second.state(), PlaybackState::Pending);
        assert_eq!(svc.active_count(), 1);
    }

    #[test]
    fn stop_all_cancels_and_rewinds_cursor() {
        let (mut svc, out) = service();
        let a = svc.play_buffer(&secs(1.0), PlayMode::Queued);
        let b = svc.play_buffer(&secs(1.0), PlayMode::Queued);
        out.advance(0.3);
        svc.stop_all();

        assert!(a.is_cancelled() && b.is_cancelled());
        assert_eq!(svc.active_count(), 0);
        assert!(out.started().iter().all(|s| s.stopped));

        svc.play_buffer(&secs(1.0), PlayMode::Queued);
        assert!(approx(out.started()[2].start, 0.3));
    }

    #[test]
    fn stop_all_swallows_errors_from_dead_sources() {
        let (mut svc, out) = service();
        let done = svc.play_buffer(&secs(1.0), PlayMode::Immediate);
        let id = out.started()[0].id;
        AudioOutput::stop(&mut out.clone(), id).unwrap();

        svc.stop_all();
        assert!(done.is_cancelled());
        assert_eq!(svc.active_count(), 0);
    }

    #[test]
    fn finished_but_unpumped_sound_is_not_cancelled() {
        let (mut svc, out) = service();
        let done = svc.play_buffer(&secs(0.1), PlayMode::Immediate);
        out.advance(0.5);
        svc.stop_all();
        assert!(done.is_finished());
    }

    #[test]
    fn play_pcm_decodes_and_queues() {
        let (mut svc, out) = service();
        let encoded = general_purpose::STANDARD.encode(vec![0u8; 4800]);
        svc.play_buffer(&secs(1.0), PlayMode::Queued);
        svc.play_pcm(&encoded).unwrap();
        let started = out.started();
        assert!(approx(started[1].start, 1.0));
        assert!(approx(started[1].duration, 0.1));
    }

    #[test]
    fn play_pcm_propagates_malformed_input() {
        let (mut svc, _out) = service();
        assert!(matches!(svc.play_pcm("%%%"), Err(AudioError::Base64(_))));
        assert!(matches!(svc.play_pcm("AA=="), Err(AudioError::OddLength(1))));
    }

    #[test]
    fn celebration_is_a_chirp() {
        let (mut svc, out) = service();
        svc.play_celebration_sound();
        assert_eq!(out.chirp_count(), 1);
        assert_eq!(svc.active_count(), 0);
    }
}
