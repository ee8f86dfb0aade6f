use std::cell::RefCell;
use std::rc::Rc;

use super::error::AudioError;
use super::output::{AudioOutput, Chirp, ContextState, OutputFactory, SourceId};
use super::pcm::AudioBuffer;
use super::service::AudioConfig;

/// A source started on a [`ManualOutput`].
#[derive(Debug, Clone, PartialEq)]
pub struct StartedSource {
    pub id: SourceId,
    /// Output time at which playback begins.
    pub start: f64,
    pub duration: f64,
    pub stopped: bool,
}

#[derive(Debug)]
struct ManualState {
    now: f64,
    state: ContextState,
    next_id: u32,
    started: Vec<StartedSource>,
    chirps: Vec<(f64, Chirp)>,
    opened: u32,
}

/// Headless output whose clock only moves when told to.
///
/// Clones share the same state, so a caller can keep one handle for
/// inspection while the service owns another.
#[derive(Debug, Clone)]
pub struct ManualOutput {
    shared: Rc<RefCell<ManualState>>,
}

impl ManualOutput {
    /// A running output at time zero.
    pub fn new() -> Self {
        Self {
            shared: Rc::new(RefCell::new(ManualState {
                now: 0.0,
                state: ContextState::Running,
                next_id: 1,
                started: Vec::new(),
                chirps: Vec::new(),
                opened: 0,
            })),
        }
    }

    /// Start in the suspended state, like a browser context before a gesture.
    pub fn suspended() -> Self {
        let out = Self::new();
        out.shared.borrow_mut().state = ContextState::Suspended;
        out
    }

    /// Factory handing out clones of this output; counts how often it was called.
    pub fn factory(&self) -> OutputFactory {
        let out = self.clone();
        Box::new(move |_config: &AudioConfig| -> Result<Box<dyn AudioOutput>, AudioError> {
            out.shared.borrow_mut().opened += 1;
            Ok(Box::new(out.clone()))
        })
    }

    /// Move the clock forward. A suspended context does not advance.
    pub fn advance(&self, seconds: f64) {
        let mut s = self.shared.borrow_mut();
        if s.state == ContextState::Running {
            s.now += seconds;
        }
    }

    pub fn now(&self) -> f64 {
        self.shared.borrow().now
    }

    pub fn context_state(&self) -> ContextState {
        self.shared.borrow().state
    }

    pub fn started(&self) -> Vec<StartedSource> {
        self.shared.borrow().started.clone()
    }

    pub fn chirp_count(&self) -> usize {
        self.shared.borrow().chirps.len()
    }

    /// How many times the factory created this output.
    pub fn opened(&self) -> u32 {
        self.shared.borrow().opened
    }
}

impl Default for ManualOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput for ManualOutput {
    fn state(&self) -> ContextState {
        self.shared.borrow().state
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        match s.state {
            ContextState::Closed => Err(AudioError::Backend("context closed".into())),
            _ => {
                s.state = ContextState::Running;
                Ok(())
            }
        }
    }

    fn current_time(&self) -> f64 {
        self.shared.borrow().now
    }

    fn start(&mut self, buffer: &AudioBuffer, when: Option<f64>) -> Result<SourceId, AudioError> {
        let mut s = self.shared.borrow_mut();
        let id = SourceId(s.next_id);
        s.next_id += 1;
        let start = when.map_or(s.now, |t| t.max(s.now));
        s.started.push(StartedSource {
            id,
            start,
            duration: buffer.duration(),
            stopped: false,
        });
        Ok(id)
    }

    fn stop(&mut self, source: SourceId) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        let now = s.now;
        let entry = s
            .started
            .iter_mut()
            .find(|e| e.id == source)
            .ok_or_else(|| AudioError::Backend(format!("unknown source {:?}", source)))?;
        if entry.stopped || entry.start + entry.duration <= now {
            return Err(AudioError::SourceFinished);
        }
        entry.stopped = true;
        Ok(())
    }

    fn chirp(&mut self, chirp: &Chirp) -> Result<(), AudioError> {
        let mut s = self.shared.borrow_mut();
        let now = s.now;
        s.chirps.push((now, *chirp));
        Ok(())
    }
}
