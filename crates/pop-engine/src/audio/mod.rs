//! Sound output: PCM decoding, a pluggable output context, and the
//! [`AudioService`] that sequences playback on top of it.

mod error;
mod manual;
mod output;
mod pcm;
mod service;

pub use error::AudioError;
pub use manual::{ManualOutput, StartedSource};
pub use output::{AudioOutput, Chirp, ContextState, OutputFactory, SourceId};
pub use pcm::{decode_base64, decode_pcm16, AudioBuffer};
pub use service::{AudioConfig, AudioService, Completion, PlayMode, PlaybackState};
