/// Errors raised by the audio layer.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("audio context not initialized")]
    Uninitialized,

    #[error("invalid base64 audio payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("16-bit PCM payload has odd byte length {0}")]
    OddLength(usize),

    #[error("PCM channel count must be at least 1")]
    NoChannels,

    #[error("audio source already finished")]
    SourceFinished,

    #[error("audio backend error: {0}")]
    Backend(String),
}
