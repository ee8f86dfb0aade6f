use base64::{engine::general_purpose, Engine as _};

use super::error::AudioError;

/// Decoded, playable audio: one `Vec<f32>` per channel, samples in [-1, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self { sample_rate, channels }
    }

    /// A silent mono buffer lasting `seconds`.
    pub fn silence(sample_rate: u32, seconds: f64) -> Self {
        let frames = (seconds * sample_rate as f64).round().max(0.0) as usize;
        Self::new(sample_rate, vec![vec![0.0; frames]])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Frames per channel.
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

/// Standard-alphabet base64 to raw bytes.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, AudioError> {
    Ok(general_purpose::STANDARD.decode(encoded.trim())?)
}

/// Interpret `bytes` as interleaved little-endian i16 PCM and split it into
/// normalized channels (`sample / 32768`). A trailing partial frame is dropped.
pub fn decode_pcm16(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer, AudioError> {
    if channels == 0 {
        return Err(AudioError::NoChannels);
    }
    if bytes.len() % 2 != 0 {
        return Err(AudioError::OddLength(bytes.len()));
    }

    let channel_count = channels as usize;
    let frames = bytes.len() / 2 / channel_count;
    let mut out = vec![Vec::with_capacity(frames); channel_count];

    for (i, chunk) in bytes.chunks_exact(2).take(frames * channel_count).enumerate() {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        out[i % channel_count].push(sample as f32 / 32768.0);
    }

    Ok(AudioBuffer::new(sample_rate, out))
}
