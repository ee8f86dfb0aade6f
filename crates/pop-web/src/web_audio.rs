use std::collections::HashMap;

use pop_engine::audio::{AudioBuffer, AudioConfig, AudioError, AudioOutput, Chirp, ContextState, OutputFactory, SourceId};
use wasm_bindgen::JsValue;
use web_sys::{AudioBufferSourceNode, AudioContext, AudioContextOptions, AudioContextState, OscillatorType};

fn js_err(err: JsValue) -> AudioError {
    AudioError::Backend(err.as_string().unwrap_or_else(|| format!("{:?}", err)))
}

/// Browser output backed by a Web Audio `AudioContext`.
pub struct WebAudioOutput {
    ctx: AudioContext,
    sources: HashMap<SourceId, AudioBufferSourceNode>,
    next_id: u32,
}

impl WebAudioOutput {
    /// Create a context running at the configured sample rate.
    pub fn open(config: &AudioConfig) -> Result<Self, AudioError> {
        let options = AudioContextOptions::new();
        options.set_sample_rate(config.sample_rate as f32);
        let ctx = AudioContext::new_with_context_options(&options).map_err(js_err)?;
        Ok(Self {
            ctx,
            sources: HashMap::new(),
            next_id: 1,
        })
    }

    /// Factory for `AudioService::new`.
    pub fn factory() -> OutputFactory {
        Box::new(|config: &AudioConfig| -> Result<Box<dyn AudioOutput>, AudioError> {
            Ok(Box::new(WebAudioOutput::open(config)?))
        })
    }

    fn to_js_buffer(&self, buffer: &AudioBuffer) -> Result<web_sys::AudioBuffer, AudioError> {
        let channels = buffer.channel_count().max(1) as u32;
        // Web Audio refuses zero-length buffers.
        let frames = buffer.frames().max(1) as u32;
        let js = self
            .ctx
            .create_buffer(channels, frames, buffer.sample_rate() as f32)
            .map_err(js_err)?;
        for index in 0..buffer.channel_count() {
            if let Some(samples) = buffer.channel(index) {
                js.copy_to_channel(samples, index as i32).map_err(js_err)?;
            }
        }
        Ok(js)
    }
}

impl AudioOutput for WebAudioOutput {
    fn state(&self) -> ContextState {
        match self.ctx.state() {
            AudioContextState::Running => ContextState::Running,
            AudioContextState::Closed => ContextState::Closed,
            _ => ContextState::Suspended,
        }
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        // The returned promise settles later; state() reports the outcome.
        self.ctx.resume().map(|_| ()).map_err(js_err)
    }

    fn current_time(&self) -> f64 {
        self.ctx.current_time()
    }

    fn start(&mut self, buffer: &AudioBuffer, when: Option<f64>) -> Result<SourceId, AudioError> {
        let js_buffer = self.to_js_buffer(buffer)?;
        let source = self.ctx.create_buffer_source().map_err(js_err)?;
        source.set_buffer(Some(&js_buffer));
        source
            .connect_with_audio_node(&self.ctx.destination())
            .map_err(js_err)?;
        match when {
            Some(t) => source.start_with_when(t).map_err(js_err)?,
            None => source.start().map_err(js_err)?,
        }

        let id = SourceId(self.next_id);
        self.next_id += 1;
        self.sources.insert(id, source);
        Ok(id)
    }

    fn stop(&mut self, source: SourceId) -> Result<(), AudioError> {
        let node = self.sources.remove(&source).ok_or(AudioError::SourceFinished)?;
        node.stop().map_err(js_err)
    }

    fn release(&mut self, source: SourceId) {
        if let Some(node) = self.sources.remove(&source) {
            if let Err(err) = node.disconnect() {
                log::trace!("ignoring disconnect of {:?}: {:?}", source, err);
            }
        }
    }

    fn chirp(&mut self, chirp: &Chirp) -> Result<(), AudioError> {
        let osc = self.ctx.create_oscillator().map_err(js_err)?;
        let gain = self.ctx.create_gain().map_err(js_err)?;
        osc.set_type(OscillatorType::Sine);
        osc.connect_with_audio_node(&gain).map_err(js_err)?;
        gain.connect_with_audio_node(&self.ctx.destination())
            .map_err(js_err)?;

        let t = self.ctx.current_time();
        let end = t + chirp.duration;
        osc.frequency().set_value_at_time(chirp.start_hz, t).map_err(js_err)?;
        osc.frequency()
            .exponential_ramp_to_value_at_time(chirp.end_hz, end)
            .map_err(js_err)?;
        gain.gain().set_value_at_time(chirp.start_gain, t).map_err(js_err)?;
        gain.gain()
            .exponential_ramp_to_value_at_time(chirp.end_gain, end)
            .map_err(js_err)?;

        osc.start().map_err(js_err)?;
        osc.stop_with_when(end).map_err(js_err)
    }
}
