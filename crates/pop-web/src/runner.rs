use pop_engine::bridge::protocol::{
    HEADER_EVENT_COUNT, HEADER_FLOATS, HEADER_FRAME_COUNTER, HEADER_MAX_EVENTS,
    HEADER_MAX_SDF_INSTANCES, HEADER_PROTOCOL_VERSION, HEADER_SDF_INSTANCE_COUNT,
    HEADER_WORLD_HEIGHT, HEADER_WORLD_WIDTH, PROTOCOL_VERSION,
};
use pop_engine::audio::OutputFactory;
use pop_engine::{
    build_sdf_buffer, AudioService, EngineContext, FixedTimestep, Game, GameConfig, InputEvent,
    InputQueue, ProtocolLayout, Rng, SDFBuffer, SpeechReply,
};

/// Generic game runner that wires up the engine loop.
///
/// Each concrete game creates a `thread_local!` GameRunner and exports free
/// functions via `#[wasm_bindgen]`, because wasm-bindgen cannot export
/// generic structs directly.
pub struct GameRunner<G: Game> {
    game: G,
    ctx: EngineContext,
    input: InputQueue,
    sdf_buffer: SDFBuffer,
    timestep: FixedTimestep,
    config: GameConfig,
    layout: ProtocolLayout,
    initialized: bool,
    frame: u32,
    header: [f32; HEADER_FLOATS],
}

impl<G: Game> GameRunner<G> {
    /// `audio` creates the output context the first time sound is needed.
    pub fn new(game: G, audio: OutputFactory) -> Self {
        let config = game.config();
        let timestep = FixedTimestep::new(config.fixed_dt);
        let layout = ProtocolLayout::from_config(&config);
        let ctx = EngineContext::new(&config, AudioService::new(config.audio, audio));

        Self {
            game,
            ctx,
            input: InputQueue::new(),
            sdf_buffer: SDFBuffer::with_capacity(config.max_sdf_instances),
            timestep,
            layout,
            config,
            initialized: false,
            frame: 0,
            header: [0.0; HEADER_FLOATS],
        }
    }

    /// Initialize the game. Call once after construction.
    pub fn init(&mut self) {
        self.game.init(&mut self.ctx);
        self.initialized = true;
        self.write_header();
    }

    /// Push an input event into the queue.
    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Hand a narration result from the host to the game.
    pub fn push_speech_reply(&mut self, reply: SpeechReply) {
        self.ctx.speech.deliver(reply);
    }

    /// Run one frame tick: fixed updates, audio bookkeeping, render buffer.
    pub fn tick(&mut self, dt: f32) {
        if !self.initialized {
            return;
        }

        self.ctx.clear_frame_data();

        let steps = self.timestep.accumulate(dt);
        for _ in 0..steps {
            self.game.update(&mut self.ctx, &self.input);
            self.ctx.audio.pump();
            // Input is only consumed by an update; keep it for the next frame otherwise.
            self.input.drain();
        }

        if self.ctx.events.len() > self.layout.max_events {
            log::warn!(
                "dropping {} game events over capacity",
                self.ctx.events.len() - self.layout.max_events
            );
            self.ctx.events.truncate(self.layout.max_events);
        }

        build_sdf_buffer(self.ctx.scene.iter(), &mut self.sdf_buffer);
        self.sdf_buffer.truncate(self.layout.max_sdf_instances);

        self.frame = self.frame.wrapping_add(1);
        self.write_header();
    }

    /// Run `f` against the game and its context outside the tick, for host commands.
    pub fn with_game<R>(&mut self, f: impl FnOnce(&mut G, &mut EngineContext) -> R) -> R {
        f(&mut self.game, &mut self.ctx)
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Replace the engine RNG.
    pub fn reseed(&mut self, seed: u64) {
        self.ctx.rng = Rng::new(seed);
    }

    /// Unlock audio from a user gesture.
    pub fn resume_audio(&mut self) {
        if let Err(err) = self.ctx.audio.resume() {
            log::warn!("could not resume audio: {}", err);
        }
    }

    /// Pending speech requests as a JSON array; drains them.
    pub fn speech_requests_json(&mut self) -> String {
        self.ctx.speech.requests_json()
    }

    fn write_header(&mut self) {
        let h = &mut self.header;
        h[HEADER_FRAME_COUNTER] = self.frame as f32;
        h[HEADER_PROTOCOL_VERSION] = PROTOCOL_VERSION;
        h[HEADER_WORLD_WIDTH] = self.ctx.bounds.x;
        h[HEADER_WORLD_HEIGHT] = self.ctx.bounds.y;
        h[HEADER_MAX_SDF_INSTANCES] = self.layout.max_sdf_instances as f32;
        h[HEADER_SDF_INSTANCE_COUNT] = self.sdf_buffer.instance_count() as f32;
        h[HEADER_MAX_EVENTS] = self.layout.max_events as f32;
        h[HEADER_EVENT_COUNT] = self.ctx.events.len() as f32;
    }

    pub fn header(&self) -> &[f32] {
        &self.header
    }

    // ---- Pointer accessors for buffer reads ----

    pub fn header_ptr(&self) -> *const f32 {
        self.header.as_ptr()
    }

    pub fn sdf_instances_ptr(&self) -> *const f32 {
        self.sdf_buffer.instances_ptr()
    }

    pub fn sdf_instance_count(&self) -> u32 {
        self.sdf_buffer.instance_count() as u32
    }

    pub fn game_events_ptr(&self) -> *const f32 {
        self.ctx.events.as_ptr() as *const f32
    }

    pub fn game_events_len(&self) -> u32 {
        self.ctx.events.len() as u32
    }

    pub fn world_width(&self) -> f32 {
        self.ctx.bounds.x
    }

    pub fn world_height(&self) -> f32 {
        self.ctx.bounds.y
    }

    // ---- Capacity accessors ----

    pub fn max_sdf_instances(&self) -> u32 {
        self.layout.max_sdf_instances as u32
    }

    pub fn max_events(&self) -> u32 {
        self.layout.max_events as u32
    }

    pub fn buffer_total_floats(&self) -> u32 {
        self.layout.buffer_total_floats as u32
    }

    pub fn fixed_dt(&self) -> f32 {
        self.config.fixed_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use pop_engine::{Entity, EntityId, GameEvent, ManualOutput, MeshComponent, SDFColor};

    /// Counts updates and taps; spawns one ball on init.
    #[derive(Default)]
    struct Probe {
        updates: u32,
        taps: u32,
        replies: u32,
    }

    impl Game for Probe {
        fn init(&mut self, ctx: &mut EngineContext) {
            let id = ctx.next_id();
            ctx.scene.spawn(
                Entity::new(id)
                    .with_pos(Vec2::new(100.0, 100.0))
                    .with_mesh(MeshComponent::sphere(10.0, SDFColor::new(1.0, 0.0, 0.0))),
            );
        }

        fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue) {
            self.updates += 1;
            for event in input.iter() {
                if let InputEvent::Tap { .. } = event {
                    self.taps += 1;
                    ctx.emit_event(GameEvent::new(1.0));
                }
            }
            self.replies += ctx.speech.drain_replies().len() as u32;
        }
    }

    fn runner() -> GameRunner<Probe> {
        let mut r = GameRunner::new(Probe::default(), ManualOutput::new().factory());
        r.init();
        r
    }

    #[test]
    fn tick_before_init_does_nothing() {
        let mut r = GameRunner::new(Probe::default(), ManualOutput::new().factory());
        r.tick(1.0 / 60.0);
        assert_eq!(r.game().updates, 0);
    }

    #[test]
    fn input_survives_frames_without_a_step() {
        let mut r = runner();
        r.push_input(InputEvent::Tap { id: EntityId(1) });
        r.tick(0.001);
        assert_eq!(r.game().taps, 0);
        r.tick(1.0 / 60.0);
        assert_eq!(r.game().taps, 1);
        assert_eq!(r.game_events_len(), 1);
    }

    #[test]
    fn input_is_seen_once_per_frame() {
        let mut r = runner();
        r.push_input(InputEvent::Tap { id: EntityId(1) });
        r.tick(3.0 / 60.0 + 0.001);
        assert_eq!(r.game().updates, 3);
        assert_eq!(r.game().taps, 1);
    }

    #[test]
    fn header_reflects_frame() {
        let mut r = runner();
        r.tick(1.0 / 60.0);
        let h = r.header();
        assert_eq!(h[HEADER_FRAME_COUNTER], 1.0);
        assert_eq!(h[HEADER_PROTOCOL_VERSION], PROTOCOL_VERSION);
        assert_eq!(h[HEADER_SDF_INSTANCE_COUNT], 1.0);
        assert_eq!(h[HEADER_WORLD_WIDTH], 800.0);
        assert_eq!(r.sdf_instance_count(), 1);
    }

    #[test]
    fn speech_replies_reach_the_game() {
        let mut r = runner();
        let id = r.with_game(|_, ctx| ctx.speech.request("hello"));
        assert!(r.speech_requests_json().contains("hello"));
        r.push_speech_reply(SpeechReply::Failed { id });
        r.tick(1.0 / 60.0);
        assert_eq!(r.game().replies, 1);
    }
}
