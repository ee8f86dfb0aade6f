use glam::Vec2;

use crate::api::types::{EntityId, GameEvent};
use crate::audio::{AudioConfig, AudioService};
use crate::core::rng::Rng;
use crate::core::scene::Scene;
use crate::input::queue::InputQueue;
use crate::speech::SpeechChannel;

/// Configuration for the engine, provided by the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Fixed timestep in seconds (default: 1/60).
    pub fixed_dt: f32,
    /// World width in game units. The host may change it later with a resize.
    pub world_width: f32,
    /// World height in game units.
    pub world_height: f32,
    /// Maximum number of SDF instances (default: 64).
    pub max_sdf_instances: usize,
    /// Maximum number of game events per frame (default: 32).
    pub max_events: usize,
    /// Seed for the engine RNG. Zero is remapped by `Rng::new`.
    pub seed: u64,
    /// Output format expected from the speech collaborator.
    pub audio: AudioConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            world_width: 800.0,
            world_height: 600.0,
            max_sdf_instances: 64,
            max_events: 32,
            seed: 42,
            audio: AudioConfig::default(),
        }
    }
}

/// The core contract every game must fulfill.
pub trait Game {
    /// Return engine configuration. Called once before init.
    fn config(&self) -> GameConfig {
        GameConfig::default()
    }

    /// Setup initial state.
    fn init(&mut self, ctx: &mut EngineContext);

    /// One fixed tick. Consume input and speech replies, move things, check win conditions.
    fn update(&mut self, ctx: &mut EngineContext, input: &InputQueue);
}

/// Mutable access to engine state, passed to Game::init and Game::update.
pub struct EngineContext {
    pub scene: Scene,
    pub audio: AudioService,
    pub speech: SpeechChannel,
    pub events: Vec<GameEvent>,
    pub rng: Rng,
    /// Current viewport size in world units.
    pub bounds: Vec2,
    /// Seconds advanced by one `Game::update` call.
    pub fixed_dt: f32,
    next_id: u32,
}

impl EngineContext {
    /// Build a context around an already-constructed audio service.
    pub fn new(config: &GameConfig, audio: AudioService) -> Self {
        Self {
            scene: Scene::with_capacity(config.max_sdf_instances),
            audio,
            speech: SpeechChannel::new(),
            events: Vec::with_capacity(config.max_events),
            rng: Rng::new(config.seed),
            bounds: Vec2::new(config.world_width, config.world_height),
            fixed_dt: config.fixed_dt,
            next_id: 1,
        }
    }

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Emit a game event to be forwarded to the host.
    pub fn emit_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Clear per-frame transient data.
    pub fn clear_frame_data(&mut self) {
        self.events.clear();
    }

    /// Despawn an entity. Returns false if it was already gone.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        self.scene.despawn(id).is_some()
    }

    /// Change the viewport. Non-positive sizes are ignored.
    pub fn resize(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.bounds = Vec2::new(width, height);
            log::debug!("viewport resized to {}x{}", width, height);
        }
    }
}
