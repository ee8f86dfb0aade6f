pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod bridge;
pub mod input;
pub mod audio;
pub mod speech;

// Re-export key types at crate root for convenience
pub use api::game::{Game, GameConfig, EngineContext};
pub use api::types::{EntityId, GameEvent};
pub use components::entity::Entity;
pub use components::mesh::{MeshComponent, SDFShape, SDFColor};
pub use core::scene::Scene;
pub use core::time::FixedTimestep;
pub use core::rng::Rng;
pub use input::queue::{InputEvent, InputQueue};
pub use renderer::sdf_instance::{SDFInstance, SDFBuffer};
pub use bridge::protocol::ProtocolLayout;
pub use systems::motion::{bounce_step, integrate_bounded};
pub use systems::picking::pick_at;
pub use systems::sdf_render::build_sdf_buffer;
pub use audio::{
    AudioBuffer, AudioConfig, AudioError, AudioOutput, AudioService,
    Chirp, Completion, ContextState, ManualOutput, PlayMode, PlaybackState, SourceId,
};
pub use speech::{SpeechChannel, SpeechId, SpeechReply, SpeechRequest};
