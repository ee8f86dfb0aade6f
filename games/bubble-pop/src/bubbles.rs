//! Bubble records, the colour palette, and level spawning.

use glam::Vec2;
use pop_engine::api::types::EntityId;
use pop_engine::components::entity::Entity;
use pop_engine::components::mesh::{MeshComponent, SDFColor};
use pop_engine::EngineContext;
use serde::Serialize;

use crate::level::{sizing, LevelSpec};

/// Targets draw above distractors and win overlapping taps.
const Z_TARGET: i16 = 1;
const Z_DISTRACTOR: i16 = 0;

/// Named bubble colour.
#[derive(Debug, Clone, Copy)]
pub struct BubbleColor {
    pub name: &'static str,
    pub color: SDFColor,
}

pub const PALETTE: [BubbleColor; 8] = [
    BubbleColor { name: "red", color: SDFColor::new(0.94, 0.27, 0.27) },
    BubbleColor { name: "blue", color: SDFColor::new(0.23, 0.51, 0.96) },
    BubbleColor { name: "green", color: SDFColor::new(0.13, 0.77, 0.37) },
    BubbleColor { name: "yellow", color: SDFColor::new(0.98, 0.80, 0.08) },
    BubbleColor { name: "purple", color: SDFColor::new(0.66, 0.33, 0.97) },
    BubbleColor { name: "pink", color: SDFColor::new(0.93, 0.28, 0.60) },
    BubbleColor { name: "orange", color: SDFColor::new(0.98, 0.45, 0.09) },
    BubbleColor { name: "teal", color: SDFColor::new(0.08, 0.72, 0.65) },
];

/// Game-side state of one bubble. Position and velocity live on the entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub id: EntityId,
    pub symbol: String,
    pub color: &'static str,
    pub is_target: bool,
    pub is_popping: bool,
}

/// What the host needs to draw a bubble's label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleSnapshot<'a> {
    pub id: EntityId,
    pub symbol: &'a str,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color: &'a str,
    pub popping: bool,
}

fn spawn_bubble(
    ctx: &mut EngineContext,
    symbol: &str,
    diameter: f32,
    speed: f32,
    is_target: bool,
) -> Bubble {
    let id = ctx.next_id();
    let bounds = ctx.bounds;
    let pos = Vec2::new(
        ctx.rng.next_f32() * (bounds.x - diameter) + diameter / 2.0,
        ctx.rng.next_f32() * (bounds.y - diameter) + diameter / 2.0,
    );
    let vel = Vec2::new(
        (ctx.rng.next_f32() - 0.5) * speed,
        (ctx.rng.next_f32() - 0.5) * speed,
    );
    let palette = ctx.rng.pick(&PALETTE).copied().unwrap_or(PALETTE[0]);

    let z = if is_target { Z_TARGET } else { Z_DISTRACTOR };
    ctx.scene.spawn(
        Entity::new(id)
            .with_pos(pos)
            .with_vel(vel)
            .with_z(z)
            .with_mesh(MeshComponent::sphere(diameter / 2.0, palette.color)),
    );

    Bubble {
        id,
        symbol: symbol.to_string(),
        color: palette.name,
        is_target,
        is_popping: false,
    }
}

/// Spawn all bubbles for a level: targets first, then distractors.
pub fn spawn_level(ctx: &mut EngineContext, spec: &LevelSpec) -> Vec<Bubble> {
    let size = sizing(ctx.bounds, spec.difficulty);
    let speed = spec.speed();
    let mut bubbles = Vec::new();

    for _ in 0..spec.target_count {
        bubbles.push(spawn_bubble(ctx, &spec.target, size.target, speed, true));
    }

    let pool = spec.category.distractor_pool(&spec.target);
    for _ in 0..spec.distractor_count() {
        let Some(symbol) = ctx.rng.pick(&pool).copied() else {
            log::warn!("no distractor symbols available besides {:?}", spec.target);
            break;
        };
        bubbles.push(spawn_bubble(ctx, symbol, size.distractor, speed, false));
    }

    bubbles
}
