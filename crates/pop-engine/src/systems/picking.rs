use glam::Vec2;

use crate::api::types::EntityId;
use crate::components::entity::Entity;

/// Find the topmost active entity whose circle contains `point`.
/// Ties on `z` go to the most recently spawned entity, which also draws last.
pub fn pick_at<'a>(entities: impl Iterator<Item = &'a Entity>, point: Vec2) -> Option<EntityId> {
    let mut best: Option<(i16, EntityId)> = None;
    for entity in entities {
        if !entity.active {
            continue;
        }
        let Some(radius) = entity.radius() else {
            continue;
        };
        if entity.pos.distance_squared(point) > radius * radius {
            continue;
        }
        match best {
            Some((z, _)) if z > entity.z => {}
            _ => best = Some((entity.z, entity.id)),
        }
    }
    best.map(|(_, id)| id)
}
