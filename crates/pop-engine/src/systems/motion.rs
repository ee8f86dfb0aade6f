use glam::Vec2;

use crate::components::entity::Entity;

/// Advance one circle by `vel * dt` inside `[0, bounds]`.
///
/// On an axis where the circle pokes past an edge, that velocity component is
/// negated and the centre is clamped so the circle touches the edge. The other
/// axis is left alone. Returns the new (position, velocity).
pub fn bounce_step(pos: Vec2, vel: Vec2, radius: f32, bounds: Vec2, dt: f32) -> (Vec2, Vec2) {
    let mut next = pos + vel * dt;
    let mut vel = vel;

    if next.x - radius < 0.0 || next.x + radius > bounds.x {
        vel.x = -vel.x;
        next.x = if next.x - radius < 0.0 { radius } else { bounds.x - radius };
    }
    if next.y - radius < 0.0 || next.y + radius > bounds.y {
        vel.y = -vel.y;
        next.y = if next.y - radius < 0.0 { radius } else { bounds.y - radius };
    }

    (next, vel)
}

/// Move every active entity with a mesh, bouncing off the viewport walls.
/// Entities do not collide with each other.
pub fn integrate_bounded<'a>(
    entities: impl Iterator<Item = &'a mut Entity>,
    bounds: Vec2,
    dt: f32,
) {
    for entity in entities {
        if !entity.active {
            continue;
        }
        let Some(radius) = entity.radius() else {
            continue;
        };
        let (pos, vel) = bounce_step(entity.pos, entity.vel, radius, bounds, dt);
        entity.pos = pos;
        entity.vel = vel;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntityId;
    use crate::components::mesh::{MeshComponent, SDFColor};
    use crate::core::rng::Rng;

    const BOUNDS: Vec2 = Vec2::new(400.0, 300.0);
    const EPS: f32 = 1e-3;

    #[test]
    fn free_flight_moves_by_velocity() {
        let (pos, vel) = bounce_step(Vec2::new(100.0, 100.0), Vec2::new(60.0, -30.0), 10.0, BOUNDS, 0.5);
        assert_eq!(pos, Vec2::new(130.0, 85.0));
        assert_eq!(vel, Vec2::new(60.0, -30.0));
    }

    #[test]
    fn right_wall_flips_only_x() {
        let (pos, vel) = bounce_step(Vec2::new(388.0, 150.0), Vec2::new(5.0, 2.0), 10.0, BOUNDS, 1.0);
        assert_eq!(vel, Vec2::new(-5.0, 2.0));
        assert_eq!(pos.x, 390.0);
        assert_eq!(pos.y, 152.0);
    }

    #[test]
    fn top_wall_flips_only_y() {
        let (pos, vel) = bounce_step(Vec2::new(200.0, 12.0), Vec2::new(3.0, -4.0), 10.0, BOUNDS, 1.0);
        assert_eq!(vel, Vec2::new(3.0, 4.0));
        assert_eq!(pos, Vec2::new(203.0, 10.0));
    }

    #[test]
    fn corner_flips_both() {
        let (pos, vel) = bounce_step(Vec2::new(11.0, 289.0), Vec2::new(-4.0, 4.0), 10.0, BOUNDS, 1.0);
        assert_eq!(vel, Vec2::new(4.0, -4.0));
        assert_eq!(pos, Vec2::new(10.0, 290.0));
    }

    #[test]
    fn positions_stay_in_bounds_over_many_steps() {
        let mut rng = Rng::new(99);
        let mut entities: Vec<Entity> = (0..20)
            .map(|i| {
                let radius = 5.0 + rng.next_f32() * 40.0;
                let pos = Vec2::new(
                    radius + rng.next_f32() * (BOUNDS.x - 2.0 * radius),
                    radius + rng.next_f32() * (BOUNDS.y - 2.0 * radius),
                );
                let vel = Vec2::new(rng.next_f32() - 0.5, rng.next_f32() - 0.5) * 600.0;
                Entity::new(EntityId(i))
                    .with_pos(pos)
                    .with_vel(vel)
                    .with_mesh(MeshComponent::sphere(radius, SDFColor::default()))
            })
            .collect();

        for _ in 0..2000 {
            integrate_bounded(entities.iter_mut(), BOUNDS, 1.0 / 60.0);
            for e in &entities {
                let r = e.radius().unwrap();
                assert!(e.pos.x >= r - EPS && e.pos.x <= BOUNDS.x - r + EPS, "x escaped: {:?}", e.pos);
                assert!(e.pos.y >= r - EPS && e.pos.y <= BOUNDS.y - r + EPS, "y escaped: {:?}", e.pos);
            }
        }
    }

    #[test]
    fn inactive_entities_do_not_move() {
        let mut e = Entity::new(EntityId(1))
            .with_pos(Vec2::new(50.0, 50.0))
            .with_vel(Vec2::new(100.0, 0.0))
            .with_mesh(MeshComponent::sphere(5.0, SDFColor::default()));
        e.active = false;
        let mut entities = vec![e];
        integrate_bounded(entities.iter_mut(), BOUNDS, 1.0);
        assert_eq!(entities[0].pos, Vec2::new(50.0, 50.0));
    }
}
