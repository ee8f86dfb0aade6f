use glam::Vec2;
use crate::api::types::EntityId;
use crate::components::mesh::MeshComponent;

/// Fat Entity: one struct with optional components.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    /// Inactive entities are skipped by motion, picking and rendering.
    pub active: bool,
    /// Centre position in world space.
    pub pos: Vec2,
    /// Velocity in world units per second.
    pub vel: Vec2,
    /// Draw order. Higher draws on top and wins pointer picks.
    pub z: i16,
    /// SDF mesh (optional; entities without one are invisible and untouchable).
    pub mesh: Option<MeshComponent>,
}

impl Entity {
    /// Create a new entity with the given ID at the origin, at rest.
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            active: true,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            z: 0,
            mesh: None,
        }
    }

    // -- Builder pattern --

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_vel(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_z(mut self, z: i16) -> Self {
        self.z = z;
        self
    }

    pub fn with_mesh(mut self, mesh: MeshComponent) -> Self {
        self.mesh = Some(mesh);
        self
    }

    /// Collision radius, if the entity has a mesh.
    pub fn radius(&self) -> Option<f32> {
        self.mesh.map(|m| m.radius())
    }
}
