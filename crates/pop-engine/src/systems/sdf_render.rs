use crate::components::entity::Entity;
use crate::renderer::sdf_instance::{SDFBuffer, SDFInstance};

/// Build the SDF instance buffer from active entities with meshes,
/// ordered by `z` (stable, so spawn order breaks ties).
pub fn build_sdf_buffer<'a>(
    entities: impl Iterator<Item = &'a Entity>,
    buffer: &mut SDFBuffer,
) {
    buffer.clear();
    let mut visible: Vec<&Entity> = entities
        .filter(|e| e.active && e.mesh.is_some())
        .collect();
    visible.sort_by_key(|e| e.z);

    for entity in visible {
        let Some(mesh) = &entity.mesh else { continue };
        buffer.push(SDFInstance {
            x: entity.pos.x,
            y: entity.pos.y,
            radius: mesh.radius(),
            r: mesh.color.r,
            g: mesh.color.g,
            b: mesh.color.b,
            alpha: mesh.alpha,
            _pad: 0.0,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::EntityId;
    use crate::components::mesh::{MeshComponent, SDFColor};
    use glam::Vec2;

    #[test]
    fn build_sdf_buffer_from_entity_with_mesh() {
        let entity = Entity::new(EntityId(1))
            .with_pos(Vec2::new(50.0, 75.0))
            .with_mesh(MeshComponent::sphere(15.0, SDFColor::new(1.0, 0.0, 0.0)).with_alpha(0.5));

        let entities = vec![entity];
        let mut buffer = SDFBuffer::new();
        build_sdf_buffer(entities.iter(), &mut buffer);

        let inst = buffer.instances()[0];
        assert_eq!(buffer.instance_count(), 1);
        assert_eq!((inst.x, inst.y, inst.radius), (50.0, 75.0, 15.0));
        assert_eq!(inst.r, 1.0);
        assert_eq!(inst.alpha, 0.5);
    }

    #[test]
    fn skips_inactive_and_meshless_and_sorts_by_z() {
        let bare = Entity::new(EntityId(1));
        let mut hidden = Entity::new(EntityId(2)).with_mesh(MeshComponent::sphere(1.0, SDFColor::default()));
        hidden.active = false;
        let top = Entity::new(EntityId(3))
            .with_z(5)
            .with_mesh(MeshComponent::sphere(3.0, SDFColor::default()));
        let bottom = Entity::new(EntityId(4))
            .with_z(1)
            .with_mesh(MeshComponent::sphere(4.0, SDFColor::default()));

        let entities = vec![bare, hidden, top, bottom];
        let mut buffer = SDFBuffer::new();
        build_sdf_buffer(entities.iter(), &mut buffer);

        let radii: Vec<f32> = buffer.instances().iter().map(|i| i.radius).collect();
        assert_eq!(radii, vec![4.0, 3.0]);
    }
}
