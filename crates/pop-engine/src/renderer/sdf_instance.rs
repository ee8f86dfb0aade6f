use bytemuck::{Pod, Zeroable};

/// Per-bubble render data read by the host's canvas renderer.
/// 8 floats = 32 bytes per instance.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct SDFInstance {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub alpha: f32,
    pub _pad: f32,
}

impl SDFInstance {
    pub const FLOATS: usize = 8;
    pub const STRIDE_BYTES: usize = Self::FLOATS * 4;
}

/// Buffer of SDF instances, bottom-most first.
pub struct SDFBuffer {
    instances: Vec<SDFInstance>,
}

impl SDFBuffer {
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    pub fn with_capacity(max: usize) -> Self {
        Self {
            instances: Vec::with_capacity(max),
        }
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn push(&mut self, instance: SDFInstance) {
        self.instances.push(instance);
    }

    /// Keep at most `len` instances.
    pub fn truncate(&mut self, len: usize) {
        self.instances.truncate(len);
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn instances(&self) -> &[SDFInstance] {
        &self.instances
    }

    pub fn instances_ptr(&self) -> *const f32 {
        self.instances.as_ptr() as *const f32
    }
}

impl Default for SDFBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdf_instance_is_32_bytes() {
        assert_eq!(std::mem::size_of::<SDFInstance>(), SDFInstance::STRIDE_BYTES);
    }

    #[test]
    fn cast_to_floats() {
        let mut buf = SDFBuffer::new();
        buf.push(SDFInstance { x: 1.0, radius: 3.0, ..Default::default() });
        let floats: &[f32] = bytemuck::cast_slice(buf.instances());
        assert_eq!(floats.len(), SDFInstance::FLOATS);
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[2], 3.0);
    }
}
