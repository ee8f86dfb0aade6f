/// RGB color for SDF rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SDFColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl SDFColor {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl Default for SDFColor {
    fn default() -> Self {
        Self { r: 0.6, g: 0.6, b: 0.8 }
    }
}

/// SDF shape primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SDFShape {
    Sphere { radius: f32 },
}

/// Component for SDF-rendered circles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshComponent {
    pub shape: SDFShape,
    pub color: SDFColor,
    /// Opacity in [0, 1].
    pub alpha: f32,
}

impl MeshComponent {
    pub fn new(shape: SDFShape, color: SDFColor) -> Self {
        Self {
            shape,
            color,
            alpha: 1.0,
        }
    }

    /// A sphere of the given radius. Non-positive radii are bumped to a hair above zero.
    pub fn sphere(radius: f32, color: SDFColor) -> Self {
        Self::new(SDFShape::Sphere { radius: radius.max(f32::EPSILON) }, color)
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn radius(&self) -> f32 {
        match self.shape {
            SDFShape::Sphere { radius } => radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sphere_radius_is_positive() {
        let mesh = MeshComponent::sphere(-3.0, SDFColor::default());
        assert!(mesh.radius() > 0.0);
        assert_eq!(MeshComponent::sphere(12.0, SDFColor::default()).radius(), 12.0);
    }

    #[test]
    fn alpha_is_clamped() {
        let mesh = MeshComponent::sphere(1.0, SDFColor::default()).with_alpha(3.0);
        assert_eq!(mesh.alpha, 1.0);
    }
}
