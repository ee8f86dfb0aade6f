pub mod motion;
pub mod picking;
pub mod sdf_render;
