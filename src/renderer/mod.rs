//! WebGPU rendering module
//!
//! Instanced low-poly meshes over a fullscreen backdrop, viewed through an
//! orbit camera.

pub mod camera;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use camera::OrbitCamera;
pub use pipeline::SceneRenderState;
