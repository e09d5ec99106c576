//! WebGPU rendering
//!
//! The whole scene is a single fullscreen pass over signed distance fields.

mod ripple;
mod sdf_pipeline;

pub use ripple::TapRipple;
pub use sdf_pipeline::SceneRenderer;
