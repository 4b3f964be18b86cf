//! Scene inputs consumed by the clustering pass

mod camera;
mod light;

pub use camera::*;
pub use light::*;
