pub mod config;
pub mod error;
pub mod grid;
pub mod library;
pub mod plugin;
pub mod sink;
pub mod types;

pub use config::{Dimension, GraphConfig};
pub use grid::SurfaceGrid;
pub use library::FunctionKind;
pub use plugin::SurfaceGraphPlugin;
