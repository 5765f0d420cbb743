//! Data models.

pub mod position;
pub mod preset;

pub use position::Position;
pub use preset::PresetTable;
