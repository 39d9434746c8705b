//! Neonrace library - procedural racetracks and reactive race audio

pub mod audio;
pub mod cli;
pub mod params;
pub mod session;
pub mod track;
