// src/config/mod.rs
pub mod ai;
pub mod settings;

pub use ai::SummarizerConfig;
pub use settings::{ConfigStatus, Settings, SourcesConfig};
