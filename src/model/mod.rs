pub mod admin;
pub mod analysis;
pub mod case;
pub mod chat;
pub mod config;

pub use admin::*;
pub use analysis::*;
pub use case::*;
pub use chat::*;
pub use config::{AnalysisConfig, Config, StorageConfig};
