pub mod analysis;
pub mod case;
pub mod chat;
pub mod llm;
pub mod queue;
pub mod settings;
pub mod storage;

pub use analysis::AnalysisService;
pub use case::{CaseAnalyzer, CaseService};
pub use chat::ChatService;
pub use queue::AnalysisQueue;
pub use settings::{SettingsKeySource, SettingsService};
pub use storage::FileStore;
