pub mod journal;
pub mod short_term;
pub mod state_store;

pub use journal::{ActivityLog, ActivityLogEntry, AnalyzerLog, AnalyzerLogEntry, Journal};
pub use short_term::{MemoryEntry, MemoryStore};
pub use state_store::StateStore;
