//! Global free-text search: classify one query, fan it out as typed column
//! filters.
pub mod classifier;
pub mod dispatcher;

pub use classifier::{QueryKind, TypeClassifier};
pub use dispatcher::{GlobalSearchDispatcher, SearchTargets};
