mod analysis;
pub mod categories;
pub mod matcher;

pub use analysis::{analyze, AnalysisResult, Scorer, Verdict};
pub use categories::{Category, CategoryTable, LoadError, Phrase};
pub use matcher::{normalize, MatchPolicy, NormalizedMessage};
