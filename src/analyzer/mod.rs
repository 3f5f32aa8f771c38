// Analyzer module: the analysis session, its statistics helpers and the insight layer.

pub mod insights;
pub mod report;
pub mod stats;
pub mod track_analysis;

// Re-export the session types for ease of use.
pub use report::{AnalysisReport, Operation};
pub use track_analysis::TrackAnalyzer;
