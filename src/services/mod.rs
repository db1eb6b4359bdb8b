pub mod analysis;

pub use analysis::{AnalysisOutcome, AnalysisRequest, AnalysisService, ClassificationRun};
