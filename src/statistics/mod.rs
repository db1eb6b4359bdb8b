pub mod clustering;
pub mod confidence;
pub mod correlation;
pub mod diversity;
mod engine;
pub mod tiers;
pub mod trends;

pub use clustering::{ClusterAssignment, ClusteringOutcome};
pub use confidence::{ConfidenceInterval, wilson_interval};
pub use correlation::{CorrelationMethod, CorrelationReport, MetricCorrelation};
pub use diversity::{DiversityIndex, diversity};
pub use engine::{ArchetypeStatistic, CORRELATION_METRICS, StatisticsEngine, StatisticsReport};
pub use tiers::assign_tier;
pub use trends::{ArchetypeTrend, TrendCategory, TrendReport};
