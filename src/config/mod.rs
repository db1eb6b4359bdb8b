pub mod settings;

pub use settings::{
    AggregationSettings, AppConfig, ClassificationSettings, ClusteringSettings,
    CorrelationSettings, MatchupSettings, MatchupUnit, PeriodGranularity, StatisticsSettings,
    TierThreshold, TrendSettings,
};
