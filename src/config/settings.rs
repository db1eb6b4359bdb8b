use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{MetagameError, MetagameResult};

pub const CONFIG_ENV_VAR: &str = "METAGAME_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationSettings {
    pub unclassified_label: String,
}

impl Default for ClassificationSettings {
    fn default() -> Self {
        Self {
            unclassified_label: "Unclassified".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    pub group_by_colors: bool,
    pub meta_share_epsilon: f64,
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            group_by_colors: false,
            meta_share_epsilon: 1e-9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierThreshold {
    pub min_lower_bound: f64,
    pub label: String,
}

impl TierThreshold {
    pub fn new(min_lower_bound: f64, label: &str) -> Self {
        Self {
            min_lower_bound,
            label: label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsSettings {
    pub confidence_level: f64,
    pub min_sample_size: u32,
    /// Highest threshold first
    pub tiers: Vec<TierThreshold>,
    pub lowest_tier_label: String,
}

impl Default for StatisticsSettings {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            min_sample_size: 20,
            tiers: vec![
                TierThreshold::new(0.55, "Tier 1"),
                TierThreshold::new(0.50, "Tier 2"),
                TierThreshold::new(0.45, "Tier 3"),
            ],
            lowest_tier_label: "Tier 4".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    Week,
    Month,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendSettings {
    pub period: PeriodGranularity,
    pub rising_growth: f64,
    pub declining_growth: f64,
    pub volatility_cutoff: f64,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            period: PeriodGranularity::Week,
            rising_growth: 1.25,
            declining_growth: 0.8,
            volatility_cutoff: 0.05,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringSettings {
    /// Fixed cluster count; `None` searches 2..=max_clusters by silhouette
    pub clusters: Option<usize>,
    pub max_clusters: usize,
    pub seed: u64,
    pub max_iterations: usize,
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            clusters: None,
            max_clusters: 6,
            seed: 42,
            max_iterations: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationSettings {
    pub significance_level: f64,
    pub normality_alpha: f64,
    pub top_pairs: usize,
}

impl Default for CorrelationSettings {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            normality_alpha: 0.05,
            top_pairs: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchupUnit {
    Matches,
    Games,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchupSettings {
    pub min_sample_size: u32,
    pub unit: MatchupUnit,
}

impl Default for MatchupSettings {
    fn default() -> Self {
        Self {
            min_sample_size: 20,
            unit: MatchupUnit::Matches,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classification: ClassificationSettings,
    pub aggregation: AggregationSettings,
    pub statistics: StatisticsSettings,
    pub trends: TrendSettings,
    pub clustering: ClusteringSettings,
    pub correlation: CorrelationSettings,
    pub matchups: MatchupSettings,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overlaid by the given JSON file (or the one named by `METAGAME_CONFIG`)
    pub fn load(path: Option<&Path>) -> MetagameResult<Self> {
        let env_path = std::env::var(CONFIG_ENV_VAR).ok();
        let path = path.or(env_path.as_deref().map(Path::new));

        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::new(),
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> MetagameResult<Self> {
        let json = fs::read_to_string(path).map_err(|source| MetagameError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&json)
            .map_err(|e| MetagameError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> MetagameResult<()> {
        if self.classification.unclassified_label.trim().is_empty() {
            return Err(MetagameError::Config(
                "unclassified_label must not be blank".to_string(),
            ));
        }

        let level = self.statistics.confidence_level;
        if !(level > 0.0 && level < 1.0) {
            return Err(MetagameError::Config(format!(
                "confidence_level must lie in (0, 1), got {}",
                level
            )));
        }

        let tiers = &self.statistics.tiers;
        if tiers
            .windows(2)
            .any(|w| w[0].min_lower_bound <= w[1].min_lower_bound)
        {
            return Err(MetagameError::Config(
                "tier thresholds must be strictly descending".to_string(),
            ));
        }

        if self.clustering.clusters == Some(0) || self.clustering.max_clusters < 2 {
            return Err(MetagameError::Config(
                "clustering needs at least 2 clusters".to_string(),
            ));
        }

        if self.trends.declining_growth > self.trends.rising_growth {
            return Err(MetagameError::Config(
                "declining_growth must not exceed rising_growth".to_string(),
            ));
        }

        Ok(())
    }
}
