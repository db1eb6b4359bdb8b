use chrono::NaiveDate;
use log::{debug, info};
use ndarray::Array2;
use serde::Serialize;

use super::clustering::{ClusteringOutcome, cluster_archetypes};
use super::confidence::{proportion, wilson_interval};
use super::correlation::{CorrelationReport, correlate_metrics};
use super::diversity::{DiversityIndex, diversity};
use super::tiers::assign_tier;
use super::trends::{TrendReport, analyze_trends};
use crate::aggregation::{ArchetypeGroup, MetagameSnapshot};
use crate::config::{
    AppConfig, ClusteringSettings, CorrelationSettings, StatisticsSettings, TrendSettings,
};
use crate::errors::{ClassificationAmbiguity, InsufficientDataWarning};

/// Columns of the correlation metric matrix
///
/// Deck count is left out: it is meta_share scaled by the batch size.
pub const CORRELATION_METRICS: [&str; 4] = ["meta_share", "win_rate", "matches", "draw_rate"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeStatistic {
    pub archetype: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<String>,
    pub deck_count: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub matches: u32,
    /// wins / (wins + losses)
    pub win_rate: f64,
    pub draw_rate: f64,
    pub meta_share: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Only assigned when the sample is large enough
    pub tier: Option<String>,
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub total_decks: u32,
    pub archetype_count: usize,
    pub duplicates_removed: usize,
    pub unclassified_decks: u32,
    pub archetypes: Vec<ArchetypeStatistic>,
    pub diversity: DiversityIndex,
    pub most_played: Option<String>,
    pub best_performing: Option<String>,
    pub trends: TrendReport,
    pub clustering: ClusteringOutcome,
    pub correlations: CorrelationReport,
    pub ambiguities: Vec<ClassificationAmbiguity>,
    pub warnings: Vec<InsufficientDataWarning>,
}

impl StatisticsReport {
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }

    pub fn archetype(&self, name: &str) -> Option<&ArchetypeStatistic> {
        self.archetypes.iter().find(|a| a.archetype == name)
    }
}

pub struct StatisticsEngine {
    statistics: StatisticsSettings,
    trends: TrendSettings,
    clustering: ClusteringSettings,
    correlation: CorrelationSettings,
}

impl StatisticsEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            statistics: config.statistics.clone(),
            trends: config.trends.clone(),
            clustering: config.clustering.clone(),
            correlation: config.correlation.clone(),
        }
    }

    /// Full report for one aggregated batch
    ///
    /// `observations` pairs each counted deck's tournament date with its group
    /// name and feeds the trend analysis.
    pub fn compute(
        &self,
        snapshot: &MetagameSnapshot,
        observations: &[(NaiveDate, String)],
    ) -> StatisticsReport {
        if snapshot.is_empty() {
            info!("  → No classified decks, producing an empty report");
            return self.empty_report(snapshot);
        }

        let archetypes: Vec<ArchetypeStatistic> = snapshot
            .groups
            .iter()
            .map(|group| self.archetype_statistic(group))
            .collect();

        let warnings = self.insufficient_data_warnings(&archetypes);
        info!(
            "  → {} archetypes, {} flagged for insufficient data",
            archetypes.len(),
            warnings.len()
        );

        let diversity = diversity(&snapshot.shares());
        let names: Vec<String> = archetypes.iter().map(|a| a.archetype.clone()).collect();
        let clustering = cluster_archetypes(&names, &cluster_features(&archetypes), &self.clustering);
        let correlations = correlate_metrics(
            &CORRELATION_METRICS,
            &metric_matrix(&archetypes),
            &self.correlation,
        );

        StatisticsReport {
            total_decks: snapshot.total_decks,
            archetype_count: archetypes.len(),
            duplicates_removed: snapshot.duplicates_removed,
            unclassified_decks: snapshot.unclassified_decks,
            most_played: snapshot.most_played().map(ArchetypeGroup::display_name),
            best_performing: snapshot
                .best_performing(self.statistics.min_sample_size)
                .map(ArchetypeGroup::display_name),
            trends: analyze_trends(observations, &self.trends),
            diversity,
            clustering,
            correlations,
            archetypes,
            ambiguities: Vec::new(),
            warnings,
        }
    }

    fn empty_report(&self, snapshot: &MetagameSnapshot) -> StatisticsReport {
        StatisticsReport {
            total_decks: 0,
            archetype_count: 0,
            duplicates_removed: snapshot.duplicates_removed,
            unclassified_decks: 0,
            archetypes: Vec::new(),
            diversity: DiversityIndex::default(),
            most_played: None,
            best_performing: None,
            trends: TrendReport::default(),
            clustering: ClusteringOutcome::NotClustered {
                reason: "no archetypes".to_string(),
            },
            correlations: CorrelationReport::default(),
            ambiguities: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn archetype_statistic(&self, group: &ArchetypeGroup) -> ArchetypeStatistic {
        let record = group.record;
        let matches = record.matches_played();
        let interval = wilson_interval(record.wins, record.decided(), self.statistics.confidence_level);
        let insufficient_data = matches < self.statistics.min_sample_size;
        let tier = (!insufficient_data).then(|| assign_tier(interval.lower, &self.statistics));

        ArchetypeStatistic {
            archetype: group.display_name(),
            colors: group.colors.clone(),
            deck_count: group.deck_count,
            wins: record.wins,
            losses: record.losses,
            draws: record.draws,
            matches,
            win_rate: proportion(record.wins, record.decided()),
            draw_rate: proportion(record.draws, matches),
            meta_share: group.meta_share,
            ci_lower: interval.lower,
            ci_upper: interval.upper,
            tier,
            insufficient_data,
        }
    }

    fn insufficient_data_warnings(&self, archetypes: &[ArchetypeStatistic]) -> Vec<InsufficientDataWarning> {
        archetypes
            .iter()
            .filter(|a| a.insufficient_data)
            .map(|a| {
                debug!(
                    "{}: {} matches, below the {} required",
                    a.archetype, a.matches, self.statistics.min_sample_size
                );
                InsufficientDataWarning {
                    subject: a.archetype.clone(),
                    sample_size: a.matches,
                    required: self.statistics.min_sample_size,
                }
            })
            .collect()
    }
}

fn cluster_features(archetypes: &[ArchetypeStatistic]) -> Array2<f64> {
    let mut features = Array2::<f64>::zeros((archetypes.len(), 2));
    for (i, archetype) in archetypes.iter().enumerate() {
        features[[i, 0]] = archetype.meta_share;
        features[[i, 1]] = archetype.win_rate;
    }
    features
}

fn metric_matrix(archetypes: &[ArchetypeStatistic]) -> Array2<f64> {
    let mut values = Array2::<f64>::zeros((archetypes.len(), CORRELATION_METRICS.len()));
    for (i, a) in archetypes.iter().enumerate() {
        values[[i, 0]] = a.meta_share;
        values[[i, 1]] = a.win_rate;
        values[[i, 2]] = a.matches as f64;
        values[[i, 3]] = a.draw_rate;
    }
    values
}
