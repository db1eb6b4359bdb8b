use crate::config::StatisticsSettings;

/// Tier label for a win-rate CI lower bound
pub fn assign_tier(ci_lower: f64, settings: &StatisticsSettings) -> String {
    settings
        .tiers
        .iter()
        .find(|tier| ci_lower >= tier.min_lower_bound)
        .map(|tier| tier.label.clone())
        .unwrap_or_else(|| settings.lowest_tier_label.clone())
}
