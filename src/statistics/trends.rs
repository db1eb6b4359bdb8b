use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use ndarray::{ArrayView1, s};
use serde::Serialize;

use crate::config::{PeriodGranularity, TrendSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendCategory {
    Rising,
    Declining,
    Volatile,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeTrend {
    pub archetype: String,
    /// Meta share per period, aligned with `TrendReport::periods`
    pub shares: Vec<f64>,
    /// last / first; undefined when the first period share is zero
    pub growth_rate: Option<f64>,
    pub volatility: f64,
    pub category: TrendCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendReport {
    pub periods: Vec<String>,
    pub archetypes: Vec<ArchetypeTrend>,
}

pub fn period_label(date: NaiveDate, granularity: PeriodGranularity) -> String {
    match granularity {
        PeriodGranularity::Week => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        PeriodGranularity::Month => format!("{}-{:02}", date.year(), date.month()),
    }
}

/// Per-period meta shares of every archetype seen in the observations
pub fn analyze_trends(observations: &[(NaiveDate, String)], settings: &TrendSettings) -> TrendReport {
    if observations.is_empty() {
        return TrendReport::default();
    }

    let mut counts: BTreeMap<String, BTreeMap<&str, u32>> = BTreeMap::new();
    let mut archetypes: BTreeSet<&str> = BTreeSet::new();
    for (date, archetype) in observations {
        let period = period_label(*date, settings.period);
        *counts
            .entry(period)
            .or_default()
            .entry(archetype.as_str())
            .or_default() += 1;
        archetypes.insert(archetype.as_str());
    }

    let periods: Vec<String> = counts.keys().cloned().collect();
    let trends = archetypes
        .into_iter()
        .map(|archetype| {
            let shares = counts
                .values()
                .map(|period| period_share(period, archetype))
                .collect();
            classify_trend(archetype, shares, settings)
        })
        .collect();

    TrendReport {
        periods,
        archetypes: trends,
    }
}

fn period_share(period: &BTreeMap<&str, u32>, archetype: &str) -> f64 {
    let total: u32 = period.values().sum();
    let count = period.get(archetype).copied().unwrap_or(0);
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

pub fn classify_trend(archetype: &str, shares: Vec<f64>, settings: &TrendSettings) -> ArchetypeTrend {
    let first = shares.first().copied().unwrap_or(0.0);
    let last = shares.last().copied().unwrap_or(0.0);
    let growth_rate = (first > 0.0).then(|| last / first);
    let volatility = delta_volatility(&shares);

    let category = if volatility > settings.volatility_cutoff {
        TrendCategory::Volatile
    } else {
        match growth_rate {
            Some(g) if g >= settings.rising_growth => TrendCategory::Rising,
            Some(g) if g <= settings.declining_growth => TrendCategory::Declining,
            Some(_) => TrendCategory::Stable,
            None if last > 0.0 => TrendCategory::Rising,
            None => TrendCategory::Stable,
        }
    };

    ArchetypeTrend {
        archetype: archetype.to_string(),
        shares,
        growth_rate,
        volatility,
        category,
    }
}

/// Population standard deviation of period-to-period changes
fn delta_volatility(shares: &[f64]) -> f64 {
    if shares.len() < 2 {
        return 0.0;
    }

    let shares = ArrayView1::from(shares);
    let deltas = &shares.slice(s![1..]) - &shares.slice(s![..-1]);
    deltas.std(0.0)
}
