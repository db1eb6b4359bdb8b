use std::cmp::Ordering;

use ndarray::{Array1, Array2, ArrayView1};
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, StudentsT};

use crate::config::CorrelationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMethod {
    Pearson,
    Spearman,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCorrelation {
    pub metric_a: String,
    pub metric_b: String,
    pub pearson: f64,
    pub spearman: f64,
    /// Pearson when both series pass the normality check, Spearman otherwise
    pub method: CorrelationMethod,
    pub coefficient: f64,
    pub p_value: f64,
    pub significant: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CorrelationReport {
    pub sample_size: usize,
    /// Every computable pair, strongest |coefficient| first
    pub pairs: Vec<MetricCorrelation>,
    /// Leading significant pairs
    pub strongest: Vec<MetricCorrelation>,
}

/// Pairwise correlation of metric columns; rows are archetypes
///
/// Fewer than three rows yield an empty report. Pairs involving a constant
/// column are skipped.
pub fn correlate_metrics(
    metric_names: &[&str],
    values: &Array2<f64>,
    settings: &CorrelationSettings,
) -> CorrelationReport {
    let n = values.nrows();
    if n < 3 || values.ncols() != metric_names.len() {
        return CorrelationReport {
            sample_size: n,
            ..CorrelationReport::default()
        };
    }

    let normal: Vec<bool> = values
        .columns()
        .into_iter()
        .map(|column| jarque_bera_p(column) > settings.normality_alpha)
        .collect();

    let mut pairs = Vec::new();
    for a in 0..metric_names.len() {
        for b in (a + 1)..metric_names.len() {
            let (x, y) = (values.column(a), values.column(b));
            let (Some(pearson), Some(spearman)) = (pearson(x, y), spearman(x, y)) else {
                continue;
            };

            let (method, coefficient) = if normal[a] && normal[b] {
                (CorrelationMethod::Pearson, pearson)
            } else {
                (CorrelationMethod::Spearman, spearman)
            };
            let p_value = correlation_p_value(coefficient, n);

            pairs.push(MetricCorrelation {
                metric_a: metric_names[a].to_string(),
                metric_b: metric_names[b].to_string(),
                pearson,
                spearman,
                method,
                coefficient,
                p_value,
                significant: p_value < settings.significance_level,
            });
        }
    }

    pairs.sort_by(|p, q| {
        q.coefficient
            .abs()
            .partial_cmp(&p.coefficient.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| p.metric_a.cmp(&q.metric_a))
            .then_with(|| p.metric_b.cmp(&q.metric_b))
    });

    let strongest = pairs
        .iter()
        .filter(|pair| pair.significant)
        .take(settings.top_pairs)
        .cloned()
        .collect();

    CorrelationReport {
        sample_size: n,
        pairs,
        strongest,
    }
}

/// Pearson r; `None` when either series is constant
pub fn pearson(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    let dx = &x - x.mean()?;
    let dy = &y - y.mean()?;
    let sxx = dx.dot(&dx);
    let syy = dy.dot(&dy);
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }

    Some((dx.dot(&dy) / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Spearman rho as the Pearson correlation of average ranks
pub fn spearman(x: ArrayView1<f64>, y: ArrayView1<f64>) -> Option<f64> {
    let rx = ranks(x);
    let ry = ranks(y);
    pearson(rx.view(), ry.view())
}

/// 1-based ranks; tied values share their average rank
pub fn ranks(values: ArrayView1<f64>) -> Array1<f64> {
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    let mut ranks = Array1::<f64>::zeros(values.len());
    let mut i = 0;
    while i < indexed.len() {
        let mut j = i;
        while j < indexed.len() && indexed[j].1 == indexed[i].1 {
            j += 1;
        }
        let average = (i + j + 1) as f64 / 2.0;
        for &(index, _) in &indexed[i..j] {
            ranks[index] = average;
        }
        i = j;
    }
    ranks
}

/// p-value of the Jarque-Bera normality test (chi-square, 2 df)
pub fn jarque_bera_p(values: ArrayView1<f64>) -> f64 {
    let n = values.len() as f64;
    let Some(mean) = values.mean() else {
        return 0.0;
    };

    let centered = values.mapv(|x| x - mean);
    let m2 = centered.mapv(|d| d.powi(2)).sum() / n;
    if m2 <= 0.0 {
        return 0.0;
    }
    let m3 = centered.mapv(|d| d.powi(3)).sum() / n;
    let m4 = centered.mapv(|d| d.powi(4)).sum() / n;

    let skewness = m3 / m2.powf(1.5);
    let kurtosis = m4 / (m2 * m2);
    let statistic = n / 6.0 * (skewness.powi(2) + (kurtosis - 3.0).powi(2) / 4.0);

    if !statistic.is_finite() {
        return 0.0;
    }
    ChiSquared::new(2.0)
        .map(|chi_square| chi_square.sf(statistic))
        .unwrap_or(0.0)
}

/// Two-sided p-value of H0: no correlation, from the t statistic with n - 2 df
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let remainder = 1.0 - r * r;
    if remainder <= 0.0 {
        return 0.0;
    }
    let t = r * (df / remainder).sqrt();
    if !t.is_finite() {
        return 0.0;
    }
    StudentsT::new(0.0, 1.0, df)
        .map(|students_t| (2.0 * students_t.sf(t.abs())).clamp(0.0, 1.0))
        .unwrap_or(1.0)
}
