use log::debug;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::ClusteringSettings;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub archetype: String,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusteringOutcome {
    Clustered {
        k: usize,
        silhouette: f64,
        assignments: Vec<ClusterAssignment>,
        /// Centroids in standardized feature space, one row per cluster
        centroids: Vec<Vec<f64>>,
    },
    NotClustered {
        reason: String,
    },
}

impl ClusteringOutcome {
    fn not_clustered(reason: impl Into<String>) -> Self {
        Self::NotClustered {
            reason: reason.into(),
        }
    }

    pub fn is_clustered(&self) -> bool {
        matches!(self, Self::Clustered { .. })
    }
}

struct Partition {
    labels: Vec<usize>,
    centroids: Array2<f64>,
    silhouette: f64,
}

/// K-means over standardized feature rows, one row per archetype
///
/// With `settings.clusters` unset, k runs over 2..=max_clusters (capped at n - 1)
/// and the partition with the best silhouette wins; ties keep the smaller k.
pub fn cluster_archetypes(
    archetypes: &[String],
    features: &Array2<f64>,
    settings: &ClusteringSettings,
) -> ClusteringOutcome {
    let n = features.nrows();
    if n != archetypes.len() {
        return ClusteringOutcome::not_clustered("feature rows do not match archetypes");
    }

    let candidates: Vec<usize> = match settings.clusters {
        Some(k) if k < 2 => {
            return ClusteringOutcome::not_clustered("at least two clusters are required");
        }
        Some(k) if n <= k => {
            return ClusteringOutcome::not_clustered(format!(
                "{} archetypes are not enough for {} clusters",
                n, k
            ));
        }
        Some(k) => vec![k],
        None => (2..=settings.max_clusters.min(n.saturating_sub(1))).collect(),
    };

    if candidates.is_empty() {
        return ClusteringOutcome::not_clustered(format!(
            "{} archetypes are not enough to cluster",
            n
        ));
    }

    let data = standardize(features);
    let mut best: Option<Partition> = None;

    for k in candidates {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let Some((labels, centroids)) = kmeans(&data, k, settings.max_iterations, &mut rng) else {
            debug!("k={} skipped: fewer distinct points than clusters", k);
            continue;
        };

        let silhouette = silhouette_score(&data, &labels, k);
        debug!("k={} silhouette={:.4}", k, silhouette);

        if best.as_ref().is_none_or(|b| silhouette > b.silhouette) {
            best = Some(Partition {
                labels,
                centroids,
                silhouette,
            });
        }
    }

    match best {
        Some(partition) => build_outcome(archetypes, partition),
        None => ClusteringOutcome::not_clustered("fewer distinct archetypes than clusters"),
    }
}

/// Relabel clusters by first appearance so equal partitions serialize identically
fn build_outcome(archetypes: &[String], partition: Partition) -> ClusteringOutcome {
    let k = partition.centroids.nrows();
    let mut mapping: Vec<Option<usize>> = vec![None; k];
    let mut next = 0;
    for &label in &partition.labels {
        if mapping[label].is_none() {
            mapping[label] = Some(next);
            next += 1;
        }
    }

    let relabel = |label: usize| mapping[label].unwrap_or(label);

    let assignments = archetypes
        .iter()
        .zip(&partition.labels)
        .map(|(archetype, &label)| ClusterAssignment {
            archetype: archetype.clone(),
            cluster: relabel(label),
        })
        .collect();

    let mut centroids = vec![Vec::new(); k];
    for (label, row) in partition.centroids.outer_iter().enumerate() {
        centroids[relabel(label)] = row.to_vec();
    }

    ClusteringOutcome::Clustered {
        k,
        silhouette: partition.silhouette,
        assignments,
        centroids,
    }
}

/// Column-wise z-scores; constant columns become 0
pub fn standardize(features: &Array2<f64>) -> Array2<f64> {
    let mut data = features.clone();
    for mut column in data.axis_iter_mut(Axis(1)) {
        let mean = column.mean().unwrap_or(0.0);
        let std = column.std(0.0);
        if std > 0.0 {
            column.mapv_inplace(|x| (x - mean) / std);
        } else {
            column.fill(0.0);
        }
    }
    data
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    (&a - &b).mapv(|x| x * x).sum()
}

/// k-means++ seeding followed by Lloyd iterations
fn kmeans(
    data: &Array2<f64>,
    k: usize,
    max_iterations: usize,
    rng: &mut StdRng,
) -> Option<(Vec<usize>, Array2<f64>)> {
    let mut centroids = seed_centroids(data, k, rng)?;
    let mut labels = vec![0; data.nrows()];

    for iteration in 0..max_iterations.max(1) {
        let mut changed = false;
        for (i, point) in data.outer_iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if nearest != labels[i] {
                labels[i] = nearest;
                changed = true;
            }
        }

        if iteration > 0 && !changed {
            debug!("k-means converged after {} iterations", iteration);
            break;
        }
        update_centroids(data, &labels, &mut centroids);
    }

    Some((labels, centroids))
}

fn seed_centroids(data: &Array2<f64>, k: usize, rng: &mut StdRng) -> Option<Array2<f64>> {
    let n = data.nrows();
    let mut centroids = Array2::<f64>::zeros((k, data.ncols()));
    centroids.row_mut(0).assign(&data.row(rng.gen_range(0..n)));

    for c in 1..k {
        let distances: Array1<f64> = data
            .outer_iter()
            .map(|point| {
                (0..c)
                    .map(|j| squared_distance(point, centroids.row(j)))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();

        let total = distances.sum();
        if total <= 0.0 {
            return None;
        }

        let target = rng.gen_range(0.0..total);
        let mut cumulative = 0.0;
        let mut chosen = n - 1;
        for (i, &d) in distances.iter().enumerate() {
            cumulative += d;
            if cumulative > target {
                chosen = i;
                break;
            }
        }
        centroids.row_mut(c).assign(&data.row(chosen));
    }

    Some(centroids)
}

fn nearest_centroid(point: ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    centroids
        .outer_iter()
        .map(|centroid| squared_distance(point, centroid))
        .enumerate()
        .fold((0, f64::INFINITY), |best, (j, d)| if d < best.1 { (j, d) } else { best })
        .0
}

fn update_centroids(data: &Array2<f64>, labels: &[usize], centroids: &mut Array2<f64>) {
    let mut sums = Array2::<f64>::zeros(centroids.raw_dim());
    let mut counts = vec![0usize; centroids.nrows()];

    for (point, &label) in data.outer_iter().zip(labels) {
        let mut row = sums.row_mut(label);
        row += &point;
        counts[label] += 1;
    }

    // Empty clusters keep their previous centroid
    for (j, &count) in counts.iter().enumerate() {
        if count > 0 {
            let mean = sums.row(j).mapv(|x| x / count as f64);
            centroids.row_mut(j).assign(&mean);
        }
    }
}

/// Mean silhouette coefficient; singleton clusters contribute 0
pub fn silhouette_score(data: &Array2<f64>, labels: &[usize], k: usize) -> f64 {
    let n = data.nrows();
    if n == 0 {
        return 0.0;
    }

    let total: f64 = (0..n)
        .map(|i| {
            let mut sums = vec![0.0; k];
            let mut counts = vec![0usize; k];
            for j in 0..n {
                if i != j {
                    sums[labels[j]] += squared_distance(data.row(i), data.row(j)).sqrt();
                    counts[labels[j]] += 1;
                }
            }

            let own = labels[i];
            if counts[own] == 0 {
                return 0.0;
            }
            let a = sums[own] / counts[own] as f64;
            let b = (0..k)
                .filter(|&c| c != own && counts[c] > 0)
                .map(|c| sums[c] / counts[c] as f64)
                .fold(f64::INFINITY, f64::min);

            if !b.is_finite() || a.max(b) == 0.0 {
                0.0
            } else {
                (b - a) / a.max(b)
            }
        })
        .sum();

    total / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(rows: &[(f64, f64)]) -> (Vec<String>, Array2<f64>) {
        let names = (0..rows.len()).map(|i| format!("A{}", i)).collect();
        let mut data = Array2::<f64>::zeros((rows.len(), 2));
        for (i, &(share, win_rate)) in rows.iter().enumerate() {
            data[[i, 0]] = share;
            data[[i, 1]] = win_rate;
        }
        (names, data)
    }

    fn two_groups() -> (Vec<String>, Array2<f64>) {
        features(&[
            (0.30, 0.60),
            (0.31, 0.61),
            (0.29, 0.59),
            (0.05, 0.40),
            (0.06, 0.41),
            (0.04, 0.39),
        ])
    }

    #[test]
    fn test_finds_two_separated_groups() {
        let (names, data) = two_groups();

        let outcome = cluster_archetypes(&names, &data, &ClusteringSettings::default());

        match outcome {
            ClusteringOutcome::Clustered {
                k,
                silhouette,
                assignments,
                ..
            } => {
                assert_eq!(k, 2);
                assert!(silhouette > 0.8);
                let clusters: Vec<usize> = assignments.iter().map(|a| a.cluster).collect();
                assert_eq!(clusters, vec![0, 0, 0, 1, 1, 1]);
            }
            other => panic!("expected clustering, got {:?}", other),
        }
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let (names, data) = two_groups();
        let settings = ClusteringSettings {
            clusters: Some(3),
            ..ClusteringSettings::default()
        };

        let first = cluster_archetypes(&names, &data, &settings);
        let second = cluster_archetypes(&names, &data, &settings);

        assert_eq!(first, second);
    }

    #[test]
    fn test_fewer_points_than_clusters_is_not_an_error() {
        let (names, data) = features(&[(0.5, 0.5), (0.5, 0.6)]);
        let settings = ClusteringSettings {
            clusters: Some(3),
            ..ClusteringSettings::default()
        };

        let outcome = cluster_archetypes(&names, &data, &settings);

        assert!(!outcome.is_clustered());
    }

    #[test]
    fn test_empty_input() {
        let (names, data) = features(&[]);

        let outcome = cluster_archetypes(&names, &data, &ClusteringSettings::default());

        assert!(matches!(outcome, ClusteringOutcome::NotClustered { .. }));
    }

    #[test]
    fn test_identical_points_are_not_clustered() {
        let (names, data) = features(&[(0.2, 0.5), (0.2, 0.5), (0.2, 0.5), (0.2, 0.5)]);

        let outcome = cluster_archetypes(&names, &data, &ClusteringSettings::default());

        assert!(!outcome.is_clustered());
    }

    #[test]
    fn test_constant_column_standardizes_to_zero() {
        let (_, data) = features(&[(0.1, 0.5), (0.3, 0.5), (0.5, 0.5)]);

        let standardized = standardize(&data);

        assert!(standardized.column(1).iter().all(|&x| x == 0.0));
        assert!((standardized.column(0).sum()).abs() < 1e-12);
    }
}
