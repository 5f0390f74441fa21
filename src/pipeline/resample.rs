//! SMOTE oversampling followed by edited-nearest-neighbours cleaning
//!
//! SMOTE brings the minority class up to the size of the majority by
//! interpolating between a minority sample and one of its minority neighbours. ENN
//! then drops any sample, original or synthetic, whose nearest neighbours do
//! not all share its class.

use std::collections::BTreeMap;

use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::target::class_counts;

pub const DEFAULT_K_NEIGHBORS: usize = 5;
pub const DEFAULT_ENN_NEIGHBORS: usize = 3;
pub const DEFAULT_RESAMPLE_SEED: u64 = 42;

#[derive(Debug, Error, PartialEq)]
pub enum ResampleError {
    #[error("feature matrix has {rows} rows but {labels} labels were given")]
    LengthMismatch { rows: usize, labels: usize },

    #[error("resampling needs at least two classes, found {0}")]
    SingleClass(usize),

    #[error("class {class} has {count} sample(s), SMOTE needs at least 2")]
    TooFewSamples { class: i64, count: usize },

    #[error("neighbour counts must be at least 1")]
    InvalidNeighbors,
}

/// Combined over- and under-sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoteEnn {
    /// Neighbours considered when interpolating synthetic samples.
    pub k_neighbors: usize,
    /// Neighbours that must agree with a sample for it to survive cleaning.
    pub enn_neighbors: usize,
    pub seed: u64,
}

impl Default for SmoteEnn {
    fn default() -> Self {
        Self {
            k_neighbors: DEFAULT_K_NEIGHBORS,
            enn_neighbors: DEFAULT_ENN_NEIGHBORS,
            seed: DEFAULT_RESAMPLE_SEED,
        }
    }
}

/// Class counts at each step of a resampling run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResampleReport {
    pub before: BTreeMap<i64, usize>,
    pub after_oversampling: BTreeMap<i64, usize>,
    pub after: BTreeMap<i64, usize>,
    pub synthetic: usize,
    pub removed: usize,
}

impl SmoteEnn {
    pub fn new(k_neighbors: usize, enn_neighbors: usize, seed: u64) -> Self {
        Self {
            k_neighbors,
            enn_neighbors,
            seed,
        }
    }

    /// Rebalance `(x, y)`; rows of `x` pair with entries of `y`.
    ///
    /// Original rows come first in the output, in input order, followed by
    /// synthetic rows; rows removed by cleaning are skipped.
    pub fn fit_resample(
        &self,
        x: &Mat<f64>,
        y: &[i64],
    ) -> Result<(Mat<f64>, Vec<i64>, ResampleReport), ResampleError> {
        if x.nrows() != y.len() {
            return Err(ResampleError::LengthMismatch {
                rows: x.nrows(),
                labels: y.len(),
            });
        }
        if self.k_neighbors == 0 || self.enn_neighbors == 0 {
            return Err(ResampleError::InvalidNeighbors);
        }

        let before = class_counts(y);
        if before.len() < 2 {
            return Err(ResampleError::SingleClass(before.len()));
        }

        let mut rows = matrix_rows(x);
        let mut labels = y.to_vec();
        let synthetic = self.oversample(&mut rows, &mut labels, &before)?;
        let after_oversampling = class_counts(&labels);

        let keep = edited_nearest_neighbours(&rows, &labels, self.enn_neighbors);
        let kept_rows: Vec<&Vec<f64>> = rows
            .iter()
            .zip(&keep)
            .filter_map(|(r, k)| k.then_some(r))
            .collect();
        let kept_labels: Vec<i64> = labels
            .iter()
            .zip(&keep)
            .filter_map(|(l, k)| k.then_some(*l))
            .collect();
        let removed = labels.len() - kept_labels.len();

        let mut out = Mat::<f64>::zeros(kept_rows.len(), x.ncols());
        for (i, row) in kept_rows.iter().enumerate() {
            for (j, v) in row.iter().enumerate() {
                out[(i, j)] = *v;
            }
        }

        let report = ResampleReport {
            before,
            after_oversampling,
            after: class_counts(&kept_labels),
            synthetic,
            removed,
        };
        tracing::info!(
            synthetic = report.synthetic,
            removed = report.removed,
            rows = kept_labels.len(),
            "resampled training data"
        );
        Ok((out, kept_labels, report))
    }

    /// Append synthetic minority rows until the minority matches the majority.
    ///
    /// The minority is the smallest class; ties go to the lowest code.
    fn oversample(
        &self,
        rows: &mut Vec<Vec<f64>>,
        labels: &mut Vec<i64>,
        counts: &BTreeMap<i64, usize>,
    ) -> Result<usize, ResampleError> {
        let majority = counts.values().copied().max().unwrap_or(0);
        let Some((&class, &count)) = counts.iter().min_by_key(|entry| *entry.1) else {
            return Ok(0);
        };
        if count < 2 {
            return Err(ResampleError::TooFewSamples { class, count });
        }
        let needed = majority - count;
        if needed == 0 {
            return Ok(0);
        }

        let class_rows: Vec<Vec<f64>> = rows
            .iter()
            .zip(labels.iter())
            .filter(|(_, label)| **label == class)
            .map(|(row, _)| row.clone())
            .collect();
        let k = self.k_neighbors.min(count - 1);
        let neighbours = nearest_neighbours(&class_rows, k);

        let mut rng = StdRng::seed_from_u64(self.seed);
        for _ in 0..needed {
            let i = rng.gen_range(0..class_rows.len());
            let nn = neighbours[i][rng.gen_range(0..k)];
            let gap: f64 = rng.gen();
            let sample = class_rows[i]
                .iter()
                .zip(&class_rows[nn])
                .map(|(a, b)| a + gap * (b - a))
                .collect();
            rows.push(sample);
            labels.push(class);
        }
        tracing::debug!(class, generated = needed, "oversampled minority class");
        Ok(needed)
    }
}

/// Keep mask: a row survives if all of its `k` nearest neighbours share its label.
pub fn edited_nearest_neighbours(rows: &[Vec<f64>], labels: &[i64], k: usize) -> Vec<bool> {
    if rows.len() < 2 {
        return vec![true; rows.len()];
    }
    let k = k.min(rows.len() - 1);
    let neighbours = nearest_neighbours(rows, k);
    neighbours
        .iter()
        .enumerate()
        .map(|(i, nn)| nn.iter().all(|&j| labels[j] == labels[i]))
        .collect()
}

/// Indices of the `k` nearest other rows of every row.
///
/// Squared Euclidean distance; ties go to the lower index.
pub fn nearest_neighbours(rows: &[Vec<f64>], k: usize) -> Vec<Vec<usize>> {
    (0..rows.len())
        .into_par_iter()
        .map(|i| {
            let mut dists: Vec<(f64, usize)> = (0..rows.len())
                .filter(|&j| j != i)
                .map(|j| (squared_distance(&rows[i], &rows[j]), j))
                .collect();
            let k = k.min(dists.len());
            if k == 0 {
                return Vec::new();
            }
            let by_distance =
                |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
            if k < dists.len() {
                dists.select_nth_unstable_by(k - 1, by_distance);
                dists.truncate(k);
            }
            dists.sort_by(by_distance);
            dists.into_iter().map(|(_, j)| j).collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn matrix_rows(x: &Mat<f64>) -> Vec<Vec<f64>> {
    (0..x.nrows())
        .map(|i| (0..x.ncols()).map(|j| x[(i, j)]).collect())
        .collect()
}
