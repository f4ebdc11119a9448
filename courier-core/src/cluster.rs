//! Spatial grouping of pending jobs.
//!
//! [`Clusterer`] runs k-means over job positions, treating latitude and
//! longitude as planar axes. Seeding uses k-means++ driven by a
//! [`ChaCha8Rng`] with a fixed seed, so the same input always produces the
//! same partition. Clustering works on a caller-provided slice and never
//! touches dispatch state.

use geo::Coord;
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::fleet::Job;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// Lloyd iterations allowed before the current partition is accepted.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Rejected clustering request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClusterError {
    /// Zero clusters were requested for two or more jobs.
    #[error("cannot partition {jobs} jobs into zero clusters")]
    ZeroClusters {
        /// Number of jobs supplied.
        jobs: usize,
    },
}

/// Tuning for [`Clusterer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClustererConfig {
    /// Seed for centroid initialisation.
    pub seed: u64,
    /// Upper bound on refinement iterations.
    pub max_iterations: usize,
}

impl Default for ClustererConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ClustererConfig {
    /// Override the seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Override the iteration bound.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Seeded k-means partitioner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clusterer {
    config: ClustererConfig,
}

impl Clusterer {
    /// Clusterer with the default seed and iteration bound.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clusterer with explicit tuning.
    #[must_use]
    pub const fn with_config(config: ClustererConfig) -> Self {
        Self { config }
    }

    /// Partition `jobs` into `k` groups.
    ///
    /// Fewer than two jobs always yield one group holding all of them. When
    /// `k` exceeds the job count every job gets its own group and the
    /// remaining groups are empty. Otherwise exactly `k` groups are returned,
    /// some of which may be empty.
    ///
    /// # Errors
    /// Returns [`ClusterError::ZeroClusters`] when `k` is zero and at least
    /// two jobs are supplied.
    ///
    /// # Examples
    /// ```
    /// use courier_core::{Clusterer, DispatchState, JobRequest, lat_lon};
    ///
    /// let state = DispatchState::new();
    /// state.submit_jobs([
    ///     JobRequest::new(lat_lon(14.5500, 121.0200)),
    ///     JobRequest::new(lat_lon(14.5501, 121.0201)),
    ///     JobRequest::new(lat_lon(14.6000, 121.0800)),
    /// ])?;
    /// let clusters = Clusterer::new().cluster(&state.pending_jobs(), 2)?;
    /// assert_eq!(clusters.len(), 2);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn cluster(&self, jobs: &[Job], k: usize) -> Result<Vec<Vec<Job>>, ClusterError> {
        if jobs.len() < 2 {
            return Ok(vec![jobs.to_vec()]);
        }
        let points: Vec<Coord<f64>> = jobs.iter().map(|job| job.location).collect();
        let labels = self.labels(&points, k)?;
        let mut clusters = vec![Vec::new(); k];
        for (job, label) in jobs.iter().zip(labels) {
            if let Some(cluster) = clusters.get_mut(label) {
                cluster.push(job.clone());
            }
        }
        Ok(clusters)
    }

    /// Cluster label for each point, in input order.
    ///
    /// # Errors
    /// Returns [`ClusterError::ZeroClusters`] when `k` is zero and at least
    /// two points are supplied.
    pub fn labels(&self, points: &[Coord<f64>], k: usize) -> Result<Vec<usize>, ClusterError> {
        if points.len() < 2 {
            return Ok(vec![0; points.len()]);
        }
        if k == 0 {
            return Err(ClusterError::ZeroClusters { jobs: points.len() });
        }
        if k >= points.len() {
            return Ok((0..points.len()).collect());
        }
        Ok(lloyd(points, k, self.config))
    }
}

fn lloyd(points: &[Coord<f64>], k: usize, config: ClustererConfig) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut centroids = seed_centroids(points, k, &mut rng);
    let mut labels = assign(points, &centroids);
    for _ in 0..config.max_iterations {
        centroids = recompute(points, &labels, &centroids);
        let next = assign(points, &centroids);
        if next == labels {
            break;
        }
        labels = next;
    }
    labels
}

/// k-means++ initialisation: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest chosen centroid.
fn seed_centroids(points: &[Coord<f64>], k: usize, rng: &mut ChaCha8Rng) -> Vec<Coord<f64>> {
    let mut centroids = Vec::with_capacity(k);
    if let Some(first) = points.get(rng.gen_range(0..points.len())) {
        centroids.push(*first);
    }
    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|point| nearest(*point, &centroids).1)
            .collect();
        // Duplicate points can leave every weight at zero.
        let pick = match WeightedIndex::new(&weights) {
            Ok(distribution) => distribution.sample(rng),
            Err(_) => rng.gen_range(0..points.len()),
        };
        match points.get(pick) {
            Some(point) => centroids.push(*point),
            None => break,
        }
    }
    centroids
}

fn assign(points: &[Coord<f64>], centroids: &[Coord<f64>]) -> Vec<usize> {
    points
        .iter()
        .map(|point| nearest(*point, centroids).0)
        .collect()
}

/// Index of and squared distance to the closest centroid; ties go to the
/// lower index.
fn nearest(point: Coord<f64>, centroids: &[Coord<f64>]) -> (usize, f64) {
    centroids
        .iter()
        .enumerate()
        .map(|(index, centroid)| (index, squared_distance(point, *centroid)))
        .fold((0, f64::INFINITY), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
}

fn squared_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).powi(2) + (a.y - b.y).powi(2)
}

/// Move each centroid to the mean of its members. Empty clusters keep their
/// previous centroid.
fn recompute(points: &[Coord<f64>], labels: &[usize], previous: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let mut sums = vec![(Coord { x: 0.0, y: 0.0 }, 0_u32); previous.len()];
    for (point, label) in points.iter().zip(labels) {
        if let Some((sum, count)) = sums.get_mut(*label) {
            *sum = *sum + *point;
            *count += 1;
        }
    }
    sums.into_iter()
        .zip(previous)
        .map(|((sum, count), old)| {
            if count == 0 {
                *old
            } else {
                sum / f64::from(count)
            }
        })
        .collect()
}
