//! Weighted k-means over combos.
//!
//! Centers are seeded with a farthest-point heuristic and refined with Lloyd
//! iterations until the center list stops changing.

use rgb::RGBA8;
use tracing::{debug, trace, warn};

use crate::histogram::{channels, Combo, WeightedPoint};

/// Result of clustering: final centers plus, for every input point, the index
/// of its nearest center.
#[derive(Debug, Clone)]
pub struct Clustering {
    pub centers: Vec<Combo>,
    pub assignments: Vec<usize>,
    /// Lloyd iterations run before the centers settled or the cap was hit.
    pub iterations: usize,
}

impl Clustering {
    /// Center assigned to `points[point]`.
    pub fn center_of(&self, point: usize) -> &Combo {
        &self.centers[self.assignments[point]]
    }
}

/// Partition `points` into at most `max_centers` clusters.
pub fn cluster(
    points: &[WeightedPoint],
    max_centers: usize,
    max_iterations: usize,
) -> Clustering {
    if points.is_empty() || max_centers == 0 {
        return Clustering {
            centers: Vec::new(),
            assignments: Vec::new(),
            iterations: 0,
        };
    }

    let mut centers = initial_centers(points, max_centers);
    let mut iterations = 0;

    let assignments = loop {
        let assignments = assign(points, &centers);
        if iterations == max_iterations {
            warn!(
                iterations,
                centers = centers.len(),
                "k-means did not settle within the iteration cap"
            );
            break assignments;
        }

        let next = recompute(points, &assignments, centers.len());
        iterations += 1;
        trace!(iteration = iterations, centers = next.len(), "lloyd step");

        if next == centers {
            break assignments;
        }
        centers = next;
    };

    Clustering {
        centers,
        assignments,
        iterations,
    }
}

/// Farthest-point seeding in normalized units.
///
/// Starts from the most frequent combo, then repeatedly takes the cluster
/// with the largest total weighted distance and promotes its farthest point.
fn initial_centers(points: &[WeightedPoint], max_centers: usize) -> Vec<Combo> {
    let mut seed = 0;
    for (i, p) in points.iter().enumerate() {
        if p.count > points[seed].count {
            seed = i;
        }
    }

    let mut centers = vec![points[seed].combo.clone()];
    let mut nearest = vec![0usize; points.len()];
    let mut dist: Vec<f64> = points
        .iter()
        .map(|p| normalized_distance(&p.combo, &centers[0]))
        .collect();

    while centers.len() < max_centers {
        let mut totals = vec![0.0f64; centers.len()];
        for (i, p) in points.iter().enumerate() {
            totals[nearest[i]] += dist[i] * p.count as f64;
        }

        let mut target = None;
        let mut target_total = 0.0;
        for (c, &total) in totals.iter().enumerate() {
            if total > target_total {
                target = Some(c);
                target_total = total;
            }
        }
        let Some(target) = target else {
            break;
        };

        // A point with non-zero distance differs from every center, so the
        // promoted combo is always new.
        let mut candidate = None;
        let mut candidate_dist = 0.0;
        for i in (0..points.len()).filter(|&i| nearest[i] == target) {
            if dist[i] > candidate_dist {
                candidate = Some(i);
                candidate_dist = dist[i];
            }
        }
        let Some(candidate) = candidate else {
            break;
        };
        let promoted = points[candidate].combo.clone();

        let c = centers.len();
        for (i, p) in points.iter().enumerate() {
            let d = normalized_distance(&p.combo, &promoted);
            if d < dist[i] {
                dist[i] = d;
                nearest[i] = c;
            }
        }
        centers.push(promoted);
    }

    if centers.len() < max_centers {
        debug!(
            centers = centers.len(),
            requested = max_centers,
            "seeding ran out of distinct combos, palette will be smaller than requested"
        );
    }

    centers
}

/// Below this many points the parallel assignment costs more than it saves.
#[cfg(feature = "threads")]
const PARALLEL_MIN_POINTS: usize = 1024;

/// Nearest center for every point. Ties go to the lower center index, so the
/// result is the same however the work is split.
#[cfg(feature = "threads")]
fn assign(points: &[WeightedPoint], centers: &[Combo]) -> Vec<usize> {
    use rayon::prelude::*;

    if points.len() < PARALLEL_MIN_POINTS {
        return assign_serial(points, centers);
    }
    points
        .par_iter()
        .map(|p| nearest_center(&p.combo, centers))
        .collect()
}

#[cfg(not(feature = "threads"))]
fn assign(points: &[WeightedPoint], centers: &[Combo]) -> Vec<usize> {
    assign_serial(points, centers)
}

fn assign_serial(points: &[WeightedPoint], centers: &[Combo]) -> Vec<usize> {
    points
        .iter()
        .map(|p| nearest_center(&p.combo, centers))
        .collect()
}

fn nearest_center(combo: &Combo, centers: &[Combo]) -> usize {
    let mut best = 0;
    let mut best_dist = u64::MAX;

    for (i, center) in centers.iter().enumerate() {
        if let Some(d) = bounded_distance(combo, center, best_dist) {
            if d < best_dist {
                best = i;
                best_dist = d;
                if d == 0 {
                    break;
                }
            }
        }
    }

    best
}

/// Weighted mean of each cluster, rounded to the nearest byte. Clusters that
/// received no points are dropped.
fn recompute(points: &[WeightedPoint], assignments: &[usize], num_centers: usize) -> Vec<Combo> {
    let width = points.first().map_or(0, |p| p.combo.len()) * 4;
    let mut sums = vec![vec![0u64; width]; num_centers];
    let mut weights = vec![0u64; num_centers];

    for (p, &c) in points.iter().zip(assignments) {
        let w = p.count as u64;
        weights[c] += w;
        let sum = &mut sums[c];
        for (j, color) in p.combo.colors().iter().enumerate() {
            for (k, v) in channels(*color).into_iter().enumerate() {
                sum[j * 4 + k] += v as u64 * w;
            }
        }
    }

    sums.into_iter()
        .zip(weights)
        .filter(|&(_, w)| w > 0)
        .map(|(sum, w)| {
            Combo::new(
                sum.chunks_exact(4)
                    .map(|ch| {
                        RGBA8::new(
                            rounded_mean(ch[0], w),
                            rounded_mean(ch[1], w),
                            rounded_mean(ch[2], w),
                            rounded_mean(ch[3], w),
                        )
                    })
                    .collect(),
            )
        })
        .collect()
}

#[inline]
fn rounded_mean(sum: u64, weight: u64) -> u8 {
    ((sum + weight / 2) / weight) as u8
}

/// Squared distance, abandoned with `None` once it exceeds `limit`.
fn bounded_distance(a: &Combo, b: &Combo, limit: u64) -> Option<u64> {
    let mut sum = 0u64;
    for (x, y) in a.colors().iter().zip(b.colors()) {
        sum += color_distance(*x, *y);
        if sum > limit {
            return None;
        }
    }
    Some(sum)
}

#[inline]
fn color_distance(x: RGBA8, y: RGBA8) -> u64 {
    channels(x)
        .into_iter()
        .zip(channels(y))
        .map(|(p, q)| {
            let d = p.abs_diff(q) as u64;
            d * d
        })
        .sum()
}

/// Squared distance with every channel scaled to `0.0..=1.0`.
fn normalized_distance(a: &Combo, b: &Combo) -> f64 {
    a.colors()
        .iter()
        .zip(b.colors())
        .flat_map(|(x, y)| channels(*x).into_iter().zip(channels(*y)))
        .map(|(p, q)| {
            let d = (p as f64 - q as f64) / 255.0;
            d * d
        })
        .sum()
}
