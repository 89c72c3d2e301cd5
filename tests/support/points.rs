#![allow(dead_code)]

use r3_hashgrid::Point3;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Generate points uniformly distributed in the cube `[-half_extent, half_extent)³`.
pub fn random_cloud(n: usize, half_extent: f32, seed: u64) -> Vec<Point3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    random_cloud_with_rng(n, half_extent, &mut rng)
}

pub fn random_cloud_with_rng<R: Rng + ?Sized>(
    n: usize,
    half_extent: f32,
    rng: &mut R,
) -> Vec<Point3> {
    (0..n)
        .map(|_| {
            Point3::new(
                rng.gen_range(-half_extent..half_extent),
                rng.gen_range(-half_extent..half_extent),
                rng.gen_range(-half_extent..half_extent),
            )
        })
        .collect()
}

/// One point at the center of every cell of a `dim³` lattice with the given spacing.
pub fn lattice_centers(dim: usize, spacing: f32) -> Vec<Point3> {
    let mut points = Vec::with_capacity(dim * dim * dim);
    for z in 0..dim {
        for y in 0..dim {
            for x in 0..dim {
                points.push(Point3::new(
                    (x as f32 + 0.5) * spacing,
                    (y as f32 + 0.5) * spacing,
                    (z as f32 + 0.5) * spacing,
                ));
            }
        }
    }
    points
}

// =============================================================================
// Adversarial Point Generators for Stress Testing
// =============================================================================

/// Generate tight Gaussian-ish clusters around a few random centers.
///
/// Most cells stay empty while a handful hold almost every point.
pub fn clustered_points(n: usize, clusters: usize, spread: f32, seed: u64) -> Vec<Point3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let centers = random_cloud_with_rng(clusters.max(1), 50.0, &mut rng);
    (0..n)
        .map(|i| {
            let c = centers[i % centers.len()];
            // Sum of uniforms: cheap bell-shaped offset.
            let mut offset = || (0..3).map(|_| rng.gen_range(-spread..spread)).sum::<f32>() / 3.0;
            Point3::new(c.x + offset(), c.y + offset(), c.z + offset())
        })
        .collect()
}

/// Generate points lying exactly on cell boundaries (multiples of `cell_width`).
pub fn boundary_points(n: usize, cell_width: f32, range: i32, seed: u64) -> Vec<Point3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let mut coord = || rng.gen_range(-range..=range) as f32 * cell_width;
            Point3::new(coord(), coord(), coord())
        })
        .collect()
}

/// Indices of all points within Chebyshev distance `radius` of `center`.
pub fn bruteforce_linf(points: &[Point3], center: Point3, radius: f32) -> Vec<i32> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.distance_linf(center) <= radius)
        .map(|(i, _)| i as i32)
        .collect()
}

/// Indices of all points within Euclidean distance `radius` of `center`.
pub fn bruteforce_l2(points: &[Point3], center: Point3, radius: f32) -> Vec<i32> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.distance_squared(center) <= radius * radius)
        .map(|(i, _)| i as i32)
        .collect()
}
