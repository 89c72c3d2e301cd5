use super::*;
use crate::{GridDims, HashGrid, Quantization};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;

fn random_points(n: usize, lo: f32, hi: f32, seed: u64) -> Vec<Vec3> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Vec3::new(
                rng.gen_range(lo..hi),
                rng.gen_range(lo..hi),
                rng.gen_range(lo..hi),
            )
        })
        .collect()
}

fn collect_unique(query: HashGridQuery<'_>) -> HashSet<i32> {
    let mut out = HashSet::new();
    for idx in query {
        assert!(out.insert(idx), "index {} emitted twice", idx);
    }
    out
}

fn one_per_cell(dim: i32) -> Vec<Vec3> {
    let mut points = Vec::new();
    for z in 0..dim {
        for y in 0..dim {
            for x in 0..dim {
                points.push(Vec3::new(x as f32 + 0.5, y as f32 + 0.5, z as f32 + 0.5));
            }
        }
    }
    points
}

#[test]
fn test_empty_grid_yields_nothing() {
    let points: Vec<Vec3> = Vec::new();
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(4).unwrap()).unwrap();
    for radius in [0.0, 0.5, 3.0, 1000.0] {
        let mut q = grid.query([0.25, -3.0, 7.5], radius).unwrap();
        assert_eq!(q.next(), None);
        assert_eq!(q.state(), QueryState::Exhausted);
    }
}

#[test]
fn test_single_cell_query() {
    let points = vec![Vec3::new(0.1, 0.1, 0.1), Vec3::new(0.2, 0.2, 0.2)];
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(2).unwrap()).unwrap();
    let found = collect_unique(grid.query([0.15, 0.15, 0.15], 0.5).unwrap());
    assert_eq!(found, HashSet::from([0, 1]));
}

#[test]
fn test_aliased_cells_are_candidates() {
    let points = vec![Vec3::new(0.5, 0.5, 0.5), Vec3::new(2.5, 0.5, 0.5)];
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(2).unwrap()).unwrap();
    assert_eq!(grid.point_cell(&points[0]), grid.point_cell(&points[1]));

    let center = Vec3::new(0.5, 0.5, 0.5);
    let radius = 0.1;
    let candidates = collect_unique(grid.query(center, radius).unwrap());
    assert_eq!(candidates, HashSet::from([0, 1]));

    let exact: Vec<i32> = grid
        .query(center, radius)
        .unwrap()
        .filter(|&i| points[i as usize].distance(center) <= radius)
        .collect();
    assert_eq!(exact, vec![0]);
}

#[test]
fn test_negative_coordinates_find_themselves() {
    let points = vec![Vec3::new(-0.5, 0.0, 0.0)];
    for mode in [Quantization::Floor, Quantization::Truncate] {
        let grid =
            HashGrid::from_points_with(&points, 1.0, GridDims::cube(4).unwrap(), mode).unwrap();
        let found: Vec<i32> = grid.query(points[0], 0.1).unwrap().collect();
        assert_eq!(found, vec![0], "mode {:?}", mode);
    }
}

#[test]
fn test_large_radius_visits_each_cell_once() {
    let points = one_per_cell(4);
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(4).unwrap()).unwrap();

    for center in [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.7, 2.2, 3.9),
        Vec3::new(-13.25, 40.0, -0.5),
    ] {
        let q = grid.query(center, 1000.0).unwrap();
        let (start, end) = q.bounds();
        assert_eq!(end - start, IVec3::splat(3));
        assert_eq!(q.num_cells(), 64);

        let found = collect_unique(q);
        assert_eq!(found.len(), 64);
        assert_eq!(found, (0..64).collect::<HashSet<i32>>());
    }
}

#[test]
fn test_boundary_walk_order() {
    let points: Vec<Vec3> = (0..8).map(|x| Vec3::new(x as f32, 0.5, 0.5)).collect();
    let grid = HashGrid::from_points(&points, 1.0, GridDims::new(8, 1, 1).unwrap()).unwrap();

    let q = grid.query([3.5, 0.5, 0.5], 1.5).unwrap();
    let (start, end) = q.bounds();
    assert_eq!(start.x, 2);
    assert_eq!(end.x, 5);
    // Single-cell axes clamp to one period.
    assert_eq!(start.y, end.y);
    assert_eq!(start.z, end.z);

    let found: Vec<i32> = q.collect();
    assert_eq!(found, vec![2, 3, 4, 5]);
}

#[test]
fn test_exhaustion_is_idempotent() {
    let points = vec![Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.6, 0.5, 0.5)];
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(4).unwrap()).unwrap();

    let mut q = grid.query([0.5, 0.5, 0.5], 0.2).unwrap();
    assert_eq!(q.state(), QueryState::Fresh);
    assert_eq!(q.next_candidate(), Some(0));
    assert_eq!(q.state(), QueryState::MidCell);
    assert_eq!(q.next_candidate(), Some(1));
    assert_eq!(q.state(), QueryState::Advancing);
    assert_eq!(q.next_candidate(), None);
    assert_eq!(q.state(), QueryState::Exhausted);
    for _ in 0..5 {
        assert_eq!(q.next_candidate(), None);
        assert_eq!(q.state(), QueryState::Exhausted);
    }
}

#[test]
fn test_invalid_query_inputs() {
    let points = vec![Vec3::ZERO];
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(2).unwrap()).unwrap();

    assert_eq!(
        grid.query(Vec3::ZERO, -1.0).unwrap_err(),
        HashGridError::InvalidRadius(-1.0)
    );
    assert!(matches!(
        grid.query(Vec3::ZERO, f32::NAN),
        Err(HashGridError::InvalidRadius(_))
    ));
    assert!(matches!(
        grid.query(Vec3::ZERO, f32::INFINITY),
        Err(HashGridError::InvalidRadius(_))
    ));
    assert_eq!(
        grid.query([f32::NAN, 0.0, 0.0], 1.0).unwrap_err(),
        HashGridError::NonFinitePosition
    );
}

#[test]
fn test_zero_radius_covers_own_cell() {
    let points = random_points(400, -3.0, 3.0, 8);
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(8).unwrap()).unwrap();
    for (i, p) in points.iter().enumerate() {
        let q = grid.query(*p, 0.0).unwrap();
        assert_eq!(q.num_cells(), 1);
        assert!(q.into_iter().any(|j| j == i as i32), "point {} missing", i);
    }
}

#[test]
fn test_completeness_against_bruteforce() {
    let points = random_points(2000, -8.0, 8.0, 42);
    let queries = random_points(200, -9.0, 9.0, 43);
    let dims = GridDims::new(16, 8, 32).unwrap();

    for mode in [Quantization::Floor, Quantization::Truncate] {
        let grid = HashGrid::from_points_with(&points, 0.8, dims, mode).unwrap();
        for (qi, center) in queries.iter().enumerate() {
            let radius = 0.3 + (qi % 7) as f32 * 0.4;
            let found = collect_unique(grid.query(*center, radius).unwrap());
            for (j, p) in points.iter().enumerate() {
                let linf = (*p - *center).abs().max_element();
                if linf <= radius {
                    assert!(
                        found.contains(&(j as i32)),
                        "mode={:?} query={} radius={} missed point {}",
                        mode,
                        qi,
                        radius,
                        j
                    );
                }
            }
        }
    }
}

#[test]
fn test_clamp_returns_every_point_once() {
    let points = random_points(500, -20.0, 20.0, 17);
    let dims = GridDims::new(4, 8, 2).unwrap();
    let cell_width = 1.25;
    let grid = HashGrid::from_points(&points, cell_width, dims).unwrap();

    // Half the largest physical extent: 8 * 1.25 / 2.
    let radius = 5.0;
    let all: HashSet<i32> = (0..points.len() as i32).collect();
    for center in random_points(10, -50.0, 50.0, 18) {
        let q = grid.query(center, radius).unwrap();
        assert!(q.num_cells() <= dims.num_cells());
        assert_eq!(collect_unique(q), all);
    }
}

#[test]
fn test_query_is_deterministic() {
    let points = random_points(1000, -5.0, 5.0, 77);
    let grid = HashGrid::from_points(&points, 0.5, GridDims::cube(16).unwrap()).unwrap();
    let center = Vec3::new(0.3, -1.2, 2.0);
    let a: Vec<i32> = grid.query(center, 1.1).unwrap().collect();
    let b: Vec<i32> = grid.query(center, 1.1).unwrap().collect();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn test_query_batch_matches_serial() {
    let points = random_points(1500, -6.0, 6.0, 5);
    let centers = random_points(300, -6.0, 6.0, 6);
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(8).unwrap()).unwrap();
    let view = grid.view();

    let batch = view
        .query_batch(&centers, 1.0, |i, q| (i, q.collect::<Vec<i32>>()))
        .unwrap();
    assert_eq!(batch.len(), centers.len());
    for (i, (bi, ids)) in batch.iter().enumerate() {
        assert_eq!(*bi, i);
        let serial: Vec<i32> = view.query(centers[i], 1.0).unwrap().collect();
        assert_eq!(ids, &serial);
    }

    assert_eq!(
        view.query_batch(&centers, -0.5, |_, q| q.count()).unwrap_err(),
        HashGridError::InvalidRadius(-0.5)
    );
}

#[test]
fn test_view_point_id_lookup() {
    let points = vec![Vec3::new(1.5, 0.5, 0.5), Vec3::new(0.5, 0.5, 0.5)];
    let grid = HashGrid::from_points(&points, 1.0, GridDims::cube(2).unwrap()).unwrap();
    let view = grid.view();
    assert_eq!(view.point_id(0), 1);
    assert_eq!(view.point_id(1), 0);
    assert_eq!(grid.point_id(0), 1);
    assert_eq!(view.get_point_id(2), None);
}
