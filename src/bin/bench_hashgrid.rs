//! Benchmark r3-hashgrid build and query throughput.
//!
//! Run with: cargo run --release --features cli --bin bench_hashgrid
//!
//! Usage:
//!   bench_hashgrid              Run default size (1m)
//!   bench_hashgrid 100k 1m 10m  Run multiple sizes
//!   bench_hashgrid -n 10        Run 10 iterations (for profiling)
//!
//! For per-step build timing, add `--features timing`.

use clap::Parser;
use r3_hashgrid::validation::validate;
use r3_hashgrid::{GridDims, HashGrid, HashGridConfig, Point3};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, Write};
use std::time::Instant;

fn parse_count(s: &str) -> Result<usize, String> {
    let s = s.to_lowercase();
    let (num_str, multiplier) = if s.ends_with('m') {
        (&s[..s.len() - 1], 1_000_000)
    } else if s.ends_with('k') {
        (&s[..s.len() - 1], 1_000)
    } else {
        (s.as_str(), 1)
    };

    num_str
        .parse::<f64>()
        .map(|n| (n * multiplier as f64) as usize)
        .map_err(|e| format!("Invalid number '{}': {}", s, e))
}

#[derive(Parser)]
#[command(name = "bench_hashgrid")]
#[command(about = "Benchmark r3-hashgrid at various scales")]
struct Args {
    /// Point counts to benchmark (e.g., 100k, 1m, 10M)
    #[arg(value_parser = parse_count)]
    sizes: Vec<usize>,

    /// Random seed
    #[arg(short, long, default_value_t = 12345)]
    seed: u64,

    /// Grid extent per axis (power of two)
    #[arg(long, default_value_t = 128)]
    dim: i32,

    /// Cell width; the query radius defaults to the same value
    #[arg(long, default_value_t = 1.0)]
    cell_width: f32,

    /// Query radius
    #[arg(long)]
    radius: Option<f32>,

    /// Mean points per unit cube of the generated cloud
    #[arg(long, default_value_t = 4.0)]
    density: f32,

    /// Number of queries per size
    #[arg(long, value_parser = parse_count, default_value = "100k")]
    queries: usize,

    /// Check build invariants after each build (slow)
    #[arg(long)]
    validate: bool,

    /// Number of iterations to run (useful for profiling)
    #[arg(short = 'n', long, default_value_t = 1)]
    repeat: usize,
}

fn generate_points<R: Rng>(n: usize, half_extent: f32, rng: &mut R) -> Vec<Point3> {
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

fn format_rate(count: usize, ms: f64) -> String {
    if ms <= 0.0 {
        return "N/A".to_string();
    }
    let per_sec = count as f64 / (ms / 1000.0);
    if per_sec >= 1_000_000.0 {
        format!("{:.2}M/s", per_sec / 1_000_000.0)
    } else if per_sec >= 1_000.0 {
        format!("{:.1}k/s", per_sec / 1000.0)
    } else {
        format!("{:.0}/s", per_sec)
    }
}

fn format_num(n: usize) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{}k", n / 1_000)
    } else {
        format!("{}", n)
    }
}

struct BenchResult {
    n: usize,
    build_ms: f64,
    query_ms: f64,
    candidates: usize,
    neighbors: usize,
}

fn run_queries(
    grid: &HashGrid,
    points: &[Point3],
    centers: &[Point3],
    radius: f32,
) -> (usize, usize) {
    let r2 = radius * radius;
    let counts = grid
        .view()
        .query_batch(centers, radius, |i, query| {
            let center = centers[i];
            let mut candidates = 0usize;
            let mut neighbors = 0usize;
            for idx in query {
                candidates += 1;
                if points[idx as usize].distance_squared(center) <= r2 {
                    neighbors += 1;
                }
            }
            (candidates, neighbors)
        })
        .expect("query radius must be finite and non-negative");
    counts
        .iter()
        .fold((0, 0), |(c, nb), &(ci, ni)| (c + ci, nb + ni))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    println!("r3-hashgrid Benchmark");
    println!("=====================\n");

    let sizes: Vec<usize> = if args.sizes.is_empty() {
        vec![1_000_000]
    } else {
        args.sizes
    };
    let radius = args.radius.unwrap_or(args.cell_width);
    let dims = match GridDims::cube(args.dim) {
        Ok(dims) => dims,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    println!("Configuration:");
    println!("  seed = {}", args.seed);
    println!("  dims = {}^3", args.dim);
    println!("  cell width = {}, radius = {}", args.cell_width, radius);
    println!("  density = {} points/unit^3", args.density);
    println!(
        "  sizes = {:?}",
        sizes.iter().map(|&n| format_num(n)).collect::<Vec<_>>()
    );
    if args.repeat > 1 {
        println!("  repeat = {}", args.repeat);
    }

    #[cfg(feature = "timing")]
    println!("  timing = enabled (per-step build timing will be printed)");

    let mut results: Vec<BenchResult> = Vec::new();

    for &n in &sizes {
        println!("\n{}", "=".repeat(60));
        println!("Benchmarking n = {}", format_num(n));
        println!("{}", "=".repeat(60));

        let t_gen = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
        let half_extent = 0.5 * (n as f32 / args.density).cbrt().max(1.0);
        let points = generate_points(n, half_extent, &mut rng);
        let centers = generate_points(args.queries, half_extent, &mut rng);
        let gen_time = t_gen.elapsed().as_secs_f64() * 1000.0;
        println!("Point generation: {:.1}ms", gen_time);

        let mut grid = HashGrid::with_config(HashGridConfig {
            dims,
            cell_width: args.cell_width,
            max_points: n,
            ..Default::default()
        })
        .expect("cell width must be finite and positive");

        let mut build_times: Vec<f64> = Vec::with_capacity(args.repeat);
        let mut query_times: Vec<f64> = Vec::with_capacity(args.repeat);
        let mut totals = (0, 0);

        for iter in 0..args.repeat {
            if args.repeat > 1 {
                print!("  Iteration {}/{}... ", iter + 1, args.repeat);
                io::stdout().flush().unwrap();
            }

            let t0 = Instant::now();
            #[cfg(feature = "timing")]
            {
                let mut timings = r3_hashgrid::HashGridBuildTimings::default();
                grid.update_with_timings(&points, args.cell_width, &mut timings)
                    .expect("build should succeed");
                eprintln!(
                    "[timing] assign={:?} ranges={:?} scatter={:?} total={:?}",
                    timings.assign,
                    timings.ranges,
                    timings.scatter,
                    timings.total()
                );
            }
            #[cfg(not(feature = "timing"))]
            grid.update(&points, args.cell_width)
                .expect("build should succeed");
            build_times.push(t0.elapsed().as_secs_f64() * 1000.0);

            let t1 = Instant::now();
            totals = run_queries(&grid, &points, &centers, radius);
            query_times.push(t1.elapsed().as_secs_f64() * 1000.0);

            if args.repeat > 1 {
                println!(
                    "build {:.1}ms, query {:.1}ms",
                    build_times[iter], query_times[iter]
                );
            }
        }

        if args.validate {
            let report = validate(&grid, &points);
            println!("Validation: {}", report);
        }

        let avg = |times: &[f64]| times.iter().sum::<f64>() / times.len().max(1) as f64;
        let result = BenchResult {
            n,
            build_ms: avg(&build_times),
            query_ms: avg(&query_times),
            candidates: totals.0,
            neighbors: totals.1,
        };

        let stats = grid.stats();
        println!("\nResults:");
        println!(
            "  Build time:    {:>8.1}ms ({})",
            result.build_ms,
            format_rate(n, result.build_ms)
        );
        println!(
            "  Query time:    {:>8.1}ms ({})",
            result.query_ms,
            format_rate(centers.len(), result.query_ms)
        );
        println!(
            "  Occupied:      {:>8} / {}",
            format_num(stats.occupied_cells),
            format_num(stats.num_cells)
        );
        println!("  Max/cell:      {:>8}", stats.max_occupancy);
        println!("  Mean/cell:     {:>8.2}", stats.mean_occupancy);
        if !centers.is_empty() {
            println!(
                "  Candidates/q:  {:>8.2}",
                result.candidates as f64 / centers.len() as f64
            );
            println!(
                "  Neighbors/q:   {:>8.2}",
                result.neighbors as f64 / centers.len() as f64
            );
        }

        results.push(result);
    }

    if results.len() > 1 {
        println!("\n\n{}", "=".repeat(60));
        println!("SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "{:>10} | {:>10} | {:>12} | {:>10}",
            "n", "build", "build rate", "query"
        );
        println!("{:-<10}-+-{:-<10}-+-{:-<12}-+-{:-<10}", "", "", "", "");

        for r in &results {
            println!(
                "{:>10} | {:>8.1}ms | {:>12} | {:>8.1}ms",
                format_num(r.n),
                r.build_ms,
                format_rate(r.n, r.build_ms),
                r.query_ms
            );
        }
    }

    println!("\nBenchmark complete.");
}
