// Demonstration: roll out a policy on a synthetic grid scan and score it.
//
// Run from this repo root:
//   cargo run --example oracle_rollout -- --policy teacher --batches 10

use std::env;
use std::error::Error;
use std::sync::Arc;

use r2r_nav::episode::{mint_tasks, EnvConfig, NavBatch, PathId, PathRecord};
use r2r_nav::features::FeatureSource;
use r2r_nav::graph::{InMemoryConnectivity, NavGraph, NavGraphStore, Point3};
use r2r_nav::metrics::EvaluationMetrics;
use r2r_nav::policy::{Policy, RandomPolicy, TeacherPolicy};
use r2r_nav::sim::GraphSimulatorFactory;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SCAN: &str = "grid";
const SIDE: usize = 5;
const SPACING: f64 = 2.5;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("teacher");
    let batches: usize = arg_value(&args, "--batches")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);

    let graphs = Arc::new(NavGraphStore::load(
        &InMemoryConnectivity::new().with(grid()?),
        [SCAN],
    )?);
    let records = sample_records(&graphs, 40, seed)?;

    let mut policy: Box<dyn Policy> = match policy_name {
        "teacher" => Box::new(TeacherPolicy::new()),
        "random" => Box::new(RandomPolicy::new(seed)),
        other => {
            eprintln!("Unknown --policy '{}'; expected 'teacher' or 'random'.", other);
            std::process::exit(2);
        }
    };

    let config = EnvConfig {
        batch_size: 8,
        seed,
        ..EnvConfig::default()
    };
    let mut env = NavBatch::new(
        config,
        mint_tasks(&records, None),
        Arc::clone(&graphs),
        FeatureSource::placeholder(),
        GraphSimulatorFactory::new(graphs),
    )?;

    let metrics = EvaluationMetrics::evaluate(&mut env, policy.as_mut(), batches, 60)?;
    println!("Policy: {}", policy.name());
    println!("{}", metrics);
    Ok(())
}

/// Square lattice of viewpoints with 4-neighbour edges.
fn grid() -> Result<NavGraph, Box<dyn Error>> {
    let mut g = NavGraph::new(SCAN);
    for row in 0..SIDE {
        for col in 0..SIDE {
            let point = Point3::new(col as f64 * SPACING, row as f64 * SPACING, 1.5);
            g.add_viewpoint(node(row, col), point)?;
        }
    }
    for row in 0..SIDE {
        for col in 0..SIDE {
            if col + 1 < SIDE {
                g.connect(&node(row, col), &node(row, col + 1))?;
            }
            if row + 1 < SIDE {
                g.connect(&node(row, col), &node(row + 1, col))?;
            }
        }
    }
    Ok(g)
}

fn node(row: usize, col: usize) -> String {
    format!("r{row}c{col}")
}

/// Random start/goal pairs, each routed along its shortest path.
fn sample_records(
    graphs: &NavGraphStore,
    n: usize,
    seed: u64,
) -> Result<Vec<PathRecord>, Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut records = Vec::with_capacity(n);
    while records.len() < n {
        let start = node(rng.gen_range(0..SIDE), rng.gen_range(0..SIDE));
        let goal = node(rng.gen_range(0..SIDE), rng.gen_range(0..SIDE));
        if start == goal {
            continue;
        }
        records.push(PathRecord {
            scan: SCAN.into(),
            path: graphs.path_between(SCAN, &start, &goal)?,
            heading: rng.gen_range(0.0..std::f64::consts::TAU),
            instructions: vec![format!("walk from {start} to {goal}")],
            path_id: PathId::Int(records.len() as u64),
            distance: None,
        });
    }
    Ok(records)
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
