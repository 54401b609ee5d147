// Resonance Simulation Runner - seeded parameter-evolution driver
// Steps the core over the demo topology, models one transfer per step, gates
// one sampled block proposal per step and optionally streams a per-step
// JSONL time series.
//
// Usage:
//   cargo run --release --bin resonance                        # 100 steps, seed 0
//   cargo run --release --bin resonance -- --steps 500         # Longer run
//   cargo run --release --bin resonance -- --seed 42           # Custom seed
//   cargo run --release --bin resonance -- --config run.json   # JSON config
//   cargo run --release --bin resonance -- --route A:D         # Route lookup each step
//   cargo run --release --bin resonance -- --time-series       # Enable JSONL output
//   RUST_LOG=resonance_engine=debug cargo run --bin resonance  # Controller + routing logs

mod time_series;
mod traffic;

use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use resonance_engine::{ConfigError, NetworkGraph, NodeId, SimulationConfig, SimulationCore};
use time_series::{StepSnapshot, TimeSeriesWriter};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use traffic::TransferModel;

const INITIAL_BALANCE: f64 = 1000.0;
const TIME_SERIES_DIR: &str = "resonance-results/time-series";

/// Demo topology: `(from, to, latency, fee)`.
const DEMO_EDGES: [(&str, &str, f64, f64); 7] = [
    ("A", "B", 0.1, 0.01),
    ("B", "C", 0.2, 0.02),
    ("C", "D", 0.15, 0.015),
    ("D", "E", 0.25, 0.025),
    ("A", "E", 0.5, 0.005),
    ("B", "D", 0.3, 0.01),
    ("A", "C", 0.4, 0.03),
];

#[derive(Debug, thiserror::Error)]
enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid argument: {0}")]
    Argument(String),
}

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    steps: u64,
    seed: Option<u64>,
    config: Option<PathBuf>,
    route: Option<(NodeId, NodeId)>,
    time_series: bool,
}

fn parse_args() -> Result<CliArgs, DriverError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs { steps: 100, seed: None, config: None, route: None, time_series: false };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--steps" => {
                i += 1;
                if i < args.len() {
                    cli.steps = args[i].parse().unwrap_or(100);
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    cli.seed = args[i].parse().ok();
                }
            }
            "--config" => {
                i += 1;
                if i < args.len() {
                    cli.config = Some(PathBuf::from(&args[i]));
                }
            }
            "--route" => {
                i += 1;
                if i < args.len() {
                    let (from, to) = args[i]
                        .split_once(':')
                        .ok_or_else(|| DriverError::Argument(format!("--route expects SRC:DST, got `{}`", args[i])))?;
                    cli.route = Some((NodeId::from(from), NodeId::from(to)));
                }
            }
            "--time-series" => {
                cli.time_series = true;
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
            }
        }
        i += 1;
    }

    Ok(cli)
}

fn load_config(cli: &CliArgs) -> Result<SimulationConfig, DriverError> {
    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn demo_topology() -> Result<NetworkGraph, ConfigError> {
    NetworkGraph::with_edges(["A", "B", "C", "D", "E"], &DEMO_EDGES)
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = parse_args().and_then(|cli| run(&cli)) {
        error!(error = %e, "simulation aborted");
        std::process::exit(1);
    }
}

fn run(cli: &CliArgs) -> Result<(), DriverError> {
    let config = load_config(cli)?;
    let mut core = SimulationCore::new(demo_topology()?, &config)?;
    // transfers and block proposals draw from their own streams so the
    // core's sequence is unaffected
    let mut proposals = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(2));
    let mut transfers = TransferModel::new(
        ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(1)),
        core.graph().node_ids(),
        INITIAL_BALANCE,
    );
    let mut writer = if cli.time_series {
        Some(TimeSeriesWriter::create(Path::new(TIME_SERIES_DIR), config.seed, core.strategy_name())?)
    } else {
        None
    };
    let (sender, receiver) = (NodeId::from("A"), NodeId::from("E"));
    let fee = core.hamiltonian().fee();

    info!(
        steps = cli.steps,
        seed = config.seed,
        gradient = core.strategy_name(),
        nodes = core.graph().len(),
        edges = core.graph().edge_count(),
        "resonance run starting"
    );

    let start = Instant::now();
    let mut route_failures = 0u64;
    let mut blocks_admitted = 0u64;
    let mut last_route = None;

    for _ in 0..cli.steps {
        let report = core.step();

        let amount = transfers.sample_amount();
        let fee_mean = core.field().mean_of(fee);
        if let Some(t) = transfers.transfer(&sender, &receiver, amount, fee_mean) {
            debug!(sender = %t.sender, receiver = %t.receiver, amount = t.amount, perturbation = t.perturbation, "transfer settled");
            core.apply_transfer_perturbation(&t.receiver, t.perturbation);
        }

        let block = core.propose_block(&mut proposals);
        let admitted = core.admit_block(&block);
        if admitted {
            blocks_admitted += 1;
            debug!(step = report.step, block_size = block.block_size, fee_rate = block.fee_rate, "block admitted");
        }

        let route_action = match &cli.route {
            Some((from, to)) => match core.route(from, to) {
                Ok(route) => {
                    let action = route.action;
                    last_route = Some(route);
                    Some(action)
                }
                Err(e) => {
                    route_failures += 1;
                    warn!(step = report.step, error = %e, "route lookup failed");
                    None
                }
            },
            None => None,
        };

        if let Some(w) = writer.as_mut() {
            w.record(&StepSnapshot::capture(&core, &report, route_action, admitted))?;
        }
    }

    let elapsed = start.elapsed();

    // ─── Summary ────────────────────────────────────────────────────────

    let field = core.field();
    let weights = core.weights();
    println!("\n  Resonance Simulation Runner");
    println!("  PRNG: ChaCha8Rng | Seed: {} | Gradient: {}", config.seed, core.strategy_name());
    println!("  {}", "-".repeat(60));
    println!("  Steps:               {:>10}", core.step_count());
    for id in field.param_ids() {
        let p = field.parameter(id);
        println!("  Mean {:<15} {:>10.5}  [{}, {}]", p.name(), p.mean(), p.min(), p.max());
    }
    println!("  Hamiltonian:         {:>10.5}", core.energy().value);
    println!("  Cap events:          {:>10}", core.cap_events());
    println!("  Mean imbalance:      {:>10.5}", core.imbalance().mean());
    println!("  Imbalance saturated: {:>10}", core.imbalance_saturations());
    println!("  Blocks admitted:     {:>10}", blocks_admitted);
    println!("  Transfers:           {:>10}", transfers.transfer_count);
    println!("  Ledger total:        {:>10.3}", transfers.total_balance());
    println!(
        "  Weights:             order {:.4} | eff {:.4} | rob {:.4} | unc {:.4} | imb {:.4}",
        weights.order, weights.efficiency, weights.robustness, weights.uncertainty_penalty, weights.imbalance_penalty
    );
    if let Some(record) = core.history().latest() {
        println!("  Confirmation time:   {:>10.4}", record.confirmation_time);
    }
    if let Some(route) = &last_route {
        let path: Vec<&str> = route.path.iter().map(NodeId::as_str).collect();
        println!("  Route:               {} (action {:.4}, {} candidates)", path.join(" -> "), route.action, route.candidates);
    }
    if cli.route.is_some() {
        println!("  Route failures:      {:>10}", route_failures);
    }
    println!("  Elapsed:             {:>8}ms", elapsed.as_millis());

    if let Some(w) = writer {
        let (path, lines) = w.finish()?;
        println!("  Time series:         {} lines -> {}", lines, path.display());
    }
    println!();
    Ok(())
}
