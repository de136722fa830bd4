//! Ebb & Bloom Genesis CLI
//!
//! Run verification scenarios over one or many seeds, or export a world.

use bloom_env::{BloomResult, Seed};
use bloom_sim::scenarios::ScenarioId;
use bloom_sim::{record_genesis, ScenarioResult, ScenarioRunner, SimConfig};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Frames are recorded every this many N-body steps.
const EXPORT_INTERVAL: usize = 10;

/// Ebb & Bloom deterministic genesis CLI
#[derive(Parser, Debug)]
#[command(name = "bloom-sim")]
#[command(about = "Run deterministic genesis scenarios for Ebb & Bloom", long_about = None)]
struct Args {
    /// Master seed, text or integer (defaults to the config file's seed)
    #[arg(short, long)]
    seed: Option<String>,

    /// Scenario to run (determinism, rng_moments, noise_bounds, lotka_volterra,
    /// extinction, two_body_merge, sterile_system, genesis, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,

    /// Number of seeds to test; more than one runs `<seed>-1` .. `<seed>-n`
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// N-body steps
    #[arg(long)]
    steps: Option<usize>,

    /// N-body step length in years
    #[arg(long)]
    dt: Option<f64>,

    /// JSON world configuration (partial files are fine)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export genesis frames to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    // Logs go to stderr so `--json` keeps stdout a single document
    let level = match (args.verbose, args.json) {
        (true, _) => Level::DEBUG,
        (false, true) => Level::WARN,
        (false, false) => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("bloom-sim: {}", e);
            std::process::exit(2);
        }
    };

    if !args.json {
        info!("Ebb & Bloom Genesis Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    if let Some(export_path) = &args.export {
        match run_export(config, export_path) {
            Ok(()) => return,
            Err(e) => {
                error!("✗ export failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let scenarios = match select_scenarios(&args.scenario) {
        Some(list) => list,
        None => {
            let names: Vec<&str> = ScenarioId::all().iter().map(|s| s.name()).collect();
            eprintln!("Unknown scenario `{}`; choose from: {}, all", args.scenario, names.join(", "));
            std::process::exit(2);
        }
    };

    let results = sweep(&args, &config, &scenarios);
    let failures = results.iter().filter(|r| !r.passed).count();

    if args.json {
        print_json(&results);
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failures == 0 {
            info!("✅ {} runs over {} seed(s) passed", results.len(), args.seeds.max(1));
        } else {
            error!("❌ {} of {} runs failed", failures, results.len());
            for r in results.iter().filter(|r| !r.passed) {
                error!("  - {} seed={}: {}", r.scenario.name(), r.seed, reason(r));
            }
        }
    }

    // Non-zero exit for CI
    if failures > 0 {
        std::process::exit(1);
    }
}

/// Every requested scenario on every seed of the sweep, in order.
fn sweep(args: &Args, config: &SimConfig, scenarios: &[ScenarioId]) -> Vec<ScenarioResult> {
    let mut results = Vec::with_capacity(scenarios.len() * args.seeds.max(1));
    for seed in seed_list(&config.seed, args.seeds) {
        let runner = ScenarioRunner::new(seed).with_config(config.clone());
        for &id in scenarios {
            let outcome = runner.run(id);
            if !args.json {
                if outcome.passed {
                    info!("✓ {:<16} seed={} t={:.4}", id.name(), outcome.seed, outcome.final_time);
                } else {
                    error!("✗ {:<16} seed={}: {}", id.name(), outcome.seed, reason(&outcome));
                }
            }
            results.push(outcome);
        }
    }
    results
}

fn reason(result: &ScenarioResult) -> &str {
    result.failure_reason.as_deref().unwrap_or("unknown")
}

fn print_json(results: &[ScenarioResult]) {
    let failed = results.iter().filter(|r| !r.passed).count();
    let runs: Vec<_> = results
        .iter()
        .map(|r| {
            serde_json::json!({
                "scenario": r.scenario.name(),
                "seed": r.seed,
                "passed": r.passed,
                "steps": r.total_steps,
                "final_time": r.final_time,
                "bodies": r.final_body_count,
                "metrics": r.metrics,
                "failure_reason": r.failure_reason,
            })
        })
        .collect();
    let summary = serde_json::json!({
        "runs": results.len(),
        "failed": failed,
        "results": runs,
    });
    match serde_json::to_string_pretty(&summary) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to serialize summary: {}", e),
    }
}

fn select_scenarios(name: &str) -> Option<Vec<ScenarioId>> {
    match name {
        "all" => Some(ScenarioId::all()),
        other => other.parse().ok().map(|id| vec![id]),
    }
}

/// Config file (if any) with command-line overrides applied.
fn load_config(args: &Args) -> BloomResult<SimConfig> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_json_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = &args.seed {
        config.seed = parse_seed(seed);
    }
    if let Some(steps) = args.steps {
        config.steps = steps;
    }
    if let Some(dt) = args.dt {
        config.dt = dt;
    }
    config.validate()?;
    Ok(config)
}

/// Integers become numeric seeds; anything else is a text seed.
fn parse_seed(raw: &str) -> Seed {
    raw.parse::<u64>().map(Seed::from).unwrap_or_else(|_| Seed::from(raw))
}

fn seed_list(base: &Seed, count: usize) -> Vec<Seed> {
    if count <= 1 {
        return vec![base.clone()];
    }
    (1..=count).map(|i| Seed::from(format!("{}-{}", base, i))).collect()
}

fn run_export(config: SimConfig, path: &Path) -> BloomResult<()> {
    info!("Running with export to: {}", path.display());
    let seed = config.seed.clone();
    let (export, report) = record_genesis(config, EXPORT_INTERVAL)?;
    export.write_to_file(path)?;

    info!(
        "✓ genesis (seed={}) exported {} frames to {} ({} bodies, fingerprint {:016x})",
        seed,
        export.frames.len(),
        path.display(),
        report.bodies.len(),
        report.fingerprint
    );
    Ok(())
}
