//! Tubule Simulator X - Entry point
//!
//! Headless runner for one PCT epithelial patch.
//!
//! CLI Usage:
//!   cargo run                              # Run with default parameters
//!   cargo run -- --diagnose                # Print per-transporter diagnostics
//!   cargo run -- -n 5000 --dt 1e-4 --seed 7 --export

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tubule_simulator_x::{
    config::{Parameters, DEFAULT_PARAMETER_DIR},
    export::{export_state_json, CsvExporter},
    simulation::TubuleSimulation,
};

/// CSV sample interval (simulated seconds)
const CSV_SAMPLE_INTERVAL_SEC: f64 = 0.01;

struct CliOptions {
    diagnose: bool,
    steps: Option<u64>,
    dt_sec: Option<f64>,
    seed: Option<u64>,
    params_dir: PathBuf,
    export: bool,
}

/// Parse CLI arguments
fn parse_args() -> CliOptions {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = CliOptions {
        diagnose: false,
        steps: None,
        dt_sec: None,
        seed: None,
        params_dir: PathBuf::from(DEFAULT_PARAMETER_DIR),
        export: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--diagnose" | "-d" => opts.diagnose = true,
            "--export" | "-e" => opts.export = true,
            "-n" | "--steps" => {
                i += 1;
                if i < args.len() {
                    opts.steps = args[i].parse().ok();
                }
            }
            "--dt" => {
                i += 1;
                if i < args.len() {
                    opts.dt_sec = args[i].parse().ok();
                }
            }
            "--seed" => {
                i += 1;
                if i < args.len() {
                    opts.seed = args[i].parse().ok();
                }
            }
            "--params" | "-p" => {
                i += 1;
                if i < args.len() {
                    opts.params_dir = PathBuf::from(&args[i]);
                }
            }
            "--help" | "-h" => {
                println!("Tubule Simulator X");
                println!();
                println!("Usage: tubule-simulator-x [OPTIONS]");
                println!();
                println!("Options:");
                println!("  --diagnose, -d     Print per-transporter diagnostics");
                println!("  -n, --steps N      Number of ticks (default: duration / dt)");
                println!("  --dt SEC           Tick length in seconds (default: 1e-3)");
                println!("  --seed N           RNG seed for a reproducible run");
                println!("  --params, -p DIR   Parameter directory (default: {})", DEFAULT_PARAMETER_DIR);
                println!("  --export, -e       Write JSON state and CSV time series to exports/");
                println!("  --help, -h         Show this help");
                std::process::exit(0);
            }
            other => log::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }

    opts
}

fn main() -> Result<()> {
    env_logger::init();

    let opts = parse_args();

    println!("=== Tubule Simulator X - PCT Epithelium ===\n");

    let mut params = Parameters::load_from_dir(&opts.params_dir);
    if let Some(dt) = opts.dt_sec {
        params.simulation.dt_sec = dt;
    }
    if opts.seed.is_some() {
        params.simulation.seed = opts.seed;
    }

    params.simulation.validate().context("invalid simulation parameters")?;

    let mut sim = TubuleSimulation::new(&params).context("building tubule simulation")?;
    let steps = match opts.steps {
        Some(steps) => steps,
        None => params.simulation.step_count()?,
    };

    println!("Compartments: {}", sim.context().len());
    for t in sim.transporters() {
        println!("  {:<14} {:<14} inert={}", t.id(), t.kind().to_string(), t.is_inert());
    }
    println!("\n--- Running {} ticks of {:.1e} s ---\n", steps, sim.dt_sec());

    let mut csv = if opts.export {
        Some(CsvExporter::new(CSV_SAMPLE_INTERVAL_SEC)?)
    } else {
        None
    };

    let start_time = Instant::now();
    for step in 0..steps {
        sim.step();

        if let Some(exporter) = csv.as_mut() {
            exporter.maybe_record(&sim.metrics())?;
        }

        // Report progress every 10%
        if steps >= 10 && step % (steps / 10) == 0 {
            let m = sim.metrics();
            println!(
                "  {:3.0}%: t={:.3} s, V_m={:.2} mV, cell Na+={:.2} mM, lumen glucose={:.3} mM",
                (step as f64 / steps as f64) * 100.0,
                m.simulation_time_sec,
                m.membrane_potential_mV,
                m.cell_na_mM,
                m.lumen_glucose_mM
            );
        }
    }
    let elapsed = start_time.elapsed();

    println!("\n=== Results ===");
    println!("Elapsed time: {:.2?}", elapsed);
    if elapsed.as_secs_f64() > 0.0 {
        println!("Ticks per second: {:.0}", steps as f64 / elapsed.as_secs_f64());
    }
    println!();

    let diagnostics = sim.diagnostics();
    if opts.diagnose {
        diagnostics.print_summary();
    } else {
        let m = &diagnostics.metrics;
        println!("V_m: {:.2} mV (GHK {:.2} mV)", m.membrane_potential_mV, m.ghk_potential_mV);
        println!("Cell Na+/K+: {:.2} / {:.2} mM", m.cell_na_mM, m.cell_k_mM);
        println!("Glucose reabsorbed: {:.2}%", m.glucose_reabsorbed_fraction * 100.0);
        for (id, cycles) in &m.transporter_cycles {
            println!("  {}: {} cycles", id, cycles);
        }
    }

    println!("\n=== Diagnostic Checks ===");
    let warnings = diagnostics.validate_state();
    if warnings.is_empty() {
        println!("✓ All checks passed");
    } else {
        for w in &warnings {
            println!("⚠️  WARNING: {}", w);
        }
    }

    if let Some(exporter) = csv {
        let path = exporter.finish()?;
        println!("\nTime series: {}", path.display());
    }
    if opts.export {
        let path = export_state_json(&diagnostics)?;
        println!("State: {}", path.display());
    }

    Ok(())
}
