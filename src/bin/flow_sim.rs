use clap::Parser;
use pfabric_sim::fabric::FlowSim;
use pfabric_sim::sim::ScenarioSpec;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "flow-sim",
    about = "Run a leaf-spine flow-level scenario and print per-flow completion times"
)]
struct Args {
    /// Path to scenario.json
    #[arg(long)]
    scenario: PathBuf,

    /// Override the scheduling method: pfabric or maxmin
    #[arg(long)]
    method: Option<String>,

    /// Write per-flow summaries as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Disable logging entirely
    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(if args.quiet {
            tracing_subscriber::EnvFilter::new("off")
        } else {
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
        })
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let raw = fs::read_to_string(&args.scenario)
        .map_err(|e| format!("read {}: {e}", args.scenario.display()))?;
    let mut spec: ScenarioSpec =
        serde_json::from_str(&raw).map_err(|e| format!("parse scenario: {e}"))?;
    if let Some(method) = &args.method {
        spec.method = method.clone();
    }

    let mut sim = FlowSim::from_scenario(&spec).map_err(|e| e.to_string())?;
    let report = sim.run_simulation().map_err(|e| e.to_string())?;

    for s in &report.summaries {
        println!(
            "flow_fct {} {:.9} {} {:.3}",
            s.flow_id, s.completion_time, s.size_bytes, s.average_rate
        );
    }
    println!(
        "done events={} flows={} final_time={:.9} mean_fct={:.9}",
        report.events,
        report.summaries.len(),
        report.final_time,
        report.mean_fct().unwrap_or(0.0)
    );

    if let Some(path) = &args.json {
        let json = serde_json::to_string_pretty(&report.summaries)
            .map_err(|e| format!("serialize summaries: {e}"))?;
        fs::write(path, json).map_err(|e| format!("write {}: {e}", path.display()))?;
    }
    Ok(())
}
