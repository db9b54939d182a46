//! Microgrid simulator entry point: CLI wiring and scenario execution.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use microgrid_sim::config::{PolicyKind, ScenarioConfig};
use microgrid_sim::error::ScenarioError;
use microgrid_sim::io::export::export_csv;
use microgrid_sim::runner::run_scenario;

#[derive(Parser, Debug)]
#[command(name = "microgrid-sim", version)]
#[command(about = "Microgrid state-transition and cost simulator", long_about = None)]
struct Args {
    /// Load scenario from a TOML file
    #[arg(long, conflicts_with = "preset")]
    scenario: Option<PathBuf>,

    /// Use a built-in preset (baseline, convex_pricing, discrete_agent)
    #[arg(long)]
    preset: Option<String>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override the episode length in hours
    #[arg(long)]
    steps: Option<usize>,

    /// Override the decision policy
    #[arg(long, value_enum)]
    policy: Option<PolicyKind>,

    /// Export step results to CSV
    #[arg(long, env = "MICROGRID_TELEMETRY_OUT")]
    telemetry_out: Option<PathBuf>,

    /// Print only the episode report
    #[arg(short, long)]
    quiet: bool,

    /// Start REST API server after simulation
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,

    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

fn load_scenario(args: &Args) -> Result<ScenarioConfig> {
    // --scenario takes priority, then --preset, then baseline default
    let mut scenario = if let Some(path) = &args.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(name) = &args.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::baseline()
    };

    if let Some(seed) = args.seed {
        scenario.simulation.seed = seed;
    }
    if let Some(steps) = args.steps {
        scenario.simulation.steps = Some(steps);
    }
    if let Some(policy) = args.policy {
        scenario.simulation.policy = policy;
    }
    Ok(scenario)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let scenario = load_scenario(&args)?;

    let run = match run_scenario(&scenario) {
        Ok(run) => run,
        Err(ScenarioError::Invalid(errors)) => {
            for e in &errors {
                eprintln!("{e}");
            }
            bail!("scenario has {} invalid field(s)", errors.len());
        }
        Err(e) => return Err(e).context("simulation failed"),
    };

    if !args.quiet {
        for r in &run.results {
            println!("{r}");
        }
        println!();
    }
    println!("{}", run.report);

    if let Some(path) = &args.telemetry_out {
        export_csv(&run.results, path)
            .with_context(|| format!("failed to write CSV to {}", path.display()))?;
        info!(path = %path.display(), "telemetry written");
    }

    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(microgrid_sim::api::AppState::from(run));
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
        rt.block_on(microgrid_sim::api::serve(state, addr))
            .context("API server failed")?;
    }

    Ok(())
}
