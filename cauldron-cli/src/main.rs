use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod scenario;

use scenario::Scenario;

/// Replays a lending market scenario against in-memory collaborators and
/// prints the resulting market summary as json.
#[derive(clap::Parser, Debug)]
struct Args {
    /// Scenario file
    #[clap(long, env = "CAULDRON_SCENARIO")]
    scenario: PathBuf,
    /// Stop at the first failing step
    #[clap(long, env = "CAULDRON_FAIL_FAST", default_value_t = false)]
    fail_fast: bool,
    /// Include the encoded event log in the report
    #[clap(long, default_value_t = false)]
    events: bool,
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
        .init();
    let args = Args::parse();
    let scenario = Scenario::load(&args.scenario)?;
    tracing::info!(
        "Running {} steps from {}",
        scenario.steps.len(),
        args.scenario.display()
    );
    let report = scenario.run(args.fail_fast, args.events)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.failed_steps > 0 && args.fail_fast {
        anyhow::bail!("scenario stopped after a failing step");
    }
    Ok(())
}
