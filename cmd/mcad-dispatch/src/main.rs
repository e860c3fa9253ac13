mod cycle;

use clap::Parser;
use pkg_constants::paths::{DEFAULT_DISPATCH_CONFIG, DEFAULT_SNAPSHOT};
use pkg_types::config::{DispatchConfigFile, LogFormat, load_config_file, load_snapshot};
use pkg_types::pod::ResourceList;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mcad-dispatch",
    about = "Run one AppWrapper dispatch cycle against namespace quotas"
)]
struct Cli {
    /// Path to YAML config file
    #[arg(long, short, default_value = DEFAULT_DISPATCH_CONFIG)]
    config: String,

    /// Snapshot of quotas, external demand and AppWrappers
    #[arg(long, short)]
    snapshot: Option<String>,

    /// Print decisions as JSON
    #[arg(long)]
    json: bool,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config file (returns defaults if file not found)
    let file_cfg: DispatchConfigFile = load_config_file(&cli.config)?;
    init_tracing(file_cfg.log_format.unwrap_or_default());
    info!("Config file: {}", cli.config);

    // Merge: CLI args > config file > defaults
    let snapshot_path = cli
        .snapshot
        .or(file_cfg.snapshot)
        .unwrap_or_else(|| DEFAULT_SNAPSHOT.to_string());
    info!("Snapshot: {}", snapshot_path);

    let snapshot = load_snapshot(&snapshot_path)?;
    cycle::validate_snapshot(&snapshot)?;

    let decisions = cycle::run_cycle(&snapshot);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&decisions)?);
        return Ok(());
    }

    println!("{:<10} {:<40} DETAIL", "DECISION", "APPWRAPPER");
    for d in &decisions {
        let verdict = if d.admitted { "admitted" } else { "denied" };
        let detail = if d.insufficient.is_empty() {
            format!("requests={{{}}} limits={{{}}}", render(&d.requests), render(&d.limits))
        } else {
            format!("insufficient: {}", d.insufficient.join(", "))
        };
        println!(
            "{:<10} {:<40} {}",
            verdict,
            format!("{}/{}", d.namespace, d.name),
            detail
        );
    }
    Ok(())
}

fn render(resources: &ResourceList) -> String {
    resources
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}
