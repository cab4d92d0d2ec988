use anyhow::Result;
use clap::{Parser, ValueEnum};
use gcpinv::config::Config;
use gcpinv::discovery::{Discovery, FilterSpec, ResourceType, TagPredicate};
use gcpinv::gcp::reader::GcpReader;
use serde::Serialize;
use std::sync::Arc;
use tracing::Level;

/// Version injected at compile time via GCPINV_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("GCPINV_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Discover GCP resources for import into declarative infrastructure
#[derive(Parser, Debug)]
#[command(name = "gcpinv", version = VERSION, about, long_about = None)]
struct Args {
    /// GCP project to inventory
    #[arg(short, long)]
    project: Option<String>,

    /// GCP zone; regional listings derive their region from it
    #[arg(short, long)]
    zone: Option<String>,

    /// Resource types to discover (default: all)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    types: Vec<ResourceType>,

    /// Label filter, name=value (repeatable; multiple filters are ANDed)
    #[arg(short = 'l', long = "label", value_name = "NAME=VALUE")]
    labels: Vec<TagPredicate>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    output: Output,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Output {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// One row of the emitted inventory.
#[derive(Debug, Serialize)]
struct DiscoveredResource {
    id: String,
    #[serde(rename = "type")]
    resource_type: &'static str,
}

fn setup_logging(level: LogLevel) {
    let Some(tracing_level) = level.to_tracing_level() else {
        return;
    };

    // The inventory goes to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    tracing::info!("gcpinv {} started with log level: {:?}", VERSION, level);
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.log_level);

    let mut config = Config::load();
    if let Some(project) = &args.project {
        config.set_project(project)?;
    }
    if let Some(zone) = &args.zone {
        config.set_zone(zone)?;
    }

    let project = config.effective_project();
    if project.is_empty() {
        anyhow::bail!("no GCP project configured; pass --project or set a gcloud default");
    }
    let zone = config.effective_zone();

    let reader = GcpReader::new(&project, &zone).await?;
    let discovery = Discovery::new(Arc::new(reader), &project);
    let filters = FilterSpec::new(args.labels.clone());

    let types: Vec<ResourceType> = if args.types.is_empty() {
        ResourceType::ALL.to_vec()
    } else {
        args.types.clone()
    };

    // The run aborts on the first listing failure rather than emitting a
    // partial inventory
    let mut inventory: Vec<DiscoveredResource> = Vec::new();
    for resource_type in &types {
        tracing::info!("discovering {}", resource_type);
        let handles = discovery.discover(*resource_type, &filters).await?;
        tracing::info!("{}: {} resources", resource_type, handles.len());
        inventory.extend(handles.iter().map(|h| DiscoveredResource {
            id: h.id().to_string(),
            resource_type: h.resource_type().as_str(),
        }));
    }

    match args.output {
        Output::Text => {
            for resource in &inventory {
                println!("{}\t{}", resource.resource_type, resource.id);
            }
        }
        Output::Json => {
            println!("{}", serde_json::to_string_pretty(&inventory)?);
        }
    }

    Ok(())
}
