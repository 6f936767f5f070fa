//! Benchtop command-line client.
//!
//! Thin wrapper over [`benchtop_lims`] for poking at a LIMS server from a
//! shell: fetch an entity's XML, inspect or edit its user-defined fields,
//! list a category.

use clap::{Args, Parser, Subcommand};
use tracing::info;

use benchtop_lims::{Client, ClientConfig, EntityRef, UdfMap, UdfValue};

#[derive(Debug, Parser)]
#[command(name = "benchtop", version, about = "Benchtop LIMS command-line client")]
struct Cli {
    #[command(flatten)]
    connect: ConnectArgs,

    #[command(subcommand)]
    command: Command,
}

/// Server connection settings.
#[derive(Debug, Args)]
struct ConnectArgs {
    /// Server base URL, with or without the /api/v2 suffix.
    #[arg(long, env = "BENCHTOP_BASE_URI")]
    base_uri: String,

    /// Basic-auth username.
    #[arg(long, env = "BENCHTOP_USERNAME")]
    username: String,

    /// Basic-auth password.
    #[arg(long, env = "BENCHTOP_PASSWORD", hide_env_values = true)]
    password: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "BENCHTOP_TIMEOUT", default_value = "60")]
    timeout: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "BENCHTOP_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetches an entity and prints its XML representation.
    Get {
        /// Resource category, e.g. samples, artifacts, processes.
        category: String,
        /// Resource id, e.g. s24-101.
        id: String,
    },
    /// Prints an entity's user-defined fields, one per line.
    Udfs {
        category: String,
        id: String,
    },
    /// Sets a user-defined field and writes the entity back.
    SetUdf {
        category: String,
        id: String,
        /// Field name.
        name: String,
        /// Field value; text unless --numeric or --boolean is given.
        value: String,
        /// Treat the value as a number.
        #[arg(long, conflicts_with = "boolean")]
        numeric: bool,
        /// Treat the value as true/false.
        #[arg(long, conflicts_with = "numeric")]
        boolean: bool,
    },
    /// Lists a category's entity URIs, following pagination.
    List {
        category: String,
        /// Query filters as key=value pairs, e.g. name=ind-1.
        #[arg(value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("benchtop={level},benchtop_lims={level}")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn entity_for(client: &Client, category: &str, id: &str) -> EntityRef {
    client.entity(&client.base().uri(category, &[id]))
}

fn print_udfs(udfs: &UdfMap) -> anyhow::Result<()> {
    for (name, value) in udfs.pairs()? {
        println!("{name}\t{}\t{}", value.type_name(), value.to_text());
    }
    Ok(())
}

fn list(client: &Client, category: &str, filters: &[(String, String)]) -> anyhow::Result<()> {
    let params: Vec<(&str, &str)> = filters
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let entities: Vec<EntityRef> = match category {
        "samples" => resource_uris(client.samples(&params)?),
        "artifacts" => resource_uris(client.artifacts(&params)?),
        "projects" => resource_uris(client.projects(&params)?),
        "researchers" => resource_uris(client.researchers(&params)?),
        "containers" => resource_uris(client.containers(&params)?),
        "processes" => resource_uris(client.processes(&params)?),
        other => anyhow::bail!("unknown listable category '{other}'"),
    };
    for entity in &entities {
        println!("{}", entity.uri());
    }
    info!(category, count = entities.len(), "listed");
    Ok(())
}

fn resource_uris<T: benchtop_lims::Resource>(resources: Vec<T>) -> Vec<EntityRef> {
    resources.into_iter().map(|r| r.entity().clone()).collect()
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.connect.log_level);

    let config = ClientConfig::new(
        &cli.connect.base_uri,
        &cli.connect.username,
        &cli.connect.password,
    )
    .with_timeout(std::time::Duration::from_secs(cli.connect.timeout));
    let client = Client::new(config)?;

    match cli.command {
        Command::Get { category, id } => {
            let entity = entity_for(&client, &category, &id);
            println!("{}", entity.to_xml()?);
        }
        Command::Udfs { category, id } => {
            let entity = entity_for(&client, &category, &id);
            print_udfs(&UdfMap::new(entity))?;
        }
        Command::SetUdf {
            category,
            id,
            name,
            value,
            numeric,
            boolean,
        } => {
            let value = if numeric {
                UdfValue::Numeric(value.parse()?)
            } else if boolean {
                UdfValue::Boolean(value.parse()?)
            } else {
                UdfValue::Text(value)
            };
            let entity = entity_for(&client, &category, &id);
            let udfs = UdfMap::new(entity.clone());
            udfs.set(&name, value)?;
            entity.put()?;
            info!(uri = entity.uri(), field = %name, "field written");
        }
        Command::List { category, filters } => {
            list(&client, &category, &filters)?;
        }
    }

    Ok(())
}
