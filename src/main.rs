//! qlq
//!
//! Command-line interface for querying QuantumLeap history:
//! - Entity and type history, paged and merged
//! - Entity listing
//! - Filter expression building
//! - Service status and maintenance

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use quantumleap_client::{
    constraint, generate_default_config, AggrMethod, AggrPeriod, AggrScope, Config,
    LoggingConfig, QuantumLeapClient, QueryOptions, Statement, SubscriptionRequest,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "qlq")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query time-series history from QuantumLeap")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// QuantumLeap URL, overrides config
    #[arg(long, global = true)]
    pub url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// History of one entity
    Entity {
        /// Entity id
        id: String,
        /// Only this attribute
        #[arg(short, long)]
        attr: Option<String>,
        /// Values only, no metadata
        #[arg(long)]
        values: bool,
        #[command(flatten)]
        query: QueryArgs,
    },

    /// History of every entity of a type
    Type {
        /// Entity type
        entity_type: String,
        /// Only this attribute
        #[arg(short, long)]
        attr: Option<String>,
        /// Values only, no metadata
        #[arg(long)]
        values: bool,
        #[command(flatten)]
        query: QueryArgs,
    },

    /// List entities with history
    Entities {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Build a filter expression, e.g. `qlq filter "temperature>20" "color!=black"`
    Filter {
        /// Statements
        #[arg(required = true)]
        statements: Vec<String>,
    },

    /// Show service version
    Version,

    /// Show service health
    Health,

    /// Delete the history of an entity
    DeleteEntity {
        id: String,
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,
    },

    /// Delete the history of every entity of a type
    DeleteType { entity_type: String },

    /// Create the Orion subscription that feeds QuantumLeap
    Subscribe {
        #[arg(short = 't', long = "type")]
        entity_type: Option<String>,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        id_pattern: Option<String>,
        #[arg(long)]
        attributes: Option<String>,
        #[arg(long)]
        observed_attributes: Option<String>,
        #[arg(long)]
        notified_attributes: Option<String>,
        /// Minimum seconds between notifications
        #[arg(long, allow_negative_numbers = true)]
        throttling: Option<i64>,
        #[arg(long)]
        time_index_attribute: Option<String>,
    },

    /// Print a default config file
    Config,
}

/// Options shared by history queries
#[derive(Args)]
pub struct QueryArgs {
    /// Entity type
    #[arg(short = 't', long = "entity-type")]
    pub type_filter: Option<String>,
    /// Comma-separated entity ids (type queries)
    #[arg(long)]
    pub ids: Option<String>,
    /// Comma-separated attribute names
    #[arg(long)]
    pub attrs: Option<String>,
    /// count, sum, avg, min, max
    #[arg(long)]
    pub aggr_method: Option<AggrMethod>,
    /// year, month, day, hour, minute, second
    #[arg(long)]
    pub aggr_period: Option<AggrPeriod>,
    /// entity, global
    #[arg(long)]
    pub aggr_scope: Option<AggrScope>,
    /// Start date, ISO 8601
    #[arg(long)]
    pub from: Option<String>,
    /// End date, ISO 8601
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub last_n: Option<u64>,
    /// Total records to fetch (default: all)
    #[arg(short, long)]
    pub limit: Option<u64>,
    #[arg(long)]
    pub offset: Option<u64>,
    #[arg(long)]
    pub georel: Option<String>,
    #[arg(long)]
    pub geometry: Option<String>,
    #[arg(long)]
    pub coords: Option<String>,
    #[arg(long)]
    pub options: Option<String>,
}

impl QueryArgs {
    fn into_options(self) -> QueryOptions {
        let mut options = QueryOptions::new();
        if let Some(t) = self.type_filter {
            options = options.entity_type(t);
        }
        if let Some(ids) = self.ids {
            options = options.id(ids);
        }
        if let Some(attrs) = self.attrs {
            options = options.attrs(attrs.split(',').map(str::trim));
        }
        if let Some(m) = self.aggr_method {
            options = options.aggr_method(m);
        }
        if let Some(p) = self.aggr_period {
            options = options.aggr_period(p);
        }
        if let Some(s) = self.aggr_scope {
            options = options.aggr_scope(s);
        }
        if let Some(from) = self.from {
            options = options.from_date(from);
        }
        if let Some(to) = self.to {
            options = options.to_date(to);
        }
        if let Some(n) = self.last_n {
            options = options.last_n(n);
        }
        if let Some(limit) = self.limit {
            options = options.limit(limit);
        }
        if let Some(offset) = self.offset {
            options = options.offset(offset);
        }
        if let Some(georel) = self.georel {
            options = options.geo(
                georel,
                self.geometry.unwrap_or_default(),
                self.coords.unwrap_or_default(),
            );
        }
        if let Some(o) = self.options {
            options = options.options(o);
        }
        options
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.url {
        config.client.url = url;
    }

    init_tracing(&config.logging);

    match cli.command {
        Commands::Filter { statements } => {
            let parsed = statements
                .iter()
                .map(|s| s.parse::<Statement>())
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", constraint::create_query(parsed)?);
            return Ok(());
        }
        Commands::Config => {
            print!("{}", generate_default_config());
            return Ok(());
        }
        command => run(command, &config).await,
    }
}

async fn run(command: Commands, config: &Config) -> anyhow::Result<()> {
    let client = QuantumLeapClient::new(&config.client).context("creating client")?;
    let queries = client.queries();

    match command {
        Commands::Entity {
            id,
            attr,
            values,
            query,
        } => {
            let options = query.into_options();
            let series = match (attr, values) {
                (None, false) => queries.entity_by_id(&id, &options).await?,
                (None, true) => queries.entity_values_by_id(&id, &options).await?,
                (Some(attr), false) => queries.entity_attr_by_id(&id, &attr, &options).await?,
                (Some(attr), true) => queries.entity_attr_values_by_id(&id, &attr, &options).await?,
            };
            print_json(&series)
        }
        Commands::Type {
            entity_type,
            attr,
            values,
            query,
        } => {
            let options = query.into_options();
            let series = match (attr, values) {
                (None, false) => queries.entity_by_type(&entity_type, &options).await?,
                (None, true) => queries.entity_values_by_type(&entity_type, &options).await?,
                (Some(attr), false) => {
                    queries
                        .entity_attr_by_type(&entity_type, &attr, &options)
                        .await?
                }
                (Some(attr), true) => {
                    queries
                        .entity_attr_values_by_type(&entity_type, &attr, &options)
                        .await?
                }
            };
            print_json(&series)
        }
        Commands::Entities { query } => {
            let headers = queries.list_entities(&query.into_options()).await?;
            print_json(&headers)
        }
        Commands::Version => print_json(&client.version().await?),
        Commands::Health => print_json(&client.health().await?),
        Commands::DeleteEntity { id, entity_type } => {
            let deleted = client.delete_entity(&id, entity_type.as_deref()).await?;
            println!("Deleted history of entity {}", deleted);
            Ok(())
        }
        Commands::DeleteType { entity_type } => {
            let deleted = client.delete_entity_type(&entity_type).await?;
            println!("Deleted history of type {}", deleted);
            Ok(())
        }
        Commands::Subscribe {
            entity_type,
            id,
            id_pattern,
            attributes,
            observed_attributes,
            notified_attributes,
            throttling,
            time_index_attribute,
        } => {
            let request = SubscriptionRequest {
                entity_type,
                entity_id: id,
                id_pattern,
                attributes,
                observed_attributes,
                notified_attributes,
                throttling,
                time_index_attribute,
            };
            client.subscribe(&request).await?;
            println!("Subscription created");
            Ok(())
        }
        Commands::Filter { .. } | Commands::Config => Ok(()),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs go to stderr so stdout stays parseable
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "quantumleap_client={level},qlq={level}",
            level = logging.level
        ))
    });
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_query_args_to_options() {
        let cli = Cli::parse_from([
            "qlq", "type", "Room", "--attr", "temperature", "--aggr-method", "avg",
            "--aggr-period", "hour", "--limit", "20",
        ]);
        match cli.command {
            Commands::Type {
                entity_type,
                attr,
                values,
                query,
            } => {
                assert_eq!(entity_type, "Room");
                assert_eq!(attr.as_deref(), Some("temperature"));
                assert!(!values);
                let options = query.into_options();
                assert_eq!(
                    options,
                    QueryOptions::new()
                        .aggregate(AggrMethod::Avg, AggrPeriod::Hour)
                        .limit(20)
                );
            }
            _ => panic!("expected type command"),
        }
    }
}
