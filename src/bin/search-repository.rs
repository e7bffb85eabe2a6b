//! Search Repository admin binary
//!
//! Runs one maintenance command against a configured cluster and prints the
//! JSON result.

use anyhow::{bail, Context};
use search_repository::{
    builder::RequestBuilder,
    config::Config,
    observability::init_from_config,
    registry::ClusterRegistry,
    repository::{Conditions, Repository},
    schema::StaticSchema,
};
use serde_json::{json, Map, Value};
use std::{path::Path, sync::Arc};
use tracing::{info, warn};

const USAGE: &str = "usage:
  search-repository count <index> [conditions-json]
  search-repository create-mapping <index> <mapping-file>
  search-repository reindex <cluster> <from> <to>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = if Path::new(&config_path).exists() {
        Config::from_file_with_env(&config_path)
            .with_context(|| format!("loading configuration from {}", config_path))?
    } else {
        Config::default_config()
    };
    init_from_config(&config.logging);

    if !Path::new(&config_path).exists() {
        warn!("{} not found, using the localhost default cluster", config_path);
    }
    info!("Configuration loaded with {} cluster(s)", config.clusters.len());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let registry = ClusterRegistry::new(&config);

    let output = match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["count", index, rest @ ..] if rest.len() <= 1 => {
            let conditions = match rest.first() {
                Some(raw) => {
                    let value: Value = serde_json::from_str(raw).context("parsing conditions")?;
                    Conditions::from_json(&value)?
                }
                None => Conditions::new(),
            };
            let mut repository = Repository::connect(RequestBuilder::new(*index), &registry).await?;
            let total = repository.count(&conditions, None).await?;
            json!({ "index": index, "count": total })
        }
        ["create-mapping", index, mapping_file] => {
            let raw = std::fs::read_to_string(mapping_file)
                .with_context(|| format!("reading {}", mapping_file))?;
            let properties: Map<String, Value> =
                serde_json::from_str(&raw).context("mapping file must be a JSON object of field descriptors")?;
            let repository = Repository::connect(RequestBuilder::new(*index), &registry)
                .await?
                .with_schema(Arc::new(StaticSchema::from(properties)));
            match repository.create_mapping(None, Map::new()).await? {
                Some(response) => response,
                None => json!({ "skipped": "mapping file declares no fields" }),
            }
        }
        ["reindex", cluster, from, to] => {
            let repository = Repository::connect(RequestBuilder::new(*cluster), &registry).await?;
            repository.reindex(from, to).await?
        }
        _ => bail!("{}", USAGE),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
