pub mod config;
pub mod delete;
pub mod extract;
pub mod list;
pub mod mockup;
pub mod serve;
pub mod show;

use anyhow::{bail, Context};
use completion_client::CompletionClient;
use raos_core::cache::MemoryCache;
use raos_core::config::{Config, WarnLevel};
use raos_core::requirement::RequirementRecord;
use raos_core::store::FileStore;
use raos_core::Pipeline;
use std::path::Path;
use std::sync::Arc;

pub(crate) fn load_config(root: &Path) -> anyhow::Result<Config> {
    let config = Config::load(root).context("failed to load .raos/config.yaml")?;
    let errors: Vec<String> = config
        .validate()
        .into_iter()
        .filter(|w| w.level == WarnLevel::Error)
        .map(|w| w.message)
        .collect();
    if !errors.is_empty() {
        bail!("invalid configuration: {}", errors.join("; "));
    }
    Ok(config)
}

/// Pipeline over the file store at `root`, talking to the configured model.
/// Fails if the API key variable is unset.
pub(crate) fn open_pipeline(root: &Path, config: &Config) -> anyhow::Result<Pipeline> {
    let client = CompletionClient::from_config(&config.completion)?;
    Ok(Pipeline::new(
        Arc::new(FileStore::new(root)),
        Arc::new(client),
        Arc::new(MemoryCache::new()),
        &config.pipeline,
    ))
}

pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}

pub(crate) fn print_record(r: &RequirementRecord) {
    println!("id:          {}", r.id);
    println!("state:       {}", r.state());
    println!("owner:       {}", r.owner_id);
    println!("created:     {}", r.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("description: {}", r.description);
    if let Some(name) = &r.app_name {
        println!("app name:    {name}");
        println!("entities:    {}", r.entities.join(", "));
        println!("roles:       {}", r.roles.join(", "));
        println!("features:    {}", r.features.join(", "));
    }
    if let Some(raos) = r.raos.as_deref().filter(|v| !v.is_empty()) {
        println!();
        let rows: Vec<Vec<String>> = raos
            .iter()
            .map(|t| {
                vec![
                    t.role.clone(),
                    t.action.clone(),
                    t.object.clone(),
                    crate::output::truncate(&t.supplementary, 60),
                ]
            })
            .collect();
        crate::output::print_table(&["ROLE", "ACTION", "OBJECT", "SUPPLEMENTARY"], &rows);
    }
    if let Some(markup) = &r.mockup_markup {
        println!();
        println!("mockup:      {} bytes (print with `raos mockup {}`)", markup.len(), r.id);
    }
}
