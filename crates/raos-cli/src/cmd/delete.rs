use crate::output::print_json;
use raos_core::store::{FileStore, RecordStore};
use std::path::Path;
use uuid::Uuid;

pub fn run(root: &Path, id: Uuid, owner: &str, json: bool) -> anyhow::Result<()> {
    FileStore::new(root).delete(id, owner)?;
    if json {
        print_json(&serde_json::json!({ "deleted": id }))?;
    } else {
        println!("Deleted requirement {id}.");
    }
    Ok(())
}
