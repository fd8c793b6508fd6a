use crate::output::print_json;
use raos_core::store::{FileStore, RecordStore};
use std::path::Path;
use uuid::Uuid;

pub fn run(root: &Path, id: Uuid, json: bool) -> anyhow::Result<()> {
    let record = FileStore::new(root).get(id)?;
    if json {
        print_json(&serde_json::json!({
            "state": record.state(),
            "record": record,
        }))
    } else {
        super::print_record(&record);
        Ok(())
    }
}
