use crate::output::print_json;
use raos_core::store::{FileStore, RecordStore};
use std::path::Path;
use uuid::Uuid;

pub fn run(root: &Path, id: Uuid, out: Option<&Path>, json: bool) -> anyhow::Result<()> {
    // A stored mockup needs neither the model nor an API key.
    let stored = FileStore::new(root).get(id)?.mockup_markup;
    let markup = match stored {
        Some(markup) => markup,
        None => {
            let config = super::load_config(root)?;
            let pipeline = super::open_pipeline(root, &config)?;
            super::runtime()?.block_on(pipeline.run_mockup(id))?
        }
    };

    match out {
        Some(path) => {
            raos_core::io::atomic_write(path, markup.as_bytes())?;
            if json {
                print_json(&serde_json::json!({ "id": id, "path": path, "bytes": markup.len() }))?;
            } else {
                println!("wrote {} bytes to {}", markup.len(), path.display());
            }
        }
        None if json => print_json(&serde_json::json!({ "id": id, "mockup_markup": markup }))?,
        None => println!("{markup}"),
    }
    Ok(())
}
