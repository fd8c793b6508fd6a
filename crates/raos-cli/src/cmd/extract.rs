use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn run(root: &Path, description: &str, owner: &str, json: bool) -> anyhow::Result<()> {
    let config = super::load_config(root)?;
    let pipeline = super::open_pipeline(root, &config)?;
    let record = pipeline.create(description, owner)?;
    let id = record.id;

    let record = super::runtime()?
        .block_on(pipeline.run_extraction(id))
        .with_context(|| format!("requirement {id} was saved but extraction failed"))?;

    if json {
        print_json(&record)?;
    } else {
        super::print_record(&record);
    }
    Ok(())
}
