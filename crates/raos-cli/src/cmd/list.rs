use crate::output::{print_json, print_table, truncate};
use raos_core::store::{FileStore, ListQuery, RecordStore};
use std::path::Path;

pub fn run(
    root: &Path,
    page: usize,
    limit: usize,
    search: Option<String>,
    owner: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let query = ListQuery {
        page,
        limit,
        search,
        owner,
    };
    let result = FileStore::new(root).list(&query)?;

    if json {
        return print_json(&result);
    }

    if result.items.is_empty() {
        println!("No requirements.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = result
        .items
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.state().to_string(),
                r.app_name.clone().unwrap_or_else(|| "-".into()),
                r.owner_id.clone(),
                r.created_at.format("%Y-%m-%d %H:%M").to_string(),
                truncate(&r.description, 48),
            ]
        })
        .collect();
    print_table(&["ID", "STATE", "APP", "OWNER", "CREATED", "DESCRIPTION"], &rows);
    println!(
        "\npage {} of {} ({} total)",
        result.current_page,
        result.total_pages.max(1),
        result.total
    );
    Ok(())
}
