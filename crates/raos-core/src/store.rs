use crate::error::{RaosError, Result};
use crate::paths;
use crate::requirement::{RecordEdit, RequirementRecord};
use crate::types::Extraction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: usize = 10;
pub const MAX_PAGE_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// ListQuery / Page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    /// 1-based page number. `0` is treated as `1`.
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Case-insensitive substring match on app name or description.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

fn default_page() -> usize {
    1
}

fn default_limit() -> usize {
    DEFAULT_PAGE_LIMIT
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
            search: None,
            owner: None,
        }
    }
}

impl ListQuery {
    pub fn owned_by(owner: impl Into<String>) -> Self {
        Self {
            owner: Some(owner.into()),
            ..Self::default()
        }
    }

    fn effective_page(&self) -> usize {
        self.page.max(1)
    }

    fn effective_limit(&self) -> usize {
        self.limit.clamp(1, MAX_PAGE_LIMIT)
    }

    fn accepts(&self, record: &RequirementRecord) -> bool {
        if let Some(owner) = &self.owner {
            if !record.is_owned_by(owner) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => record.matches(needle),
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub total_pages: usize,
    pub current_page: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            total_pages: self.total_pages,
            current_page: self.current_page,
        }
    }
}

/// Newest first, filtered, then sliced to the requested page.
pub fn paginate(mut records: Vec<RequirementRecord>, query: &ListQuery) -> Page<RequirementRecord> {
    records.retain(|r| query.accepts(r));
    records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    let page = query.effective_page();
    let limit = query.effective_limit();
    let total = records.len();
    let total_pages = total.div_ceil(limit);
    let items = records
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    Page {
        items,
        total,
        total_pages,
        current_page: page,
    }
}

// ---------------------------------------------------------------------------
// RecordStore
// ---------------------------------------------------------------------------

/// Persistence for requirement records.
///
/// Implementors provide keyed storage; the state-checked writes are shared
/// default methods so every backend enforces the same transitions. Callers
/// serialize writes per record (see `Pipeline`).
pub trait RecordStore: Send + Sync {
    /// Insert a new record. Fails if the id already exists.
    fn create(&self, record: &RequirementRecord) -> Result<()>;

    fn get(&self, id: Uuid) -> Result<RequirementRecord>;

    /// Replace an existing record.
    fn put(&self, record: &RequirementRecord) -> Result<()>;

    fn all(&self) -> Result<Vec<RequirementRecord>>;

    /// Returns `false` if nothing was stored under `id`.
    fn remove(&self, id: Uuid) -> Result<bool>;

    fn list(&self, query: &ListQuery) -> Result<Page<RequirementRecord>> {
        Ok(paginate(self.all()?, query))
    }

    fn save_extraction(&self, id: Uuid, extraction: &Extraction) -> Result<RequirementRecord> {
        let mut record = self.get(id)?;
        record.apply_extraction(extraction)?;
        self.put(&record)?;
        Ok(record)
    }

    fn save_mockup(&self, id: Uuid, markup: &str) -> Result<RequirementRecord> {
        let mut record = self.get(id)?;
        record.apply_mockup(markup)?;
        self.put(&record)?;
        Ok(record)
    }

    fn update_fields(&self, id: Uuid, owner_id: &str, edit: &RecordEdit) -> Result<RequirementRecord> {
        let mut record = self.get(id)?;
        record.apply_edit(owner_id, edit)?;
        self.put(&record)?;
        Ok(record)
    }

    fn delete(&self, id: Uuid, owner_id: &str) -> Result<()> {
        let record = self.get(id)?;
        if !record.is_owned_by(owner_id) {
            return Err(RaosError::Forbidden(
                "only the creator can delete this requirement".into(),
            ));
        }
        self.remove(id)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// One YAML file per record under `.raos/requirements/`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write(&self, record: &RequirementRecord) -> Result<()> {
        let path = paths::requirement_file(&self.root, record.id);
        let data = serde_yaml::to_string(record)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

impl RecordStore for FileStore {
    fn create(&self, record: &RequirementRecord) -> Result<()> {
        let path = paths::requirement_file(&self.root, record.id);
        if path.exists() {
            return Err(RaosError::Validation(format!(
                "requirement {} already exists",
                record.id
            )));
        }
        self.write(record)
    }

    fn get(&self, id: Uuid) -> Result<RequirementRecord> {
        let path = paths::requirement_file(&self.root, id);
        if !path.exists() {
            return Err(RaosError::RequirementNotFound(id));
        }
        let data = std::fs::read_to_string(&path)?;
        let record: RequirementRecord = serde_yaml::from_str(&data)?;
        Ok(record)
    }

    fn put(&self, record: &RequirementRecord) -> Result<()> {
        let path = paths::requirement_file(&self.root, record.id);
        if !path.exists() {
            return Err(RaosError::RequirementNotFound(record.id));
        }
        self.write(record)
    }

    fn all(&self) -> Result<Vec<RequirementRecord>> {
        let dir = paths::requirements_dir(&self.root);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| Uuid::parse_str(s).ok())
            else {
                continue;
            };
            match self.get(id) {
                Ok(r) => records.push(r),
                Err(RaosError::RequirementNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(records)
    }

    fn remove(&self, id: Uuid) -> Result<bool> {
        crate::io::remove_if_exists(&paths::requirement_file(&self.root, id))
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Uuid, RequirementRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn create(&self, record: &RequirementRecord) -> Result<()> {
        let mut map = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(&record.id) {
            return Err(RaosError::Validation(format!(
                "requirement {} already exists",
                record.id
            )));
        }
        map.insert(record.id, record.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<RequirementRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(RaosError::RequirementNotFound(id))
    }

    fn put(&self, record: &RequirementRecord) -> Result<()> {
        let mut map = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match map.get_mut(&record.id) {
            Some(slot) => {
                *slot = record.clone();
                Ok(())
            }
            None => Err(RaosError::RequirementNotFound(record.id)),
        }
    }

    fn all(&self) -> Result<Vec<RequirementRecord>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect())
    }

    fn remove(&self, id: Uuid) -> Result<bool> {
        Ok(self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_extraction;
    use crate::types::RecordState;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn record_at(owner: &str, desc: &str, minutes_ago: i64) -> RequirementRecord {
        let mut r = RequirementRecord::new(desc, owner).unwrap();
        r.created_at = Utc::now() - Duration::minutes(minutes_ago);
        r
    }

    fn exercise_backend(store: &dyn RecordStore) {
        let r = RequirementRecord::new("Admin manages products", "u1").unwrap();
        store.create(&r).unwrap();
        assert!(store.create(&r).is_err());
        assert_eq!(store.get(r.id).unwrap(), r);

        let extracted = store.save_extraction(r.id, &sample_extraction()).unwrap();
        assert_eq!(extracted.state(), RecordState::Extracted);
        assert_eq!(store.get(r.id).unwrap().state(), RecordState::Extracted);

        let completed = store.save_mockup(r.id, "<!DOCTYPE html>").unwrap();
        assert_eq!(completed.state(), RecordState::Completed);

        assert!(matches!(
            store.delete(r.id, "u2").unwrap_err(),
            RaosError::Forbidden(_)
        ));
        store.delete(r.id, "u1").unwrap();
        assert!(matches!(
            store.get(r.id).unwrap_err(),
            RaosError::RequirementNotFound(_)
        ));
    }

    #[test]
    fn memory_store_lifecycle() {
        exercise_backend(&MemoryStore::new());
    }

    #[test]
    fn file_store_lifecycle() {
        let dir = TempDir::new().unwrap();
        exercise_backend(&FileStore::new(dir.path()));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let r = RequirementRecord::new("A todo app", "u1").unwrap();
        FileStore::new(dir.path()).create(&r).unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(reopened.get(r.id).unwrap(), r);
        assert_eq!(reopened.all().unwrap().len(), 1);
    }

    #[test]
    fn file_store_ignores_stray_files() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());
        let req_dir = paths::requirements_dir(dir.path());
        std::fs::create_dir_all(&req_dir).unwrap();
        std::fs::write(req_dir.join("notes.txt"), "hi").unwrap();
        std::fs::write(req_dir.join("not-a-uuid.yaml"), "x: 1").unwrap();
        assert!(store.all().unwrap().is_empty());
    }

    #[test]
    fn failed_transition_leaves_stored_record_untouched() {
        let store = MemoryStore::new();
        let r = RequirementRecord::new("A todo app", "u1").unwrap();
        store.create(&r).unwrap();
        assert!(store.save_mockup(r.id, "<!DOCTYPE html>").is_err());
        assert_eq!(store.get(r.id).unwrap(), r);
    }

    #[test]
    fn list_is_newest_first_and_paged() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store.create(&record_at("u1", &format!("app {i}"), i)).unwrap();
        }

        let first = store.list(&ListQuery::default()).unwrap();
        assert_eq!(first.total, 25);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.current_page, 1);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].description, "app 0");

        let last = store
            .list(&ListQuery {
                page: 3,
                ..ListQuery::default()
            })
            .unwrap();
        assert_eq!(last.items.len(), 5);
        assert_eq!(last.items[4].description, "app 24");
    }

    #[test]
    fn list_filters_by_owner_and_search() {
        let store = MemoryStore::new();
        store.create(&record_at("u1", "Inventory tracker", 1)).unwrap();
        store.create(&record_at("u2", "Recipe book", 2)).unwrap();
        store.create(&record_at("u1", "Recipe planner", 3)).unwrap();

        let mine = store.list(&ListQuery::owned_by("u1")).unwrap();
        assert_eq!(mine.total, 2);

        let recipes = store
            .list(&ListQuery {
                search: Some("RECIPE".into()),
                ..ListQuery::default()
            })
            .unwrap();
        assert_eq!(recipes.total, 2);

        let both = store
            .list(&ListQuery {
                search: Some("recipe".into()),
                owner: Some("u1".into()),
                ..ListQuery::default()
            })
            .unwrap();
        assert_eq!(both.items[0].description, "Recipe planner");
    }

    #[test]
    fn huge_page_number_is_empty_not_a_panic() {
        let records: Vec<_> = (0..3).map(|i| record_at("u1", "x", i)).collect();
        let page = paginate(
            records,
            &ListQuery {
                page: usize::MAX,
                limit: MAX_PAGE_LIMIT,
                ..ListQuery::default()
            },
        );
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.current_page, usize::MAX);
    }

    #[test]
    fn limit_is_clamped() {
        let records: Vec<_> = (0..3).map(|i| record_at("u1", "x", i)).collect();
        let page = paginate(
            records,
            &ListQuery {
                page: 0,
                limit: 0,
                ..ListQuery::default()
            },
        );
        assert_eq!(page.current_page, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 3);
    }
}
