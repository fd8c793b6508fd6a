use crate::error::{RaosError, Result};
use crate::types::{Extraction, Raos, RecordState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// RequirementRecord
// ---------------------------------------------------------------------------

/// A user's app idea and everything the pipeline has derived from it.
///
/// `description`, `owner_id` and `created_at` are fixed at creation. The
/// extraction field group (`app_name` .. `raos`) and the mockup field are
/// each written once by the pipeline; see [`RequirementRecord::state`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRecord {
    pub id: Uuid,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raos: Option<Vec<Raos>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mockup_markup: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl RequirementRecord {
    /// New record in the `Created` state. Description and owner must be non-blank.
    pub fn new(description: impl Into<String>, owner_id: impl Into<String>) -> Result<Self> {
        let description = description.into();
        let owner_id = owner_id.into();
        if description.trim().is_empty() {
            return Err(RaosError::Validation("description is required".into()));
        }
        if owner_id.trim().is_empty() {
            return Err(RaosError::Validation("owner id is required".into()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            description,
            app_name: None,
            entities: Vec::new(),
            roles: Vec::new(),
            features: Vec::new(),
            raos: None,
            mockup_markup: None,
            owner_id,
            created_at: Utc::now(),
        })
    }

    pub fn state(&self) -> RecordState {
        if self.mockup_markup.is_some() {
            RecordState::Completed
        } else if self.app_name.is_some() || self.raos.is_some() {
            RecordState::Extracted
        } else {
            RecordState::Created
        }
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    /// The persisted extraction field group, if extraction has run.
    pub fn extraction(&self) -> Option<Extraction> {
        if self.state() == RecordState::Created {
            return None;
        }
        Some(Extraction {
            app_name: self.app_name.clone().unwrap_or_default(),
            entities: self.entities.clone(),
            roles: self.roles.clone(),
            features: self.features.clone(),
            raos: self.raos.clone().unwrap_or_default(),
        })
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// `Created → Extracted`. Refuses to overwrite an existing extraction.
    pub fn apply_extraction(&mut self, extraction: &Extraction) -> Result<()> {
        let from = self.state();
        if from != RecordState::Created {
            return Err(RaosError::InvalidTransition {
                from,
                to: RecordState::Extracted,
                reason: "extraction output already exists".into(),
            });
        }
        self.app_name = Some(extraction.app_name.clone());
        self.entities = extraction.entities.clone();
        self.roles = extraction.roles.clone();
        self.features = extraction.features.clone();
        self.raos = Some(extraction.raos.clone());
        Ok(())
    }

    /// `Extracted → Completed`.
    pub fn apply_mockup(&mut self, markup: impl Into<String>) -> Result<()> {
        let from = self.state();
        if from != RecordState::Extracted {
            let reason = match from {
                RecordState::Created => "extraction has not run",
                _ => "mockup already generated",
            };
            return Err(RaosError::InvalidTransition {
                from,
                to: RecordState::Completed,
                reason: reason.into(),
            });
        }
        self.mockup_markup = Some(markup.into());
        Ok(())
    }

    /// Owner edits of the extracted fields. Allowed only between extraction
    /// and mockup generation; never re-triggers extraction.
    pub fn apply_edit(&mut self, owner_id: &str, edit: &RecordEdit) -> Result<()> {
        if !self.is_owned_by(owner_id) {
            return Err(RaosError::Forbidden(
                "only the creator can edit this requirement".into(),
            ));
        }
        let state = self.state();
        if state != RecordState::Extracted {
            return Err(RaosError::InvalidTransition {
                from: state,
                to: state,
                reason: format!("requirements can only be edited while {}", RecordState::Extracted),
            });
        }
        edit.validate()?;

        if let Some(name) = &edit.app_name {
            self.app_name = Some(name.trim().to_string());
        }
        if let Some(roles) = &edit.roles {
            self.roles = roles.clone();
        }
        if let Some(entities) = &edit.entities {
            self.entities = entities.clone();
        }
        if let Some(raos) = &edit.raos {
            self.raos = Some(raos.clone());
        }
        Ok(())
    }

    /// Case-insensitive match against app name and description.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.description.to_lowercase().contains(&needle)
            || self
                .app_name
                .as_deref()
                .map(|n| n.to_lowercase().contains(&needle))
                .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// RecordEdit
// ---------------------------------------------------------------------------

/// Partial update of the owner-editable fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordEdit {
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub entities: Option<Vec<String>>,
    #[serde(default)]
    pub raos: Option<Vec<Raos>>,
}

impl RecordEdit {
    pub fn is_empty(&self) -> bool {
        self.app_name.is_none()
            && self.roles.is_none()
            && self.entities.is_none()
            && self.raos.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(RaosError::Validation("no editable fields supplied".into()));
        }
        if let Some(name) = &self.app_name {
            if name.trim().is_empty() {
                return Err(RaosError::Validation("app name must not be empty".into()));
            }
        }
        let blank_item = |items: &Option<Vec<String>>| {
            items
                .as_ref()
                .map(|v| v.iter().any(|s| s.trim().is_empty()))
                .unwrap_or(false)
        };
        if blank_item(&self.roles) {
            return Err(RaosError::Validation("roles must not contain blank entries".into()));
        }
        if blank_item(&self.entities) {
            return Err(RaosError::Validation(
                "entities must not contain blank entries".into(),
            ));
        }
        if let Some(raos) = &self.raos {
            for (i, r) in raos.iter().enumerate() {
                if r.role.trim().is_empty() || r.action.trim().is_empty() || r.object.trim().is_empty()
                {
                    return Err(RaosError::Validation(format!(
                        "raos[{i}] needs a role, an action and an object"
                    )));
                }
            }
        }
        Ok(())
    }
}
