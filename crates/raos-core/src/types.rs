use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Raos
// ---------------------------------------------------------------------------

/// One Role-Action-Object-Supplementary behaviour tuple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Raos {
    pub role: String,
    pub action: String,
    pub object: String,
    #[serde(default)]
    pub supplementary: String,
}

impl Raos {
    pub fn new(
        role: impl Into<String>,
        action: impl Into<String>,
        object: impl Into<String>,
        supplementary: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            action: action.into(),
            object: object.into(),
            supplementary: supplementary.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Structured output of the extraction stage.
///
/// Field names follow the JSON schema the model is asked to emit
/// (`appName`, `entities`, ...). Missing list fields default to empty;
/// `appName` and `raos` are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub app_name: String,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    pub raos: Vec<Raos>,
}

// ---------------------------------------------------------------------------
// RecordState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    Created,
    Extracted,
    Completed,
}

impl RecordState {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordState::Created => "created",
            RecordState::Extracted => "extracted",
            RecordState::Completed => "completed",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_parses_model_schema() {
        let json = r#"{
            "appName": "ShopLite",
            "entities": ["Product", "Order"],
            "roles": ["Admin", "Customer"],
            "features": ["Catalog"],
            "raos": [
                {"role": "Admin", "action": "create", "object": "Product",
                 "supplementary": "Price must be positive"}
            ]
        }"#;
        let e: Extraction = serde_json::from_str(json).unwrap();
        assert_eq!(e.app_name, "ShopLite");
        assert_eq!(e.roles, vec!["Admin", "Customer"]);
        assert_eq!(e.raos[0].object, "Product");
    }

    #[test]
    fn extraction_requires_app_name_and_raos() {
        assert!(serde_json::from_str::<Extraction>(r#"{"raos": []}"#).is_err());
        assert!(serde_json::from_str::<Extraction>(r#"{"appName": "X"}"#).is_err());

        let e: Extraction = serde_json::from_str(r#"{"appName": "X", "raos": []}"#).unwrap();
        assert!(e.entities.is_empty());
    }

    #[test]
    fn states_are_ordered() {
        assert!(RecordState::Created < RecordState::Extracted);
        assert!(RecordState::Extracted < RecordState::Completed);
        assert_eq!(RecordState::Completed.to_string(), "completed");
    }
}
