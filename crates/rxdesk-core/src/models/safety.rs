use serde::{Deserialize, Serialize};

/// Input for the drug safety check endpoint. The response shape is owned by
/// the external model service and handled as opaque JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SafetyCheckRequest {
    pub drug_name: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
}
