//! Output artifact of a compiled selection

use serde::{Deserialize, Serialize};

use crate::source::DataSource;

/// The generated SQL plus the upstream source it was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlArtifact {
    pub sql: String,
    /// Lineage parent: the base query the selection was joined against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineage: Option<DataSource>,
}

impl SqlArtifact {
    /// The `{"sql": ...}` payload handed to the data-source writer
    pub fn payload(&self) -> serde_json::Value {
        serde_json::json!({ "sql": self.sql })
    }

    /// Feed this artifact back in as the base of another selection
    pub fn as_source(&self) -> DataSource {
        DataSource::Json {
            payload: self.payload(),
        }
    }
}
