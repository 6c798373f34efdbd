use serde::{Deserialize, Serialize};

/// `{id, source, target}`; stock templates spell the endpoints `from`/`to`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionModel {
    pub id: String,
    #[serde(alias = "from")]
    pub source: String,
    #[serde(alias = "to")]
    pub target: String,
}
