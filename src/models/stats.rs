use serde::{Deserialize, Serialize};

/// Named counter, looked up by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub value: i64,

    /// UTC seconds of the last change, set by whoever writes the counter.
    #[serde(default)]
    pub updated_at: i64,
}

impl store::Keyed for Stats {
    type Key = String;

    fn key(&self) -> &String {
        &self.name
    }
}
