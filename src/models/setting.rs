use serde::{Deserialize, Serialize};

/// Named runtime setting, looked up by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setting {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub name: String,

    pub value: String,
}

impl store::Keyed for Setting {
    type Key = String;

    fn key(&self) -> &String {
        &self.name
    }
}
