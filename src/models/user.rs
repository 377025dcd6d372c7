use serde::{Deserialize, Serialize};

/// A bot user. `user_id` is the external (Telegram) id; nothing stops two
/// documents from sharing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub user_id: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl User {
    pub fn new(user_id: i64) -> Self {
        Self {
            id: None,
            user_id,
            username: None,
            first_name: None,
            last_name: None,
            language_code: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl store::Keyed for User {
    type Key = i64;

    fn key(&self) -> &i64 {
        &self.user_id
    }
}
