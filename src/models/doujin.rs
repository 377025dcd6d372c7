use serde::{Deserialize, Serialize};

/// Site a content record was acquired from. Stored as its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    ExHentai,
    EHentai,
    NHentai,
}

/// Content record produced by the acquisition side and looked up by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doujin {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub url: String,

    pub title: String,

    pub source: Source,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub pages: u32,

    /// Published copy, when the publishing integration has produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegraph_url: Option<String>,
}

impl store::Keyed for Doujin {
    type Key = String;

    fn key(&self) -> &String {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_is_stored_as_string() {
        let doujin: Doujin = serde_json::from_value(json!({
            "url": "https://example.org/g/1",
            "title": "t",
            "source": "NHentai",
        }))
        .unwrap();
        assert_eq!(doujin.source, Source::NHentai);
        assert!(doujin.tags.is_empty());
        assert_eq!(
            serde_json::to_value(doujin.source).unwrap(),
            json!("NHentai")
        );
    }
}
