use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Deserialize, Debug)]
pub struct DatabaseProperty {
    pub id: String,
    #[serde(rename = "type")]
    pub typ: String,
}

#[derive(Deserialize, Debug)]
pub struct RetrieveDatabaseResp {
    pub id: String,
    pub title: Vec<Value>,
    pub properties: HashMap<String, DatabaseProperty>,
}

/// A database row.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl Page {
    /// Plain text of the first listed property that is present.
    pub fn text_of<S: AsRef<str>>(&self, names: &[S]) -> Option<String> {
        names
            .iter()
            .find_map(|name| self.properties.get(name.as_ref()))
            .and_then(PropertyValue::plain_text)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        title: Vec<RichText>,
    },
    RichText {
        rich_text: Vec<RichText>,
    },
    Url {
        url: Option<String>,
    },
    Select {
        select: Option<SelectOption>,
    },
    Date {
        date: Option<DateValue>,
    },
    #[serde(other)]
    Other,
}

impl PropertyValue {
    pub fn plain_text(&self) -> Option<String> {
        match self {
            PropertyValue::Title { title: spans } | PropertyValue::RichText { rich_text: spans } => {
                Some(spans.iter().map(|s| s.plain_text.as_str()).collect())
            }
            PropertyValue::Url { url } => Some(url.clone().unwrap_or_default()),
            PropertyValue::Select { select } => Some(
                select
                    .as_ref()
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
            ),
            PropertyValue::Date { .. } | PropertyValue::Other => None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct DateValue {
    pub start: String,
}

/// One page of a paginated list endpoint.
#[derive(Deserialize, Debug)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BlockRef {
    pub id: String,
}
