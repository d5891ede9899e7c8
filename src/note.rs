use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::record::{self, Record, format_date};

pub const DEFAULT_CATEGORY: &str = "general";

/// A Second Brain note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Record for Note {
    const COLLECTION: &'static str = "notes";
    const KIND: &'static str = "note";
    const WIDGET_NAME: &'static str = "second-brain";
    const DATA_GLOBAL: &'static str = "__NOTES_DATA__";
    const CARD_TITLE: &'static str = "🧠 Second Brain";
    const TOOLS_JSON: &'static [u8] = include_bytes!("../catalogue/notes.tools.json");
    const RESOURCES_JSON: &'static [u8] = include_bytes!("../catalogue/notes.resources.json");

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn from_input(input: &Value, today: NaiveDate) -> Result<Self, ValidationError> {
        let obj = record::as_object(input)?;
        Ok(Note {
            id: String::new(),
            title: record::required_title(obj)?,
            description: record::optional_string(obj, "description")?,
            created_at: record::optional_string(obj, "createdAt")?
                .unwrap_or_else(|| format_date(today)),
            category: record::optional_string(obj, "category")?
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            tags: record::optional_string_list(obj, "tags")?.unwrap_or_default(),
        })
    }

    fn seed(today: NaiveDate) -> Vec<Self> {
        let days_ago = |n: u64| format_date(today.checked_sub_days(Days::new(n)).unwrap_or(today));
        vec![
            Note {
                id: "1".into(),
                title: "Software architecture ideas".into(),
                description: Some("Thoughts on design patterns and clean architecture".into()),
                created_at: days_ago(2),
                category: "technology".into(),
                tags: vec!["architecture".into(), "patterns".into()],
            },
            Note {
                id: "2".into(),
                title: "Reading notes: Clean Code".into(),
                description: Some("Key principles for writing clean, maintainable code".into()),
                created_at: days_ago(1),
                category: "learning".into(),
                tags: vec!["programming".into(), "books".into()],
            },
            Note {
                id: "3".into(),
                title: "Side project ideas".into(),
                description: Some("Brainstorming features for a new application".into()),
                created_at: format_date(today),
                category: "ideas".into(),
                tags: vec!["project".into(), "innovation".into()],
            },
        ]
    }
}
