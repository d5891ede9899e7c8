use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::record::{self, Record, format_date};

/// Documented priorities. Other values are stored verbatim.
pub const PRIORITIES: [&str; 3] = ["low", "medium", "high"];
pub const DEFAULT_PRIORITY: &str = "medium";

/// A to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    pub priority: String,
    #[serde(default)]
    pub completed: bool,
}

/// Partial update accepted by `PATCH /tasks/{id}` and `update_task_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusPatch {
    pub completed: bool,
}

impl StatusPatch {
    pub fn from_input(input: &Value) -> Result<Self, ValidationError> {
        let obj = record::as_object(input)?;
        let completed =
            record::optional_bool(obj, "completed")?.ok_or_else(|| ValidationError::required("completed"))?;
        Ok(StatusPatch { completed })
    }

    pub fn apply(self, task: &mut Task) {
        task.completed = self.completed;
    }
}

impl Record for Task {
    const COLLECTION: &'static str = "tasks";
    const KIND: &'static str = "task";
    const WIDGET_NAME: &'static str = "task-manager";
    const DATA_GLOBAL: &'static str = "__TASKS_DATA__";
    const CARD_TITLE: &'static str = "✅ Tasks";
    const TOOLS_JSON: &'static [u8] = include_bytes!("../catalogue/tasks.tools.json");
    const RESOURCES_JSON: &'static [u8] = include_bytes!("../catalogue/tasks.resources.json");

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn from_input(input: &Value, _today: NaiveDate) -> Result<Self, ValidationError> {
        let obj = record::as_object(input)?;
        Ok(Task {
            id: String::new(),
            title: record::required_title(obj)?,
            description: record::optional_string(obj, "description")?,
            due_date: record::optional_string(obj, "dueDate")?,
            priority: record::optional_string(obj, "priority")?
                .unwrap_or_else(|| DEFAULT_PRIORITY.to_string()),
            completed: record::optional_bool(obj, "completed")?.unwrap_or(false),
        })
    }

    fn seed(today: NaiveDate) -> Vec<Self> {
        let in_days = |n: u64| format_date(today.checked_add_days(Days::new(n)).unwrap_or(today));
        vec![
            Task {
                id: "1".into(),
                title: "Review pull requests".into(),
                description: Some("Go through the open reviews on the API repo".into()),
                due_date: Some(format_date(today)),
                priority: "high".into(),
                completed: false,
            },
            Task {
                id: "2".into(),
                title: "Write weekly report".into(),
                description: Some("Summarize progress and blockers for the team".into()),
                due_date: Some(in_days(2)),
                priority: "medium".into(),
                completed: false,
            },
            Task {
                id: "3".into(),
                title: "Book dentist appointment".into(),
                description: None,
                due_date: Some(in_days(7)),
                priority: "low".into(),
                completed: true,
            },
        ]
    }
}
