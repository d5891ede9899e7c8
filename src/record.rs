//! The contract both collections (notes and tasks) implement, plus the
//! field readers their validators share.

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::widget::CardItem;

/// Date format used for `createdAt` / `dueDate`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A record kept in a [`RecordStore`](crate::RecordStore) and exposed over
/// REST and MCP.
pub trait Record: CardItem + Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Plural name: REST path segment, `get_<plural>` tool, structured-content key.
    const COLLECTION: &'static str;
    /// Singular name: `get_<kind>` / `create_<kind>` tools and the `<kind>_id` argument.
    const KIND: &'static str;
    /// Widget template name, looked up under the assets directory.
    const WIDGET_NAME: &'static str;
    /// `window.<global>` the full widget reads its data from.
    const DATA_GLOBAL: &'static str;
    /// Heading shown on the summary card.
    const CARD_TITLE: &'static str;
    /// Tool catalogue (JSON) for this collection.
    const TOOLS_JSON: &'static [u8];
    /// Resource catalogue (JSON) for this collection.
    const RESOURCES_JSON: &'static [u8];

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn title(&self) -> &str;

    /// Build a record from untyped input, applying defaults.
    ///
    /// `today` fills date fields that default to the creation date.
    /// Unknown fields and any client-supplied `id` are ignored.
    fn from_input(input: &Value, today: NaiveDate) -> Result<Self, ValidationError>;

    /// Records present when the process starts.
    fn seed(today: NaiveDate) -> Vec<Self>;

    /// `ui://widget/<name>.html`
    fn widget_uri() -> String {
        format!("ui://widget/{}.html", Self::WIDGET_NAME)
    }
}

/// Today's date on the local clock.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Require `input` to be a JSON object.
pub(crate) fn as_object(input: &Value) -> Result<&Map<String, Value>, ValidationError> {
    input
        .as_object()
        .ok_or_else(|| ValidationError::new("body", "must be an object"))
}

/// Required, non-empty string field.
pub(crate) fn required_title(obj: &Map<String, Value>) -> Result<String, ValidationError> {
    match optional_string(obj, "title")? {
        None => Err(ValidationError::required("title")),
        Some(t) if t.trim().is_empty() => Err(ValidationError::new("title", "must not be empty")),
        Some(t) => Ok(t),
    }
}

/// Optional string field; `null` reads as absent.
pub(crate) fn optional_string(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<String>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::new(field, "must be a string")),
    }
}

/// Optional boolean field; `null` reads as absent.
pub(crate) fn optional_bool(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<bool>, ValidationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ValidationError::new(field, "must be a boolean")),
    }
}

/// Optional list of strings; `null` reads as absent.
pub(crate) fn optional_string_list(
    obj: &Map<String, Value>,
    field: &str,
) -> Result<Option<Vec<String>>, ValidationError> {
    let invalid = || ValidationError::new(field, "must be an array of strings");
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(String::from).ok_or_else(invalid))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(invalid()),
    }
}
