// 🏷️ Project Type Entity

use crate::db::TYPES_TABLE;
use crate::table::TableRow;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectType {
    pub id: Option<i64>,
    pub title: String,
    pub description: String,
    /// Serialized type options
    pub params: String,
}

impl ProjectType {
    pub fn new(title: &str, description: &str) -> Self {
        ProjectType {
            id: None,
            title: title.to_string(),
            description: description.to_string(),
            params: String::new(),
        }
    }
}

impl TableRow for ProjectType {
    const TABLE: &'static str = TYPES_TABLE;
    const COLUMNS: &'static [&'static str] = &["title", "description", "params"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.description.clone()),
            Value::Text(self.params.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(ProjectType {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            description: row.get(2)?,
            params: row.get(3)?,
        })
    }
}
