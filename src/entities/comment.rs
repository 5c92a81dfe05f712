// 💬 Comment Entity

use crate::db::COMMENTS_TABLE;
use crate::table::TableRow;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Option<i64>,
    pub comment: String,
    pub record_date: DateTime<Utc>,
    pub published: bool,
    pub project_id: i64,
    pub user_id: i64,
}

impl Comment {
    pub fn new(comment: &str, project_id: i64, user_id: i64) -> Self {
        Comment {
            id: None,
            comment: comment.to_string(),
            record_date: Utc::now(),
            published: true,
            project_id,
            user_id,
        }
    }
}

impl TableRow for Comment {
    const TABLE: &'static str = COMMENTS_TABLE;
    const COLUMNS: &'static [&'static str] =
        &["comment", "record_date", "published", "project_id", "user_id"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.comment.clone()),
            Value::Text(self.record_date.to_rfc3339()),
            Value::Integer(self.published as i64),
            Value::Integer(self.project_id),
            Value::Integer(self.user_id),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let record_date: String = row.get(2)?;
        let record_date = DateTime::parse_from_rfc3339(&record_date)
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    2,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?
            .with_timezone(&Utc);

        Ok(Comment {
            id: Some(row.get(0)?),
            comment: row.get(1)?,
            record_date,
            published: row.get::<_, i64>(3)? != 0,
            project_id: row.get(4)?,
            user_id: row.get(5)?,
        })
    }
}
