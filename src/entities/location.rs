// 📍 Location Entity

use crate::db::LOCATIONS_TABLE;
use crate::table::TableRow;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: Option<i64>,
    pub name: String,
    pub latitude: String,
    pub longitude: String,
    pub country_code: String,
    /// Assigned later by a states import
    pub state_code: Option<String>,
    pub timezone: String,
}

impl TableRow for Location {
    const TABLE: &'static str = LOCATIONS_TABLE;
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "latitude",
        "longitude",
        "country_code",
        "state_code",
        "timezone",
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.name.clone()),
            Value::Text(self.latitude.clone()),
            Value::Text(self.longitude.clone()),
            Value::Text(self.country_code.clone()),
            self.state_code.clone().map(Value::Text).unwrap_or(Value::Null),
            Value::Text(self.timezone.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Location {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            country_code: row.get(4)?,
            state_code: row.get(5)?,
            timezone: row.get(6)?,
        })
    }
}

/// A state code to attach to existing locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateAssignment {
    /// Native states file: matched by location id
    ById { location_id: i64, state_code: String },
    /// Legacy states file: matched by city name within the legacy country
    ByName { name: String, state_code: String },
}

impl StateAssignment {
    pub fn state_code(&self) -> &str {
        match self {
            StateAssignment::ById { state_code, .. } => state_code,
            StateAssignment::ByName { state_code, .. } => state_code,
        }
    }
}
