// 🌍 Country Entity
// Natural key: `code` (ISO 3166-1 alpha-2)

use crate::db::COUNTRIES_TABLE;
use crate::table::TableRow;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: Option<i64>,
    pub name: String,
    pub code: String,
    /// Extended code, e.g. "en_US"
    pub code4: String,
    pub latitude: String,
    pub longitude: String,
    /// Currency abbreviation
    pub currency: String,
    pub timezone: String,
}

impl Country {
    pub fn new(name: &str, code: &str) -> Self {
        Country {
            name: name.to_string(),
            code: code.to_string(),
            ..Default::default()
        }
    }

    /// Overwrite the descriptive columns with values from a newer import.
    /// Identity columns (`id`, `name`, `code`) stay untouched.
    pub fn refresh_details(&mut self, incoming: &Country) {
        self.code4 = incoming.code4.clone();
        self.latitude = incoming.latitude.clone();
        self.longitude = incoming.longitude.clone();
        self.currency = incoming.currency.clone();
        self.timezone = incoming.timezone.clone();
    }
}

impl TableRow for Country {
    const TABLE: &'static str = COUNTRIES_TABLE;
    const COLUMNS: &'static [&'static str] = &[
        "name", "code", "code4", "latitude", "longitude", "currency", "timezone",
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
            Value::Text(self.code.clone()),
            Value::Text(self.code4.clone()),
            Value::Text(self.latitude.clone()),
            Value::Text(self.longitude.clone()),
            Value::Text(self.currency.clone()),
            Value::Text(self.timezone.clone()),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Country {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            code: row.get(2)?,
            code4: row.get(3)?,
            latitude: row.get(4)?,
            longitude: row.get(5)?,
            currency: row.get(6)?,
            timezone: row.get(7)?,
        })
    }
}
