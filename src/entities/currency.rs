// 💱 Currency Entity
// Natural key: `abbr` (ISO 4217 code)

use crate::db::CURRENCIES_TABLE;
use crate::table::TableRow;
use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    /// None until stored
    pub id: Option<i64>,
    pub title: String,
    /// Unique abbreviation, e.g. "EUR"
    pub abbr: String,
    pub symbol: String,
    /// Display position of the symbol (0 = before amount, 1 = after)
    pub position: i64,
}

impl Currency {
    pub fn new(title: &str, abbr: &str, symbol: &str, position: i64) -> Self {
        Currency {
            id: None,
            title: title.to_string(),
            abbr: abbr.to_string(),
            symbol: symbol.to_string(),
            position,
        }
    }

    /// Set the symbol only when none is stored yet.
    ///
    /// Returns true when the symbol changed.
    pub fn fill_missing_symbol(&mut self, symbol: &str) -> bool {
        if self.symbol.trim().is_empty() && !symbol.trim().is_empty() {
            self.symbol = symbol.trim().to_string();
            return true;
        }
        false
    }
}

impl TableRow for Currency {
    const TABLE: &'static str = CURRENCIES_TABLE;
    const COLUMNS: &'static [&'static str] = &["title", "abbr", "symbol", "position"];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Text(self.abbr.clone()),
            Value::Text(self.symbol.clone()),
            Value::Integer(self.position),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Currency {
            id: Some(row.get(0)?),
            title: row.get(1)?,
            abbr: row.get(2)?,
            symbol: row.get(3)?,
            position: row.get(4)?,
        })
    }
}
