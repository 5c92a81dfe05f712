// 🗃️ Table Row Wrapper
// One table row ↔ one record object

use crate::error::{AdminError, Result};
use rusqlite::types::{ToSql, Value};
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};
use std::marker::PhantomData;
use tracing::debug;

// ============================================================================
// ROW BINDING
// ============================================================================

/// Binds a record type to its table.
///
/// `from_row` receives the primary key at index 0 followed by `COLUMNS`
/// in declaration order. `values` returns the non-key columns in the same order.
pub trait TableRow: Sized {
    const TABLE: &'static str;
    const PRIMARY_KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Option<i64>;
    fn set_id(&mut self, id: i64);
    fn values(&self) -> Vec<Value>;
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

// ============================================================================
// TABLE
// ============================================================================

/// Generic load/store/delete over a `TableRow` type
pub struct Table<'c, T: TableRow> {
    conn: &'c Connection,
    _row: PhantomData<T>,
}

impl<'c, T: TableRow> Table<'c, T> {
    pub fn new(conn: &'c Connection) -> Self {
        Table {
            conn,
            _row: PhantomData,
        }
    }

    fn select_list() -> String {
        let mut columns = vec![T::PRIMARY_KEY];
        columns.extend_from_slice(T::COLUMNS);
        columns.join(", ")
    }

    /// Load a row by primary key
    pub fn load(&self, id: i64) -> Result<Option<T>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            Self::select_list(),
            T::TABLE,
            T::PRIMARY_KEY
        );

        let row = self.conn.query_row(&sql, [id], T::from_row).optional()?;
        Ok(row)
    }

    /// Load the first row whose `column` equals `value`
    pub fn load_by(&self, column: &str, value: &dyn ToSql) -> Result<Option<T>> {
        if !T::COLUMNS.contains(&column) {
            return Err(AdminError::InvalidColumn {
                table: T::TABLE,
                column: column.to_string(),
            });
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1 LIMIT 1",
            Self::select_list(),
            T::TABLE,
            column
        );

        let row = self.conn.query_row(&sql, [value], T::from_row).optional()?;
        Ok(row)
    }

    /// Insert the record, or update it when its id already exists.
    ///
    /// Returns the stored id; a freshly inserted record gets its id assigned.
    pub fn store(&self, record: &mut T) -> Result<i64> {
        let values = record.values();

        if let Some(id) = record.id() {
            if self.exists(id)? {
                let assignments: Vec<String> = T::COLUMNS
                    .iter()
                    .enumerate()
                    .map(|(i, column)| format!("{} = ?{}", column, i + 1))
                    .collect();
                let sql = format!(
                    "UPDATE {} SET {} WHERE {} = ?{}",
                    T::TABLE,
                    assignments.join(", "),
                    T::PRIMARY_KEY,
                    T::COLUMNS.len() + 1
                );

                let mut bound = values;
                bound.push(Value::Integer(id));
                self.conn.execute(&sql, params_from_iter(bound))?;

                debug!(table = T::TABLE, id, "row updated");
                return Ok(id);
            }
        }

        let mut columns: Vec<&str> = Vec::with_capacity(T::COLUMNS.len() + 1);
        let mut bound: Vec<Value> = Vec::with_capacity(T::COLUMNS.len() + 1);
        if let Some(id) = record.id() {
            columns.push(T::PRIMARY_KEY);
            bound.push(Value::Integer(id));
        }
        columns.extend_from_slice(T::COLUMNS);
        bound.extend(values);

        let placeholders: Vec<String> = (1..=bound.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            columns.join(", "),
            placeholders.join(", ")
        );
        self.conn.execute(&sql, params_from_iter(bound))?;

        let id = self.conn.last_insert_rowid();
        record.set_id(id);

        debug!(table = T::TABLE, id, "row inserted");
        Ok(id)
    }

    /// Delete a row by primary key, returns whether a row was removed
    pub fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", T::TABLE, T::PRIMARY_KEY);
        let removed = self.conn.execute(&sql, [id])?;
        Ok(removed > 0)
    }

    pub fn exists(&self, id: i64) -> Result<bool> {
        let sql = format!("SELECT 1 FROM {} WHERE {} = ?1", T::TABLE, T::PRIMARY_KEY);
        let found = self
            .conn
            .query_row(&sql, [id], |row| row.get::<_, i64>(0))
            .optional()?;
        Ok(found.is_some())
    }

    pub fn count(&self) -> Result<i64> {
        crate::db::count_rows(self.conn, T::TABLE)
    }
}
