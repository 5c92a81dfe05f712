// 📦 Batch Accumulator
// Collects rows during a parsing pass and flushes them as multi-row INSERTs

use crate::db::MAX_BOUND_PARAMETERS;
use crate::error::Result;
use crate::table::TableRow;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::marker::PhantomData;
use tracing::debug;

/// Accumulates records of one table and writes them in chunks.
///
/// Every row is written as `(id, COLUMNS...)`; a record without an id binds
/// NULL so the store assigns one. Chunks never exceed SQLite's bound-parameter
/// limit, whatever chunk size was requested.
pub struct BatchInsert<T: TableRow> {
    chunk_size: usize,
    pending: Vec<Vec<Value>>,
    rows_written: usize,
    statements: usize,
    _row: PhantomData<T>,
}

/// What a finished batch wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub rows_written: usize,
    pub statements: usize,
}

impl<T: TableRow> BatchInsert<T> {
    /// Flush every `chunk_size` rows
    pub fn new(chunk_size: usize) -> Self {
        let chunk_size = chunk_size.clamp(1, Self::max_rows_per_statement());

        BatchInsert {
            chunk_size,
            pending: Vec::new(),
            rows_written: 0,
            statements: 0,
            _row: PhantomData,
        }
    }

    /// Write everything in as few statements as the parameter limit allows
    pub fn single_statement() -> Self {
        Self::new(usize::MAX)
    }

    fn columns_per_row() -> usize {
        T::COLUMNS.len() + 1
    }

    fn max_rows_per_statement() -> usize {
        (MAX_BOUND_PARAMETERS / Self::columns_per_row()).max(1)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Queue a record, flushing when the chunk is full
    pub fn push(&mut self, conn: &Connection, record: &T) -> Result<()> {
        let mut row = Vec::with_capacity(Self::columns_per_row());
        row.push(record.id().map(Value::Integer).unwrap_or(Value::Null));
        row.extend(record.values());
        self.pending.push(row);

        if self.pending.len() >= self.chunk_size {
            self.flush(conn)?;
        }

        Ok(())
    }

    /// Write the remaining rows and report totals
    pub fn finish(mut self, conn: &Connection) -> Result<BatchStats> {
        self.flush(conn)?;

        Ok(BatchStats {
            rows_written: self.rows_written,
            statements: self.statements,
        })
    }

    fn flush(&mut self, conn: &Connection) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let width = Self::columns_per_row();
        let rows = self.pending.len();

        let tuples: Vec<String> = (0..rows)
            .map(|r| {
                let placeholders: Vec<String> = (1..=width)
                    .map(|c| format!("?{}", r * width + c))
                    .collect();
                format!("({})", placeholders.join(", "))
            })
            .collect();

        let mut columns = vec![T::PRIMARY_KEY];
        columns.extend_from_slice(T::COLUMNS);

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            T::TABLE,
            columns.join(", "),
            tuples.join(", ")
        );

        let values = std::mem::take(&mut self.pending).into_iter().flatten();
        conn.execute(&sql, params_from_iter(values))?;

        self.rows_written += rows;
        self.statements += 1;

        debug!(table = T::TABLE, rows, statement = self.statements, "batch flushed");
        Ok(())
    }
}
