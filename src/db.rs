use crate::error::Result;
use rusqlite::{params, Connection};
use tracing::debug;

pub const CURRENCIES_TABLE: &str = "currencies";
pub const COUNTRIES_TABLE: &str = "countries";
pub const LOCATIONS_TABLE: &str = "locations";
pub const COMMENTS_TABLE: &str = "comments";
pub const TYPES_TABLE: &str = "types";

/// SQLite's default SQLITE_MAX_VARIABLE_NUMBER for bundled builds
pub const MAX_BOUND_PARAMETERS: usize = 32_766;

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Reference data
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS currencies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            abbr TEXT UNIQUE NOT NULL,
            symbol TEXT NOT NULL DEFAULT '',
            position INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS countries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            code TEXT UNIQUE NOT NULL,
            code4 TEXT NOT NULL DEFAULT '',
            latitude TEXT NOT NULL DEFAULT '',
            longitude TEXT NOT NULL DEFAULT '',
            currency TEXT NOT NULL DEFAULT '',
            timezone TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS locations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            latitude TEXT NOT NULL DEFAULT '',
            longitude TEXT NOT NULL DEFAULT '',
            country_code TEXT NOT NULL DEFAULT '',
            state_code TEXT,
            timezone TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    // ==========================================================================
    // Project data
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS comments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            comment TEXT NOT NULL,
            record_date TEXT NOT NULL,
            published INTEGER NOT NULL DEFAULT 1,
            project_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            params TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_locations_name_country ON locations(name, country_code)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_comments_project ON comments(project_id)",
        [],
    )?;

    Ok(())
}

/// Row-count probe used to pick between bulk insert and update mode.
///
/// `table` must be one of the table constants of this module.
pub fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;

    Ok(count)
}

/// Delete every row and restart the id sequence
pub fn truncate_table(conn: &Connection, table: &str) -> Result<usize> {
    let removed = conn.execute(&format!("DELETE FROM {}", table), [])?;
    conn.execute("DELETE FROM sqlite_sequence WHERE name = ?1", params![table])?;

    debug!(table, removed, "table truncated");
    Ok(removed)
}
