// 🌍 Reference Data Importer
// XML/TXT files → currencies, countries, locations, state codes

use crate::batch::BatchInsert;
use crate::config::ImportConfig;
use crate::db::{count_rows, truncate_table, COUNTRIES_TABLE, CURRENCIES_TABLE, LOCATIONS_TABLE};
use crate::entities::{Country, Currency, Location, StateAssignment};
use crate::error::{AdminError, Result};
use crate::parser::{
    detect_format, parse_states, CountryXmlParser, CurrencyXmlParser, GeoNamesParser, IdPolicy,
    LocationXmlParser, RecordParser, SourceFormat, StatesFlavor,
};
use crate::table::Table;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// OR terms per state UPDATE. SQLite caps expression depth at 1000 and
/// every OR nests one level deeper.
const MAX_OR_PREDICATES: usize = 500;

// ============================================================================
// RESOURCE KIND
// ============================================================================

/// Reference tables an import or removal can target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Currencies,
    Countries,
    Locations,
}

impl ResourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::Currencies => "currencies",
            ResourceKind::Countries => "countries",
            ResourceKind::Locations => "locations",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            ResourceKind::Currencies => CURRENCIES_TABLE,
            ResourceKind::Countries => COUNTRIES_TABLE,
            ResourceKind::Locations => LOCATIONS_TABLE,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceKind {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "currencies" => Ok(ResourceKind::Currencies),
            "countries" => Ok(ResourceKind::Countries),
            "locations" => Ok(ResourceKind::Locations),
            other => Err(AdminError::InvalidResource(other.to_string())),
        }
    }
}

// ============================================================================
// OPTIONS & REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Discard source ids and let the store assign new ones
    pub reset_id: bool,
    /// Locations with a smaller population are skipped (TXT only)
    pub min_population: i64,
    /// Rows per INSERT statement for locations
    pub batch_size: usize,
    /// Country matched by legacy states files
    pub legacy_state_country: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        ImportOptions {
            reset_id: false,
            min_population: config.min_population,
            batch_size: config.batch_size,
            legacy_state_country: config.legacy_state_country.clone(),
        }
    }
}

impl ImportOptions {
    fn id_policy(&self) -> IdPolicy {
        IdPolicy::from_reset_flag(self.reset_id)
    }
}

/// How the import wrote to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Empty table, rows written with multi-row INSERTs
    BulkInsert,
    /// Populated table, each record matched by its natural key
    Upsert,
    /// State codes attached to existing locations
    StateUpdate,
}

/// Outcome of one import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub mode: ImportMode,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub statements: usize,
}

impl ImportReport {
    fn new(mode: ImportMode) -> Self {
        ImportReport {
            mode,
            inserted: 0,
            updated: 0,
            skipped: 0,
            statements: 0,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "{} inserted, {} updated, {} skipped ({} statements)",
            self.inserted, self.updated, self.skipped, self.statements
        )
    }
}

// ============================================================================
// IMPORTER
// ============================================================================

/// Imports reference data into one connection.
///
/// Nothing runs inside a transaction: a failing statement leaves the
/// statements before it applied.
pub struct Importer<'c> {
    conn: &'c Connection,
    options: ImportOptions,
}

impl<'c> Importer<'c> {
    pub fn new(conn: &'c Connection, options: ImportOptions) -> Self {
        Importer { conn, options }
    }

    /// Import a file into the table of `kind`
    pub fn import(&self, kind: ResourceKind, file_path: &Path) -> Result<ImportReport> {
        let report = match kind {
            ResourceKind::Currencies => self.import_currencies(file_path)?,
            ResourceKind::Countries => self.import_countries(file_path)?,
            ResourceKind::Locations => self.import_locations(file_path)?,
        };

        info!(resource = %kind, file = %file_path.display(), "import finished: {}", report.summary());
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Currencies
    // ------------------------------------------------------------------------

    /// Bulk insert into an empty table, otherwise upsert by `abbr`
    pub fn import_currencies(&self, file_path: &Path) -> Result<ImportReport> {
        let currencies = CurrencyXmlParser::new(self.options.id_policy()).parse_all(file_path)?;

        if count_rows(self.conn, CURRENCIES_TABLE)? > 0 {
            self.update_currencies(currencies)
        } else {
            self.insert_currencies(currencies)
        }
    }

    fn insert_currencies(&self, currencies: Vec<Currency>) -> Result<ImportReport> {
        let mut report = ImportReport::new(ImportMode::BulkInsert);
        let mut batch = BatchInsert::<Currency>::single_statement();

        for currency in &currencies {
            if currency.title.is_empty() || currency.abbr.is_empty() {
                report.skipped += 1;
                continue;
            }
            batch.push(self.conn, currency)?;
        }

        let stats = batch.finish(self.conn)?;
        report.inserted = stats.rows_written;
        report.statements = stats.statements;
        Ok(report)
    }

    /// Existing currencies only get a missing symbol filled in;
    /// new ones are stored at position 0.
    fn update_currencies(&self, currencies: Vec<Currency>) -> Result<ImportReport> {
        let mut report = ImportReport::new(ImportMode::Upsert);
        let table = Table::<Currency>::new(self.conn);

        for incoming in currencies {
            if incoming.abbr.is_empty() {
                report.skipped += 1;
                continue;
            }

            match table.load_by("abbr", &incoming.abbr)? {
                Some(mut stored) => {
                    if stored.fill_missing_symbol(&incoming.symbol) {
                        table.store(&mut stored)?;
                        report.updated += 1;
                        report.statements += 1;
                    } else {
                        debug!(abbr = %stored.abbr, "currency unchanged");
                    }
                }
                None => {
                    let mut fresh = Currency::new(&incoming.title, &incoming.abbr, "", 0);
                    fresh.fill_missing_symbol(&incoming.symbol);
                    table.store(&mut fresh)?;
                    report.inserted += 1;
                    report.statements += 1;
                }
            }
        }

        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Countries
    // ------------------------------------------------------------------------

    /// Bulk insert into an empty table, otherwise upsert by `code`
    pub fn import_countries(&self, file_path: &Path) -> Result<ImportReport> {
        let countries = CountryXmlParser::new(self.options.id_policy()).parse_all(file_path)?;

        if count_rows(self.conn, COUNTRIES_TABLE)? > 0 {
            self.update_countries(countries)
        } else {
            self.insert_countries(countries)
        }
    }

    fn insert_countries(&self, countries: Vec<Country>) -> Result<ImportReport> {
        let mut report = ImportReport::new(ImportMode::BulkInsert);
        let mut batch = BatchInsert::<Country>::single_statement();

        for country in &countries {
            if country.name.is_empty() || country.code.is_empty() {
                report.skipped += 1;
                continue;
            }
            batch.push(self.conn, country)?;
        }

        let stats = batch.finish(self.conn)?;
        report.inserted = stats.rows_written;
        report.statements = stats.statements;
        Ok(report)
    }

    /// Descriptive columns are refreshed for every country in the file;
    /// name and code are only written for new rows.
    fn update_countries(&self, countries: Vec<Country>) -> Result<ImportReport> {
        let mut report = ImportReport::new(ImportMode::Upsert);
        let table = Table::<Country>::new(self.conn);

        for incoming in countries {
            if incoming.code.is_empty() {
                report.skipped += 1;
                continue;
            }

            let (mut country, is_new) = match table.load_by("code", &incoming.code)? {
                Some(stored) => (stored, false),
                None => (Country::new(&incoming.name, &incoming.code), true),
            };

            country.refresh_details(&incoming);
            table.store(&mut country)?;
            report.statements += 1;

            if is_new {
                report.inserted += 1;
            } else {
                report.updated += 1;
            }
        }

        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Locations
    // ------------------------------------------------------------------------

    /// `.xml` files use the export schema, anything else is GeoNames text.
    /// Rows are always inserted, `batch_size` per statement.
    pub fn import_locations(&self, file_path: &Path) -> Result<ImportReport> {
        let ids = self.options.id_policy();

        match detect_format(file_path) {
            SourceFormat::Xml => self.insert_locations(&LocationXmlParser::new(ids), file_path),
            SourceFormat::GeoNamesText => self.insert_locations(
                &GeoNamesParser::new(ids, self.options.min_population),
                file_path,
            ),
        }
    }

    fn insert_locations(
        &self,
        parser: &dyn RecordParser<Record = Location>,
        file_path: &Path,
    ) -> Result<ImportReport> {
        let mut report = ImportReport::new(ImportMode::BulkInsert);
        let mut batch = BatchInsert::<Location>::new(self.options.batch_size);

        debug!(format = parser.format().name(), chunk = batch.chunk_size(), "importing locations");

        report.skipped = parser.parse(file_path, &mut |location| batch.push(self.conn, &location))?;

        let stats = batch.finish(self.conn)?;
        report.inserted = stats.rows_written;
        report.statements = stats.statements;
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // States
    // ------------------------------------------------------------------------

    /// Attach state codes to existing locations.
    ///
    /// Files with `generator="crowdfunding"` match locations by id, any other
    /// file matches by city name within `legacy_state_country`. One UPDATE is
    /// issued per state code, split every 500 matches.
    pub fn import_states(&self, file_path: &Path) -> Result<ImportReport> {
        let states = parse_states(file_path)?;
        let mut report = ImportReport::new(ImportMode::StateUpdate);
        report.skipped = states.skipped;

        // state code → match predicates, each a (sql, params) pair
        let mut groups: BTreeMap<String, Vec<(&'static str, Vec<Value>)>> = BTreeMap::new();

        for assignment in states.assignments {
            let predicate = match assignment {
                StateAssignment::ById { location_id, .. } => {
                    ("(id = ?)", vec![Value::Integer(location_id)])
                }
                StateAssignment::ByName { ref name, .. } => (
                    "(name = ? AND country_code = ?)",
                    vec![
                        Value::Text(name.clone()),
                        Value::Text(self.options.legacy_state_country.clone()),
                    ],
                ),
            };

            groups
                .entry(assignment.state_code().to_string())
                .or_default()
                .push(predicate);
        }

        for (state_code, predicates) in groups {
            let (updated, statements) = self.update_state_group(&state_code, &predicates)?;
            report.updated += updated;
            report.statements += statements;
        }

        info!(
            flavor = ?states.flavor,
            native = states.flavor == StatesFlavor::Native,
            "states import finished: {}",
            report.summary()
        );
        Ok(report)
    }

    fn update_state_group(
        &self,
        state_code: &str,
        predicates: &[(&'static str, Vec<Value>)],
    ) -> Result<(usize, usize)> {
        let params_per_predicate = predicates.first().map(|(_, p)| p.len()).unwrap_or(1);
        let per_statement = ((crate::db::MAX_BOUND_PARAMETERS - 1) / params_per_predicate)
            .clamp(1, MAX_OR_PREDICATES);

        let mut updated = 0;
        let mut statements = 0;

        for chunk in predicates.chunks(per_statement) {
            let clause: Vec<&str> = chunk.iter().map(|(sql, _)| *sql).collect();
            let sql = format!(
                "UPDATE {} SET state_code = ? WHERE {}",
                LOCATIONS_TABLE,
                clause.join(" OR ")
            );

            let mut bound = vec![Value::Text(state_code.to_string())];
            for (_, values) in chunk {
                bound.extend(values.iter().cloned());
            }

            updated += self.conn.execute(&sql, params_from_iter(bound))?;
            statements += 1;
        }

        debug!(state_code, updated, statements, "state code assigned");
        Ok((updated, statements))
    }

    // ------------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------------

    /// Truncate the table of a resource kind given by name.
    ///
    /// An empty or unknown name fails with `InvalidResource` before any
    /// table is touched.
    pub fn remove_all(&self, resource: &str) -> Result<usize> {
        if resource.trim().is_empty() {
            return Err(AdminError::InvalidResource(resource.to_string()));
        }

        let kind: ResourceKind = resource.parse()?;
        let removed = truncate_table(self.conn, kind.table())?;

        info!(resource = %kind, removed, "all rows removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;
    use std::io::Write;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    fn fixture(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn importer(conn: &Connection, reset_id: bool) -> Importer<'_> {
        Importer::new(
            conn,
            ImportOptions {
                reset_id,
                ..ImportOptions::default()
            },
        )
    }

    fn currencies_xml() -> tempfile::NamedTempFile {
        fixture(
            ".xml",
            "<currencies>\
                <currency><id>10</id><title>Euro</title><abbr>EUR</abbr><symbol>€</symbol><position>1</position></currency>\
                <currency><id>20</id><title>US Dollar</title><abbr>USD</abbr><symbol>$</symbol><position>0</position></currency>\
                <currency><id>30</id><title></title><abbr>XXX</abbr></currency>\
             </currencies>",
        )
    }

    fn ids(conn: &Connection, sql: &str) -> Vec<i64> {
        conn.prepare(sql)
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    fn geonames_line(id: i64, name: &str, ascii: &str, population: i64) -> String {
        let mut columns = vec![String::new(); 19];
        columns[0] = id.to_string();
        columns[1] = name.to_string();
        columns[2] = ascii.to_string();
        columns[4] = "30.26715".to_string();
        columns[5] = "-97.74306".to_string();
        columns[8] = "US".to_string();
        columns[14] = population.to_string();
        columns[17] = "America/Chicago".to_string();
        columns.join("\t")
    }

    #[test]
    fn test_resource_kind_from_str() {
        assert_eq!("currencies".parse::<ResourceKind>().unwrap(), ResourceKind::Currencies);
        assert_eq!(" locations ".parse::<ResourceKind>().unwrap(), ResourceKind::Locations);
        assert!("planets".parse::<ResourceKind>().is_err());
        assert_eq!(ResourceKind::Countries.to_string(), "countries");
    }

    #[test]
    fn test_import_currencies_into_empty_table_preserves_ids() {
        let conn = setup();
        let file = currencies_xml();

        let report = importer(&conn, false).import(ResourceKind::Currencies, file.path()).unwrap();

        assert_eq!(report.mode, ImportMode::BulkInsert);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.statements, 1);
        assert_eq!(ids(&conn, "SELECT id FROM currencies ORDER BY id"), vec![10, 20]);
    }

    #[test]
    fn test_import_currencies_reset_id() {
        let conn = setup();
        let file = currencies_xml();

        importer(&conn, true).import_currencies(file.path()).unwrap();

        assert_eq!(ids(&conn, "SELECT id FROM currencies ORDER BY id"), vec![1, 2]);
    }

    #[test]
    fn test_import_currencies_into_populated_table_fills_symbol_only() {
        let conn = setup();
        conn.execute(
            "INSERT INTO currencies (id, title, abbr, symbol, position) VALUES
                (1, 'Euro (old)', 'EUR', '', 1),
                (2, 'Dollar', 'USD', 'US$', 1)",
            [],
        )
        .unwrap();

        let file = fixture(
            ".xml",
            "<currencies>\
                <currency><title>Euro</title><abbr>EUR</abbr><symbol>€</symbol></currency>\
                <currency><title>US Dollar</title><abbr>USD</abbr><symbol>$</symbol></currency>\
                <currency><title>Pound</title><abbr>GBP</abbr><symbol>£</symbol><position>1</position></currency>\
                <currency><title>Nameless</title><abbr></abbr></currency>\
             </currencies>",
        );

        let report = importer(&conn, false).import_currencies(file.path()).unwrap();
        assert_eq!(report.mode, ImportMode::Upsert);
        assert_eq!(report.updated, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);

        let table = Table::<Currency>::new(&conn);
        let euro = table.load_by("abbr", &"EUR").unwrap().unwrap();
        assert_eq!(euro.title, "Euro (old)");
        assert_eq!(euro.symbol, "€");
        assert_eq!(euro.position, 1);

        let dollar = table.load_by("abbr", &"USD").unwrap().unwrap();
        assert_eq!(dollar.title, "Dollar");
        assert_eq!(dollar.symbol, "US$");

        let pound = table.load_by("abbr", &"GBP").unwrap().unwrap();
        assert_eq!(pound.symbol, "£");
        assert_eq!(pound.position, 0);
    }

    #[test]
    fn test_import_countries_insert_then_update() {
        let conn = setup();
        let first = fixture(
            ".xml",
            "<countries>\
                <country><id>1</id><name>Bulgaria</name><code>BG</code><currency>BGN</currency></country>\
                <country><id>2</id><name>No code</name><code></code></country>\
             </countries>",
        );

        let report = importer(&conn, false).import_countries(first.path()).unwrap();
        assert_eq!(report.mode, ImportMode::BulkInsert);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);

        let second = fixture(
            ".xml",
            "<countries>\
                <country><name>Republic of Bulgaria</name><code>BG</code><code4>bg_BG</code4>\
                    <currency>EUR</currency><timezone>Europe/Sofia</timezone></country>\
                <country><name>Greece</name><code>GR</code><currency>EUR</currency></country>\
             </countries>",
        );

        let report = importer(&conn, false).import_countries(second.path()).unwrap();
        assert_eq!(report.mode, ImportMode::Upsert);
        assert_eq!(report.updated, 1);
        assert_eq!(report.inserted, 1);

        let table = Table::<Country>::new(&conn);
        let bulgaria = table.load_by("code", &"BG").unwrap().unwrap();
        assert_eq!(bulgaria.id, Some(1));
        assert_eq!(bulgaria.name, "Bulgaria");
        assert_eq!(bulgaria.code4, "bg_BG");
        assert_eq!(bulgaria.currency, "EUR");
        assert_eq!(bulgaria.timezone, "Europe/Sofia");

        assert_eq!(table.load_by("code", &"GR").unwrap().unwrap().name, "Greece");
    }

    #[test]
    fn test_import_locations_txt_chunks_and_fallback() {
        let conn = setup();
        let mut lines: Vec<String> = (1..=1200)
            .map(|i| geonames_line(i, &format!("Town {}", i), &format!("Town {}", i), 20000))
            .collect();
        lines.push(geonames_line(5000, "Zürich", "", 400000));
        lines.push(geonames_line(5001, "Hamlet", "Hamlet", 12));
        let file = fixture(".txt", &lines.join("\n"));

        let options = ImportOptions {
            min_population: 15000,
            ..ImportOptions::default()
        };
        let report = Importer::new(&conn, options).import_locations(file.path()).unwrap();

        assert_eq!(report.inserted, 1201);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.statements, 3);

        let table = Table::<Location>::new(&conn);
        let zurich = table.load(5000).unwrap().unwrap();
        assert_eq!(zurich.name, "Zürich");
        assert_eq!(zurich.state_code, None);
        assert!(table.load(5001).unwrap().is_none());
    }

    #[test]
    fn test_import_locations_xml() {
        let conn = setup();
        let file = fixture(
            ".xml",
            "<locations>\
                <location><id>4671654</id><name>Austin</name><latitude>30.26715</latitude>\
                    <longitude>-97.74306</longitude><country_code>US</country_code>\
                    <timezone>America/Chicago</timezone></location>\
                <location><id>4671655</id><name></name></location>\
             </locations>",
        );

        let report = importer(&conn, true).import(ResourceKind::Locations, file.path()).unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(ids(&conn, "SELECT id FROM locations"), vec![1]);
    }

    #[test]
    fn test_import_native_states_updates_by_id() {
        let conn = setup();
        conn.execute(
            "INSERT INTO locations (id, name, country_code) VALUES
                (1, 'Austin', 'US'), (2, 'Dallas', 'US'), (3, 'Boston', 'US'), (4, 'Sofia', 'BG')",
            [],
        )
        .unwrap();

        let file = fixture(
            ".xml",
            "<states generator=\"crowdfunding\">\
                <state><id>1</id><state_code>TX</state_code></state>\
                <state><id>2</id><state_code>TX</state_code></state>\
                <state><id>3</id><state_code>MA</state_code></state>\
                <state><id>4</id><state_code></state_code></state>\
             </states>",
        );

        let report = importer(&conn, false).import_states(file.path()).unwrap();
        assert_eq!(report.mode, ImportMode::StateUpdate);
        assert_eq!(report.updated, 3);
        assert_eq!(report.statements, 2);
        assert_eq!(report.skipped, 1);

        assert_eq!(ids(&conn, "SELECT id FROM locations WHERE state_code = 'TX' ORDER BY id"), vec![1, 2]);
        assert_eq!(ids(&conn, "SELECT id FROM locations WHERE state_code = 'MA'"), vec![3]);
        assert_eq!(ids(&conn, "SELECT id FROM locations WHERE state_code IS NULL"), vec![4]);
    }

    #[test]
    fn test_import_legacy_states_matches_name_in_us() {
        let conn = setup();
        conn.execute(
            "INSERT INTO locations (id, name, country_code) VALUES
                (1, 'Paris', 'US'), (2, 'Paris', 'FR'), (3, 'Austin', 'US')",
            [],
        )
        .unwrap();

        let file = fixture(
            ".xml",
            "<cities>\
                <city><name>Paris</name><state_code>TX</state_code></city>\
                <city><name>Austin</name><state_code>TX</state_code></city>\
             </cities>",
        );

        let report = importer(&conn, false).import_states(file.path()).unwrap();
        assert_eq!(report.updated, 2);
        assert_eq!(report.statements, 1);

        assert_eq!(ids(&conn, "SELECT id FROM locations WHERE state_code = 'TX' ORDER BY id"), vec![1, 3]);
        assert_eq!(ids(&conn, "SELECT id FROM locations WHERE state_code IS NULL"), vec![2]);
    }

    fn seed_locations(conn: &Connection, count: i64) {
        let mut batch = BatchInsert::<Location>::new(500);
        for id in 1..=count {
            let location = Location {
                id: Some(id),
                name: format!("City {}", id),
                country_code: "US".to_string(),
                ..Default::default()
            };
            batch.push(conn, &location).unwrap();
        }
        batch.finish(conn).unwrap();
    }

    #[test]
    fn test_import_native_states_large_group() {
        let conn = setup();
        seed_locations(&conn, 1500);

        let records: String = (1..=1500)
            .map(|id| format!("<state><id>{}</id><state_code>CA</state_code></state>", id))
            .collect();
        let file = fixture(".xml", &format!("<states generator=\"crowdfunding\">{}</states>", records));

        let report = importer(&conn, false).import_states(file.path()).unwrap();
        assert_eq!(report.updated, 1500);
        assert_eq!(report.statements, 1500 / MAX_OR_PREDICATES);

        let assigned: i64 = conn
            .query_row("SELECT COUNT(*) FROM locations WHERE state_code = 'CA'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(assigned, 1500);
    }

    #[test]
    fn test_import_legacy_states_large_group() {
        let conn = setup();
        seed_locations(&conn, 1200);

        let records: String = (1..=1200)
            .map(|id| format!("<city><name>City {}</name><state_code>TX</state_code></city>", id))
            .collect();
        let file = fixture(".xml", &format!("<cities>{}</cities>", records));

        let report = importer(&conn, false).import_states(file.path()).unwrap();
        assert_eq!(report.updated, 1200);
        // 500 + 500 + 200
        assert_eq!(report.statements, 3);

        let unassigned: i64 = conn
            .query_row("SELECT COUNT(*) FROM locations WHERE state_code IS NULL", [], |row| row.get(0))
            .unwrap();
        assert_eq!(unassigned, 0);
    }

    #[test]
    fn test_state_values_are_bound_not_interpolated() {
        let conn = setup();
        conn.execute("INSERT INTO locations (id, name, country_code) VALUES (1, 'O''Fallon', 'US')", [])
            .unwrap();

        let file = fixture(
            ".xml",
            "<cities><city><name>O'Fallon</name><state_code>IL' OR '1'='1</state_code></city></cities>",
        );

        importer(&conn, false).import_states(file.path()).unwrap();

        let code: String = conn
            .query_row("SELECT state_code FROM locations WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(code, "IL' OR '1'='1");
    }

    #[test]
    fn test_remove_all() {
        let conn = setup();
        let file = currencies_xml();
        importer(&conn, false).import_currencies(file.path()).unwrap();

        let removed = importer(&conn, false).remove_all("currencies").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(count_rows(&conn, CURRENCIES_TABLE).unwrap(), 0);
    }

    #[test]
    fn test_remove_all_rejects_unknown_resource() {
        let conn = setup();
        let file = currencies_xml();
        importer(&conn, false).import_currencies(file.path()).unwrap();

        for resource in ["", "  ", "projects"] {
            let result = importer(&conn, false).remove_all(resource);
            assert!(matches!(result, Err(AdminError::InvalidResource(_))));
        }
        assert_eq!(count_rows(&conn, CURRENCIES_TABLE).unwrap(), 2);
    }

    #[test]
    fn test_malformed_file_aborts_import() {
        let conn = setup();
        let file = fixture(".xml", "<currencies><currency><abbr>EUR</currency>");

        let result = importer(&conn, false).import_currencies(file.path());
        assert!(matches!(result, Err(AdminError::Parse { .. })));
        assert_eq!(count_rows(&conn, CURRENCIES_TABLE).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_key_in_bulk_insert_is_persistence_error() {
        let conn = setup();
        let file = fixture(
            ".xml",
            "<currencies>\
                <currency><title>Euro</title><abbr>EUR</abbr></currency>\
                <currency><title>Euro again</title><abbr>EUR</abbr></currency>\
             </currencies>",
        );

        let result = importer(&conn, false).import_currencies(file.path());
        assert!(matches!(result, Err(AdminError::Persistence(_))));
    }
}
