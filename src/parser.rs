// 🏗️ Parser Framework
// One parser per reference-data source, all feeding records to a sink

use crate::entities::{Country, Currency, Location, StateAssignment};
use crate::error::{AdminError, Result};
use crate::xml::{XmlDocument, XmlRecord};
use std::fs::File;
use std::path::Path;
use tracing::trace;

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceFormat - how a reference-data file is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// XML written by this extension's export
    Xml,
    /// Tab-delimited GeoNames dump (allCountries.txt, cities15000.txt, ...)
    GeoNamesText,
}

impl SourceFormat {
    pub fn name(&self) -> &str {
        match self {
            SourceFormat::Xml => "XML",
            SourceFormat::GeoNamesText => "GeoNames TXT",
        }
    }
}

/// Detect the format of a locations file from its extension.
///
/// `.xml` (any case) is XML, everything else is treated as GeoNames text.
pub fn detect_format(file_path: &Path) -> SourceFormat {
    let is_xml = file_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xml"))
        .unwrap_or(false);

    if is_xml {
        SourceFormat::Xml
    } else {
        SourceFormat::GeoNamesText
    }
}

/// How a parser treats the ids found in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Keep source ids; missing or zero ids are left for the store
    #[default]
    Preserve,
    /// Drop every source id (reset-id mode)
    Reset,
}

impl IdPolicy {
    pub fn from_reset_flag(reset_id: bool) -> Self {
        if reset_id {
            IdPolicy::Reset
        } else {
            IdPolicy::Preserve
        }
    }

    fn apply(&self, id: Option<i64>) -> Option<i64> {
        match self {
            IdPolicy::Reset => None,
            IdPolicy::Preserve => id.filter(|id| *id > 0),
        }
    }
}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// RecordParser - streams records out of one source file.
///
/// Records are pushed into `sink` as soon as they are read so callers can
/// batch them without holding the whole file. Returns the number of records
/// dropped by the parser's presence checks.
pub trait RecordParser {
    type Record;

    fn parse(
        &self,
        file_path: &Path,
        sink: &mut dyn FnMut(Self::Record) -> Result<()>,
    ) -> Result<usize>;

    fn format(&self) -> SourceFormat;

    /// Collect every record into memory
    fn parse_all(&self, file_path: &Path) -> Result<Vec<Self::Record>> {
        let mut records = Vec::new();
        self.parse(file_path, &mut |record| {
            records.push(record);
            Ok(())
        })?;
        Ok(records)
    }
}

// ============================================================================
// CURRENCIES
// ============================================================================

/// Currencies XML: every child of the root is a currency with
/// `id`, `title`, `abbr`, `symbol`, `position`.
///
/// No presence checks here; insert and update mode skip differently.
pub struct CurrencyXmlParser {
    ids: IdPolicy,
}

impl CurrencyXmlParser {
    pub fn new(ids: IdPolicy) -> Self {
        CurrencyXmlParser { ids }
    }

    fn currency(&self, item: &XmlRecord) -> Currency {
        Currency {
            id: self.ids.apply(item.integer("id")),
            title: item.text("title").to_string(),
            abbr: item.text("abbr").to_string(),
            symbol: item.text("symbol").to_string(),
            position: item.integer("position").unwrap_or(0),
        }
    }
}

impl RecordParser for CurrencyXmlParser {
    type Record = Currency;

    fn parse(&self, file_path: &Path, sink: &mut dyn FnMut(Currency) -> Result<()>) -> Result<usize> {
        let document = XmlDocument::load(file_path)?;

        for item in &document.records {
            sink(self.currency(item))?;
        }

        Ok(0)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Xml
    }
}

// ============================================================================
// COUNTRIES
// ============================================================================

/// Countries XML: `<country>` children with `id`, `name`, `code`, `code4`,
/// `latitude`, `longitude`, `currency`, `timezone`.
pub struct CountryXmlParser {
    ids: IdPolicy,
}

impl CountryXmlParser {
    pub fn new(ids: IdPolicy) -> Self {
        CountryXmlParser { ids }
    }
}

impl RecordParser for CountryXmlParser {
    type Record = Country;

    fn parse(&self, file_path: &Path, sink: &mut dyn FnMut(Country) -> Result<()>) -> Result<usize> {
        let document = XmlDocument::load(file_path)?;

        for item in document.records_named("country") {
            sink(Country {
                id: self.ids.apply(item.integer("id")),
                name: item.text("name").to_string(),
                code: item.text("code").to_string(),
                code4: item.text("code4").to_string(),
                latitude: item.text("latitude").to_string(),
                longitude: item.text("longitude").to_string(),
                currency: item.text("currency").to_string(),
                timezone: item.text("timezone").to_string(),
            })?;
        }

        Ok(0)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Xml
    }
}

// ============================================================================
// LOCATIONS
// ============================================================================

/// Locations XML: `<location>` children mirroring the GeoNames columns.
/// Records without a name are dropped.
pub struct LocationXmlParser {
    ids: IdPolicy,
}

impl LocationXmlParser {
    pub fn new(ids: IdPolicy) -> Self {
        LocationXmlParser { ids }
    }
}

impl RecordParser for LocationXmlParser {
    type Record = Location;

    fn parse(&self, file_path: &Path, sink: &mut dyn FnMut(Location) -> Result<()>) -> Result<usize> {
        let document = XmlDocument::load(file_path)?;
        let mut skipped = 0;

        for item in document.records_named("location") {
            let name = item.text("name");
            if name.is_empty() {
                skipped += 1;
                continue;
            }

            sink(Location {
                id: self.ids.apply(item.integer("id")),
                name: name.to_string(),
                latitude: item.text("latitude").to_string(),
                longitude: item.text("longitude").to_string(),
                country_code: item.text("country_code").to_string(),
                state_code: None,
                timezone: item.text("timezone").to_string(),
            })?;
        }

        Ok(skipped)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::Xml
    }
}

// GeoNames column positions
const GEONAME_ID: usize = 0;
const GEONAME_NAME: usize = 1;
const GEONAME_ASCII_NAME: usize = 2;
const GEONAME_LATITUDE: usize = 4;
const GEONAME_LONGITUDE: usize = 5;
const GEONAME_COUNTRY_CODE: usize = 8;
const GEONAME_POPULATION: usize = 14;
const GEONAME_TIMEZONE: usize = 17;

/// GeoNames tab-delimited dump.
///
/// The ASCII name is preferred, falling back to the UTF-8 name when blank.
/// Records without any name, or with a population under `min_population`,
/// are dropped.
pub struct GeoNamesParser {
    ids: IdPolicy,
    min_population: i64,
}

impl GeoNamesParser {
    pub fn new(ids: IdPolicy, min_population: i64) -> Self {
        GeoNamesParser {
            ids,
            min_population,
        }
    }

    fn column<'r>(record: &'r csv::StringRecord, index: usize) -> &'r str {
        record.get(index).unwrap_or("").trim()
    }

    /// I/O failures stay `Io`, anything else is a `Parse` error on `line`
    fn read_error(file_path: &Path, line: usize, error: csv::Error) -> AdminError {
        let message = error.to_string();
        match error.into_kind() {
            csv::ErrorKind::Io(source) => AdminError::io(file_path, source),
            _ => AdminError::parse(file_path, format!("line {}: {}", line, message)),
        }
    }
}

impl RecordParser for GeoNamesParser {
    type Record = Location;

    fn parse(&self, file_path: &Path, sink: &mut dyn FnMut(Location) -> Result<()>) -> Result<usize> {
        use csv::ReaderBuilder;

        let file = File::open(file_path).map_err(|e| AdminError::io(file_path, e))?;

        // GeoNames never quotes; names may contain '"'
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_reader(file);

        let mut skipped = 0;

        for (line_num, result) in reader.records().enumerate() {
            let record = result.map_err(|e| Self::read_error(file_path, line_num + 1, e))?;

            let mut name = Self::column(&record, GEONAME_ASCII_NAME);
            if name.is_empty() {
                name = Self::column(&record, GEONAME_NAME);
            }
            if name.is_empty() {
                trace!(line = line_num + 1, "location without name skipped");
                skipped += 1;
                continue;
            }

            let population = Self::column(&record, GEONAME_POPULATION).parse::<i64>().unwrap_or(0);
            if population < self.min_population {
                skipped += 1;
                continue;
            }

            let raw_id = Self::column(&record, GEONAME_ID);
            let id = if raw_id.is_empty() {
                None
            } else {
                let id = raw_id.parse::<i64>().map_err(|_| {
                    AdminError::parse(
                        file_path,
                        format!("line {}: invalid geoname id '{}'", line_num + 1, raw_id),
                    )
                })?;
                Some(id)
            };

            sink(Location {
                id: self.ids.apply(id),
                name: name.to_string(),
                latitude: Self::column(&record, GEONAME_LATITUDE).to_string(),
                longitude: Self::column(&record, GEONAME_LONGITUDE).to_string(),
                country_code: Self::column(&record, GEONAME_COUNTRY_CODE).to_string(),
                state_code: None,
                timezone: Self::column(&record, GEONAME_TIMEZONE).to_string(),
            })?;
        }

        Ok(skipped)
    }

    fn format(&self) -> SourceFormat {
        SourceFormat::GeoNamesText
    }
}

// ============================================================================
// STATES
// ============================================================================

/// Generator marker of states files exported by this extension
pub const NATIVE_STATES_GENERATOR: &str = "crowdfunding";

/// Which producer wrote a states file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatesFlavor {
    /// `<state>` records tied to location ids
    Native,
    /// `<city>` records matched by name
    Legacy,
}

impl StatesFlavor {
    pub fn from_generator(generator: Option<&str>) -> Self {
        match generator {
            Some(NATIVE_STATES_GENERATOR) => StatesFlavor::Native,
            _ => StatesFlavor::Legacy,
        }
    }
}

/// A parsed states file
#[derive(Debug, Clone)]
pub struct StatesFile {
    pub flavor: StatesFlavor,
    pub assignments: Vec<StateAssignment>,
    pub skipped: usize,
}

/// Read a states file, picking the record schema from the `generator` marker.
///
/// Native records need a state code and are keyed by id; legacy records need
/// a city name (a blank legacy state code still clears the column).
pub fn parse_states(file_path: &Path) -> Result<StatesFile> {
    let document = XmlDocument::load(file_path)?;
    let flavor = StatesFlavor::from_generator(document.attribute("generator"));

    let mut assignments = Vec::new();
    let mut skipped = 0;

    match flavor {
        StatesFlavor::Native => {
            for item in document.records_named("state") {
                let state_code = item.text("state_code");
                if state_code.is_empty() {
                    skipped += 1;
                    continue;
                }

                assignments.push(StateAssignment::ById {
                    location_id: item.integer("id").unwrap_or(0),
                    state_code: state_code.to_string(),
                });
            }
        }
        StatesFlavor::Legacy => {
            for item in document.records_named("city") {
                let name = item.text("name");
                if name.is_empty() {
                    skipped += 1;
                    continue;
                }

                assignments.push(StateAssignment::ByName {
                    name: name.to_string(),
                    state_code: item.text("state_code").to_string(),
                });
            }
        }
    }

    Ok(StatesFile {
        flavor,
        assignments,
        skipped,
    })
}
