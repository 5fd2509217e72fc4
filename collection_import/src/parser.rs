//! CSV export parsing
//!
//! Accepts the TCGplayer and ManaBox export layouts (and close variants).
//! Bad rows are reported individually; only an unusable header aborts.

use crate::error::{ImportError, MalformedRow, Result};
use crate::log::ImportLog;
use crate::models::LineItem;
use csv::StringRecord;
use mtg_common::{FallbackId, Finish};

const QUANTITY: &[&str] = &["quantity", "qty", "count"];
const SET_CODE: &[&str] = &["set code", "setcode", "set"];
const COLLECTOR_NUMBER: &[&str] = &["card number", "collector number", "cn"];
const FINISH: &[&str] = &["foil", "printing", "finish"];
const CATALOG_ID: &[&str] = &["scryfall id"];
const EXTERNAL_ID: &[&str] = &["product id", "tcgplayer id"];
const NAME: &[&str] = &["name", "card name"];

/// Line items plus the rows that were rejected
#[derive(Debug, Default)]
pub struct ParsedInput {
    pub items: Vec<LineItem>,
    pub malformed: Vec<MalformedRow>,
}

impl ParsedInput {
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// Column positions resolved from the header row
#[derive(Debug, Default)]
struct ColumnMap {
    quantity: Option<usize>,
    set_code: Option<usize>,
    collector_number: Option<usize>,
    finish: Option<usize>,
    catalog_id: Option<usize>,
    external_id: Option<usize>,
    name: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |aliases: &[&str]| {
            aliases
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias))
        };

        Self {
            quantity: find(QUANTITY),
            set_code: find(SET_CODE),
            collector_number: find(COLLECTOR_NUMBER),
            finish: find(FINISH),
            catalog_id: find(CATALOG_ID),
            external_id: find(EXTERNAL_ID),
            name: find(NAME),
        }
    }

    fn has_identifying_columns(&self) -> bool {
        (self.set_code.is_some() && self.collector_number.is_some())
            || self.catalog_id.is_some()
            || self.external_id.is_some()
    }
}

/// Parse an uploaded export into line items, in file order.
pub fn parse_rows(input: &str, log: &ImportLog) -> Result<ParsedInput> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| ImportError::MalformedInput(format!("unreadable header: {}", e)))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);
    log.debug(format_args!("Resolved columns: {:?}", columns));

    if !columns.has_identifying_columns() {
        return Err(ImportError::MalformedInput(format!(
            "header has no set code/collector number or card id columns: {}",
            headers.iter().collect::<Vec<_>>().join(", ")
        )));
    }
    if columns.quantity.is_none() {
        log.warn(format_args!(
            "No quantity column found, every row will be rejected"
        ));
    }

    let mut parsed = ParsedInput::default();
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                log.warn(format_args!("Skipping unreadable row at line {}: {}", line, e));
                parsed.malformed.push(MalformedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        match parse_record(&record, &columns, line, log) {
            Ok(item) => parsed.items.push(item),
            Err(row) => {
                log.warn(format_args!("Rejected row: {}", row));
                parsed.malformed.push(row);
            }
        }
    }

    log.info(format_args!(
        "{} line items parsed ({} cards), {} rows rejected",
        parsed.items.len(),
        parsed.total_quantity(),
        parsed.malformed.len()
    ));
    Ok(parsed)
}

fn cell(record: &StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_record(
    record: &StringRecord,
    columns: &ColumnMap,
    line: u64,
    log: &ImportLog,
) -> std::result::Result<LineItem, MalformedRow> {
    let malformed = |reason: String| MalformedRow { line, reason };

    let quantity = match cell(record, columns.quantity) {
        None => return Err(malformed("missing quantity".to_string())),
        Some(raw) => match raw.parse::<u32>() {
            Ok(0) => return Err(malformed("quantity must be positive".to_string())),
            Ok(quantity) => quantity,
            Err(_) => return Err(malformed(format!("non-numeric quantity '{}'", raw))),
        },
    };

    let set_code = cell(record, columns.set_code).map(str::to_string);
    let collector_number = cell(record, columns.collector_number).map(str::to_string);

    let catalog_id =
        cell(record, columns.catalog_id).map(|id| FallbackId::CatalogId(id.to_string()));
    let external_id = cell(record, columns.external_id).and_then(|raw| match raw.parse::<u64>() {
        Ok(id) => Some(FallbackId::ExternalId(id)),
        Err(_) => {
            log.warn(format_args!(
                "Line {}: ignoring non-numeric product id '{}'",
                line, raw
            ));
            None
        }
    });
    let fallback = catalog_id.or(external_id);

    if (set_code.is_none() || collector_number.is_none()) && fallback.is_none() {
        return Err(malformed(
            "no set code/collector number and no card id".to_string(),
        ));
    }

    let requested_finish = cell(record, columns.finish)
        .map(Finish::parse)
        .unwrap_or(Finish::Unknown);

    Ok(LineItem {
        line,
        name: cell(record, columns.name).map(str::to_string),
        set_code,
        collector_number,
        requested_finish,
        quantity,
        fallback,
    })
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
