use crate::domain::model::{FieldKey, InvoiceFields, InvoiceRequest, LineItem};
use crate::utils::error::{Result, ToolkitError};
use std::collections::HashMap;
use std::path::Path;

/// Item columns per row: `item1Name` .. `item5Tax`.
pub const MAX_BATCH_ITEMS: usize = 5;

/// One data row of a batch file, numbered from 1. A row that does not parse carries its error
/// so the remaining rows can still be processed.
#[derive(Debug)]
pub struct BatchRow {
    pub row: usize,
    pub request: Result<InvoiceRequest>,
}

/// One invoice request per CSV row. Column names are the field macro names plus
/// `item{i}Name`, `item{i}Description`, `item{i}Quantity`, `item{i}Price`, `item{i}Tax`.
///
/// Only an unreadable file or header fails the whole batch.
pub fn read_batch(path: &Path) -> Result<Vec<BatchRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = reader.headers()?.clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(index, name)| (name, index))
        .collect();

    let rows: Vec<BatchRow> = reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            let row = index + 1;
            let request = record
                .map_err(ToolkitError::from)
                .and_then(|record| parse_row(row, &record, &columns));
            BatchRow { row, request }
        })
        .collect();

    let failed = rows.iter().filter(|r| r.request.is_err()).count();
    tracing::info!(
        "Read {} invoice row(s) from {}, {} unreadable",
        rows.len(),
        path.display(),
        failed
    );
    Ok(rows)
}

fn parse_row(
    row: usize,
    record: &csv::StringRecord,
    columns: &HashMap<&str, usize>,
) -> Result<InvoiceRequest> {
    let value = |name: &str| cell(record, columns, name).to_string();

    let mut fields = InvoiceFields::default();
    for key in FieldKey::ALL {
        fields.set(key, value(key.macro_name()));
    }

    let mut items = Vec::new();
    for i in 1..=MAX_BATCH_ITEMS {
        let name = value(&format!("item{}Name", i));
        if name.is_empty() {
            continue;
        }
        let quantity = or_default(value(&format!("item{}Quantity", i)), "1");
        let price = or_default(value(&format!("item{}Price", i)), "0");
        let tax = or_default(value(&format!("item{}Tax", i)), "0");
        let item = LineItem::parse(
            &name,
            &value(&format!("item{}Description", i)),
            &quantity,
            &price,
            &tax,
        )
        .map_err(|e| {
            let detail = match e {
                ToolkitError::ValidationError { message } => message,
                other => other.to_string(),
            };
            ToolkitError::validation(format!("row {}, item {}: {}", row, i, detail))
        })?;
        items.push(item);
    }

    Ok(InvoiceRequest::new(fields, items))
}

fn cell<'r>(record: &'r csv::StringRecord, columns: &HashMap<&str, usize>, name: &str) -> &'r str {
    columns
        .get(name)
        .and_then(|&index| record.get(index))
        .unwrap_or("")
}

fn or_default(value: String, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value
    }
}
