use std::collections::BTreeSet;
use std::io::Read;
use std::time::Instant;

use crate::config::DashboardConfig;
use crate::error::AppError;
use crate::parser::columns::{lookup, validate_columns, ColumnMap, Field};
use crate::parser::deserializers::{
    cell_is_blank, cell_to_opt_i32, cell_to_string, parse_flexible_date,
};
use crate::parser::types::{ParseWarning, RawRow, ServiceRecord};

/// Normalised records plus what the filter panel needs to populate its
/// dropdowns.
#[derive(Debug)]
pub struct ParseOutput {
    pub records: Vec<ServiceRecord>,
    pub warnings: Vec<ParseWarning>,
    pub total_rows: usize,
    pub detected_columns: Vec<String>,
    pub missing_optional_columns: Vec<String>,
    pub unique_statuses: Vec<String>,
    pub unique_activity_statuses: Vec<String>,
    pub unique_service_types: Vec<String>,
    pub unique_models: Vec<String>,
    pub unique_technicians: Vec<String>,
    pub parse_duration_ms: u64,
}

/// Parses the JSON produced by a sheet-to-JSON conversion: an array of
/// objects keyed by header.
pub fn parse_json_rows(json: &str) -> Result<ParseOutput, AppError> {
    let rows: Vec<RawRow> = serde_json::from_str(json)?;
    parse_rows(rows)
}

/// Normalises already decoded rows. Rows are never dropped; only warnings
/// are collected.
pub fn parse_rows(rows: Vec<RawRow>) -> Result<ParseOutput, AppError> {
    let start = Instant::now();

    if rows.is_empty() {
        return Err(AppError::EmptyFile);
    }

    let mut detected: BTreeSet<String> = BTreeSet::new();
    for row in &rows {
        for key in row.keys() {
            detected.insert(key.trim().to_string());
        }
    }
    let detected_columns: Vec<String> = detected.into_iter().collect();
    let missing_optional_columns = Field::ALL
        .iter()
        .filter(|f| **f != Field::Id)
        .filter(|f| !f.aliases().iter().any(|a| detected_columns.iter().any(|c| c == a)))
        .map(|f| f.label().to_string())
        .collect();

    let mut warnings = Vec::new();
    let records: Vec<ServiceRecord> = rows
        .iter()
        .enumerate()
        // +2: 1-based, header on the first line
        .map(|(i, row)| normalize_row(row, i + 2, &mut warnings))
        .collect();

    Ok(finish(
        records,
        warnings,
        rows.len(),
        detected_columns,
        missing_optional_columns,
        start,
    ))
}

/// File-path entry using the delimiter from the dashboard configuration.
pub fn parse_csv_with_config(path: &str, config: &DashboardConfig) -> Result<ParseOutput, AppError> {
    config.validate()?;
    parse_csv(path, config.csv_delimiter_byte())
}

pub fn parse_csv(path: &str, delimiter: u8) -> Result<ParseOutput, AppError> {
    let file = std::fs::File::open(path)?;
    parse_csv_reader(std::io::BufReader::new(file), delimiter)
}

/// CSV export of the same sheet. Accepts any `Read` source.
///
/// Cells that are not valid UTF-8 are decoded lossily and the row is kept
/// with a warning. Only a failing reader aborts the parse.
pub fn parse_csv_reader<R: Read>(reader: R, delimiter: u8) -> Result<ParseOutput, AppError> {
    let start = Instant::now();

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .double_quote(true)
        .quoting(true)
        .from_reader(reader);

    let headers = csv::StringRecord::from_byte_record_lossy(rdr.byte_headers()?.clone());
    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::EmptyFile);
    }
    let col_map = ColumnMap::from_headers(&headers);
    let col_validation = validate_columns(&col_map)?;

    let mut records = Vec::new();
    let mut warnings = Vec::new();
    let mut row_idx = 0usize;

    for result in rdr.byte_records() {
        let raw = result?;
        row_idx += 1;
        let line = row_idx + 1;
        let record = match csv::StringRecord::from_byte_record(raw) {
            Ok(record) => record,
            Err(err) => {
                warnings.push(ParseWarning {
                    line,
                    message: format!("Caracteres inválidos substituídos: {}", err.utf8_error()),
                });
                csv::StringRecord::from_byte_record_lossy(err.into_byte_record())
            }
        };
        let row = col_map.to_row(&record);
        records.push(normalize_row(&row, line, &mut warnings));
    }

    if row_idx == 0 {
        return Err(AppError::EmptyFile);
    }

    Ok(finish(
        records,
        warnings,
        row_idx,
        col_validation.present,
        col_validation.missing_optional,
        start,
    ))
}

/// Builds a record from one row. Unparseable non-empty dates degrade to None
/// and leave a warning.
pub fn normalize_row(row: &RawRow, line: usize, warnings: &mut Vec<ParseWarning>) -> ServiceRecord {
    let text = |field: Field| lookup(row, field).map(cell_to_string).unwrap_or_default();

    let mut date = |field: Field| {
        let cell = lookup(row, field)?;
        let parsed = parse_flexible_date(cell);
        if parsed.is_none() && !cell_is_blank(cell) {
            warnings.push(ParseWarning {
                line,
                message: format!("{} inválida: {}", field.label(), cell_to_string(cell)),
            });
        }
        parsed
    };

    let creation_date = date(Field::Creation);
    let scheduled_date = date(Field::Scheduled);
    let execution_date = date(Field::Execution);
    let last_service_date = date(Field::LastService);

    let mut id = text(Field::Id);
    if id.is_empty() {
        id = format!("linha-{}", line);
    }

    ServiceRecord {
        id,
        creation_date,
        scheduled_date,
        execution_date,
        last_service_date,
        status_label: text(Field::Status),
        activity_status: text(Field::ActivityStatus),
        model: text(Field::Model),
        service_type_label: text(Field::ServiceType),
        last_technician: text(Field::Technician),
        cycle_time_days: lookup(row, Field::CycleTime).and_then(cell_to_opt_i32),
    }
}

fn finish(
    records: Vec<ServiceRecord>,
    warnings: Vec<ParseWarning>,
    total_rows: usize,
    detected_columns: Vec<String>,
    missing_optional_columns: Vec<String>,
    start: Instant,
) -> ParseOutput {
    let uniques = |pick: fn(&ServiceRecord) -> &str| -> Vec<String> {
        records
            .iter()
            .map(pick)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    };

    let output = ParseOutput {
        unique_statuses: uniques(|r| r.status_label.as_str()),
        unique_activity_statuses: uniques(|r| r.activity_status.as_str()),
        unique_service_types: uniques(|r| r.service_type_label.as_str()),
        unique_models: uniques(|r| r.model.as_str()),
        unique_technicians: uniques(|r| r.last_technician.as_str()),
        records,
        warnings,
        total_rows,
        detected_columns,
        missing_optional_columns,
        parse_duration_ms: start.elapsed().as_millis() as u64,
    };

    log::info!(
        "{} serviços importados ({} avisos) em {} ms",
        output.records.len(),
        output.warnings.len(),
        output.parse_duration_ms
    );

    output
}
