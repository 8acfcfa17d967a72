use std::collections::HashMap;

use serde_json::Value;

use crate::error::AppError;
use crate::parser::types::RawRow;

/// Logical fields of a service record and the spreadsheet headers they may
/// appear under. The first header present in a row wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Creation,
    Scheduled,
    Execution,
    LastService,
    Status,
    ActivityStatus,
    Model,
    ServiceType,
    Technician,
    CycleTime,
}

impl Field {
    pub const ALL: [Field; 11] = [
        Field::Id,
        Field::Creation,
        Field::Scheduled,
        Field::Execution,
        Field::LastService,
        Field::Status,
        Field::ActivityStatus,
        Field::Model,
        Field::ServiceType,
        Field::Technician,
        Field::CycleTime,
    ];

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::Id => &["OS", "OS_Item", "ID"],
            Field::Creation => &["Data Criação", "Data Criacao"],
            Field::Scheduled => &["Data Agend.", "Data Agendamento"],
            Field::Execution => &["Data Execução", "Data Execucao", "Data Exec."],
            Field::LastService => &["Último Atendimento", "Ultimo Atendimento"],
            // "Satus iCare" is a typo carried by some exports.
            Field::Status => &["Status iCare", "Satus iCare", "Status"],
            Field::ActivityStatus => &["Status Atividade"],
            Field::Model => &["Modelo"],
            Field::ServiceType => &["Tipo-Subtipo de Serviço", "Tipo-Subtipo"],
            Field::Technician => &[
                "Técnico - Último Atendimento",
                "Tecnico - Ultimo Atendimento",
            ],
            Field::CycleTime => &["Cycle Time"],
        }
    }

    /// Label used in error and warning messages.
    pub fn label(&self) -> &'static str {
        self.aliases()[0]
    }
}

/// Columns without which no metric can be derived.
const REQUIRED: &[Field] = &[Field::Status, Field::Creation];

/// Looks a field up in a decoded row, following the alias list. A null cell
/// falls through to the next alias.
pub fn lookup<'a>(row: &'a RawRow, field: Field) -> Option<&'a Value> {
    field.aliases().iter().find_map(|alias| {
        row.get(*alias)
            .filter(|v| !v.is_null())
            .or_else(|| {
                row.iter()
                    .find(|(k, v)| k.trim() == *alias && !v.is_null())
                    .map(|(_, v)| v)
            })
    })
}

/// Maps header names to their index in a CSV record.
pub struct ColumnMap {
    indices: HashMap<String, usize>,
    headers: Vec<String>,
}

impl ColumnMap {
    /// Header fields are trimmed of surrounding whitespace and of a leading BOM.
    pub fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut indices = HashMap::new();
        let mut header_list = Vec::new();
        for (i, field) in headers.iter().enumerate() {
            let name = field.trim_start_matches('\u{FEFF}').trim().to_string();
            indices.entry(name.clone()).or_insert(i);
            header_list.push(name);
        }
        ColumnMap {
            indices,
            headers: header_list,
        }
    }

    pub fn has(&self, col: &str) -> bool {
        self.indices.contains_key(col)
    }

    /// True if any alias of the field is present.
    pub fn has_field(&self, field: Field) -> bool {
        field.aliases().iter().any(|a| self.has(a))
    }

    pub fn all_headers(&self) -> &[String] {
        &self.headers
    }

    /// Converts a CSV record into the same row shape the JSON path receives.
    pub fn to_row(&self, record: &csv::StringRecord) -> RawRow {
        let mut row = RawRow::new();
        for (i, header) in self.headers.iter().enumerate() {
            if header.is_empty() || row.contains_key(header) {
                continue;
            }
            let cell = record.get(i).unwrap_or("");
            row.insert(header.clone(), Value::String(cell.to_string()));
        }
        row
    }
}

#[derive(Debug)]
pub struct ColumnValidation {
    pub present: Vec<String>,
    pub missing_optional: Vec<String>,
}

/// Fails with `AppError::MissingColumns` when a required field has none of
/// its aliases among the headers.
pub fn validate_columns(col_map: &ColumnMap) -> Result<ColumnValidation, AppError> {
    let missing_required: Vec<String> = REQUIRED
        .iter()
        .filter(|f| !col_map.has_field(**f))
        .map(|f| f.label().to_string())
        .collect();

    if !missing_required.is_empty() {
        return Err(AppError::MissingColumns(missing_required));
    }

    let missing_optional = Field::ALL
        .iter()
        .filter(|f| !REQUIRED.contains(f) && **f != Field::Id)
        .filter(|f| !col_map.has_field(**f))
        .map(|f| f.label().to_string())
        .collect();

    Ok(ColumnValidation {
        present: col_map.all_headers().to_vec(),
        missing_optional,
    })
}
