use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analyzer::classifier::{classify, StatusCategory};

/// One spreadsheet row as handed over by the decoding layer: header → cell.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Normalised service record ("OS" of an equipment pickup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    pub id: String,
    pub creation_date: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
    pub execution_date: Option<NaiveDate>,
    pub last_service_date: Option<NaiveDate>,
    pub status_label: String,
    pub activity_status: String,
    pub model: String,
    pub service_type_label: String,
    pub last_technician: String,
    pub cycle_time_days: Option<i32>,
}

impl ServiceRecord {
    /// Empty record, handy as a base for struct-update syntax.
    pub fn new(id: impl Into<String>) -> Self {
        ServiceRecord {
            id: id.into(),
            creation_date: None,
            scheduled_date: None,
            execution_date: None,
            last_service_date: None,
            status_label: String::new(),
            activity_status: String::new(),
            model: String::new(),
            service_type_label: String::new(),
            last_technician: String::new(),
            cycle_time_days: None,
        }
    }

    pub fn category(&self) -> StatusCategory {
        classify(&self.status_label)
    }

    /// A previous visit was registered ("com atendimento anterior").
    pub fn has_prior_service(&self) -> bool {
        !self.last_technician.trim().is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseWarning {
    pub line: usize,
    pub message: String,
}
