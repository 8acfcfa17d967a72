use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::analyzer::temporal::date_in_range;
use crate::parser::types::ServiceRecord;

/// Inclusive date window; an unset bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        DateRange { from, to }
    }

    pub fn is_active(&self) -> bool {
        self.from.is_some() || self.to.is_some()
    }

    /// An active range rejects records without the date.
    pub fn matches(&self, date: Option<NaiveDate>) -> bool {
        if !self.is_active() {
            return true;
        }
        match date {
            Some(d) => date_in_range(d, self.from, self.to),
            None => false,
        }
    }
}

/// One entry of the technician multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TechnicianToken {
    /// Any non-empty technician.
    Filled,
    /// Blank or missing technician.
    Empty,
    Name(String),
}

impl TechnicianToken {
    pub const FILLED: &'static str = "filled";
    pub const EMPTY: &'static str = "empty";

    pub fn from_token(token: &str) -> Self {
        match token.trim() {
            "filled" => TechnicianToken::Filled,
            "empty" => TechnicianToken::Empty,
            name => TechnicianToken::Name(name.to_string()),
        }
    }

    pub fn as_token(&self) -> &str {
        match self {
            TechnicianToken::Filled => Self::FILLED,
            TechnicianToken::Empty => Self::EMPTY,
            TechnicianToken::Name(name) => name,
        }
    }

    pub fn matches(&self, technician: &str) -> bool {
        let technician = technician.trim();
        match self {
            TechnicianToken::Filled => !technician.is_empty(),
            TechnicianToken::Empty => technician.is_empty(),
            TechnicianToken::Name(name) => technician == name,
        }
    }
}

impl Serialize for TechnicianToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_token())
    }
}

impl<'de> Deserialize<'de> for TechnicianToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TechnicianToken::from_token(&s))
    }
}

/// User selection from the filter panel. `None`, "", "todos" and "all" on a
/// categorical field mean no restriction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub creation_range: DateRange,
    pub scheduled_range: DateRange,
    pub execution_range: DateRange,
    pub status: Option<String>,
    pub activity_status: Option<String>,
    pub service_type: Option<String>,
    pub model: Option<String>,
    pub technicians: Vec<TechnicianToken>,
}

fn choice(value: &Option<String>) -> Option<&str> {
    match value.as_deref().map(str::trim) {
        None | Some("") | Some("todos") | Some("all") => None,
        Some(v) => Some(v),
    }
}

fn matches_choice(selected: &Option<String>, value: &str) -> bool {
    choice(selected).map_or(true, |c| value.trim() == c)
}

impl FilterState {
    /// AND across dimensions, OR inside the technician multi-select.
    pub fn matches(&self, record: &ServiceRecord) -> bool {
        self.creation_range.matches(record.creation_date)
            && self.scheduled_range.matches(record.scheduled_date)
            && self.execution_range.matches(record.execution_date)
            && matches_choice(&self.status, &record.status_label)
            && matches_choice(&self.activity_status, &record.activity_status)
            && matches_choice(&self.service_type, &record.service_type_label)
            && matches_choice(&self.model, &record.model)
            && (self.technicians.is_empty()
                || self
                    .technicians
                    .iter()
                    .any(|t| t.matches(&record.last_technician)))
    }

    pub fn active_filter_count(&self) -> usize {
        [
            self.creation_range.is_active(),
            self.scheduled_range.is_active(),
            self.execution_range.is_active(),
            choice(&self.status).is_some(),
            choice(&self.activity_status).is_some(),
            choice(&self.service_type).is_some(),
            choice(&self.model).is_some(),
            !self.technicians.is_empty(),
        ]
        .iter()
        .filter(|active| **active)
        .count()
    }

    /// Same selection with the three date ranges cleared. The reference
    /// period KPIs are computed over this view.
    pub fn without_date_ranges(&self) -> FilterState {
        FilterState {
            creation_range: DateRange::default(),
            scheduled_range: DateRange::default(),
            execution_range: DateRange::default(),
            ..self.clone()
        }
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filter_count() > 0
    }

    /// Literal technician names selected (sentinels excluded).
    pub fn technician_names(&self) -> Vec<String> {
        self.technicians
            .iter()
            .filter_map(|t| match t {
                TechnicianToken::Name(name) if !name.is_empty() => Some(name.clone()),
                _ => None,
            })
            .collect()
    }
}

pub fn apply_filters(records: &[ServiceRecord], filters: &FilterState) -> Vec<ServiceRecord> {
    records
        .iter()
        .filter(|r| filters.matches(r))
        .cloned()
        .collect()
}
