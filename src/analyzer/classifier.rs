use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Semantic group of a free-text "Status iCare".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum StatusCategory {
    Backlog,
    Success,
    Failure,
    Cancelled,
    Other,
}

impl StatusCategory {
    /// Label shown on the charts.
    pub fn label(&self) -> &'static str {
        match self {
            StatusCategory::Backlog => "Backlog",
            StatusCategory::Success => "Sucesso",
            StatusCategory::Failure => "Insucesso",
            StatusCategory::Cancelled => "Cancelado",
            StatusCategory::Other => "Outros",
        }
    }
}

/// Maps a status label to its category. Case-insensitive.
///
/// Order matters: "Insucesso" contains "sucesso", so failure is tested
/// before success. Cancellation wins over everything.
pub fn classify(status_label: &str) -> StatusCategory {
    let s = status_label.to_lowercase();
    if s.contains("cancel") {
        StatusCategory::Cancelled
    } else if s.contains("insucesso") {
        StatusCategory::Failure
    } else if s.contains("sucesso") {
        StatusCategory::Success
    } else if s.contains("backlog") {
        StatusCategory::Backlog
    } else {
        StatusCategory::Other
    }
}

static BACKLOG_BAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(>=|≥|<=|≤|>|<)?\s*(\d+)").expect("BACKLOG_BAND: invalid pattern")
});

/// Severity of a backlog band label ("Backlog > 30 Dias" > "Backlog > 14 Dias"
/// > "Backlog > 4 Dias" > "Backlog ≤ 4 Dias"). Labels without a number rank
/// lowest.
pub fn backlog_severity(status_label: &str) -> i64 {
    let Some(caps) = BACKLOG_BAND.captures(status_label) else {
        return -1;
    };
    // Free text: an absurdly long number saturates instead of overflowing.
    let days: i64 = caps[2].parse().unwrap_or(i64::MAX);
    let rank = days.saturating_mul(2);
    match caps.get(1).map(|m| m.as_str()) {
        Some(">") | Some(">=") | Some("≥") => rank.saturating_add(1),
        _ => rank,
    }
}

/// Business order of raw status labels: backlog bands by severity
/// descending, then success, failure, cancelled and everything else.
/// Ties fall back to alphabetical order.
pub fn compare_raw_status(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (classify(a), classify(b));
    ca.cmp(&cb)
        .then_with(|| {
            if ca == StatusCategory::Backlog {
                backlog_severity(b).cmp(&backlog_severity(a))
            } else {
                Ordering::Equal
            }
        })
        .then_with(|| a.cmp(b))
}

/// Binary equipment partition used by the FIBRA / PAYTV KPI tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ModelSegment {
    Fiber,
    Other,
}

impl ModelSegment {
    pub fn of(model: &str, fiber_model: &str) -> Self {
        if model.trim() == fiber_model.trim() {
            ModelSegment::Fiber
        } else {
            ModelSegment::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ModelSegment::Fiber => "FIBRA",
            ModelSegment::Other => "PAYTV",
        }
    }
}

/// Collapses the many model spellings into the families charted by
/// "Status por Modelo". Unknown models become "OUTROS".
pub fn normalize_model_family(model: &str) -> &'static str {
    let v = model.trim().to_uppercase();
    if v.contains("MODEM FIBRA") {
        "MODEM FIBRA"
    } else if v.contains("DVR ANDROID 4K") {
        "DVR ANDROID 4K"
    } else if v == "HD" || v.contains("HD PLUS") {
        "HD PLUS"
    } else if v.contains("SLIM") || v.contains("SH10") || v.contains("ZAPPER") {
        "ZAPPER"
    } else if v == "LINHA" || v == "S14" {
        "LINHA"
    } else {
        "OUTROS"
    }
}
