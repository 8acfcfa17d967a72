use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::analyzer::classifier::{
    compare_raw_status, normalize_model_family, ModelSegment, StatusCategory,
};
use crate::analyzer::stats::{mean, pct1, pct_rounded, round1};
use crate::analyzer::temporal::ReferencePeriod;
use crate::config::{BaseDateField, BasePolicy, DashboardConfig};
use crate::parser::types::ServiceRecord;

/// Uniform `{name, value}` item consumed by every categorical chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedMetric {
    #[serde(rename = "name")]
    pub label: String,
    #[serde(rename = "value")]
    pub count: usize,
    #[serde(rename = "percentOfBase", skip_serializing_if = "Option::is_none")]
    pub percent_of_base: Option<f64>,
}

impl AggregatedMetric {
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        AggregatedMetric {
            label: label.into(),
            count,
            percent_of_base: None,
        }
    }

    fn with_base(label: impl Into<String>, count: usize, base: usize) -> Self {
        AggregatedMetric {
            label: label.into(),
            count,
            percent_of_base: Some(pct1(count, base)),
        }
    }
}

fn label_or_outros(s: &str) -> &str {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        "Outros"
    } else {
        trimmed
    }
}

// ─── Status groupings ────────────────────────────────────────────────────────

/// One entry per category present, in category order. Percentages are of
/// the whole collection.
pub fn group_by_classified_status(records: &[ServiceRecord]) -> Vec<AggregatedMetric> {
    let mut counts: BTreeMap<StatusCategory, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(r.category()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(cat, n)| AggregatedMetric::with_base(cat.label(), n, records.len()))
        .collect()
}

/// One entry per literal status, in business order (see
/// [`compare_raw_status`]), not in order of appearance.
pub fn group_by_raw_status(records: &[ServiceRecord]) -> Vec<AggregatedMetric> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        *counts.entry(label_or_outros(&r.status_label)).or_default() += 1;
    }
    let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| compare_raw_status(a.0, b.0));
    entries
        .into_iter()
        .map(|(label, n)| AggregatedMetric::with_base(label, n, records.len()))
        .collect()
}

/// Top `n` values of a text column, by count descending then label.
fn top_counts(
    records: &[ServiceRecord],
    key: impl Fn(&ServiceRecord) -> &str,
    n: usize,
) -> Vec<AggregatedMetric> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        *counts.entry(label_or_outros(key(r))).or_default() += 1;
    }
    let mut entries: Vec<(&str, usize)> = counts.into_iter().collect();
    // stable: equal counts keep alphabetical order
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
        .into_iter()
        .take(n)
        .map(|(label, count)| AggregatedMetric::with_base(label, count, records.len()))
        .collect()
}

pub fn group_by_service_type(records: &[ServiceRecord], n: usize) -> Vec<AggregatedMetric> {
    top_counts(records, |r| r.service_type_label.as_str(), n)
}

pub fn group_by_model(records: &[ServiceRecord], n: usize) -> Vec<AggregatedMetric> {
    top_counts(records, |r| r.model.as_str(), n)
}

/// "Status por Modelo": `"<family> - <group>"`, unknown families and
/// cancelled/other statuses left out.
pub fn group_by_status_and_model_family(records: &[ServiceRecord]) -> Vec<AggregatedMetric> {
    let mut counts: BTreeMap<(&'static str, StatusCategory), usize> = BTreeMap::new();
    for r in records {
        let family = normalize_model_family(&r.model);
        if family == "OUTROS" {
            continue;
        }
        let cat = r.category();
        if matches!(cat, StatusCategory::Cancelled | StatusCategory::Other) {
            continue;
        }
        *counts.entry((family, cat)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((family, cat), n)| AggregatedMetric::new(format!("{} - {}", family, cat.label()), n))
        .collect()
}

/// "Status Atividade" distribution, one entry per value in alphabetical
/// order. Blank values are grouped under "Sem Status".
pub fn group_by_activity_status(records: &[ServiceRecord]) -> Vec<AggregatedMetric> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for r in records {
        let label = match r.activity_status.trim() {
            "" => "Sem Status",
            s => s,
        };
        *counts.entry(label).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(label, n)| AggregatedMetric::with_base(label, n, records.len()))
        .collect()
}

// ─── Overview counters ───────────────────────────────────────────────────────

/// Finished pickup: a "Finalizado" label or a classified success.
pub fn is_finalized(record: &ServiceRecord) -> bool {
    record.status_label.contains("Finalizado") || record.category() == StatusCategory::Success
}

/// Headline counters over the filtered records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverview {
    pub total: usize,
    pub finalizados: usize,
    pub sucesso: usize,
    pub pendentes: usize,
    pub em_andamento: usize,
}

pub fn status_overview(records: &[ServiceRecord]) -> StatusOverview {
    let mut overview = StatusOverview {
        total: records.len(),
        finalizados: 0,
        sucesso: 0,
        pendentes: 0,
        em_andamento: 0,
    };
    for r in records {
        if is_finalized(r) {
            overview.finalizados += 1;
        }
        if r.category() == StatusCategory::Success {
            overview.sucesso += 1;
        }
        if r.status_label.contains("Pendente") {
            overview.pendentes += 1;
        }
        if r.status_label.contains("Andamento") {
            overview.em_andamento += 1;
        }
    }
    overview
}

/// How many records carry the optional pickup columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCoverage {
    pub total: usize,
    pub with_execution_date: usize,
    /// Last-service date or last technician filled.
    pub with_last_service: usize,
}

pub fn data_coverage(records: &[ServiceRecord]) -> DataCoverage {
    DataCoverage {
        total: records.len(),
        with_execution_date: records.iter().filter(|r| r.execution_date.is_some()).count(),
        with_last_service: records
            .iter()
            .filter(|r| r.last_service_date.is_some() || r.has_prior_service())
            .count(),
    }
}

// ─── Technician views ────────────────────────────────────────────────────────

fn selected_technician<'a>(record: &'a ServiceRecord, names: &[String]) -> Option<&'a str> {
    let tech = record.last_technician.trim();
    if tech.is_empty() || !names.iter().any(|n| n == tech) {
        None
    } else {
        Some(tech)
    }
}

/// Category counts restricted to the selected technicians.
pub fn group_by_technician_status(
    records: &[ServiceRecord],
    names: &[String],
) -> Vec<AggregatedMetric> {
    if names.is_empty() {
        return Vec::new();
    }
    let subset: Vec<ServiceRecord> = records
        .iter()
        .filter(|r| selected_technician(r, names).is_some())
        .cloned()
        .collect();
    group_by_classified_status(&subset)
}

/// `"<technician> - <group>"`, cancelled left out, ordered by group then
/// technician.
pub fn group_by_technician_and_status(
    records: &[ServiceRecord],
    names: &[String],
) -> Vec<AggregatedMetric> {
    let mut counts: BTreeMap<(StatusCategory, &str), usize> = BTreeMap::new();
    for r in records {
        let Some(tech) = selected_technician(r, names) else {
            continue;
        };
        let cat = r.category();
        if cat == StatusCategory::Cancelled {
            continue;
        }
        *counts.entry((cat, tech)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((cat, tech), n)| AggregatedMetric::new(format!("{} - {}", tech, cat.label()), n))
        .collect()
}

/// `"<model> - <group>"` for the selected technicians, cancelled/other left
/// out, ordered by model then group and capped at `limit`.
pub fn group_by_technician_model_status(
    records: &[ServiceRecord],
    names: &[String],
    limit: usize,
) -> Vec<AggregatedMetric> {
    let mut counts: BTreeMap<(String, StatusCategory), usize> = BTreeMap::new();
    for r in records {
        if selected_technician(r, names).is_none() {
            continue;
        }
        let cat = r.category();
        if matches!(cat, StatusCategory::Cancelled | StatusCategory::Other) {
            continue;
        }
        let model = match r.model.trim() {
            "" => "OUTROS".to_string(),
            m => m.to_string(),
        };
        *counts.entry((model, cat)).or_default() += 1;
    }
    counts
        .into_iter()
        .take(limit)
        .map(|((model, cat), n)| AggregatedMetric::new(format!("{} - {}", model, cat.label()), n))
        .collect()
}

// ─── Model segments ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SegmentedRecords<'a> {
    pub fiber: Vec<&'a ServiceRecord>,
    pub other: Vec<&'a ServiceRecord>,
}

pub fn segment_by_model<'a>(records: &'a [ServiceRecord], fiber_model: &str) -> SegmentedRecords<'a> {
    let mut out = SegmentedRecords::default();
    for r in records {
        match ModelSegment::of(&r.model, fiber_model) {
            ModelSegment::Fiber => out.fiber.push(r),
            ModelSegment::Other => out.other.push(r),
        }
    }
    out
}

/// Which records a KPI block covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KpiScope {
    Total,
    Model(ModelSegment),
}

impl KpiScope {
    pub fn label(&self) -> &'static str {
        match self {
            KpiScope::Total => "TOTAL",
            KpiScope::Model(segment) => segment.label(),
        }
    }

    pub fn includes(&self, record: &ServiceRecord, fiber_model: &str) -> bool {
        match self {
            KpiScope::Total => true,
            KpiScope::Model(segment) => ModelSegment::of(&record.model, fiber_model) == *segment,
        }
    }
}

// ─── Rates ───────────────────────────────────────────────────────────────────

/// round(100 × success / base), 0 for an empty base, never above 100.
pub fn success_rate(success_count: usize, base_count: usize) -> u32 {
    pct_rounded(success_count, base_count).min(100)
}

/// Successes still missing to reach `goal_percent` of the base. None when no
/// goal is configured or the goal is not a finite number.
pub fn goal_gap(success_count: usize, base_count: usize, goal_percent: Option<f64>) -> Option<u32> {
    let goal = goal_percent.filter(|g| g.is_finite())?;
    let needed = (goal * base_count as f64 / 100.0).ceil();
    let gap = needed - success_count as f64;
    Some(if gap > 0.0 { gap as u32 } else { 0 })
}

/// Point-in-time backlog membership: classified Backlog and created on or
/// before `as_of`. Records without a creation date never count.
pub fn is_backlog_as_of(record: &ServiceRecord, as_of: NaiveDate) -> bool {
    record.category() == StatusCategory::Backlog
        && record.creation_date.is_some_and(|created| created <= as_of)
}

pub fn backlog_as_of(records: &[ServiceRecord], as_of: NaiveDate) -> usize {
    records.iter().filter(|r| is_backlog_as_of(r, as_of)).count()
}

/// Records forming the percentage denominator of the period.
pub fn in_base(record: &ServiceRecord, period: &ReferencePeriod, policy: &BasePolicy) -> bool {
    let date = match policy.date_field {
        BaseDateField::Creation => record.creation_date,
        BaseDateField::Execution => record.execution_date,
    };
    period.contains_opt(date)
        && !(policy.exclude_cancelled && record.category() == StatusCategory::Cancelled)
}

// ─── KPI block ───────────────────────────────────────────────────────────────

/// One column of KPI cards (TOTAL, FIBRA or PAYTV).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentKpi {
    pub segment: String,
    /// Created in the period, cancelled included.
    pub entrants: usize,
    /// Denominator of the success and failure rates.
    pub base: usize,
    pub backlog: usize,
    /// Classified success with execution date in the period.
    pub successes: usize,
    pub success_rate: u32,
    pub goal_gap: Option<u32>,
    pub failures: usize,
    pub failure_rate: u32,
    /// Cancelled among the entrants.
    pub cancelled: usize,
    pub cancelled_rate: u32,
}

/// The single KPI computation behind the three card columns.
///
/// `measured_on` is the backlog measurement date (see
/// [`ReferencePeriod::measurement_end`]).
pub fn segment_kpi(
    records: &[ServiceRecord],
    period: &ReferencePeriod,
    config: &DashboardConfig,
    scope: KpiScope,
    measured_on: NaiveDate,
) -> SegmentKpi {
    let mut kpi = SegmentKpi {
        segment: scope.label().to_string(),
        entrants: 0,
        base: 0,
        backlog: 0,
        successes: 0,
        success_rate: 0,
        goal_gap: None,
        failures: 0,
        failure_rate: 0,
        cancelled: 0,
        cancelled_rate: 0,
    };

    for r in records.iter().filter(|r| scope.includes(r, &config.fiber_model)) {
        let cat = r.category();
        let entrant = period.contains_opt(r.creation_date);

        if entrant {
            kpi.entrants += 1;
            if cat == StatusCategory::Cancelled {
                kpi.cancelled += 1;
            }
        }
        if in_base(r, period, &config.base_policy) {
            kpi.base += 1;
        }
        if is_backlog_as_of(r, measured_on) {
            kpi.backlog += 1;
        }
        if cat == StatusCategory::Success && period.contains_opt(r.execution_date) {
            kpi.successes += 1;
        }
        if cat == StatusCategory::Failure {
            kpi.failures += 1;
        }
    }

    kpi.success_rate = success_rate(kpi.successes, kpi.base);
    kpi.goal_gap = goal_gap(kpi.successes, kpi.base, config.goal_percent);
    kpi.failure_rate = pct_rounded(kpi.failures, kpi.base);
    kpi.cancelled_rate = pct_rounded(kpi.cancelled, kpi.entrants);
    kpi
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleTimeKpi {
    pub total_days: i64,
    /// Over every record; a missing cycle time counts as 0.
    pub average_days: f64,
    pub with_value: usize,
}

pub fn cycle_time_summary(records: &[ServiceRecord]) -> CycleTimeKpi {
    let values: Vec<f64> = records
        .iter()
        .map(|r| r.cycle_time_days.unwrap_or(0) as f64)
        .collect();
    CycleTimeKpi {
        total_days: records
            .iter()
            .filter_map(|r| r.cycle_time_days)
            .map(i64::from)
            .sum(),
        average_days: round1(mean(&values)),
        with_value: records.iter().filter(|r| r.cycle_time_days.is_some()).count(),
    }
}
