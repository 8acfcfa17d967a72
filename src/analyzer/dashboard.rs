/// Dashboard KPIs for equipment pickups (retiradas): one call computes every
/// card and chart from the loaded records.
use std::time::Instant;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::aggregation::{
    cycle_time_summary, data_coverage, group_by_activity_status, group_by_classified_status,
    group_by_model, group_by_raw_status, group_by_service_type, group_by_status_and_model_family,
    group_by_technician_and_status, group_by_technician_model_status, group_by_technician_status,
    segment_kpi, status_overview, AggregatedMetric, CycleTimeKpi, DataCoverage, KpiScope,
    SegmentKpi, StatusOverview,
};
use super::classifier::ModelSegment;
use super::evolution::{build_daily_evolution, build_monthly_series, MonthlyPoint, TimeSeriesPoint};
use super::filter::{apply_filters, FilterState};
use super::temporal::ReferencePeriod;
use crate::config::DashboardConfig;
use crate::error::AppError;
use crate::parser::types::ServiceRecord;

// ─── Data Structures ─────────────────────────────────────────────────────────

/// What the filter panel sends: the selection plus the reference month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequest {
    #[serde(default)]
    pub filters: FilterState,
    pub period: ReferencePeriod,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardKpi {
    pub meta: DashboardMeta,
    /// Reference-period cards. Date-range filters do not apply to them.
    pub total: SegmentKpi,
    pub fiber: SegmentKpi,
    pub other: SegmentKpi,
    pub overview: StatusOverview,
    pub coverage: DataCoverage,
    pub charts: DashboardCharts,
    pub cycle_time: CycleTimeKpi,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMeta {
    pub total_records: usize,
    pub filtered_records: usize,
    /// "MARÇO/2024"
    pub reference_label: String,
    pub measured_on: NaiveDate,
    pub goal_percent: Option<f64>,
    pub active_filters: usize,
    pub calcul_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCharts {
    pub status_grouped: Vec<AggregatedMetric>,
    pub status_detailed: Vec<AggregatedMetric>,
    pub activity_status: Vec<AggregatedMetric>,
    pub service_types: Vec<AggregatedMetric>,
    pub models: Vec<AggregatedMetric>,
    pub status_by_model: Vec<AggregatedMetric>,
    pub daily_evolution: Vec<TimeSeriesPoint>,
    pub monthly: Vec<MonthlyPoint>,
    pub technician_status: Vec<AggregatedMetric>,
    pub technician_status_detailed: Vec<AggregatedMetric>,
    pub technician_model_status: Vec<AggregatedMetric>,
}

// ─── Builders ────────────────────────────────────────────────────────────────

fn build_charts(
    filtered: &[ServiceRecord],
    request: &DashboardRequest,
    config: &DashboardConfig,
    today: NaiveDate,
) -> DashboardCharts {
    let names = request.filters.technician_names();

    DashboardCharts {
        status_grouped: group_by_classified_status(filtered),
        status_detailed: group_by_raw_status(filtered),
        activity_status: group_by_activity_status(filtered),
        service_types: group_by_service_type(filtered, config.top_n),
        models: group_by_model(filtered, config.top_n),
        status_by_model: group_by_status_and_model_family(filtered),
        daily_evolution: build_daily_evolution(filtered, &request.period, today),
        monthly: build_monthly_series(filtered, request.period.year()),
        technician_status: group_by_technician_status(filtered, &names),
        technician_status_detailed: group_by_technician_and_status(filtered, &names),
        technician_model_status: group_by_technician_model_status(
            filtered,
            &names,
            config.technician_model_limit,
        ),
    }
}

/// Builds the complete dashboard from the loaded records.
///
/// # Arguments
/// * `records` - Every record of the import, unfiltered
/// * `request` - Filter selection and reference month
/// * `config` - Fiber model, base policy, goal and chart limits
/// * `today` - Caps the daily series and backlog date for the current month
pub fn build_dashboard(
    records: &[ServiceRecord],
    request: &DashboardRequest,
    config: &DashboardConfig,
    today: NaiveDate,
) -> Result<DashboardKpi, AppError> {
    let start = Instant::now();
    config.validate()?;

    let filtered = apply_filters(records, &request.filters);
    let period = &request.period;
    let measured_on = period.measurement_end(today);
    log::debug!(
        "Dashboard {}: {}/{} records after {} filter(s)",
        period.label(),
        filtered.len(),
        records.len(),
        request.filters.active_filter_count()
    );

    // The reference month is its own date window: the KPI cards ignore the
    // date ranges and keep every other dimension.
    let kpi_view = apply_filters(records, &request.filters.without_date_ranges());
    let kpi = |scope| segment_kpi(&kpi_view, period, config, scope, measured_on);
    let total = kpi(KpiScope::Total);
    let fiber = kpi(KpiScope::Model(ModelSegment::Fiber));
    let other = kpi(KpiScope::Model(ModelSegment::Other));

    let charts = build_charts(&filtered, request, config, today);
    let cycle_time = cycle_time_summary(&filtered);
    let overview = status_overview(&filtered);
    let coverage = data_coverage(&filtered);

    let meta = DashboardMeta {
        total_records: records.len(),
        filtered_records: filtered.len(),
        reference_label: period.label(),
        measured_on,
        goal_percent: config.goal_percent,
        active_filters: request.filters.active_filter_count(),
        calcul_duration_ms: start.elapsed().as_millis() as u64,
    };

    log::info!(
        "Dashboard {} computed in {} ms: base {}, sucesso {} ({}%), backlog {}",
        meta.reference_label,
        meta.calcul_duration_ms,
        total.base,
        total.successes,
        total.success_rate,
        total.backlog
    );

    Ok(DashboardKpi {
        meta,
        total,
        fiber,
        other,
        overview,
        coverage,
        charts,
        cycle_time,
    })
}

/// [`build_dashboard`] measured against the local clock.
pub fn build_dashboard_today(
    records: &[ServiceRecord],
    request: &DashboardRequest,
    config: &DashboardConfig,
) -> Result<DashboardKpi, AppError> {
    build_dashboard(records, request, config, chrono::Local::now().date_naive())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
