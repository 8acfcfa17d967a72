pub mod aggregation;
pub mod classifier;
pub mod dashboard;
pub mod evolution;
pub mod filter;
pub mod stats;
pub mod temporal;

pub use aggregation::{
    backlog_as_of, goal_gap, segment_by_model, segment_kpi, success_rate, AggregatedMetric,
    KpiScope, SegmentKpi,
};
pub use classifier::{classify, ModelSegment, StatusCategory};
pub use dashboard::{build_dashboard, build_dashboard_today, DashboardKpi, DashboardRequest};
pub use evolution::{build_daily_evolution, build_monthly_series, TimeSeriesPoint};
pub use filter::{apply_filters, DateRange, FilterState, TechnicianToken};
pub use temporal::ReferencePeriod;
