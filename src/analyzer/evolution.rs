use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::analyzer::aggregation::is_finalized;
use crate::analyzer::classifier::StatusCategory;
use crate::analyzer::stats::{mean, round1};
use crate::analyzer::temporal::{day_label, month_short_name, period_days, ReferencePeriod};
use crate::parser::types::ServiceRecord;

/// One day of the "Evolução Diária" chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    /// Day of month, zero-padded ("01").
    pub day: String,
    pub backlog: usize,
    pub retiradas: usize,
    pub backlog_with_previous: usize,
    pub sucesso_with_previous: usize,
    /// "DD/MM"
    pub date: String,
}

#[derive(Default, Clone, Copy)]
struct DayCounts {
    backlog: usize,
    backlog_with_previous: usize,
    retiradas: usize,
    sucesso_with_previous: usize,
}

/// Builds the daily series of `period`, from day 1 to the measurement end
/// (today for the current month).
///
/// Backlog entries are bucketed by creation date and accumulated with a
/// running counter, so each point equals
/// [`is_backlog_as_of`](crate::analyzer::aggregation::is_backlog_as_of) evaluated on
/// that day. Retiradas are successes whose execution date is exactly the day.
pub fn build_daily_evolution(
    records: &[ServiceRecord],
    period: &ReferencePeriod,
    today: NaiveDate,
) -> Vec<TimeSeriesPoint> {
    let days = period_days(period, today);
    let Some(&first) = days.first() else {
        return Vec::new();
    };

    // Backlog created before the first day is the opening stock.
    let mut running = DayCounts::default();
    let mut created_on: HashMap<NaiveDate, DayCounts> = HashMap::new();
    let mut executed_on: HashMap<NaiveDate, DayCounts> = HashMap::new();

    for r in records {
        let prior = r.has_prior_service();
        match r.category() {
            StatusCategory::Backlog => {
                let Some(created) = r.creation_date else {
                    continue;
                };
                let bucket = if created < first {
                    &mut running
                } else {
                    created_on.entry(created).or_default()
                };
                bucket.backlog += 1;
                if prior {
                    bucket.backlog_with_previous += 1;
                }
            }
            StatusCategory::Success => {
                let Some(executed) = r.execution_date else {
                    continue;
                };
                let bucket = executed_on.entry(executed).or_default();
                bucket.retiradas += 1;
                if prior {
                    bucket.sucesso_with_previous += 1;
                }
            }
            _ => {}
        }
    }

    let mut series = Vec::with_capacity(days.len());
    for day in days {
        if let Some(c) = created_on.get(&day) {
            running.backlog += c.backlog;
            running.backlog_with_previous += c.backlog_with_previous;
        }
        let executed = executed_on.get(&day).copied().unwrap_or_default();

        series.push(TimeSeriesPoint {
            day: format!("{:02}", day.day()),
            backlog: running.backlog,
            retiradas: executed.retiradas,
            backlog_with_previous: running.backlog_with_previous,
            sucesso_with_previous: executed.sucesso_with_previous,
            date: day_label(day),
        });
    }

    log::debug!(
        "Daily evolution {}: {} points from {} records",
        period.label(),
        series.len(),
        records.len()
    );
    series
}

/// One month of the yearly "Evolução Mensal" chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyPoint {
    /// pt-BR short month name ("mar").
    pub month: String,
    pub finalizados: usize,
    pub pendentes: usize,
    pub em_andamento: usize,
    /// Average cycle time of the month's records, one decimal.
    pub cycle_time: f64,
}

/// Twelve points for `year`, bucketed by creation month.
pub fn build_monthly_series(records: &[ServiceRecord], year: i32) -> Vec<MonthlyPoint> {
    (0..12u32)
        .map(|month0| {
            let in_month: Vec<&ServiceRecord> = records
                .iter()
                .filter(|r| {
                    r.creation_date
                        .is_some_and(|d| d.year() == year && d.month0() == month0)
                })
                .collect();
            let cycle_times: Vec<f64> = in_month
                .iter()
                .map(|r| r.cycle_time_days.unwrap_or(0) as f64)
                .collect();

            MonthlyPoint {
                month: month_short_name(month0).to_string(),
                finalizados: in_month.iter().filter(|r| is_finalized(r)).count(),
                pendentes: in_month
                    .iter()
                    .filter(|r| r.status_label.contains("Pendente"))
                    .count(),
                em_andamento: in_month
                    .iter()
                    .filter(|r| r.status_label.contains("Andamento"))
                    .count(),
                cycle_time: round1(mean(&cycle_times)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::aggregation::is_backlog_as_of;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rec(
        id: &str,
        status: &str,
        creation: Option<NaiveDate>,
        execution: Option<NaiveDate>,
        tech: &str,
    ) -> ServiceRecord {
        ServiceRecord {
            status_label: status.to_string(),
            creation_date: creation,
            execution_date: execution,
            last_technician: tech.to_string(),
            ..ServiceRecord::new(id)
        }
    }

    fn scenario() -> Vec<ServiceRecord> {
        vec![
            ServiceRecord {
                model: "MODEM FIBRA".into(),
                ..rec("1", "Sucesso-Reuso", Some(ymd(2024, 3, 5)), Some(ymd(2024, 3, 10)), "")
            },
            ServiceRecord {
                model: "OUTRO".into(),
                ..rec("2", "Backlog > 4 Dias", Some(ymd(2024, 3, 1)), None, "")
            },
            ServiceRecord {
                model: "MODEM FIBRA".into(),
                ..rec("3", "Cancelado", Some(ymd(2024, 3, 2)), None, "")
            },
        ]
    }

    fn march() -> ReferencePeriod {
        ReferencePeriod::new(2, 2024).unwrap()
    }

    #[test]
    fn test_scenario_day_four_and_ten() {
        let series = build_daily_evolution(&scenario(), &march(), ymd(2024, 6, 1));
        assert_eq!(series.len(), 31);

        let day4 = &series[3];
        assert_eq!(day4.day, "04");
        assert_eq!(day4.date, "04/03");
        assert_eq!(day4.backlog, 1);

        let day10 = &series[9];
        assert_eq!(day10.retiradas, 1);
        assert_eq!(series.iter().map(|p| p.retiradas).sum::<usize>(), 1);
    }

    #[test]
    fn test_current_month_stops_today() {
        let series = build_daily_evolution(&scenario(), &march(), ymd(2024, 3, 8));
        assert_eq!(series.len(), 8);
        assert_eq!(series.last().unwrap().date, "08/03");
    }

    #[test]
    fn test_future_month_is_complete() {
        let april = ReferencePeriod::new(3, 2024).unwrap();
        let series = build_daily_evolution(&scenario(), &april, ymd(2024, 3, 8));
        assert_eq!(series.len(), 30);
        assert!(series.iter().all(|p| p.backlog == 1));
    }

    #[test]
    fn test_prior_service_variants() {
        let records = vec![
            rec("1", "Backlog > 4 Dias", Some(ymd(2024, 2, 20)), None, "JOAO"),
            rec("2", "Backlog ≤ 4 Dias", Some(ymd(2024, 3, 3)), None, ""),
            rec("3", "Sucesso-Reversa", Some(ymd(2024, 3, 1)), Some(ymd(2024, 3, 3)), "MARIA"),
            rec("4", "Sucesso-Reuso", Some(ymd(2024, 3, 1)), Some(ymd(2024, 3, 3)), " "),
        ];
        let series = build_daily_evolution(&records, &march(), ymd(2024, 12, 31));

        assert_eq!(series[0].backlog, 1);
        assert_eq!(series[0].backlog_with_previous, 1);
        assert_eq!(series[2].backlog, 2);
        assert_eq!(series[2].backlog_with_previous, 1);
        assert_eq!(series[2].retiradas, 2);
        assert_eq!(series[2].sucesso_with_previous, 1);
    }

    #[test]
    fn test_running_counter_matches_point_in_time_rule() {
        let records = vec![
            rec("1", "Backlog > 30 Dias", Some(ymd(2024, 1, 15)), None, "A"),
            rec("2", "Backlog > 4 Dias", Some(ymd(2024, 3, 7)), None, ""),
            rec("3", "Backlog ≤ 4 Dias", Some(ymd(2024, 3, 31)), None, "B"),
            rec("4", "Backlog", Some(ymd(2024, 4, 2)), None, ""),
            rec("5", "Backlog", None, None, ""),
            rec("6", "Insucesso", Some(ymd(2024, 3, 1)), None, ""),
        ];
        let series = build_daily_evolution(&records, &march(), ymd(2025, 1, 1));
        let mut previous = 0;
        for (i, point) in series.iter().enumerate() {
            let day = ymd(2024, 3, i as u32 + 1);
            let expected = records.iter().filter(|r| is_backlog_as_of(r, day)).count();
            assert_eq!(point.backlog, expected, "day {}", point.day);
            assert!(point.backlog >= previous);
            previous = point.backlog;
        }
        assert_eq!(series.last().unwrap().backlog, 3);
    }

    #[test]
    fn test_serialized_shape() {
        let series = build_daily_evolution(&scenario(), &march(), ymd(2024, 3, 1));
        let json = serde_json::to_value(&series[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "day": "01",
                "backlog": 1,
                "retiradas": 0,
                "backlogWithPrevious": 0,
                "sucessoWithPrevious": 0,
                "date": "01/03"
            })
        );
    }

    #[test]
    fn test_monthly_series() {
        let mut records = vec![
            rec("1", "Finalizado", Some(ymd(2024, 3, 1)), None, ""),
            rec("2", "Sucesso-Reuso", Some(ymd(2024, 3, 9)), None, ""),
            rec("3", "Pendente", Some(ymd(2024, 3, 20)), None, ""),
            rec("4", "Em Andamento", Some(ymd(2024, 5, 2)), None, ""),
            rec("5", "Finalizado", Some(ymd(2023, 3, 1)), None, ""),
        ];
        records[0].cycle_time_days = Some(4);
        records[1].cycle_time_days = Some(2);

        let series = build_monthly_series(&records, 2024);
        assert_eq!(series.len(), 12);
        assert_eq!(series[2].month, "mar");
        assert_eq!(series[2].finalizados, 2);
        assert_eq!(series[2].pendentes, 1);
        assert_eq!(series[2].cycle_time, 2.0);
        assert_eq!(series[4].em_andamento, 1);
        assert_eq!(series[0].finalizados, 0);
        assert_eq!(series[0].cycle_time, 0.0);
    }
}
