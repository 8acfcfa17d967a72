pub mod analyzer;
pub mod config;
pub mod error;
pub mod parser;

pub use analyzer::{build_dashboard, DashboardKpi, DashboardRequest, FilterState, ReferencePeriod};
pub use config::DashboardConfig;
pub use error::AppError;
pub use parser::{parse_json_rows, ParseOutput, ServiceRecord};

// ─── E2E Integration Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod e2e_tests {
    use chrono::NaiveDate;

    use crate::analyzer::classifier::{classify, StatusCategory};
    use crate::analyzer::filter::{apply_filters, TechnicianToken};
    use crate::analyzer::{build_daily_evolution, build_dashboard, DashboardRequest};
    use crate::config::{config_from_pairs, DashboardConfig};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Rows as a sheet-to-JSON conversion produces them: mixed headers,
    /// serial and text dates, blank cells.
    const ROWS: &str = r#"[
        {"OS": "1001", "Status iCare": "Sucesso-Reuso", "Modelo": "MODEM FIBRA",
         "Data Criação": "05/03/2024", "Data Execução": "10/03/2024",
         "Técnico - Último Atendimento": "MARIA", "Cycle Time": 5},
        {"OS": "1002", "Status iCare": "Backlog > 4 Dias", "Modelo": "OUTRO",
         "Data Criação": 45352, "Data Execução": null,
         "Técnico - Último Atendimento": ""},
        {"OS": "1003", "Status iCare": "Cancelado", "Modelo": "MODEM FIBRA",
         "Data Criação": "2024-03-02", "Data Execução": ""}
    ]"#;

    /// E2E: rows → records → dashboard, checking the documented scenarios.
    #[test]
    fn test_e2e_rows_to_dashboard() {
        let output = crate::parser::parse_json_rows(ROWS).expect("parsing failed");
        assert_eq!(output.records.len(), 3);
        assert!(output.warnings.is_empty(), "{:?}", output.warnings);
        assert_eq!(output.records[1].creation_date, Some(ymd(2024, 3, 1)));
        assert_eq!(output.unique_technicians, vec!["MARIA".to_string()]);

        let request: DashboardRequest =
            serde_json::from_str(r#"{"period": {"month": 2, "year": 2024}}"#).unwrap();
        let kpi = build_dashboard(&output.records, &request, &DashboardConfig::default(), ymd(2024, 7, 1))
            .expect("build_dashboard failed");

        // success rate 50%: base excludes the cancelled record
        assert_eq!(kpi.total.base, 2);
        assert_eq!(kpi.total.successes, 1);
        assert_eq!(kpi.total.success_rate, 50);

        // day 4 backlog, day 10 completion
        let series = &kpi.charts.daily_evolution;
        assert_eq!(series[3].backlog, 1);
        assert_eq!(series[9].retiradas, 1);
        assert_eq!(series[9].sucesso_with_previous, 1);

        assert_eq!(kpi.fiber.entrants, 2);
        assert_eq!(kpi.other.backlog, 1);
        assert_eq!(kpi.cycle_time.total_days, 5);
    }

    #[test]
    fn test_e2e_insucesso_reversa_is_failure() {
        assert_eq!(classify("INSUCESSO-REVERSA"), StatusCategory::Failure);

        let rows = r#"[{"OS": "9", "Status iCare": "INSUCESSO-REVERSA",
                        "Data Criação": "01/03/2024", "Data Execução": "02/03/2024"}]"#;
        let output = crate::parser::parse_json_rows(rows).unwrap();
        let request: DashboardRequest =
            serde_json::from_str(r#"{"period": {"month": 2, "year": 2024}}"#).unwrap();
        let kpi = build_dashboard(&output.records, &request, &DashboardConfig::default(), ymd(2024, 7, 1))
            .unwrap();
        assert_eq!(kpi.total.successes, 0);
        assert_eq!(kpi.total.failures, 1);
        assert_eq!(kpi.charts.daily_evolution[1].retiradas, 0);
    }

    #[test]
    fn test_e2e_csv_with_filters_and_config_pairs() {
        let csv = "OS;Status iCare;Modelo;Data Criação;Data Execução;Técnico - Último Atendimento\n\
                   1;Sucesso-Reuso;MODEM FIBRA;05/03/2024;10/03/2024;MARIA\n\
                   2;Backlog > 4 Dias;OUTRO;01/03/2024;;\n\
                   3;Sucesso-Reversa;HD PLUS;07/03/2024;08/03/2024;JOAO\n";
        let output = crate::parser::parse_csv_reader(csv.as_bytes(), b';').unwrap();
        assert_eq!(output.records.len(), 3);

        let config = config_from_pairs(vec![("goal_percent", "90"), ("fiber_model", "MODEM FIBRA")]);
        let mut request: DashboardRequest =
            serde_json::from_str(r#"{"period": {"month": 2, "year": 2024}}"#).unwrap();
        request.filters.technicians = vec![TechnicianToken::Filled];

        let filtered = apply_filters(&output.records, &request.filters);
        assert_eq!(filtered.len(), 2);

        let kpi = build_dashboard(&output.records, &request, &config, ymd(2024, 3, 31)).unwrap();
        assert_eq!(kpi.meta.filtered_records, 2);
        assert_eq!(kpi.total.success_rate, 100);
        assert_eq!(kpi.total.goal_gap, Some(0));
        assert_eq!(kpi.total.backlog, 0);

        let unfiltered = build_daily_evolution(&output.records, &request.period, ymd(2024, 3, 31));
        assert_eq!(unfiltered.last().unwrap().backlog, 1);
    }
}
