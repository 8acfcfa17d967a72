use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Date that places a record inside the reference period when counting the
/// percentage denominator ("entrantes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BaseDateField {
    Creation,
    Execution,
}

impl BaseDateField {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "creation" | "criacao" | "criação" => Some(BaseDateField::Creation),
            "execution" | "execucao" | "execução" => Some(BaseDateField::Execution),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            BaseDateField::Creation => "creation",
            BaseDateField::Execution => "execution",
        }
    }
}

/// Which records form the base of the success / failure percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasePolicy {
    pub date_field: BaseDateField,
    pub exclude_cancelled: bool,
}

impl Default for BasePolicy {
    fn default() -> Self {
        BasePolicy {
            date_field: BaseDateField::Creation,
            exclude_cancelled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardConfig {
    pub fiber_model: String,
    pub base_policy: BasePolicy,
    pub goal_percent: Option<f64>,
    pub top_n: usize,
    pub technician_model_limit: usize,
    pub csv_delimiter: char,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            fiber_model: "MODEM FIBRA".to_string(),
            base_policy: BasePolicy::default(),
            goal_percent: None,
            top_n: 10,
            technician_model_limit: 30,
            csv_delimiter: ';',
        }
    }
}

impl DashboardConfig {
    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        let config: DashboardConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects a goal outside 0–100. An absent goal is always valid.
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(goal) = self.goal_percent {
            if goal.is_nan() || !(0.0..=100.0).contains(&goal) {
                return Err(AppError::InvalidGoal(goal));
            }
        }
        if !self.csv_delimiter.is_ascii() {
            return Err(AppError::Custom(format!(
                "Delimitador CSV inválido: {:?}",
                self.csv_delimiter
            )));
        }
        Ok(())
    }

    pub fn csv_delimiter_byte(&self) -> u8 {
        if self.csv_delimiter.is_ascii() {
            self.csv_delimiter as u8
        } else {
            b';'
        }
    }

    /// Key/value form, the inverse of [`config_from_pairs`].
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("fiber_model", self.fiber_model.clone()),
            (
                "base_date_field",
                self.base_policy.date_field.as_str().to_string(),
            ),
            (
                "exclude_cancelled",
                self.base_policy.exclude_cancelled.to_string(),
            ),
            (
                "goal_percent",
                self.goal_percent.map(|g| g.to_string()).unwrap_or_default(),
            ),
            ("top_n", self.top_n.to_string()),
            (
                "technician_model_limit",
                self.technician_model_limit.to_string(),
            ),
            ("csv_delimiter", self.csv_delimiter.to_string()),
        ]
    }
}

/// Builds a config from loose key/value pairs (environment, query string,
/// settings table). Unknown keys are ignored and unparseable values keep the
/// default.
pub fn config_from_pairs<I, K, V>(pairs: I) -> DashboardConfig
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut config = DashboardConfig::default();

    for (key, value) in pairs {
        let value = value.as_ref().trim();
        match key.as_ref() {
            "fiber_model" => {
                if !value.is_empty() {
                    config.fiber_model = value.to_string();
                }
            }
            "base_date_field" => {
                if let Some(field) = BaseDateField::parse(value) {
                    config.base_policy.date_field = field;
                }
            }
            "exclude_cancelled" => {
                config.base_policy.exclude_cancelled = value.parse().unwrap_or(true)
            }
            "goal_percent" => {
                config.goal_percent = value
                    .replace(',', ".")
                    .parse::<f64>()
                    .ok()
                    .filter(|g| (0.0..=100.0).contains(g));
            }
            "top_n" => config.top_n = value.parse().unwrap_or(10),
            "technician_model_limit" => {
                config.technician_model_limit = value.parse().unwrap_or(30)
            }
            "csv_delimiter" => {
                if let Some(c) = value.chars().next().filter(char::is_ascii) {
                    config.csv_delimiter = c;
                }
            }
            other => log::debug!("Chave de configuração ignorada: {}", other),
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.fiber_model, "MODEM FIBRA");
        assert_eq!(config.base_policy.date_field, BaseDateField::Creation);
        assert!(config.base_policy.exclude_cancelled);
        assert!(config.goal_percent.is_none());
        assert_eq!(config.top_n, 10);
        assert_eq!(config.csv_delimiter_byte(), b';');
    }

    #[test]
    fn test_from_pairs_overrides() {
        let config = config_from_pairs(vec![
            ("goal_percent", "85,5"),
            ("exclude_cancelled", "false"),
            ("base_date_field", "execution"),
            ("top_n", "5"),
            ("csv_delimiter", ","),
        ]);
        assert_eq!(config.goal_percent, Some(85.5));
        assert!(!config.base_policy.exclude_cancelled);
        assert_eq!(config.base_policy.date_field, BaseDateField::Execution);
        assert_eq!(config.top_n, 5);
        assert_eq!(config.csv_delimiter_byte(), b',');
    }

    #[test]
    fn test_from_pairs_invalid_values_keep_defaults() {
        let config = config_from_pairs(vec![
            ("goal_percent", "150"),
            ("top_n", "muitos"),
            ("base_date_field", "agendamento"),
            ("chave_desconhecida", "x"),
        ]);
        assert!(config.goal_percent.is_none());
        assert_eq!(config.top_n, 10);
        assert_eq!(config.base_policy.date_field, BaseDateField::Creation);
    }

    #[test]
    fn test_pairs_roundtrip() {
        let mut config = DashboardConfig::default();
        config.goal_percent = Some(90.0);
        config.base_policy.exclude_cancelled = false;
        let again = config_from_pairs(config.to_pairs());
        assert_eq!(again, config);
    }

    #[test]
    fn test_from_json_partial() {
        let config =
            DashboardConfig::from_json_str(r#"{"goalPercent": 80, "basePolicy": {"excludeCancelled": false}}"#)
                .unwrap();
        assert_eq!(config.goal_percent, Some(80.0));
        assert!(!config.base_policy.exclude_cancelled);
        assert_eq!(config.base_policy.date_field, BaseDateField::Creation);
        assert_eq!(config.fiber_model, "MODEM FIBRA");
    }

    #[test]
    fn test_validate_rejects_out_of_range_goal() {
        let err = DashboardConfig::from_json_str(r#"{"goalPercent": 120}"#).unwrap_err();
        assert!(matches!(err, AppError::InvalidGoal(g) if g == 120.0));
    }
}
