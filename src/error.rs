use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de entrada/saída: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Erro de serialização: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Colunas obrigatórias ausentes: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Planilha vazia")]
    EmptyFile,

    #[error("Período de referência inválido: mês {month}, ano {year}")]
    InvalidReferencePeriod { month: u32, year: i32 },

    #[error("Meta percentual inválida: {0} (esperado entre 0 e 100)")]
    InvalidGoal(f64),

    #[error("{0}")]
    Custom(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message() {
        let err = AppError::MissingColumns(vec!["Status iCare".into(), "Data Criação".into()]);
        assert_eq!(
            err.to_string(),
            "Colunas obrigatórias ausentes: Status iCare, Data Criação"
        );
    }

    #[test]
    fn test_serialize_as_string() {
        let err = AppError::InvalidReferencePeriod { month: 12, year: 2024 };
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Período de referência inválido: mês 12, ano 2024\"");
    }
}
