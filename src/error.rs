use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarbonError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Bad date format on line {line}: {raw:?}")]
    BadDate { line: u64, raw: String },

    #[error("Bad quantity on line {line}: {raw:?} (expected a number greater than zero)")]
    BadQuantity { line: u64, raw: String },

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, CarbonError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_lists_every_column() {
        let err = CarbonError::MissingColumns(vec!["unit".to_string(), "quantity".to_string()]);
        assert_eq!(err.to_string(), "Missing required column(s): unit, quantity");
    }

    #[test]
    fn test_parse_errors_name_the_raw_value() {
        let err = CarbonError::BadDate { line: 3, raw: "2024/13/45".to_string() };
        let msg = err.to_string();
        assert!(msg.contains("line 3"), "got: {msg}");
        assert!(msg.contains("2024/13/45"), "got: {msg}");

        let err = CarbonError::BadQuantity { line: 7, raw: "lots".to_string() };
        assert!(err.to_string().contains("\"lots\""));
    }

    #[test]
    fn test_csv_error_prefix_appears_once() {
        let csv_err = csv::ReaderBuilder::new()
            .from_reader("a,b\n1\n".as_bytes())
            .records()
            .next()
            .unwrap()
            .unwrap_err();
        let msg = CarbonError::from(csv_err).to_string();
        assert!(msg.starts_with("CSV error:"), "got: {msg}");
        assert!(!msg.contains("CSV error: CSV error"), "got: {msg}");
    }
}
