use thiserror::Error;

/// Main error type for tunegrid
#[derive(Error, Debug)]
pub enum TgError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Plot error: {0}")]
    Plot(#[from] PlotError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<csv::Error> for TgError {
    fn from(err: csv::Error) -> Self {
        TgError::Csv(err.to_string())
    }
}

/// Argument grid errors
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Argument '{name}' has no candidate values")]
    EmptyArgument { name: String },

    #[error("Argument '{name}' is declared more than once")]
    DuplicateArgument { name: String },

    #[error("Grid is too large: the product of candidate counts overflows")]
    TooLarge,

    #[error("Index {index} is out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors raised while evaluating a combination
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Prediction failed for combination #{index} ({combination}): {message}")]
    PredictionFailed {
        index: usize,
        combination: String,
        message: String,
    },

    #[error("Diagnostic failed for combination #{index} ({combination}): {message}")]
    DiagnosticFailed {
        index: usize,
        combination: String,
        message: String,
    },

    #[error("Missing argument: {name}")]
    MissingArgument { name: String },

    #[error("Argument '{name}' has type {actual}, expected {expected}")]
    ArgumentType {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Length mismatch: {predicted} predictions for {observed} observations")]
    LengthMismatch { predicted: usize, observed: usize },

    #[error("Empty input: {message}")]
    EmptyInput { message: String },
}

/// Diagnostics table errors
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Unknown diagnostic: {name}")]
    UnknownDiagnostic { name: String },

    #[error("Unknown argument: {name}")]
    UnknownArgument { name: String },

    #[error("Table has no rows")]
    Empty,
}

/// Plot preparation errors
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Aesthetic '{aesthetic}' maps unknown column '{column}'")]
    UnknownAesthetic { aesthetic: String, column: String },

    #[error("Column '{column}' is mapped more than once")]
    DuplicateMapping { column: String },

    #[error("Column name '{column}' is reserved by the plot layout")]
    ReservedColumn { column: String },

    #[error("No data to plot: {message}")]
    NoData { message: String },
}

/// Result type alias for tunegrid operations
pub type TgResult<T> = Result<T, TgError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::TgError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::TgError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::TgError::Config(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = EvaluationError::LengthMismatch {
            predicted: 10,
            observed: 12,
        };

        assert!(error.to_string().contains("Length mismatch"));
        assert!(error.to_string().contains("10"));
        assert!(error.to_string().contains("12"));
    }

    #[test]
    fn test_error_conversion() {
        let grid_error = GridError::EmptyArgument {
            name: "k".to_string(),
        };
        let tg_error: TgError = grid_error.into();

        match tg_error {
            TgError::Grid(_) => (),
            _ => panic!("Expected Grid error"),
        }
    }

    #[test]
    fn test_macros() {
        let validation_err = validation_error!("Invalid value: {}", 42);
        assert!(matches!(validation_err, TgError::Validation(ref m) if m == "Invalid value: 42"));
        let _internal_err = internal_error!("Something went wrong");
        let config_err = config_error!("Missing required field: {}", "target");
        assert!(config_err.to_string().contains("target"));
    }
}
