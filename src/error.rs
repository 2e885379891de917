use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Schema inconsistency: {0}")]
    SchemaInconsistency(String),
    #[error("Grammar compilation failed: {0}")]
    GrammarCompilation(String),
    #[error("Parse error at column {column}: {message}")]
    Parse {
        message: String,
        column: usize,
        expected: Vec<String>,
    },
    #[error("Query too long: {length} characters (limit is {limit})")]
    QueryTooLong { length: usize, limit: usize },
    #[error("Unknown graph: {0}")]
    UnknownGraph(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl QueryError {
    /// Errors caused by what the user typed, as opposed to a broken schema or setup.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::QueryTooLong { .. })
    }
}

pub type Result<T> = std::result::Result<T, QueryError>;

// Helper conversions
impl From<config::ConfigError> for QueryError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<std::io::Error> for QueryError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}
