use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}
