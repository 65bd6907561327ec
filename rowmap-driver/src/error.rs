#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("database `{0}`")]
    Database(String),

    #[error("unsupported by driver: {0}")]
    Unsupported(String),

    #[error("rowmap_query `{0}`")]
    Query(#[from] rowmap_query::QueryError),

    #[cfg(feature = "sqlite")]
    #[error("sqlx `{0}`")]
    Sqlx(#[from] sqlx::Error),

    #[error("io `{0}`")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DriverError>;
