use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Geo cache exhausted near ({lat:.3}, {lon:.3}) after {attempts} attempts")]
    GeoExhausted { lat: f64, lon: f64, attempts: u32 },

    #[error("Batch {batch} rejected by sink: {message}")]
    Transport { batch: usize, message: String },

    #[error("Ticket '{ticket_id}' cannot be {action}: {reason}")]
    TicketState {
        ticket_id: String,
        action: &'static str,
        reason: &'static str,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GenResult<T> = Result<T, GenError>;
