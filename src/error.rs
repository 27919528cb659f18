use thiserror::Error;

/// Failures talking to the shipment API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Expected array of shipments")]
    NotAList,
}

/// Why a submission did not produce a shipment.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("missing required field: {0}")]
    Validation(&'static str),

    #[error("a submission is already in flight")]
    InFlight,

    #[error(transparent)]
    Api(#[from] ApiError),
}
