use thiserror::Error;

/// Ways a single weather lookup can fail.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The request never produced a readable response.
    #[error("Failed to reach the weather provider: {0}")]
    Transport(String),

    /// A response arrived but could not be understood.
    #[error("Weather provider returned an unreadable payload: {0}")]
    MalformedPayload(String),

    /// The provider reported `cod: "404"` for the city.
    #[error("City not found: {city:?}")]
    NotFound { city: String },

    /// The provider answered with a non-success `cod` other than 404.
    #[error("Weather provider rejected the request with code {code}: {message}")]
    Provider { code: String, message: String },
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound { .. })
    }
}
