//! Error types for aggregate view reads.

/// Result type for mapview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while reading aggregate views
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither the key view nor the query options name a view source
    #[error("no view source configured for key view `{0}`")]
    MissingSource(String),

    /// Neither the key view nor the query options name a view
    #[error("no view name configured for key view `{0}`")]
    MissingView(String),

    /// The view source does not know the requested view
    #[error("unknown view `{0}`")]
    UnknownView(String),

    /// The view source failed to answer a query
    #[error("view source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A reduce row could not be reduced
    #[error("reduce error: {0}")]
    Reduce(#[from] mapview_core::Error),
}

impl Error {
    /// Wrap an error raised by a [`crate::ViewSource`] implementation.
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Source(Box::new(err))
    }
}
