#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SearchErrorKind {
    Transport,
    InvalidResponse,
    ParseFailure,
    StorageFailure,
    InvalidInput,
    Internal,
}

impl SearchErrorKind {
    /// Stable tag reported to callers and diagnostics.
    pub fn code(self) -> &'static str {
        match self {
            Self::Transport => "http_request_failed",
            Self::InvalidResponse => "invalid_search_api_response",
            Self::ParseFailure => "invalid_search_api_response_body",
            Self::StorageFailure => "search_cache_failure",
            Self::InvalidInput => "invalid_search_input",
            Self::Internal => "internal_search_error",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct SearchError {
    pub kind: SearchErrorKind,
    pub message: String,
}

impl SearchError {
    pub fn new(kind: SearchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::Transport, message)
    }

    pub fn invalid_response(response_code: u16) -> Self {
        Self::new(
            SearchErrorKind::InvalidResponse,
            format!("Invalid response from API - {response_code}"),
        )
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(SearchErrorKind::InvalidInput, message)
    }

    pub fn storage(operation: &str, message: impl AsRef<str>) -> Self {
        Self::new(
            SearchErrorKind::StorageFailure,
            format!("search cache '{operation}' failed: {}", message.as_ref()),
        )
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}
