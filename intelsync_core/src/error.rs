use std::error::Error as StdError;

/// Common error type for `intelsync_core`.
///
/// Concrete transport implementations (reqwest, test fakes) should preserve
/// the underlying error chain where possible via `Error::transport`.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("transport error: {context}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync + 'static>,
    },

    #[error("transport error: {0}")]
    TransportMessage(String),

    #[error("parse error: {context}")]
    Parse {
        context: String,
        #[source]
        source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    },
}

impl Error {
    #[tracing::instrument(level = "debug", name = "intelsync.error.transport", skip(source))]
    pub fn transport(
        context: impl Into<String> + std::fmt::Debug,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Convenience: wrap any error into `Transport` with "reqwest" context.
    pub fn transport_reqwest(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Transport {
            context: "reqwest".into(),
            source: Box::new(source),
        }
    }

    pub fn parse(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Parse {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn parse_message(context: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            source: None,
        }
    }

    /// True for failures of the network layer (as opposed to record parsing).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::TransportMessage(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_preserves_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        let err = Error::transport("GET /taxii2/", io);
        assert!(err.is_transport());
        assert!(StdError::source(&err).is_some());
        assert_eq!(err.to_string(), "transport error: GET /taxii2/");
    }

    #[test]
    fn parse_without_source_is_parse() {
        let err = Error::parse_message("record id is empty");
        assert!(err.is_parse());
        assert!(!err.is_transport());
    }
}
