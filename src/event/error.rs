//! Error types for the event core and the stack-dump helper.
//!
//! None of these escape the public event API: operations log them and
//! return `false` (see [`crate::event`]).

use std::error::Error;

use super::value::EventType;

/// Bookkeeping errors detected before an operation touches any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventError {
    #[error("missing {0}")]
    MissingArgument(&'static str),
    #[error("unknown {0} object")]
    StaleObject(&'static str),
    #[error("constraint already exists for method `{0}`")]
    ConstraintExists(String),
    #[error("event loop: `{0}` is already firing on this source")]
    EventLoop(EventType),
    #[error("native event type `{0}` is not supported by this DOM observable")]
    UnsupportedNativeType(&'static str),
    #[error("unknown native event type `{0}`")]
    UnknownNativeType(String),
    #[error("object is not a DOM observable")]
    NotDomObservable,
}

/// Failure reported by a handler body.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("subscriber has no method `{0}`")]
    MissingMethod(String),
    #[error("subscriber no longer exists")]
    StaleSubscriber,
    #[error("{message}")]
    Failed {
        message: String,
        #[source]
        source: Option<Box<dyn Error + 'static>>,
    },
}

impl HandlerError {
    /// A plain failure message.
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// A failure wrapping an underlying error.
    pub fn caused_by(message: impl Into<String>, source: impl Error + 'static) -> Self {
        HandlerError::Failed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Log `err` and every error in its `source()` chain, one frame per line.
pub fn dump_error(context: &str, err: &dyn Error) {
    tracing::error!("{context}: {err}");
    let mut depth = 1;
    let mut cause = err.source();
    while let Some(inner) = cause {
        tracing::error!("  #{depth} caused by: {inner}");
        depth += 1;
        cause = inner.source();
    }
}
