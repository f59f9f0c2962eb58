//! Error taxonomy for the composition core.
//!
//! None of these escape `ImeEngine::handle()`: every failure is recovered
//! locally and at most logged. They exist so the internal layers can use `?`.

use thiserror::Error;

/// Failure reported by a linguistic backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("scheme `{0}` is not available")]
    SchemeNotFound(String),

    #[error("engine is not initialized")]
    NotInitialized,

    #[error("engine call failed: {0}")]
    Call(String),
}

/// Recoverable errors raised while composing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImeError {
    /// No engine session could be opened; composition continues without candidates.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// transliterate/learn/unlearn failed; the operation becomes a no-op.
    #[error("engine call failed: {0}")]
    EngineCallFailed(String),

    /// The character is outside the accepted-input set.
    #[error("character {0:?} is not accepted input")]
    InvalidInput(char),

    /// Digit or arrow selection beyond the available candidates.
    #[error("no candidate at position {0}")]
    OutOfRangeSelection(usize),
}

impl From<EngineError> for ImeError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::SchemeNotFound(_) | EngineError::NotInitialized => {
                ImeError::EngineUnavailable(err.to_string())
            }
            EngineError::Call(msg) => ImeError::EngineCallFailed(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_mapping() {
        let err: ImeError = EngineError::SchemeNotFound("ml".into()).into();
        assert!(matches!(err, ImeError::EngineUnavailable(_)));

        let err: ImeError = EngineError::Call("boom".into()).into();
        assert_eq!(err, ImeError::EngineCallFailed("boom".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ImeError::InvalidInput('1').to_string(),
            "character '1' is not accepted input"
        );
    }
}
