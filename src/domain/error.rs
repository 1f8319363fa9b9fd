//! Domain error types.

/// Top-level error type for regimetrader.
#[derive(Debug, thiserror::Error)]
pub enum RegimeTraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price data error: {reason}")]
    PriceData { reason: String },

    #[error("no price data for {instrument}")]
    NoData { instrument: String },

    #[error("instrument {instrument} is not present in the price store")]
    UnknownInstrument { instrument: String },

    #[error("simulation window contains no trading days")]
    EmptyWindow,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RegimeTraderError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        RegimeTraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&RegimeTraderError> for std::process::ExitCode {
    fn from(err: &RegimeTraderError) -> Self {
        let code: u8 = match err {
            RegimeTraderError::Io(_) => 1,
            RegimeTraderError::ConfigParse { .. }
            | RegimeTraderError::ConfigMissing { .. }
            | RegimeTraderError::ConfigInvalid { .. } => 2,
            RegimeTraderError::PriceData { .. }
            | RegimeTraderError::NoData { .. }
            | RegimeTraderError::UnknownInstrument { .. }
            | RegimeTraderError::EmptyWindow => 5,
        };
        std::process::ExitCode::from(code)
    }
}
