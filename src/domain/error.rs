//! Domain error types.

/// Top-level error type for tradelens.
#[derive(Debug, thiserror::Error)]
pub enum TradelensError {
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TradelensError {
    pub fn invalid_parameter(
        name: &str,
        value: impl std::fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        TradelensError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        TradelensError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&TradelensError> for std::process::ExitCode {
    fn from(err: &TradelensError) -> Self {
        let code: u8 = match err {
            TradelensError::Io(_) | TradelensError::Report { .. } => 1,
            TradelensError::ConfigParse { .. }
            | TradelensError::ConfigMissing { .. }
            | TradelensError::ConfigInvalid { .. } => 2,
            TradelensError::Database { .. } | TradelensError::DatabaseQuery { .. } => 3,
            TradelensError::InvalidParameter { .. } => 4,
            TradelensError::NoData { .. } | TradelensError::InvalidInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_message_names_parameter_and_value() {
        let err = TradelensError::invalid_parameter("slow_period", 5, "must exceed fast_period");
        assert_eq!(
            err.to_string(),
            "invalid parameter slow_period = 5: must exceed fast_period"
        );
    }

    #[test]
    fn invalid_input_message() {
        let err = TradelensError::invalid_input("series is empty");
        assert_eq!(err.to_string(), "invalid input: series is empty");
    }

    #[test]
    fn exit_codes_by_kind() {
        use std::process::ExitCode;
        let cases = [
            (TradelensError::invalid_parameter("x", 0, "bad"), ExitCode::from(4)),
            (TradelensError::invalid_input("bad"), ExitCode::from(5)),
            (
                TradelensError::ConfigMissing {
                    section: "strategy".into(),
                    key: "kind".into(),
                },
                ExitCode::from(2),
            ),
            (
                TradelensError::Database {
                    reason: "down".into(),
                },
                ExitCode::from(3),
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(
                format!("{:?}", ExitCode::from(&err)),
                format!("{:?}", expected)
            );
        }
    }
}
