//! Environment variable expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the config field for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_literal_unchanged() {
        assert_eq!(expand_env("127.0.0.1", "server.host").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: Test runs single-threaded for this variable.
        unsafe {
            std::env::remove_var("ASDM_EXPAND_UNSET");
        }

        let value = expand_env("${ASDM_EXPAND_UNSET:-fallback}", "source.url").unwrap();

        assert_eq!(value, "fallback");
    }

    #[test]
    fn test_expand_missing_var_reports_field() {
        // SAFETY: Test runs single-threaded for this variable.
        unsafe {
            std::env::remove_var("ASDM_EXPAND_MISSING");
        }

        let err = expand_env("${ASDM_EXPAND_MISSING}", "source.url").unwrap_err();

        match err {
            ConfigError::EnvVar { field, message } => {
                assert_eq!(field, "source.url");
                assert_eq!(message, "${ASDM_EXPAND_MISSING} not set");
            }
            other => panic!("Expected EnvVar error, got {other:?}"),
        }
    }
}
