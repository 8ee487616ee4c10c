use thiserror::Error;

/// Fatal conditions of a heatmap run.
#[derive(Error, Debug)]
pub enum HeatmapError {
    /// The sample provider could not produce a timestamp -> duration mapping.
    #[error("read-time data unavailable: {0}")]
    DataUnavailable(String),

    /// The layout engine was asked to draw without any day totals.
    #[error("no day totals to draw")]
    NoData,

    /// A value range was required but no day has any activity.
    #[error("no activity recorded, value range is undefined")]
    EmptyInput,

    /// A configuration value is missing or malformed.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

impl HeatmapError {
    /// Wrap a provider failure, keeping its full context chain.
    pub fn data_unavailable(err: &anyhow::Error) -> Self {
        Self::DataUnavailable(format!("{err:#}"))
    }

    /// Classify a failed fetch. Errors that already carry a kind (a missing
    /// cookie is a configuration problem) keep it; anything else means the
    /// provider could not deliver.
    pub fn from_fetch(err: anyhow::Error) -> Self {
        match err.downcast::<HeatmapError>() {
            Ok(known) => known,
            Err(err) => Self::data_unavailable(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_data_unavailable_keeps_context_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("status 401"))
            .context("fetching read times")
            .expect_err("should fail");

        let wrapped = HeatmapError::data_unavailable(&err);
        let msg = wrapped.to_string();
        assert!(msg.contains("fetching read times"));
        assert!(msg.contains("status 401"));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(HeatmapError::NoData.to_string(), "no day totals to draw");
        assert_eq!(
            HeatmapError::Configuration("colors.low is required".into()).to_string(),
            "invalid configuration: colors.low is required"
        );
    }

    #[test]
    fn test_from_fetch_keeps_known_kind() {
        let err = anyhow::Error::new(HeatmapError::Configuration("cookie missing".into()));
        assert!(matches!(
            HeatmapError::from_fetch(err),
            HeatmapError::Configuration(_)
        ));

        let err = anyhow::anyhow!("connection refused");
        match HeatmapError::from_fetch(err) {
            HeatmapError::DataUnavailable(msg) => assert!(msg.contains("connection refused")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
