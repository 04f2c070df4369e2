use std::backtrace::Backtrace;

/// Walks the `source()` chain so a single log line explains the whole failure.
pub fn error_chain_to_pretty_formatted<E>(error: E) -> String
where
    E: std::error::Error,
{
    let mut err = format!("{}", error);
    let mut source = error.source();
    while let Some(inner_err) = source {
        err.push_str(&format!("\nCaused by: \n{}", inner_err));
        source = inner_err.source();
    }
    err
}

#[derive(Debug, thiserror::Error)]
#[error("ReqwestError Context: {context}\n{backtrace}")]
pub struct ReqwestError {
    #[source]
    pub source: reqwest::Error,
    pub context: String,
    pub backtrace: OptionBacktracePrettyPrinter,
}

impl ReqwestError {
    pub fn from_reqwest_error<S: Into<String>>(source: reqwest::Error, context: S) -> Self {
        Self {
            source,
            context: context.into(),
            backtrace: OptionBacktracePrettyPrinter::capture(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("SerdeJsonError Context: {context}\n{bad_input_sample}\n{backtrace}")]
pub struct SerdeJsonError {
    #[source]
    pub source: serde_json::Error,
    pub context: String,
    pub bad_input_sample: String,
    pub backtrace: OptionBacktracePrettyPrinter,
}

impl SerdeJsonError {
    pub const SAMPLE_CHARS_LIMIT: usize = 200;

    /// Only the first [`Self::SAMPLE_CHARS_LIMIT`] chars of `bad_input` are kept.
    pub fn from_serde_json_error<S: Into<String>>(
        source: serde_json::Error,
        context: S,
        bad_input: &str,
    ) -> Self {
        Self {
            source,
            context: context.into(),
            bad_input_sample: bad_input.chars().take(Self::SAMPLE_CHARS_LIMIT).collect(),
            backtrace: OptionBacktracePrettyPrinter::capture(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("IoError Context: {context}\n{backtrace}")]
pub struct IoError {
    #[source]
    pub source: std::io::Error,
    pub context: String,
    pub backtrace: OptionBacktracePrettyPrinter,
}

impl IoError {
    pub fn from_io_error<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self {
            source,
            context: context.into(),
            backtrace: OptionBacktracePrettyPrinter::capture(),
        }
    }
}

#[derive(Debug)]
pub struct OptionBacktracePrettyPrinter(pub Option<Backtrace>);

impl OptionBacktracePrettyPrinter {
    pub fn capture() -> Self {
        Self::from(Backtrace::capture())
    }
}

impl From<Backtrace> for OptionBacktracePrettyPrinter {
    fn from(value: Backtrace) -> Self {
        Self(Some(value))
    }
}
impl std::fmt::Display for OptionBacktracePrettyPrinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_ref() {
            Some(child) => write!(f, "{}", child),
            None => write!(f, "No backtrace"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_includes_every_cause() {
        let source = serde_json::from_str::<u32>("garbage").unwrap_err();
        let err = SerdeJsonError::from_serde_json_error(source, "decoding stats", "garbage");
        let pretty = error_chain_to_pretty_formatted(&err);
        assert!(pretty.starts_with("SerdeJsonError Context: decoding stats"));
        assert!(pretty.contains("Caused by:"));
        assert!(pretty.contains("expected value"));
    }

    #[test]
    fn bad_input_sample_is_truncated() {
        let long_input = "x".repeat(1000);
        let source = serde_json::from_str::<u32>(&long_input).unwrap_err();
        let err = SerdeJsonError::from_serde_json_error(source, "ctx", &long_input);
        assert_eq!(
            err.bad_input_sample.chars().count(),
            SerdeJsonError::SAMPLE_CHARS_LIMIT
        );
    }
}
