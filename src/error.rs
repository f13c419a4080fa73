//! Purpose: Structured errors for the request runner and CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: Shared failure type; every fallible path in the crate returns it.
//! Invariants: Exit codes are stable once published; kinds are additive-only.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Internal,
    Usage,
    Decode,
    Network,
    Io,
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    url: Option<String>,
    status: Option<u16>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            url: None,
            status: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(url) = &self.url {
            write!(f, " (url: {url})")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::Decode => 3,
        ErrorKind::Network => 4,
        ErrorKind::Io => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::Decode, 3),
            (ErrorKind::Network, 4),
            (ErrorKind::Io, 5),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_context_fields() {
        let err = Error::new(ErrorKind::Decode)
            .with_message("response body is not valid json")
            .with_url("http://localhost:9/x")
            .with_status(502);
        let text = err.to_string();
        assert!(text.starts_with("Decode: response body is not valid json"));
        assert!(text.contains("(url: http://localhost:9/x)"));
        assert!(text.contains("(status: 502)"));
    }
}
