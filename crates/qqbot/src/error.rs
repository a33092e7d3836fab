use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The endpoint could not be reached (DNS, connect, TLS, body read).
    #[error("network error calling {path}: {source}")]
    Network {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The endpoint answered with a body that is not the expected JSON shape.
    #[error("failed to parse response from {path}: {source}")]
    ResponseParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The token endpoint answered without an `access_token`.
    #[error("access token missing from token response: {body}")]
    Auth { body: String },

    /// Non-success HTTP status from the bot API.
    #[error("API error on {path} (HTTP {status}{}): {message}", code_suffix(.code))]
    Api {
        path: String,
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("invalid message target: {target}")]
    InvalidTarget { target: String },

    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl Error {
    #[must_use]
    pub fn network(path: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn response_parse(path: impl Into<String>, source: serde_json::Error) -> Self {
        Self::ResponseParse {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the failure calls for dropping the cached token before retrying.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Auth { .. } => true,
            Self::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// Whether the failure is transient from the client's point of view.
    ///
    /// Nothing in this crate retries; this is a hint for an outer layer.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::ResponseParse { .. })
    }
}

fn code_suffix(code: &Option<i64>) -> String {
    code.map(|c| format!(", code {c}")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_display_includes_code_and_message() {
        let err = Error::Api {
            path: "/v2/users/u1/messages".into(),
            status: 400,
            code: Some(40034),
            message: "bad request".into(),
        };
        let text = err.to_string();
        assert!(text.contains("/v2/users/u1/messages"));
        assert!(text.contains("HTTP 400, code 40034"));
        assert!(text.contains("bad request"));
    }

    #[test]
    fn api_error_display_without_code() {
        let err = Error::Api {
            path: "/gateway".into(),
            status: 500,
            code: None,
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), "API error on /gateway (HTTP 500): boom");
    }

    #[test]
    fn unauthorized_classification() {
        let api_401 = Error::Api {
            path: "/gateway".into(),
            status: 401,
            code: Some(11244),
            message: "token not exist or expire".into(),
        };
        assert!(api_401.is_unauthorized());
        assert!(!api_401.is_retryable());

        let auth = Error::Auth { body: "{}".into() };
        assert!(auth.is_unauthorized());

        let parse = Error::response_parse(
            "/gateway",
            serde_json::from_str::<serde_json::Value>("{nope").unwrap_err(),
        );
        assert!(parse.is_retryable());
        assert!(!parse.is_unauthorized());
    }
}
