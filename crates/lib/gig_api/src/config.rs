//! Request-handling settings carried in [`crate::AppState`].

use std::fmt;
use std::str::FromStr;

/// How `GET /auth/logout` treats a missing or invalid bearer token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogoutPolicy {
    /// Always answer 200; bad tokens are logged and ignored.
    #[default]
    Lenient,
    /// Answer 400 when the token is missing or invalid.
    Strict,
}

impl FromStr for LogoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown logout policy '{other}' (expected lenient|strict)")),
        }
    }
}

impl fmt::Display for LogoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => f.write_str("lenient"),
            Self::Strict => f.write_str("strict"),
        }
    }
}
