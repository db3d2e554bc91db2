use std::fmt;

/// Credentials presented to the target store
#[derive(Clone)]
pub enum Credential {
    /// Project API key, sent both as the `apikey` header and as bearer token
    ApiKey(String),
    /// Project API key plus a separate bearer token (e.g. a user session)
    Token { apikey: String, token: String },
}

impl Credential {
    pub fn new(apikey: impl Into<String>, token: Option<String>) -> Self {
        match token {
            Some(token) if !token.is_empty() => Self::Token {
                apikey: apikey.into(),
                token,
            },
            _ => Self::ApiKey(apikey.into()),
        }
    }

    /// Value for the `apikey` header
    pub fn apikey(&self) -> &str {
        match self {
            Self::ApiKey(key) => key,
            Self::Token { apikey, .. } => apikey,
        }
    }

    /// Value for the `Authorization: Bearer` header
    pub fn bearer(&self) -> &str {
        match self {
            Self::ApiKey(key) => key,
            Self::Token { token, .. } => token,
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => write!(f, "ApiKey"),
            Self::Token { .. } => write!(f, "Token"),
        }
    }
}

// Secrets never reach logs through Debug either.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential::{}(..)", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apikey_only() {
        let cred = Credential::new("key", None);
        assert_eq!(cred.apikey(), "key");
        assert_eq!(cred.bearer(), "key");
        assert_eq!(cred.to_string(), "ApiKey");
    }

    #[test]
    fn test_token_override() {
        let cred = Credential::new("key", Some("jwt".to_string()));
        assert_eq!(cred.apikey(), "key");
        assert_eq!(cred.bearer(), "jwt");
        assert!(!format!("{:?}", cred).contains("jwt"));
    }

    #[test]
    fn test_empty_token_ignored() {
        let cred = Credential::new("key", Some(String::new()));
        assert_eq!(cred.to_string(), "ApiKey");
    }
}
