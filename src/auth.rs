use crate::error::{Result, ScouterError};
use std::fmt;

const FINE_GRAINED_PREFIX: &str = "github_pat_";
const CLASSIC_PREFIX: &str = "ghp_";

/// The two personal access token families the platform issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Classic,
    FineGrained,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialKind::Classic => write!(f, "classic"),
            CredentialKind::FineGrained => write!(f, "fine-grained"),
        }
    }
}

/// A user-supplied personal access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    kind: CredentialKind,
    secret: String,
}

impl Credential {
    /// Recognise a token by its literal prefix.
    pub fn parse(raw: &str) -> Result<Self> {
        let secret = raw.trim();
        if secret.is_empty() {
            return Err(ScouterError::InvalidToken("token is empty".to_string()));
        }

        let kind = if secret.starts_with(FINE_GRAINED_PREFIX) {
            CredentialKind::FineGrained
        } else if secret.starts_with(CLASSIC_PREFIX) {
            CredentialKind::Classic
        } else {
            return Err(ScouterError::InvalidToken(format!(
                "expected a token starting with '{}' or '{}'",
                CLASSIC_PREFIX, FINE_GRAINED_PREFIX
            )));
        };

        Ok(Credential {
            kind,
            secret: secret.to_string(),
        })
    }

    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    /// Authorization header value for REST calls.
    pub fn rest_header(&self) -> String {
        match self.kind {
            CredentialKind::FineGrained => format!("Bearer {}", self.secret),
            CredentialKind::Classic => format!("token {}", self.secret),
        }
    }

    /// Authorization header value for the GraphQL endpoint, which only
    /// accepts the bearer scheme.
    pub fn graphql_header(&self) -> String {
        match self.kind {
            CredentialKind::FineGrained => format!("Bearer {}", self.secret),
            CredentialKind::Classic => format!("bearer {}", self.secret),
        }
    }

    fn redacted(&self) -> String {
        let visible: String = self.secret.chars().take(4).collect();
        format!("{} token {}…", self.kind, visible)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.redacted())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}
