use hmac::{Hmac, Mac};
use log::warn;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Cookie holding the admin session token
pub const ADMIN_COOKIE: &str = "gamehub_admin_session";

/// Verifies admins against a single shared secret.
///
/// The session token is an HMAC of a fixed salt keyed with the secret,
/// so it's the same for every login and stays valid until the secret changes.
/// Logging out only removes the cookie.
pub struct AdminAuth {
    secret: Option<String>,
    salt: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// No admin secret is set up, so nobody can log in
    #[error("Admin is not configured, set ADMIN_PASSWORD")]
    NotConfigured,
    /// Password is incorrect
    #[error("Invalid password")]
    InvalidCredentials,
    #[error("Password required")]
    MissingPassword,
    /// Session token is missing or doesn't match
    #[error("Unauthorized")]
    Unauthorized,
    #[error("HashError: {0}")]
    HashError(String),
}

/// Proof that the caller is an admin.
/// Only [AdminAuth] hands these out, so anything taking one is admin gated.
#[derive(Debug, Clone)]
pub struct AdminSession {
    token: String,
}

impl AdminSession {
    /// The token to store in the session cookie
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl AdminAuth {
    pub const SESSION_DURATION_IN_DAYS: i64 = 7;
    pub const DEFAULT_SALT: &'static str = "gamehub_admin";

    pub fn new(secret: Option<String>, salt: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
            salt: salt
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| Self::DEFAULT_SALT.to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Checks the password against the secret, returning a session on success
    pub fn login(&self, password: &str) -> Result<AdminSession, AuthError> {
        let secret = self.secret()?;
        let password = password.trim();

        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }

        let matches: bool = password.as_bytes().ct_eq(secret.as_bytes()).into();

        if !matches {
            warn!("Rejected admin login with an invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        Ok(AdminSession {
            token: self.token()?,
        })
    }

    /// Returns a session if the token matches the one derived from the current secret
    pub fn verify(&self, token: &str) -> Result<AdminSession, AuthError> {
        let expected = self.token()?;

        if token.is_empty() {
            return Err(AuthError::Unauthorized);
        }

        let matches: bool = token.as_bytes().ct_eq(expected.as_bytes()).into();

        if matches {
            Ok(AdminSession { token: expected })
        } else {
            Err(AuthError::Unauthorized)
        }
    }

    pub fn is_authenticated(&self, token: Option<&str>) -> bool {
        token.map_or(false, |t| self.verify(t).is_ok())
    }

    fn secret(&self) -> Result<&str, AuthError> {
        self.secret.as_deref().ok_or(AuthError::NotConfigured)
    }

    fn token(&self) -> Result<String, AuthError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret()?.as_bytes())
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        mac.update(self.salt.as_bytes());

        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AdminAuth {
        AdminAuth::new(Some("hunter22".to_string()), None)
    }

    #[test]
    fn derives_a_stable_hex_token() {
        let first = auth().login("hunter22").unwrap();
        let second = auth().login(" hunter22 ").unwrap();

        assert_eq!(first.token(), second.token());
        assert_eq!(first.token().len(), 64);
        assert!(first.token().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn token_depends_on_secret_and_salt() {
        let base = auth().login("hunter22").unwrap();

        let salted = AdminAuth::new(Some("hunter22".to_string()), Some("other".to_string()))
            .login("hunter22")
            .unwrap();
        let rotated = AdminAuth::new(Some("hunter23".to_string()), None)
            .login("hunter23")
            .unwrap();

        assert_ne!(base.token(), salted.token());
        assert_ne!(base.token(), rotated.token());
        assert!(auth().verify(rotated.token()).is_err());
    }

    #[test]
    fn rejects_wrong_or_empty_passwords() {
        assert!(matches!(
            auth().login("hunter2"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(auth().login("   "), Err(AuthError::MissingPassword)));
    }

    #[test]
    fn verifies_tokens() {
        let session = auth().login("hunter22").unwrap();

        assert!(auth().verify(session.token()).is_ok());
        assert!(matches!(auth().verify(""), Err(AuthError::Unauthorized)));
        assert!(matches!(
            auth().verify("deadbeef"),
            Err(AuthError::Unauthorized)
        ));
        assert!(auth().is_authenticated(Some(session.token())));
        assert!(!auth().is_authenticated(None));
    }

    #[test]
    fn unconfigured_admin_refuses_everything() {
        let auth = AdminAuth::new(Some(String::new()), None);

        assert!(!auth.is_configured());
        assert!(matches!(auth.login("anything"), Err(AuthError::NotConfigured)));
        assert!(matches!(auth.verify("anything"), Err(AuthError::NotConfigured)));
        assert!(!auth.is_authenticated(Some("anything")));
    }
}
