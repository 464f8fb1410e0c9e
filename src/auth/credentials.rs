//! Login credentials
//!
//! Holds the username/password pair sent with `USER`/`PASS`.

use std::fmt;

use crate::error::FtpError;

const ANONYMOUS_USER: &str = "anonymous";
const ANONYMOUS_PASSWORD: &str = "anonymous@";

/// Rejects values that would smuggle extra lines onto the control connection.
fn is_valid_input(input: &str) -> bool {
    !input.contains(['\r', '\n', '\0'])
}

/// Username and password for one server
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, FtpError> {
        let username = username.into();
        let password = password.into();

        if username.trim().is_empty() {
            return Err(FtpError::InvalidCredentials("username is empty".into()));
        }
        if !is_valid_input(&username) {
            return Err(FtpError::InvalidCredentials(
                "username contains control characters".into(),
            ));
        }
        if !is_valid_input(&password) {
            return Err(FtpError::InvalidCredentials(
                "password contains control characters".into(),
            ));
        }

        Ok(Self { username, password })
    }

    /// The conventional anonymous login
    pub fn anonymous() -> Self {
        Self {
            username: ANONYMOUS_USER.to_string(),
            password: ANONYMOUS_PASSWORD.to_string(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username == ANONYMOUS_USER && self.password == ANONYMOUS_PASSWORD
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_login() {
        let creds = Credentials::anonymous();
        assert_eq!(creds.username(), "anonymous");
        assert_eq!(creds.password(), "anonymous@");
        assert!(creds.is_anonymous());
        assert_eq!(Credentials::default(), creds);
    }

    #[test]
    fn rejects_line_injection() {
        assert!(Credentials::new("bob\r\nDELE x", "pw").is_err());
        assert!(Credentials::new("bob", "pw\nQUIT").is_err());
        assert!(Credentials::new("  ", "pw").is_err());
        assert!(Credentials::new("bob", "").is_ok());
    }

    #[test]
    fn debug_hides_password() {
        let creds = Credentials::new("alice", "alice123").unwrap();
        let shown = format!("{creds:?}");
        assert!(shown.contains("alice"));
        assert!(!shown.contains("alice123"));
    }
}
