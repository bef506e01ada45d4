use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UserError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Email and password sent to the remote login endpoint.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Checked before anything is sent.
    pub fn validate(&self) -> Result<(), UserError> {
        if !is_well_formed_email(&self.email) {
            return Err(UserError::ValidationError(format!(
                "'{}' is not a valid email address",
                self.email
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(UserError::ValidationError(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

/// One `@` between a non-empty local part and a domain of non-empty labels.
fn is_well_formed_email(email: &str) -> bool {
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Remote response to a login request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoginToken {
    #[serde(default)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("eve.holt@reqres.in")]
    #[case("a@b")]
    #[case("first.last+tag@mail.example.com")]
    fn accepts_well_formed_emails(#[case] email: &str) {
        assert!(Credentials::new(email, "cityslicka").validate().is_ok());
    }

    #[rstest]
    #[case("")]
    #[case("eve.holt")]
    #[case("@reqres.in")]
    #[case("eve@")]
    #[case("eve@@reqres.in")]
    #[case("eve holt@reqres.in")]
    #[case("eve@reqres..in")]
    #[case("eve@.reqres.in")]
    fn rejects_malformed_emails(#[case] email: &str) {
        assert!(matches!(
            Credentials::new(email, "cityslicka").validate(),
            Err(UserError::ValidationError(_))
        ));
    }

    #[test]
    fn password_needs_eight_characters() {
        assert!(matches!(
            Credentials::new("eve.holt@reqres.in", "1234567").validate(),
            Err(UserError::ValidationError(_))
        ));
        assert!(Credentials::new("eve.holt@reqres.in", "12345678").validate().is_ok());
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", Credentials::new("eve.holt@reqres.in", "cityslicka"));
        assert!(rendered.contains("eve.holt@reqres.in"));
        assert!(!rendered.contains("cityslicka"));
    }
}
