//! Token authentication.
//!
//! Regular users present `sha512_hex(account + login + salt)`. The admin
//! login presents `sha512_hex(YYYYMMDDHH + admin_salt)`, where the hour is
//! read from the server's local clock at the moment of the call, so an admin
//! token expires at the top of every local hour.

use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone};
use sha2::{Digest, Sha512};

use crate::error::ApiError;
use crate::request::MethodRequest;

/// Default salt mixed into regular user tokens.
pub const DEFAULT_SALT: &str = "Otus";

/// Default login that is granted admin rights.
pub const DEFAULT_ADMIN_LOGIN: &str = "admin";

/// Default salt mixed into admin tokens.
pub const DEFAULT_ADMIN_SALT: &str = "42";

/// Returns the lowercase hex SHA-512 digest of `input`.
#[must_use]
pub fn sha512_hex(input: &str) -> String {
    hex::encode(Sha512::digest(input.as_bytes()))
}

/// What the dispatcher learns about a caller who passed authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Whether the caller used the admin login.
    pub is_admin: bool,
}

/// Checks envelope tokens against the configured salts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticator {
    salt: String,
    admin_login: String,
    admin_salt: String,
}

impl Authenticator {
    /// Creates an authenticator with explicit salts.
    #[must_use]
    pub fn new(
        salt: impl Into<String>,
        admin_login: impl Into<String>,
        admin_salt: impl Into<String>,
    ) -> Self {
        Self {
            salt: salt.into(),
            admin_login: admin_login.into(),
            admin_salt: admin_salt.into(),
        }
    }

    /// Returns `true` if `login` is the admin login.
    #[must_use]
    pub fn is_admin(&self, login: &str) -> bool {
        login == self.admin_login
    }

    /// Returns the token expected from the admin during the hour of `now`,
    /// as written in `now`'s own time zone.
    #[must_use]
    pub fn admin_token_at<Tz>(&self, now: DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let hour = now.format("%Y%m%d%H").to_string();
        sha512_hex(&format!("{hour}{}", self.admin_salt))
    }

    /// Returns the token expected from a regular user.
    #[must_use]
    pub fn user_token(&self, account: &str, login: &str) -> String {
        sha512_hex(&format!("{account}{login}{}", self.salt))
    }

    /// Authenticates a validated envelope against the local clock.
    pub fn authenticate(&self, request: &MethodRequest) -> Result<AuthContext, ApiError> {
        self.authenticate_at(request, Local::now())
    }

    /// Authenticates a validated envelope as if the call happened at `now`.
    pub fn authenticate_at<Tz>(
        &self,
        request: &MethodRequest,
        now: DateTime<Tz>,
    ) -> Result<AuthContext, ApiError>
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let is_admin = self.is_admin(&request.login);
        let expected = if is_admin {
            self.admin_token_at(now)
        } else {
            self.user_token(request.account_or_empty(), &request.login)
        };

        if expected == request.token {
            Ok(AuthContext { is_admin })
        } else {
            tracing::debug!(login = %request.login, is_admin, "token mismatch");
            Err(ApiError::Forbidden)
        }
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new(DEFAULT_SALT, DEFAULT_ADMIN_LOGIN, DEFAULT_ADMIN_SALT)
    }
}
