use log::{info, warn};

use crate::canvass::cache::LocalCache;
use crate::canvass::*;

/// Decides whether a username and password grant access.
///
/// The gated commands only see this trait, so another identity provider can be
/// plugged in without touching them.
pub trait CredentialVerifier {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// A single user whose credentials come from the configuration.
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: &str, password: &str) -> StaticCredentials {
        StaticCredentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        !self.username.is_empty() && username == self.username && password == self.password
    }
}

pub fn login(
    verifier: &dyn CredentialVerifier,
    cache: &LocalCache,
    username: &str,
    password: &str,
) -> CanvassResult<()> {
    if !verifier.verify(username, password) {
        warn!("Rejected login for {:?}", username);
        return InvalidCredentialsSnafu {}.fail();
    }
    cache.set_authenticated(true);
    info!("Logged in as {:?}", username);
    Ok(())
}

pub fn logout(cache: &LocalCache) {
    cache.set_authenticated(false);
}

pub fn require_login(cache: &LocalCache) -> CanvassResult<()> {
    if cache.is_authenticated() {
        Ok(())
    } else {
        NotAuthenticatedSnafu {}.fail()
    }
}
