//! Input validation run before a client is built.

use crate::constants::{ACCESS_KEY_LEN, SECRET_KEY_LEN};
use crate::error::{CoreError, CoreResult};

/// Check that both credential identifiers are present and well formed.
pub fn validate_credentials(access_key: &str, secret_key: &str) -> CoreResult<()> {
    let access_key = access_key.trim();
    let secret_key = secret_key.trim();

    if access_key.is_empty() || secret_key.is_empty() {
        return Err(CoreError::InvalidCredentials(
            "You must enter your access key and secret key".to_string(),
        ));
    }
    if access_key.len() != ACCESS_KEY_LEN {
        return Err(CoreError::InvalidCredentials(
            "Your access key does not appear to be valid".to_string(),
        ));
    }
    if secret_key.len() != SECRET_KEY_LEN {
        return Err(CoreError::InvalidCredentials(
            "Your secret key does not appear to be valid".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_vault(vault: &str) -> CoreResult<()> {
    if vault.trim().is_empty() {
        return Err(CoreError::InvalidInput(
            "You must enter a vault name".to_string(),
        ));
    }
    Ok(())
}
