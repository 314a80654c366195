use argon2::{
    Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use rand::{Rng, distr::Alphanumeric};

/// Length of the per-user key assigned by the remote store.
pub const KEY_LENGTH: usize = 32;

pub fn generate_key() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Argon2id hash of `secret` with a random salt, in PHC string format.
pub fn hash_secret(secret: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(secret.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Checks `secret` against a hash produced by [`hash_secret`].
///
/// `Ok(false)` for a wrong secret, `Err` for a malformed hash.
pub fn verify_secret(secret: &str, hash: &str) -> Result<bool, password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Parses the bare identity a create request answers with.
///
/// Surrounding whitespace and JSON string quotes are tolerated; anything
/// that is not a positive integer is refused.
pub fn parse_id(body: &str) -> Option<i64> {
    let trimmed = body.trim().trim_matches('"');
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => None,
    }
}

/// Shortens `text` to `max` characters for table output.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
    short.push('…');
    short
}
