use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::{error, warn};

lazy_static! {
    // Verified against when the stored hash is unusable or the user is unknown,
    // so every failed check costs one full Argon2 run.
    static ref DUMMY_HASH: Option<String> = hash_password("moneybook-dummy-password").ok();
}

/// Computes the dummy hash up front; the service must not start without it.
pub fn warm_up() -> anyhow::Result<()> {
    match DUMMY_HASH.as_deref() {
        Some(_) => Ok(()),
        None => anyhow::bail!("argon2 could not hash the dummy password"),
    }
}

/// Hashes a password with Argon2id and a fresh random salt (PHC string output).
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Returns whether `plain` matches `hash`. A corrupt hash is just a mismatch.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(error = %e, "stored password hash is not a valid PHC string");
            burn_verification(plain);
            false
        }
    }
}

/// Spends the same work as a real verification and always fails.
pub fn burn_verification(plain: &str) {
    match DUMMY_HASH.as_deref().map(PasswordHash::new) {
        Some(Ok(parsed)) => {
            let _ = Argon2::default().verify_password(plain.as_bytes(), &parsed);
        }
        _ => error!("dummy hash unavailable, failed login skipped hashing work"),
    }
}
