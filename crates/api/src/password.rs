//! Password hashing utilities with tuned Argon2 parameters
//!
//! Uses Argon2id with OWASP-recommended parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Get a configured Argon2 hasher with production-ready parameters.
///
/// - Algorithm: Argon2id
/// - Memory: 64MB (64 * 1024 KB)
/// - Iterations: 3
/// - Parallelism: 4
pub fn get_argon2<'a>() -> Argon2<'a> {
    // https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html
    let params = Params::new(
        64 * 1024,  // 64 MiB memory cost
        3,          // 3 iterations (time cost)
        4,          // 4 lanes (parallelism)
        None,       // Default output length (32 bytes)
    ).unwrap_or_else(|_| {
        tracing::warn!("Failed to create custom Argon2 params, using defaults");
        Params::default()
    });

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}

/// Hash a plaintext password into a PHC string
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = get_argon2().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Compare a plaintext password against a stored PHC hash.
///
/// An unparseable stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Failed to parse password hash: {:?}", e);
            return false;
        }
    };

    get_argon2().verify_password(password.as_bytes(), &parsed_hash).is_ok()
}
