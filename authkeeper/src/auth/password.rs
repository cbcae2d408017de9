//! Password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use base64::{Engine as _, engine::general_purpose};
use rand::prelude::RngExt;
use rand::rng;

use crate::{config::PasswordConfig, errors::Error};

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, Error> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None).map_err(|e| Error::Internal {
            operation: format!("create argon2 params: {e}"),
        })?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Argon2id RFC recommendations
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl From<&PasswordConfig> for Argon2Params {
    fn from(config: &PasswordConfig) -> Self {
        Self {
            memory_kib: config.argon2_memory_kib,
            iterations: config.argon2_iterations,
            parallelism: config.argon2_parallelism,
        }
    }
}

/// Salted one-way hashing of secrets.
///
/// Every [`hash`](Self::hash) call draws a fresh salt, so two digests of the same secret differ.
/// [`verify`](Self::verify) reads the parameters embedded in the digest, so hashes produced under
/// older parameters keep verifying after a configuration change.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher {
    params: Argon2Params,
}

impl PasswordHasher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    pub fn params(&self) -> Argon2Params {
        self.params
    }

    pub fn hash(&self, secret: &str) -> Result<String, Error> {
        let salt = generate_salt()?;
        let argon2 = self.params.to_argon2()?;

        let hash = argon2.hash_password(secret.as_bytes(), &salt).map_err(|e| Error::Internal {
            operation: format!("hash password: {e}"),
        })?;

        Ok(hash.to_string())
    }

    /// Checks `secret` against `digest`. The digest comparison inside argon2 is constant time.
    /// A digest that does not parse never verifies.
    pub fn verify(&self, secret: &str, digest: &str) -> bool {
        let parsed_hash = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Stored password hash could not be parsed: {e}");
                return false;
            }
        };

        Argon2::default().verify_password(secret.as_bytes(), &parsed_hash).is_ok()
    }

    /// [`hash`](Self::hash) on a blocking thread to avoid blocking the async runtime
    pub async fn hash_blocking(&self, secret: &str) -> Result<String, Error> {
        let hasher = *self;
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password hashing task: {e}"),
            })?
    }

    /// [`verify`](Self::verify) on a blocking thread to avoid blocking the async runtime
    pub async fn verify_blocking(&self, secret: &str, digest: &str) -> Result<bool, Error> {
        let hasher = *self;
        let secret = secret.to_string();
        let digest = digest.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &digest))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("spawn password verification task: {e}"),
            })
    }
}

const SALT_LEN: usize = 16;

fn generate_salt() -> Result<SaltString, Error> {
    let mut salt_bytes = [0u8; SALT_LEN];
    rng().fill(&mut salt_bytes);

    SaltString::encode_b64(&salt_bytes).map_err(|e| Error::Internal {
        operation: format!("encode password salt: {e}"),
    })
}

/// Generate a secure random token for password reset
pub fn generate_reset_token() -> String {
    // 32 bytes (256 bits) of cryptographically secure random data
    let mut token_bytes = [0u8; 32];
    rng().fill(&mut token_bytes);

    general_purpose::URL_SAFE_NO_PAD.encode(token_bytes)
}
