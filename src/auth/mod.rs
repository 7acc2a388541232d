use sha2::{Digest, Sha256};

/// Header carrying the admin secret on mutating requests
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Admin secret required")]
    Missing,
    #[error("Invalid admin secret")]
    Mismatch,
}

/// Stateless shared-secret check. Nothing is remembered between requests.
#[derive(Clone)]
pub struct AdminGate {
    // Digest of the configured secret; None disables admin access
    secret_digest: Option<[u8; 32]>,
}

impl AdminGate {
    pub fn new(secret: Option<&str>) -> Self {
        Self {
            secret_digest: secret.filter(|s| !s.is_empty()).map(|s| digest(s.as_bytes())),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret_digest.is_some()
    }

    /// Compare a presented credential with the configured secret, byte for byte.
    /// Header values need not be valid UTF-8, so this takes raw bytes.
    pub fn verify(&self, presented: Option<&[u8]>) -> Result<(), AuthError> {
        let presented = presented.filter(|s| !s.is_empty()).ok_or(AuthError::Missing)?;
        let expected = self.secret_digest.as_ref().ok_or(AuthError::Mismatch)?;

        if constant_time_eq(&digest(presented), expected) {
            Ok(())
        } else {
            Err(AuthError::Mismatch)
        }
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("configured", &self.is_configured())
            .finish()
    }
}

fn digest(value: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value);
    hasher.finalize().into()
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
