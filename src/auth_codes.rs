use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::Mutex;

pub const CODE_TTL: std::time::Duration = std::time::Duration::from_secs(300);

#[derive(Debug, PartialEq, Eq)]
pub enum CodeError {
    BadFormat,
    NotIssued,
    Expired,
    Mismatch,
}

impl fmt::Display for CodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeError::BadFormat => write!(f, "code must be 6 digits"),
            CodeError::NotIssued => write!(f, "no code has been issued for this email"),
            CodeError::Expired => write!(f, "code has expired"),
            CodeError::Mismatch => write!(f, "code does not match"),
        }
    }
}

impl std::error::Error for CodeError {}

/// Issued-code storage keyed by email. Expiry is an explicit comparison
/// against now at verification time; nothing sweeps in the background.
/// Behind a trait so the in-memory map can be swapped for a persistent
/// store without touching callers.
#[async_trait::async_trait]
pub trait CodeStore: Send + Sync {
    /// Stores a code, replacing any previous one for the same email.
    async fn put(&self, email: &str, code: String, ttl: std::time::Duration);

    /// Checks a code and consumes it on success. Expired codes are removed
    /// on the failed attempt that discovers them.
    async fn verify(&self, email: &str, code: &str) -> Result<(), CodeError>;
}

struct IssuedCode {
    code: String,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct InMemoryCodeStore {
    codes: Mutex<HashMap<String, IssuedCode>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CodeStore for InMemoryCodeStore {
    async fn put(&self, email: &str, code: String, ttl: std::time::Duration) {
        let expires_at = Utc::now()
            + Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(300));
        self.codes
            .lock()
            .await
            .insert(email.to_string(), IssuedCode { code, expires_at });
    }

    async fn verify(&self, email: &str, code: &str) -> Result<(), CodeError> {
        if email.is_empty() || code.is_empty() {
            return Err(CodeError::BadFormat);
        }
        if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(CodeError::BadFormat);
        }

        let mut codes = self.codes.lock().await;
        let issued = codes.get(email).ok_or(CodeError::NotIssued)?;

        if Utc::now() > issued.expires_at {
            codes.remove(email);
            return Err(CodeError::Expired);
        }
        if issued.code != code {
            return Err(CodeError::Mismatch);
        }

        // single use
        codes.remove(email);
        Ok(())
    }
}

/// 6-digit numeric code, zero-padded.
pub fn generate_auth_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// 6-character uppercase alphanumeric invite code for device binding.
pub fn generate_invite_code() -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    (0..6)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn verify_consumes_the_code() {
        let store = InMemoryCodeStore::new();
        store.put("a@b.com", "123456".to_string(), CODE_TTL).await;

        assert!(store.verify("a@b.com", "123456").await.is_ok());
        // second attempt: already consumed
        assert_eq!(
            store.verify("a@b.com", "123456").await,
            Err(CodeError::NotIssued)
        );
    }

    #[tokio::test]
    async fn wrong_code_is_a_mismatch_and_stays_usable() {
        let store = InMemoryCodeStore::new();
        store.put("a@b.com", "123456".to_string(), CODE_TTL).await;

        assert_eq!(
            store.verify("a@b.com", "654321").await,
            Err(CodeError::Mismatch)
        );
        assert!(store.verify("a@b.com", "123456").await.is_ok());
    }

    #[tokio::test]
    async fn expired_code_is_rejected_and_removed() {
        let store = InMemoryCodeStore::new();
        store
            .put("a@b.com", "123456".to_string(), std::time::Duration::ZERO)
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert_eq!(
            store.verify("a@b.com", "123456").await,
            Err(CodeError::Expired)
        );
        assert_eq!(
            store.verify("a@b.com", "123456").await,
            Err(CodeError::NotIssued)
        );
    }

    #[tokio::test]
    async fn malformed_codes_are_rejected_before_lookup() {
        let store = InMemoryCodeStore::new();
        assert_eq!(store.verify("a@b.com", "12345").await, Err(CodeError::BadFormat));
        assert_eq!(
            store.verify("a@b.com", "abcdef").await,
            Err(CodeError::BadFormat)
        );
        assert_eq!(store.verify("", "123456").await, Err(CodeError::BadFormat));
    }

    #[tokio::test]
    async fn reissue_overwrites_the_previous_code() {
        let store = InMemoryCodeStore::new();
        store.put("a@b.com", "111111".to_string(), CODE_TTL).await;
        store.put("a@b.com", "222222".to_string(), CODE_TTL).await;

        assert_eq!(
            store.verify("a@b.com", "111111").await,
            Err(CodeError::Mismatch)
        );
        assert!(store.verify("a@b.com", "222222").await.is_ok());
    }

    #[test]
    fn generated_codes_have_the_expected_shape() {
        let auth = generate_auth_code();
        assert_eq!(auth.len(), 6);
        assert!(auth.chars().all(|c| c.is_ascii_digit()));

        let invite = generate_invite_code();
        assert_eq!(invite.len(), 6);
        assert!(invite
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
