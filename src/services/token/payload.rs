/*
 * Responsibility
 * - Claims carried inside an access token (token id / user id / issued / expiry)
 * - Expiry check that does not need the key (callers may re-check a decoded payload)
 */
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::maker::TokenError;

/// Decoded access-token claims.
///
/// Fields are private: a payload is built once by the token maker and never
/// changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    token_id: Uuid,
    user_id: Uuid,
    issued_at: DateTime<Utc>,
    expired_at: DateTime<Utc>,
}

impl Payload {
    /// `expired_at` is derived from the same `now` as `issued_at`.
    ///
    /// Returns `None` if `now + duration` is outside chrono's range.
    pub(crate) fn new(
        token_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Option<Self> {
        let expired_at = now.checked_add_signed(duration)?;

        Some(Self {
            token_id,
            user_id,
            issued_at: now,
            expired_at,
        })
    }

    pub fn token_id(&self) -> Uuid {
        self.token_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expired_at(&self) -> DateTime<Utc> {
        self.expired_at
    }

    pub fn check_expired(&self) -> Result<(), TokenError> {
        self.check_expired_at(Utc::now())
    }

    // `expired_at` itself is still valid; only strictly later instants are expired.
    pub fn check_expired_at(&self, now: DateTime<Utc>) -> Result<(), TokenError> {
        if now > self.expired_at {
            return Err(TokenError::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(duration: Duration) -> (Payload, DateTime<Utc>) {
        let now = Utc::now();
        let p = Payload::new(Uuid::new_v4(), Uuid::new_v4(), now, duration).unwrap();
        (p, now)
    }

    #[test]
    fn expiry_is_issued_at_plus_duration() {
        let (p, now) = payload(Duration::minutes(15));

        assert_eq!(p.issued_at(), now);
        assert_eq!(p.expired_at() - p.issued_at(), Duration::minutes(15));
    }

    #[test]
    fn not_expired_until_after_expired_at() {
        let (p, now) = payload(Duration::seconds(30));

        assert!(p.check_expired_at(now).is_ok());
        assert!(p.check_expired_at(p.expired_at()).is_ok());
        assert!(matches!(
            p.check_expired_at(p.expired_at() + Duration::milliseconds(1)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn negative_duration_is_already_expired() {
        let (p, _) = payload(Duration::seconds(-1));

        assert!(p.expired_at() < p.issued_at());
        assert!(matches!(p.check_expired(), Err(TokenError::Expired)));
    }

    #[test]
    fn overflowing_duration_is_rejected() {
        let now = Utc::now();
        assert!(Payload::new(Uuid::new_v4(), Uuid::new_v4(), now, Duration::MAX).is_none());
    }

    #[test]
    fn serializes_with_snake_case_claim_names() {
        let (p, _) = payload(Duration::minutes(1));
        let v = serde_json::to_value(&p).unwrap();

        for key in ["token_id", "user_id", "issued_at", "expired_at"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }

        let back: Payload = serde_json::from_value(v).unwrap();
        assert_eq!(back, p);
    }
}
