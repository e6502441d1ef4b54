//! Hand-written fakes shared by the engine's unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use murmur_types::document::Document;
use murmur_types::error::{SessionError, UserError};
use murmur_types::user::User;
use serde_json::Value;

use crate::clock::Clock;
use crate::session::TokenGenerator;
use crate::user::PasswordHasher;

/// Fixed reference instant for tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

/// Clock that only moves when told to.
pub struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self(Mutex::new(at))
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.0.lock().unwrap() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Deterministic tokens: `token-1`, `token-2`, ...
#[derive(Default)]
pub struct SequentialTokens(AtomicU64);

impl TokenGenerator for SequentialTokens {
    fn generate(&self) -> Result<String, SessionError> {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("token-{n}"))
    }
}

/// Reversible "hash" that is obviously not the plaintext.
pub struct FakeHasher;

impl PasswordHasher for FakeHasher {
    fn hash(&self, password: &str) -> Result<String, UserError> {
        Ok(format!("hashed:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash == format!("hashed:{password}")
    }
}

pub fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

pub fn sample_user(id: &str, name: &str) -> User {
    User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        password_hash: String::new(),
        icon: String::new(),
        is_online: false,
        created_at: Some(t0()),
        updated_at: None,
    }
}
