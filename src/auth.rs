//! Credential file with salted SHA-256 hashes, plus login sessions.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{JsonStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Parent,
    Admin,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role '{0}' (expected teacher, parent or admin)")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "parent" => Ok(Role::Parent),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub role: Role,
    pub salt: String,
    pub password_hash: String,
}

impl Credential {
    pub fn new(username: &str, password: &str, role: Role) -> Self {
        let salt = random_hex(16);
        let password_hash = hash_password(&salt, password);
        Self {
            username: username.to_string(),
            role,
            salt,
            password_hash,
        }
    }

    fn verify(&self, password: &str) -> bool {
        let candidate = hash_password(&self.salt, password);
        constant_time_eq(candidate.as_bytes(), self.password_hash.as_bytes())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Same error for unknown users and wrong passwords.
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Please log in to continue")]
    Unauthenticated,
}

/// hex(SHA-256(salt || password))
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn random_hex(len: usize) -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
    to_hex(&bytes)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

const DEMO_ACCOUNTS: [(&str, &str, Role); 3] = [
    ("teacher1", "password123", Role::Teacher),
    ("parent1", "password123", Role::Parent),
    ("admin", "adminpassword", Role::Admin),
];

#[derive(Debug, Clone)]
pub struct CredentialStore {
    store: JsonStore<Credential>,
}

impl CredentialStore {
    /// Opens the credentials file, seeding the demo accounts when it is
    /// missing or empty. A corrupt file is left alone and reads as no users.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let store = JsonStore::new(path);
        let needs_seed = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
        if needs_seed {
            let accounts: Vec<Credential> = DEMO_ACCOUNTS
                .iter()
                .map(|(user, pass, role)| Credential::new(user, pass, *role))
                .collect();
            store.write_all(&accounts)?;
            info!("Seeded {} demo accounts in {}", accounts.len(), path.display());
        }
        Ok(Self { store })
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let credentials = self.store.load_all();
        // Hash against every entry so timing does not reveal whether or
        // where the username exists.
        let matched = credentials.iter().fold(None, |found, c| {
            let verified = c.verify(password);
            let hit = c.username == username && verified;
            found.or(hit.then_some(c))
        });

        match matched {
            Some(c) => Ok(User {
                username: c.username.clone(),
                role: c.role,
            }),
            None => {
                warn!("Failed login attempt for '{username}'");
                Err(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Sessions older than this are dropped.
pub const SESSION_TTL_HOURS: i64 = 8;

#[derive(Debug, Clone)]
struct SessionEntry {
    user: User,
    issued_at: DateTime<Utc>,
}

/// In-memory bearer tokens for logged-in users. Expired tokens are pruned
/// whenever a new one is issued.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(SESSION_TTL_HOURS))
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn issue(&self, user: User) -> String {
        let now = Utc::now();
        let token = random_hex(32);
        let mut sessions = self.lock();
        sessions.retain(|_, entry| !self.expired(entry, now));
        sessions.insert(
            token.clone(),
            SessionEntry {
                user,
                issued_at: now,
            },
        );
        token
    }

    pub fn resolve(&self, token: &str) -> Option<User> {
        let now = Utc::now();
        let mut sessions = self.lock();
        let entry = sessions.get(token)?;
        if self.expired(entry, now) {
            sessions.remove(token);
            return None;
        }
        Some(entry.user.clone())
    }

    pub fn revoke(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    /// Tokens currently held, expired or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn expired(&self, entry: &SessionEntry, now: DateTime<Utc>) -> bool {
        now - entry.issued_at >= self.ttl
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
