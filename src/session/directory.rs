//! Identity records the session store authenticates against.
//!
//! Secrets are never kept in the clear: each record holds an HMAC-SHA256
//! digest of its secret under the directory key. This is a demo directory,
//! held in memory for the life of the process.

use anyhow::{anyhow, Result};
use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::ItemId;

use super::{Session, SessionError, Watchlist};

type HmacSha256 = Hmac<Sha256>;

pub const DEMO_EMAIL: &str = "user@example.com";
pub const DEMO_NAME: &str = "Demo User";
pub const DEMO_WATCHLIST: [ItemId; 3] = [550, 299536, 299534];

#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub watchlist: Watchlist,
    secret_digest: String,
}

#[derive(Clone)]
pub struct IdentityDirectory {
    mac: HmacSha256,
    identities: Vec<Identity>,
}

impl IdentityDirectory {
    pub fn new(key: &[u8]) -> Result<Self> {
        let mac = HmacSha256::new_from_slice(key)
            .map_err(|e| anyhow!("Invalid credential key: {}", e))?;
        Ok(Self {
            mac,
            identities: Vec::new(),
        })
    }

    /// Directory seeded with the demo identity.
    pub fn with_demo_identity(key: &[u8], demo_password: &str) -> Result<Self> {
        let mut directory = Self::new(key)?;
        directory
            .insert(
                DEMO_EMAIL,
                demo_password,
                DEMO_NAME,
                Watchlist::from(DEMO_WATCHLIST.to_vec()),
            )
            .map_err(|e| anyhow!("Failed to seed demo identity: {}", e))?;
        Ok(directory)
    }

    pub fn contains_email(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.identities.iter().any(|i| i.email == email)
    }

    pub fn insert(
        &mut self,
        email: &str,
        secret: &str,
        name: &str,
        watchlist: Watchlist,
    ) -> Result<Identity, SessionError> {
        if self.contains_email(email) {
            return Err(SessionError::EmailAlreadyRegistered);
        }
        let identity = Identity {
            id: self.next_id(),
            email: normalize_email(email),
            name: name.trim().to_string(),
            watchlist,
            secret_digest: self.digest(secret),
        };
        self.identities.push(identity.clone());
        Ok(identity)
    }

    /// Unknown email and wrong secret are indistinguishable to the caller.
    pub fn verify(&self, email: &str, secret: &str) -> Result<&Identity, SessionError> {
        let email = normalize_email(email);
        let candidate = self.digest(secret);
        self.identities
            .iter()
            .find(|i| i.email == email)
            .filter(|i| constant_time_eq(i.secret_digest.as_bytes(), candidate.as_bytes()))
            .ok_or(SessionError::InvalidCredentials)
    }

    /// Reserves the identity behind a session restored from disk. Its email
    /// stays taken for the life of the process; a record the directory did
    /// not seed carries no digest and only the restored session can use it.
    pub fn restore(&mut self, session: &Session) {
        let email = normalize_email(&session.email);
        if let Some(identity) = self.identities.iter_mut().find(|i| i.email == email) {
            identity.watchlist = session.watchlist.clone();
            return;
        }
        self.identities.push(Identity {
            id: session.id.clone(),
            email,
            name: session.name.clone(),
            watchlist: session.watchlist.clone(),
            secret_digest: String::new(),
        });
    }

    pub fn sync_watchlist(&mut self, id: &str, watchlist: &Watchlist) {
        if let Some(identity) = self.identities.iter_mut().find(|i| i.id == id) {
            identity.watchlist = watchlist.clone();
        }
    }

    pub fn get(&self, id: &str) -> Option<&Identity> {
        self.identities.iter().find(|i| i.id == id)
    }

    fn next_id(&self) -> String {
        let highest = self
            .identities
            .iter()
            .filter_map(|i| i.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        (highest + 1).to_string()
    }

    fn digest(&self, secret: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(secret.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> IdentityDirectory {
        IdentityDirectory::with_demo_identity(b"test-key", "password123").expect("directory")
    }

    #[test]
    fn demo_identity_verifies_with_demo_password() {
        let dir = directory();
        let identity = dir.verify("user@example.com", "password123").expect("verify");
        assert_eq!(identity.id, "1");
        assert_eq!(identity.name, "Demo User");
        assert_eq!(identity.watchlist.ids(), &[550, 299536, 299534]);
    }

    #[test]
    fn email_lookup_ignores_case_and_padding() {
        let dir = directory();
        assert!(dir.verify("  User@Example.com ", "password123").is_ok());
        assert!(dir.contains_email("USER@example.com"));
    }

    #[test]
    fn wrong_secret_and_unknown_email_fail_alike() {
        let dir = directory();
        let wrong = dir.verify("user@example.com", "nope").unwrap_err();
        let unknown = dir.verify("ghost@example.com", "password123").unwrap_err();
        assert!(matches!(wrong, SessionError::InvalidCredentials));
        assert!(matches!(unknown, SessionError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[test]
    fn digests_depend_on_the_key() {
        let a = IdentityDirectory::new(b"key-a").unwrap();
        let b = IdentityDirectory::new(b"key-b").unwrap();
        assert_ne!(a.digest("secret"), b.digest("secret"));
        assert_eq!(a.digest("secret").len(), 64);
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut dir = directory();
        let err = dir
            .insert("user@example.com", "x", "Someone", Watchlist::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::EmailAlreadyRegistered));
        assert_eq!(dir.get("1").expect("demo").name, "Demo User");
        assert!(dir.get("2").is_none());
    }

    fn restored(id: &str, email: &str) -> Session {
        Session {
            id: id.to_string(),
            email: email.to_string(),
            name: "Returning".to_string(),
            watchlist: Watchlist::from(vec![10]),
            signed_in_at: None,
        }
    }

    #[test]
    fn restored_identity_keeps_its_email_and_id_reserved() {
        let mut dir = directory();
        dir.restore(&restored("4", "back@example.com"));

        let err = dir
            .insert("Back@Example.com", "x", "Someone", Watchlist::default())
            .unwrap_err();
        assert!(matches!(err, SessionError::EmailAlreadyRegistered));
        assert_eq!(dir.get("4").expect("restored").watchlist.ids(), &[10]);

        let next = dir
            .insert("fresh@example.com", "x", "Fresh", Watchlist::default())
            .expect("insert");
        assert_eq!(next.id, "5");
    }

    #[test]
    fn restored_identity_without_digest_cannot_sign_in() {
        let mut dir = directory();
        dir.restore(&restored("2", "back@example.com"));
        assert!(matches!(
            dir.verify("back@example.com", ""),
            Err(SessionError::InvalidCredentials)
        ));
    }

    #[test]
    fn restoring_a_seeded_identity_updates_its_watchlist() {
        let mut dir = directory();
        dir.restore(&restored("1", "user@example.com"));
        let demo = dir.verify("user@example.com", "password123").expect("verify");
        assert_eq!(demo.watchlist.ids(), &[10]);
    }
}
