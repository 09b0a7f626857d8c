//! Identity, roles and the signed-in session.
//!
//! Credentials are checked by an [`AuthProvider`]. The role attached to a
//! session comes from the configured superuser list or the user's profile
//! in the `users` collection. [`SessionManager`] is the one owner of the
//! current [`Session`]: it sets it on sign-in and clears it on sign-out, and
//! everything else receives the session explicitly.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::navigation::{initial_screen, Screen};
use crate::storage::DocumentStore;

/// Collection holding user profiles (role, organization).
pub const USERS: &str = "users";

/// Collection holding local sign-in credentials.
pub const ACCOUNTS: &str = "accounts";

const CREDENTIAL_CONTEXT: &str = "dealerflow 2024-06 account credential v1";

/// Coarse access label controlling which screens are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Signed out.
    #[default]
    #[serde(rename = "")]
    None,
    /// Regular employee.
    User,
    /// Organization administrator.
    Admin,
    /// Dealership owner account.
    Superuser,
}

impl Role {
    /// Parse a stored role string. Unrecognized roles are regular users.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "" => Self::None,
            "admin" => Self::Admin,
            "superuser" => Self::Superuser,
            _ => Self::User,
        }
    }

    /// The role string as stored and reported.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::User => "user",
            Self::Admin => "admin",
            Self::Superuser => "superuser",
        }
    }

    /// Check if this role belongs to a signed-in user.
    #[must_use]
    pub fn is_signed_in(self) -> bool {
        self != Self::None
    }

    /// Check if this role sees the admin screens.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::Superuser)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Stable user identifier.
    pub uid: String,
    /// Sign-in email.
    pub email: String,
}

/// The signed-in user and their role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The authenticated identity.
    pub user: AuthUser,
    /// Role resolved at sign-in.
    pub role: Role,
}

impl Session {
    /// Read a persisted session, or `None` if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Persist this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Remove a persisted session. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Checks credentials and creates accounts.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Verify an email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser>;

    /// Create an account. Fails if the email is already registered.
    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser>;
}

/// Credentials kept in the document store, one account per document.
///
/// Passwords are stored as a salted BLAKE3 derived-key digest.
#[derive(Clone)]
pub struct LocalAuth {
    store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for LocalAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAuth").finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Account {
    email: String,
    salt: String,
    digest: String,
}

fn credential_digest(salt: &str, password: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new_derive_key(CREDENTIAL_CONTEXT);
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hasher.finalize()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn require_text(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::MissingField { field })
    } else {
        Ok(())
    }
}

impl LocalAuth {
    /// Create a provider backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn find_account(&self, email: &str) -> Result<Option<(String, Account)>> {
        for doc in self.store.list(ACCOUNTS).await? {
            let account: Account = serde_json::from_value(doc.body)?;
            if account.email == email {
                return Ok(Some((doc.id, account)));
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl AuthProvider for LocalAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        require_text(email, "email")?;
        require_text(password, "password")?;
        let email = normalize_email(email);

        let Some((uid, account)) = self.find_account(&email).await? else {
            return Err(Error::auth("no account for that email"));
        };

        let stored = blake3::Hash::from_hex(&account.digest)
            .map_err(|e| Error::internal(format!("corrupt credential for {uid}: {e}")))?;
        if credential_digest(&account.salt, password) != stored {
            return Err(Error::auth("wrong password"));
        }

        debug!("Credentials accepted for {}", email);
        Ok(AuthUser { uid, email })
    }

    async fn create_user(&self, email: &str, password: &str) -> Result<AuthUser> {
        require_text(email, "email")?;
        require_text(password, "password")?;
        let email = normalize_email(email);

        if self.find_account(&email).await?.is_some() {
            return Err(Error::auth("email already in use"));
        }

        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            email: email.clone(),
            digest: credential_digest(&salt, password).to_hex().to_string(),
            salt,
        };
        let uid = self
            .store
            .add(ACCOUNTS, serde_json::to_value(&account)?)
            .await?;

        info!("Created account {} for {}", uid, email);
        Ok(AuthUser { uid, email })
    }
}

/// Owns the current session.
pub struct SessionManager {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthProvider>,
    superusers: Vec<String>,
    current: Option<Session>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("superusers", &self.superusers)
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager with no session.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthProvider>,
        superusers: &[String],
    ) -> Self {
        Self {
            store,
            auth,
            superusers: superusers.iter().map(|e| normalize_email(e)).collect(),
            current: None,
        }
    }

    /// Adopt a previously established session.
    pub fn restore(&mut self, session: Session) {
        debug!("Restored session for {}", session.user.email);
        self.current = Some(session);
    }

    /// The current session, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// The current role; [`Role::None`] when signed out.
    #[must_use]
    pub fn role(&self) -> Role {
        self.current.as_ref().map_or(Role::None, |s| s.role)
    }

    /// The auth provider this manager signs in through.
    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.auth
    }

    /// The store user profiles are read from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Sign in and return the first screen for the resolved role.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the profile
    /// lookup fails. Any previous session is left untouched on failure.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Screen> {
        let user = self.auth.sign_in(email, password).await?;
        self.establish(user).await
    }

    /// Start a session for an identity that was just authenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile lookup fails.
    pub async fn establish(&mut self, user: AuthUser) -> Result<Screen> {
        let role = self.resolve_role(&user).await?;
        info!("Signed in {} as '{}'", user.email, role);
        self.current = Some(Session { user, role });
        Ok(initial_screen(role))
    }

    /// Clear the session.
    pub fn sign_out(&mut self) -> Screen {
        if let Some(session) = self.current.take() {
            info!("Signed out {}", session.user.email);
        }
        initial_screen(Role::None)
    }

    async fn resolve_role(&self, user: &AuthUser) -> Result<Role> {
        if self.superusers.contains(&normalize_email(&user.email)) {
            return Ok(Role::Superuser);
        }

        let profile = self.store.get(USERS, &user.uid).await?;
        let role = profile
            .as_ref()
            .and_then(|p| p.get("role"))
            .and_then(Value::as_str)
            .map_or(Role::User, |r| match Role::parse(r) {
                Role::None => Role::User,
                other => other,
            });
        Ok(role)
    }
}

/// Write a user profile document.
///
/// # Errors
///
/// Returns an error if the store rejects the write.
pub async fn save_profile(
    store: &dyn DocumentStore,
    user: &AuthUser,
    role: Role,
    organization_id: Option<&str>,
) -> Result<()> {
    let mut body = json!({ "email": user.email, "role": role.as_str() });
    if let Some(org) = organization_id {
        body["organizationId"] = Value::from(org);
    }
    store.set(USERS, &user.uid, body).await
}
