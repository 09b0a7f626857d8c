//! Organizations, employee invitations and sign-up.
//!
//! An admin signs up with an organization name. Employees cannot sign up on
//! their own: an admin records an invitation (email, role, code) on the
//! organization, and the employee redeems the code when creating their
//! account.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::{save_profile, Role, Session, SessionManager, USERS};
use crate::error::{Error, Result};
use crate::navigation::{require, Screen};
use crate::storage::DocumentStore;

/// Collection holding organizations.
pub const ORGANIZATIONS: &str = "organizations";

/// A pending invitation for one email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    /// Code the employee must present at sign-up.
    pub invite_code: String,
    /// Role granted on sign-up.
    pub role: String,
}

/// A dealership organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Organization {
    /// Display name.
    pub name: String,
    /// Uid of the admin who created it.
    pub admin: String,
    /// Role per member uid.
    pub roles: BTreeMap<String, String>,
    /// Pending invitations keyed by email.
    pub invitations: BTreeMap<String, Invitation>,
}

/// Generate an invitation code of the given length.
///
/// Codes are lowercase hex drawn from a BLAKE3 digest of the invitation and
/// a random nonce.
#[must_use]
pub fn generate_invite_code(email: &str, role: &str, length: usize) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(email.as_bytes());
    hasher.update(role.as_bytes());
    hasher.update(Uuid::new_v4().as_bytes());
    let mut code = hasher.finalize().to_hex().to_string();
    code.truncate(length);
    code
}

async fn load_organization(store: &dyn DocumentStore, id: &str) -> Result<Organization> {
    let body = store
        .get(ORGANIZATIONS, id)
        .await?
        .ok_or_else(|| Error::not_found(ORGANIZATIONS, id))?;
    Ok(serde_json::from_value(body)?)
}

/// Create an admin account and its organization, and sign in.
///
/// Returns the admin dashboard screen.
///
/// # Errors
///
/// Returns [`Error::MissingField`] if the organization name is blank, or an
/// auth or store error.
pub async fn sign_up_admin(
    sessions: &mut SessionManager,
    email: &str,
    password: &str,
    organization_name: &str,
) -> Result<Screen> {
    if organization_name.trim().is_empty() {
        return Err(Error::MissingField {
            field: "organization name",
        });
    }

    let user = sessions.auth().create_user(email, password).await?;
    let store = sessions.store().clone();

    // The organization takes the admin's uid as its identifier.
    let organization = Organization {
        name: organization_name.trim().to_string(),
        admin: user.uid.clone(),
        roles: BTreeMap::from([(user.uid.clone(), Role::Admin.as_str().to_string())]),
        invitations: BTreeMap::new(),
    };
    store
        .set(ORGANIZATIONS, &user.uid, serde_json::to_value(&organization)?)
        .await?;
    save_profile(store.as_ref(), &user, Role::Admin, Some(&user.uid)).await?;

    info!("Created organization '{}'", organization.name);
    sessions.establish(user).await?;
    Ok(Screen::AdminDashboard)
}

/// Roles an admin may hand out. Superusers come only from configuration.
fn is_invitable(role: Role) -> bool {
    matches!(role, Role::User | Role::Admin)
}

/// Record an invitation on the admin's organization.
///
/// # Errors
///
/// Returns [`Error::Forbidden`] for non-admin sessions,
/// [`Error::RoleNotInvitable`] for any role other than user or admin,
/// [`Error::MissingField`] for a blank email, or [`Error::NotFound`] if the
/// admin has no organization.
pub async fn invite(
    store: &dyn DocumentStore,
    session: &Session,
    email: &str,
    role: Role,
    code_length: usize,
) -> Result<Invitation> {
    require(session.role, &Screen::AdminDashboard)?;
    if !is_invitable(role) {
        return Err(Error::RoleNotInvitable {
            role: role.to_string(),
        });
    }
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::MissingField {
            field: "employee email",
        });
    }

    let profile = store
        .get(USERS, &session.user.uid)
        .await?
        .ok_or_else(|| Error::not_found(USERS, &session.user.uid))?;
    let organization_id = profile
        .get("organizationId")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::not_found(ORGANIZATIONS, format!("for {}", session.user.email)))?
        .to_string();

    let mut organization = load_organization(store, &organization_id).await?;
    let invitation = Invitation {
        invite_code: generate_invite_code(&email, role.as_str(), code_length),
        role: role.as_str().to_string(),
    };
    organization
        .invitations
        .insert(email.clone(), invitation.clone());

    let mut fields = Map::new();
    fields.insert(
        "invitations".to_string(),
        serde_json::to_value(&organization.invitations)?,
    );
    store
        .update(ORGANIZATIONS, &organization_id, fields)
        .await?;

    info!("Invited {} to {} as '{}'", email, organization.name, role);
    Ok(invitation)
}

/// Create an employee account from an invitation, and sign in.
///
/// Returns the first screen for the granted role.
///
/// # Errors
///
/// Returns [`Error::InvalidInvite`] if no organization has a matching
/// invitation, or an auth or store error.
pub async fn sign_up_employee(
    sessions: &mut SessionManager,
    email: &str,
    password: &str,
    invite_code: &str,
) -> Result<Screen> {
    let email_key = email.trim().to_lowercase();
    let store = sessions.store().clone();

    let mut granted = None;
    for doc in store.list(ORGANIZATIONS).await? {
        let organization: Organization = serde_json::from_value(doc.body)?;
        if let Some(invitation) = organization.invitations.get(&email_key) {
            if invitation.invite_code == invite_code.trim() {
                granted = Some((doc.id, invitation.role.clone()));
            }
        }
    }
    let Some((organization_id, role)) = granted else {
        return Err(Error::InvalidInvite);
    };
    // Stored invitations are not trusted to carry an invitable role.
    let role = Role::parse(&role);
    if !is_invitable(role) {
        return Err(Error::InvalidInvite);
    }

    let user = sessions.auth().create_user(email, password).await?;
    save_profile(store.as_ref(), &user, role, Some(&organization_id)).await?;

    let mut organization = load_organization(store.as_ref(), &organization_id).await?;
    organization
        .roles
        .insert(user.uid.clone(), role.as_str().to_string());
    organization.invitations.remove(&email_key);
    let mut fields = Map::new();
    fields.insert("roles".to_string(), serde_json::to_value(&organization.roles)?);
    fields.insert(
        "invitations".to_string(),
        serde_json::to_value(&organization.invitations)?,
    );
    store.update(ORGANIZATIONS, &organization_id, fields).await?;

    info!("{} joined {}", user.email, organization.name);
    sessions.establish(user).await
}
