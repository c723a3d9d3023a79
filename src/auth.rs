use crate::model::{Profile, Role};
use crate::store::{self, StoreError};
use rusqlite::{Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 6;

/// Salted SHA-256, stored as `salt$hexdigest`. Stands in for the hosted
/// auth provider's credential storage.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{salt}${}", digest_with_salt(&salt, password))
}

pub fn verify_password(stored: &str, password: &str) -> bool {
    let Some((salt, digest)) = stored.split_once('$') else {
        return false;
    };
    digest_with_salt(salt, password) == digest
}

fn digest_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn validate_credentials(email: &str, password: &str) -> Result<(), StoreError> {
    if email.is_empty() || !email.contains('@') {
        return Err(StoreError::Auth("invalid email address".into()));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(StoreError::Auth(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn create_account(
    conn: &Connection,
    email: &str,
    password: &str,
    full_name: Option<String>,
    role: Role,
) -> Result<Profile, StoreError> {
    let email = store::normalize_email(email);
    validate_credentials(&email, password)?;

    let id = store::new_id();
    let identity = conn.execute(
        "INSERT INTO auth_users(id, email, password_hash, created_at) VALUES(?, ?, ?, ?)",
        (&id, &email, hash_password(password), store::now()),
    );
    if let Err(e) = identity {
        if store::is_unique_violation(&e) {
            return Err(StoreError::Auth("email is already registered".into()));
        }
        return Err(e.into());
    }

    let profile = Profile {
        id: id.clone(),
        email,
        full_name: full_name.filter(|n| !n.trim().is_empty()),
        role,
        created_at: store::now(),
    };
    if let Err(e) = store::insert_profile(conn, &profile) {
        // The identity insert already succeeded; compensate so the email
        // is not left orphaned and can be registered again.
        let _ = conn.execute("DELETE FROM auth_users WHERE id = ?", [&id]);
        return Err(StoreError::ProfileCreation(e.to_string()));
    }

    Ok(profile)
}

/// Self-registration: identity first, then the matching profile row. The
/// role is always `student`; teachers are provisioned administratively.
pub fn sign_up(
    conn: &Connection,
    email: &str,
    password: &str,
    full_name: Option<String>,
) -> Result<Profile, StoreError> {
    create_account(conn, email, password, full_name, Role::Student)
}

/// Administrative provisioning path for teacher accounts.
pub fn create_teacher(
    conn: &Connection,
    email: &str,
    password: &str,
    full_name: Option<String>,
) -> Result<Profile, StoreError> {
    create_account(conn, email, password, full_name, Role::Teacher)
}

pub fn sign_in(conn: &Connection, email: &str, password: &str) -> Result<Profile, StoreError> {
    let email = store::normalize_email(email);
    let stored: Option<(String, String)> = conn
        .query_row(
            "SELECT id, password_hash FROM auth_users WHERE email = ?",
            [&email],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?;

    // One indistinct message for unknown email and wrong password.
    let (id, password_hash) =
        stored.ok_or_else(|| StoreError::Auth("invalid email or password".into()))?;
    if !verify_password(&password_hash, password) {
        return Err(StoreError::Auth("invalid email or password".into()));
    }

    store::profile_by_id(conn, &id)?.ok_or(StoreError::NotFound("profile"))
}
