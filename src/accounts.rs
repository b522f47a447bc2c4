//! Leader accounts and roles.
//!
//! Accounts are the actors behind awarding, stock changes and manual badge
//! completion. Only admins may push stock below zero.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage::database::{get_enum, get_timestamp, get_uuid};
use crate::storage::DatabaseError;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Parent or helper with read access
    Member,
    Leader,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Leader => "leader",
            Role::Admin => "admin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Role::Member),
            "leader" => Some(Role::Leader),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// A user account that can act on member records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderAccount {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl LeaderAccount {
    pub fn new(email: &str, display_name: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.trim().to_lowercase(),
            display_name: display_name.trim().to_string(),
            role,
            created_at: Utc::now(),
        }
    }

    /// Leaders and admins may record progress and hand out badges.
    pub fn is_leader(&self) -> bool {
        self.role >= Role::Leader
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Manager for leader accounts.
pub struct AccountManager<'a> {
    conn: &'a Connection,
}

impl<'a> AccountManager<'a> {
    /// Create a new account manager with a database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create an account.
    pub fn create(&self, account: &LeaderAccount) -> Result<(), AccountError> {
        if account.display_name.is_empty() {
            return Err(AccountError::ValidationError(
                "Display name is required".to_string(),
            ));
        }
        if !account.email.contains('@') {
            return Err(AccountError::ValidationError(format!(
                "Invalid email address: {}",
                account.email
            )));
        }
        if self.find_by_email(&account.email)?.is_some() {
            return Err(AccountError::Duplicate(format!(
                "An account already exists for {}",
                account.email
            )));
        }

        self.conn
            .execute(
                "INSERT INTO accounts (id, email, display_name, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    account.id.to_string(),
                    account.email,
                    account.display_name,
                    account.role.as_str(),
                    account.created_at.to_rfc3339(),
                ],
            )
            .map_err(DatabaseError::from)?;

        Ok(())
    }

    /// Get an account by ID.
    pub fn get(&self, id: Uuid) -> Result<Option<LeaderAccount>, AccountError> {
        self.conn
            .query_row(
                "SELECT id, email, display_name, role, created_at FROM accounts WHERE id = ?1",
                params![id.to_string()],
                parse_account_row,
            )
            .optional()
            .map_err(|e| DatabaseError::from(e).into())
    }

    /// Find an account by email (case-insensitive).
    pub fn find_by_email(&self, email: &str) -> Result<Option<LeaderAccount>, AccountError> {
        self.conn
            .query_row(
                "SELECT id, email, display_name, role, created_at FROM accounts WHERE email = ?1",
                params![email.trim().to_lowercase()],
                parse_account_row,
            )
            .optional()
            .map_err(|e| DatabaseError::from(e).into())
    }

    /// Promote a member account to leader.
    ///
    /// Promoting an account that is already a leader (or admin) is rejected
    /// and nothing is written.
    pub fn promote_to_leader(&self, id: Uuid) -> Result<LeaderAccount, AccountError> {
        let mut account = self.get(id)?.ok_or(AccountError::NotFound(id))?;

        if account.is_leader() {
            return Err(AccountError::Duplicate(format!(
                "{} is already a {}",
                account.display_name,
                account.role.as_str()
            )));
        }

        self.conn
            .execute(
                "UPDATE accounts SET role = ?2 WHERE id = ?1",
                params![id.to_string(), Role::Leader.as_str()],
            )
            .map_err(DatabaseError::from)?;

        tracing::info!("Promoted {} to leader", account.display_name);
        account.role = Role::Leader;
        Ok(account)
    }
}

/// Parse a database row into a LeaderAccount.
fn parse_account_row(row: &Row<'_>) -> rusqlite::Result<LeaderAccount> {
    Ok(LeaderAccount {
        id: get_uuid(row, 0)?,
        email: row.get(1)?,
        display_name: row.get(2)?,
        role: get_enum(row, 3, "role", Role::from_str)?,
        created_at: get_timestamp(row, 4)?,
    })
}

/// Account management errors.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Account not found: {0}")]
    NotFound(Uuid),
}
