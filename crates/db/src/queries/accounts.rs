//! User accounts. Passwords arrive here already hashed.

use chrono::{DateTime, SubsecRound, Utc};
use sqlx::Row;
use watchtower_core::UserType;

use super::millis_to_datetime;
use crate::{Database, DbError, DbResult};

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    pub user_type: UserType,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create an account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_type: UserType,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub password_hash: String,
}

struct AccountRow {
    id: String,
    user_type: String,
    full_name: String,
    email: String,
    mobile: String,
    password_hash: String,
    created_at: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::sqlite::SqliteRow> for AccountRow {
    fn from_row(row: &'r sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_type: row.try_get("user_type")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            mobile: row.try_get("mobile")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<AccountRow> for Account {
    type Error = DbError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let user_type = row.user_type.parse().map_err(|_| DbError::Corrupt {
            table: "accounts",
            reason: format!("unknown user type '{}'", row.user_type),
        })?;
        Ok(Account {
            id: row.id,
            user_type,
            full_name: row.full_name,
            email: row.email,
            mobile: row.mobile,
            password_hash: row.password_hash,
            created_at: millis_to_datetime("accounts", row.created_at)?,
        })
    }
}

impl Database {
    /// Create an account. Emails are unique case-insensitively.
    pub async fn insert_account(&self, new: &NewAccount) -> DbResult<Account> {
        let account = Account {
            id: uuid::Uuid::new_v4().to_string(),
            user_type: new.user_type,
            full_name: new.full_name.clone(),
            email: new.email.clone(),
            mobile: new.mobile.clone(),
            password_hash: new.password_hash.clone(),
            created_at: Utc::now().trunc_subsecs(3),
        };

        let result = sqlx::query(
            "INSERT INTO accounts
                (id, user_type, full_name, email, mobile, password_hash, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&account.id)
        .bind(account.user_type.as_str())
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.mobile)
        .bind(&account.password_hash)
        .bind(account.created_at.timestamp_millis())
        .execute(self.pool())
        .await;

        match result {
            Ok(_) => Ok(account),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(DbError::DuplicateEmail(new.email.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_account_by_email(&self, email: &str) -> DbResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, user_type, full_name, email, mobile, password_hash, created_at
             FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await?;
        row.map(Account::try_from).transpose()
    }

    pub async fn find_account_by_id(&self, id: &str) -> DbResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, user_type, full_name, email, mobile, password_hash, created_at
             FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(Account::try_from).transpose()
    }
}
