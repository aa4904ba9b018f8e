//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor, PgPool};

use ticketwave_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

/// Columns selected for every user query.
pub(crate) const USER_COLUMNS: &str =
    "id, name, email, email_verified, has_ticket, created_at, updated_at";

/// Raw `users` row.
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    id: i32,
    name: String,
    email: String,
    email_verified: bool,
    has_ticket: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            email_verified: row.email_verified,
            has_ticket: row.has_ticket,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct UserWithHashRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: Option<String>,
}

/// Third-party identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Google,
    Apple,
}

impl SocialProvider {
    /// Column storing the provider's subject identifier.
    const fn id_column(self) -> &'static str {
        match self {
            Self::Google => "google_id",
            Self::Apple => "apple_id",
        }
    }
}

/// Insert a password user. Shared with the registration transaction.
pub(crate) async fn insert_with_password<'e>(
    executor: impl PgExecutor<'e>,
    name: &str,
    email: &Email,
    password_hash: &str,
) -> Result<User, RepositoryError> {
    let sql = format!(
        "INSERT INTO users (name, email, password_hash) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
    );
    sqlx::query_as::<_, UserRow>(&sql)
        .bind(name)
        .bind(email.as_str())
        .bind(password_hash)
        .fetch_one(executor)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email"))?
        .try_into()
}

/// Rename a user.
pub(crate) async fn update_name<'e>(
    executor: impl PgExecutor<'e>,
    id: UserId,
    name: &str,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE users SET name = $1, updated_at = NOW() WHERE id = $2")
        .bind(name)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    /// Create a new user with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create_with_password(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        insert_with_password(self.pool, name, email, password_hash).await
    }

    /// Find the user for a provider login, creating a verified account if the
    /// email is new.
    ///
    /// An existing account with the same email is reused and linked to the
    /// provider subject if it was not linked yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_or_create_social(
        &self,
        provider: SocialProvider,
        subject: &str,
        email: &Email,
        name: &str,
    ) -> Result<User, RepositoryError> {
        let column = provider.id_column();

        let link = format!(
            "UPDATE users SET {column} = COALESCE({column}, $2), updated_at = NOW() \
             WHERE email = $1 RETURNING {USER_COLUMNS}"
        );
        if let Some(row) = sqlx::query_as::<_, UserRow>(&link)
            .bind(email.as_str())
            .bind(subject)
            .fetch_optional(self.pool)
            .await?
        {
            return row.try_into();
        }

        let create = format!(
            "INSERT INTO users (name, email, email_verified, {column}) VALUES ($1, $2, TRUE, $3) \
             ON CONFLICT (email) DO UPDATE SET updated_at = NOW() \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&create)
            .bind(name)
            .bind(email.as_str())
            .bind(subject)
            .fetch_one(self.pool)
            .await?
            .try_into()
    }

    /// Get a user together with their password hash.
    ///
    /// The hash is `None` for accounts created through a provider login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, Option<String>)>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1");
        let Some(row) = sqlx::query_as::<_, UserWithHashRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some((row.user.try_into()?, row.password_hash)))
    }

    /// Mark a user's email as verified.
    ///
    /// Returns `false` if no such user exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_verified(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET email_verified = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a user's email as verified by address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    pub async fn mark_verified_by_email(&self, email: &Email) -> Result<User, RepositoryError> {
        let sql = format!(
            "UPDATE users SET email_verified = TRUE, updated_at = NOW() \
             WHERE email = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?
            .try_into()
    }
}
