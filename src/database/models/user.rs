use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Closed role set for authorization decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Publisher,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Publisher => "publisher",
            Role::Admin => "admin",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Argon2 hash, never serialized
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_expire: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub async fn find(id: Uuid, pool: &PgPool) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(
        name: &str,
        email: &str,
        role: Role,
        password_hash: &str,
        pool: &PgPool,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, role, password) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(name)
        .bind(email)
        .bind(role)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    pub async fn update_details(
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        pool: &PgPool,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email) \
             WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(pool)
        .await
    }

    pub async fn update_password(
        id: Uuid,
        password_hash: &str,
        pool: &PgPool,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET password = $2, reset_password_token = NULL, \
             reset_password_expire = NULL WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(password_hash)
        .fetch_one(pool)
        .await
    }

    /// Stash the hashed reset token with its expiry
    pub async fn set_reset_token(
        id: Uuid,
        token_hash: &str,
        expire: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_password_token = $2, reset_password_expire = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expire)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn clear_reset_token(id: Uuid, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET reset_password_token = NULL, reset_password_expire = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Lookup by hashed reset token, valid only while unexpired
    pub async fn find_by_reset_token(
        token_hash: &str,
        pool: &PgPool,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE reset_password_token = $1 AND reset_password_expire > now()",
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await
    }

    pub async fn admin_update(
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
        role: Option<Role>,
        pool: &PgPool,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             role = COALESCE($4, role) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(role)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(id: Uuid, pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Publisher).unwrap(), "\"publisher\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"admin\"").unwrap(),
            Role::Admin
        );
    }

    #[test]
    fn password_fields_never_serialize() {
        let user = User {
            id: Uuid::nil(),
            name: "Test".into(),
            email: "t@example.com".into(),
            role: Role::User,
            password: "hash".into(),
            reset_password_token: Some("secret".into()),
            reset_password_expire: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("reset_password_token").is_none());
        assert_eq!(json["email"], "t@example.com");
    }
}
