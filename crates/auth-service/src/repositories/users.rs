//! User repository: database access for the user CRUD surface and for
//! identity resolution during login and token verification.

use crate::errors::ApiError;
use crate::models::User;
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new user. Duplicate emails surface as `ApiError::EmailTaken`.
pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING user_id, name, email, password_hash, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("users_email_unique") {
            ApiError::EmailTaken
        } else {
            ApiError::Database(format!("Failed to create user: {}", e))
        }
    })?;

    Ok(user)
}

pub async fn get_all(pool: &PgPool) -> Result<Vec<User>, ApiError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, name, email, password_hash, created_at, updated_at
        FROM users
        ORDER BY created_at
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to fetch users: {}", e)))?;

    Ok(users)
}

pub async fn get_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, name, email, password_hash, created_at, updated_at
        FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to fetch user by id: {}", e)))?;

    Ok(user)
}

/// Look up a user by email (the identity reference carried in tokens).
pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT user_id, name, email, password_hash, created_at, updated_at
        FROM users
        WHERE email = $1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to fetch user by email: {}", e)))?;

    Ok(user)
}

/// Partial update. Only the supplied fields change; `updated_at` always
/// advances. Returns None when the user does not exist.
pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    name: Option<&str>,
    email: Option<&str>,
    password_hash: Option<&str>,
) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            password_hash = COALESCE($4, password_hash),
            updated_at = NOW()
        WHERE user_id = $1
        RETURNING user_id, name, email, password_hash, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        if e.to_string().contains("users_email_unique") {
            ApiError::EmailTaken
        } else {
            ApiError::Database(format!("Failed to update user: {}", e))
        }
    })?;

    Ok(user)
}

/// Delete a user. Returns true when a row was removed.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> Result<bool, ApiError> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE user_id = $1
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(|e| ApiError::Database(format!("Failed to delete user: {}", e)))?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_and_fetch_user(pool: PgPool) -> Result<(), ApiError> {
        let user = create_user(&pool, "Alice", "alice@example.com", "hash-1").await?;
        assert_eq!(user.name, "Alice");
        assert_eq!(user.email, "alice@example.com");

        let by_id = get_by_id(&pool, user.user_id).await?;
        assert!(by_id.is_some());

        let by_email = get_by_email(&pool, "alice@example.com").await?;
        assert_eq!(by_email.unwrap().user_id, user.user_id);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_user_duplicate_email(pool: PgPool) -> Result<(), ApiError> {
        create_user(&pool, "Alice", "alice@example.com", "hash-1").await?;
        let result = create_user(&pool, "Other Alice", "alice@example.com", "hash-2").await;
        assert!(matches!(result, Err(ApiError::EmailTaken)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_get_by_email_missing(pool: PgPool) -> Result<(), ApiError> {
        let user = get_by_email(&pool, "nobody@example.com").await?;
        assert!(user.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_update_user_partial(pool: PgPool) -> Result<(), ApiError> {
        let user = create_user(&pool, "Alice", "alice@example.com", "hash-1").await?;

        let updated = update_user(&pool, user.user_id, Some("Alice Smith"), None, None)
            .await?
            .unwrap();
        assert_eq!(updated.name, "Alice Smith");
        assert_eq!(updated.email, "alice@example.com");
        assert_eq!(updated.password_hash, "hash-1");
        assert!(updated.updated_at >= user.updated_at);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_update_missing_user(pool: PgPool) -> Result<(), ApiError> {
        let updated = update_user(&pool, Uuid::new_v4(), Some("Nobody"), None, None).await?;
        assert!(updated.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_delete_user(pool: PgPool) -> Result<(), ApiError> {
        let user = create_user(&pool, "Alice", "alice@example.com", "hash-1").await?;

        assert!(delete_user(&pool, user.user_id).await?);
        assert!(get_by_id(&pool, user.user_id).await?.is_none());
        // Second delete is a no-op
        assert!(!delete_user(&pool, user.user_id).await?);

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_get_all_ordered_by_creation(pool: PgPool) -> Result<(), ApiError> {
        create_user(&pool, "Alice", "alice@example.com", "h1").await?;
        create_user(&pool, "Bob", "bob@example.com", "h2").await?;

        let users = get_all(&pool).await?;
        assert_eq!(users.len(), 2);

        Ok(())
    }
}
