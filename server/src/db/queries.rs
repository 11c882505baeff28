//! Database Queries
//!
//! Runtime queries (no compile-time `DATABASE_URL` required).
//!
//! Query functions log failures with context before propagating them.

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::models::{ProfileFields, User, UserSummary};

/// Log and return a database error with context.
///
/// Used as `.map_err(db_error!("query_name", field = %value))` so every
/// failure reaches the logs before it is turned into a generic 500.
macro_rules! db_error {
    ($query:expr, $($field:tt)*) => {
        |e| {
            error!(query = $query, $($field)*, error = %e, "Database query failed");
            e
        }
    };
}

pub(crate) use db_error;

// ============================================================================
// User Queries
// ============================================================================

/// Find user by ID.
pub async fn find_user_by_id(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_user_by_id", user_id = %id))
}

/// Find user by email (case-insensitive, emails are stored lowercase).
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = LOWER($1)")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(db_error!("find_user_by_email", email = %email))
}

/// Check if email exists.
pub async fn email_exists(pool: &PgPool, email: &str) -> sqlx::Result<bool> {
    let result: (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = LOWER($1))")
            .bind(email)
            .fetch_one(pool)
            .await
            .map_err(db_error!("email_exists", email = %email))?;

    Ok(result.0)
}

/// Check if a user with the given ID exists.
pub async fn user_exists(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(db_error!("user_exists", user_id = %id))?;

    Ok(result.0)
}

/// Create a new user. The account starts out not onboarded.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    full_name: &str,
    password_hash: &str,
    profile_pic: &str,
) -> sqlx::Result<User> {
    sqlx::query_as::<_, User>(
        r"
        INSERT INTO users (id, email, full_name, password_hash, profile_pic)
        VALUES ($1, LOWER($2), $3, $4, $5)
        RETURNING *
        ",
    )
    .bind(Uuid::now_v7())
    .bind(email)
    .bind(full_name)
    .bind(password_hash)
    .bind(profile_pic)
    .fetch_one(pool)
    .await
    .map_err(db_error!("create_user", email = %email))
}

/// Apply onboarding profile fields and mark the user as onboarded.
///
/// Returns `None` if the user no longer exists.
pub async fn complete_onboarding(
    pool: &PgPool,
    user_id: Uuid,
    profile: &ProfileFields,
) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r"
        UPDATE users
        SET full_name = $2,
            bio = $3,
            native_language = $4,
            learning_language = $5,
            location = $6,
            profile_pic = COALESCE($7, profile_pic),
            is_onboarded = TRUE,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(user_id)
    .bind(&profile.full_name)
    .bind(&profile.bio)
    .bind(&profile.native_language)
    .bind(&profile.learning_language)
    .bind(&profile.location)
    .bind(profile.profile_pic.as_deref())
    .fetch_optional(pool)
    .await
    .map_err(db_error!("complete_onboarding", user_id = %user_id))
}

// ============================================================================
// Friend Set Queries
// ============================================================================

/// IDs of everyone in the user's friend set.
pub async fn list_friend_ids(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<Uuid>> {
    sqlx::query_scalar::<_, Uuid>("SELECT friend_id FROM user_friends WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(db_error!("list_friend_ids", user_id = %user_id))
}

/// Check if `friend_id` is in the friend set of `user_id`.
pub async fn are_friends(pool: &PgPool, user_id: Uuid, friend_id: Uuid) -> sqlx::Result<bool> {
    let result: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM user_friends WHERE user_id = $1 AND friend_id = $2)",
    )
    .bind(user_id)
    .bind(friend_id)
    .fetch_one(pool)
    .await
    .map_err(db_error!("are_friends", user_id = %user_id, friend_id = %friend_id))?;

    Ok(result.0)
}

/// The user's friends, expanded to their display fields.
pub async fn list_friends(pool: &PgPool, user_id: Uuid) -> sqlx::Result<Vec<UserSummary>> {
    sqlx::query_as::<_, UserSummary>(
        r"
        SELECT u.id, u.full_name, u.profile_pic, u.native_language, u.learning_language
        FROM user_friends f
        JOIN users u ON u.id = f.friend_id
        WHERE f.user_id = $1
        ORDER BY u.full_name ASC, u.id ASC
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(db_error!("list_friends", user_id = %user_id))
}
