//! Friend recommendations
//!
//! Candidates are every onboarded user outside the caller's exclusion set:
//! the caller, its friends, and anyone it has a request with in either
//! direction, whatever that request's status.

use std::collections::HashSet;

use axum::{extract::State, Json};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::types::SocialError;
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{db_error, PublicUser, User};

/// Identities that must never be recommended to `user_id`.
pub fn exclusion_set(
    user_id: Uuid,
    friends: &[Uuid],
    sent_to: &[Uuid],
    received_from: &[Uuid],
) -> HashSet<Uuid> {
    sent_to
        .iter()
        .chain(received_from)
        .chain(friends)
        .copied()
        .chain(std::iter::once(user_id))
        .collect()
}

/// Recommend users to `user_id`, given the friend set loaded with its session.
pub async fn recommend(
    pool: &PgPool,
    user_id: Uuid,
    friends: &[Uuid],
) -> Result<Vec<PublicUser>, SocialError> {
    let sent_to: Vec<Uuid> =
        sqlx::query_scalar("SELECT recipient_id FROM friend_requests WHERE sender_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(db_error!("recommend.sent", user_id = %user_id))?;

    let received_from: Vec<Uuid> =
        sqlx::query_scalar("SELECT sender_id FROM friend_requests WHERE recipient_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .map_err(db_error!("recommend.received", user_id = %user_id))?;

    let excluded: Vec<Uuid> = exclusion_set(user_id, friends, &sent_to, &received_from)
        .into_iter()
        .collect();

    let users = sqlx::query_as::<_, User>(
        r"SELECT * FROM users
           WHERE is_onboarded
             AND NOT (id = ANY($1))
           ORDER BY created_at ASC, id ASC",
    )
    .bind(&excluded)
    .fetch_all(pool)
    .await
    .map_err(db_error!("recommend.users", user_id = %user_id))?;

    Ok(users.into_iter().map(PublicUser::from).collect())
}

/// GET /api/users
/// List recommended users
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses((status = 200, description = "Recommended users", body = Vec<PublicUser>))
)]
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn get_recommended_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PublicUser>>, SocialError> {
    let users = recommend(&state.db, auth.id, &auth.friends).await?;
    Ok(Json(users))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_always_contains_self() {
        let me = Uuid::now_v7();
        let set = exclusion_set(me, &[], &[], &[]);

        assert_eq!(set.len(), 1);
        assert!(set.contains(&me));
    }

    #[test]
    fn test_exclusion_unions_all_sources() {
        let me = Uuid::now_v7();
        let friend = Uuid::now_v7();
        let sent = Uuid::now_v7();
        let received = Uuid::now_v7();

        let set = exclusion_set(me, &[friend], &[sent], &[received]);

        assert_eq!(set, HashSet::from([me, friend, sent, received]));
    }

    #[test]
    fn test_exclusion_deduplicates_overlaps() {
        let me = Uuid::now_v7();
        let other = Uuid::now_v7();

        // A friend who also appears in accepted requests both ways
        let set = exclusion_set(me, &[other], &[other], &[other, me]);

        assert_eq!(set, HashSet::from([me, other]));
    }
}
