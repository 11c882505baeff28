use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use super::types::{
    AcceptResponse, FriendRequest, FriendRequestsResponse, OutgoingRequestsResponse,
    ReceivedRequest, RequestWithParty, SentRequest, SocialError,
};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::db::{self, db_error, UserSummary};

// ============================================================================
// Lifecycle operations
// ============================================================================

/// Find the request between two users, whichever of them sent it.
pub async fn find_request_between(
    pool: &PgPool,
    a: Uuid,
    b: Uuid,
) -> Result<Option<FriendRequest>, SocialError> {
    let request = sqlx::query_as::<_, FriendRequest>(
        r"SELECT * FROM friend_requests
           WHERE (sender_id = $1 AND recipient_id = $2)
              OR (sender_id = $2 AND recipient_id = $1)",
    )
    .bind(a)
    .bind(b)
    .fetch_optional(pool)
    .await
    .map_err(db_error!("find_request_between", a = %a, b = %b))?;

    Ok(request)
}

/// Send a friend request from `sender_id` to `recipient_id`.
///
/// Checks run in order and the first failure wins: self-request, unknown
/// recipient, already friends, existing request in either direction.
pub async fn send_request(
    pool: &PgPool,
    sender_id: Uuid,
    recipient_id: Uuid,
) -> Result<FriendRequest, SocialError> {
    if sender_id == recipient_id {
        return Err(SocialError::SelfFriendRequest);
    }

    if !db::user_exists(pool, recipient_id).await? {
        return Err(SocialError::RecipientNotFound);
    }

    if db::are_friends(pool, sender_id, recipient_id).await? {
        return Err(SocialError::AlreadyFriends);
    }

    if find_request_between(pool, sender_id, recipient_id)
        .await?
        .is_some()
    {
        return Err(SocialError::DuplicateRequest);
    }

    // The pair index rejects a request created concurrently since the check above
    let request = sqlx::query_as::<_, FriendRequest>(
        r"INSERT INTO friend_requests (id, sender_id, recipient_id, status)
           VALUES ($1, $2, $3, 'pending')
           RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(sender_id)
    .bind(recipient_id)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            SocialError::DuplicateRequest
        }
        _ => {
            error!(
                query = "send_request",
                sender_id = %sender_id,
                recipient_id = %recipient_id,
                error = %e,
                "Database query failed"
            );
            SocialError::Database(e)
        }
    })?;

    tracing::info!(
        request_id = %request.id,
        sender_id = %sender_id,
        recipient_id = %recipient_id,
        "Friend request sent"
    );

    Ok(request)
}

/// Accept a friend request on behalf of `actor_id`.
///
/// Only the recipient may accept. The status change and both friend-set
/// entries are committed in one transaction. Accepting an already accepted
/// request succeeds again without creating duplicate friend entries.
pub async fn accept_request(
    pool: &PgPool,
    actor_id: Uuid,
    request_id: Uuid,
) -> Result<FriendRequest, SocialError> {
    let mut tx = pool.begin().await?;

    let request = sqlx::query_as::<_, FriendRequest>(
        "SELECT * FROM friend_requests WHERE id = $1 FOR UPDATE",
    )
    .bind(request_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(db_error!("accept_request.lock", request_id = %request_id))?
    .ok_or(SocialError::RequestNotFound)?;

    // Only the recipient can accept
    if request.recipient_id != actor_id {
        return Err(SocialError::Unauthorized);
    }

    let updated = sqlx::query_as::<_, FriendRequest>(
        r"UPDATE friend_requests
           SET status = 'accepted',
               updated_at = CASE WHEN status = 'accepted' THEN updated_at ELSE NOW() END
           WHERE id = $1
           RETURNING *",
    )
    .bind(request_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(db_error!("accept_request.update", request_id = %request_id))?;

    sqlx::query(
        r"INSERT INTO user_friends (user_id, friend_id)
           VALUES ($1, $2), ($2, $1)
           ON CONFLICT DO NOTHING",
    )
    .bind(request.sender_id)
    .bind(request.recipient_id)
    .execute(&mut *tx)
    .await
    .map_err(db_error!("accept_request.friends", request_id = %request_id))?;

    tx.commit().await?;

    tracing::info!(
        request_id = %request_id,
        sender_id = %request.sender_id,
        recipient_id = %request.recipient_id,
        "Friend request accepted"
    );

    Ok(updated)
}

const RECEIVED_PENDING_SQL: &str = r"
    SELECT r.id, r.sender_id, r.recipient_id, r.status, r.created_at,
           u.id AS party_id, u.full_name AS party_full_name, u.profile_pic AS party_profile_pic,
           u.native_language AS party_native_language,
           u.learning_language AS party_learning_language
    FROM friend_requests r
    JOIN users u ON u.id = r.sender_id
    WHERE r.recipient_id = $1 AND r.status = 'pending'
    ORDER BY r.created_at DESC, r.id DESC";

const SENT_ACCEPTED_SQL: &str = r"
    SELECT r.id, r.sender_id, r.recipient_id, r.status, r.created_at,
           u.id AS party_id, u.full_name AS party_full_name, u.profile_pic AS party_profile_pic,
           u.native_language AS party_native_language,
           u.learning_language AS party_learning_language
    FROM friend_requests r
    JOIN users u ON u.id = r.recipient_id
    WHERE r.sender_id = $1 AND r.status = 'accepted'
    ORDER BY r.updated_at DESC, r.id DESC";

const SENT_PENDING_SQL: &str = r"
    SELECT r.id, r.sender_id, r.recipient_id, r.status, r.created_at,
           u.id AS party_id, u.full_name AS party_full_name, u.profile_pic AS party_profile_pic,
           u.native_language AS party_native_language,
           u.learning_language AS party_learning_language
    FROM friend_requests r
    JOIN users u ON u.id = r.recipient_id
    WHERE r.sender_id = $1 AND r.status = 'pending'
    ORDER BY r.created_at DESC, r.id DESC";

async fn fetch_requests(
    pool: &PgPool,
    query: &'static str,
    sql: &'static str,
    user_id: Uuid,
) -> Result<Vec<RequestWithParty>, SocialError> {
    let rows = sqlx::query_as::<_, RequestWithParty>(sql)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(db_error!(query, user_id = %user_id))?;

    Ok(rows)
}

/// Pending requests addressed to the user, and the user's own requests that were accepted.
///
/// "Accepted" here only covers requests the user sent, i.e. who accepted my request.
pub async fn list_incoming(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<(Vec<ReceivedRequest>, Vec<SentRequest>), SocialError> {
    let incoming = fetch_requests(pool, "list_incoming.pending", RECEIVED_PENDING_SQL, user_id)
        .await?
        .into_iter()
        .map(RequestWithParty::into_received)
        .collect();

    let accepted = fetch_requests(pool, "list_incoming.accepted", SENT_ACCEPTED_SQL, user_id)
        .await?
        .into_iter()
        .map(RequestWithParty::into_sent)
        .collect();

    Ok((incoming, accepted))
}

/// Pending requests the user sent.
pub async fn list_outgoing(pool: &PgPool, user_id: Uuid) -> Result<Vec<SentRequest>, SocialError> {
    let outgoing = fetch_requests(pool, "list_outgoing", SENT_PENDING_SQL, user_id)
        .await?
        .into_iter()
        .map(RequestWithParty::into_sent)
        .collect();

    Ok(outgoing)
}

// ============================================================================
// HTTP handlers
// ============================================================================

/// POST /api/users/friend-request/{id}
/// Send a friend request to user `{id}`
#[utoipa::path(
    post,
    path = "/api/users/friend-request/{id}",
    tag = "friends",
    params(("id" = Uuid, Path, description = "Recipient user ID")),
    responses(
        (status = 201, description = "Request created", body = FriendRequest),
        (status = 400, description = "Self-request, unknown recipient, already friends or duplicate")
    )
)]
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn send_friend_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(recipient_id): Path<String>,
) -> Result<(StatusCode, Json<FriendRequest>), SocialError> {
    // An ID that cannot name a user is an unknown recipient
    let recipient_id =
        Uuid::parse_str(&recipient_id).map_err(|_| SocialError::RecipientNotFound)?;

    let request = send_request(&state.db, auth.id, recipient_id).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// PUT /api/users/friend-request/{id}/accept
/// Accept friend request `{id}`
#[utoipa::path(
    put,
    path = "/api/users/friend-request/{id}/accept",
    tag = "friends",
    params(("id" = Uuid, Path, description = "Friend request ID")),
    responses(
        (status = 200, description = "Request accepted", body = AcceptResponse),
        (status = 403, description = "Caller is not the recipient"),
        (status = 404, description = "Request not found")
    )
)]
#[tracing::instrument(skip(state, auth), fields(user_id = %auth.id))]
pub async fn accept_friend_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(request_id): Path<String>,
) -> Result<Json<AcceptResponse>, SocialError> {
    let request_id = Uuid::parse_str(&request_id).map_err(|_| SocialError::RequestNotFound)?;

    accept_request(&state.db, auth.id, request_id).await?;

    Ok(Json(AcceptResponse {
        message: "Friend request accepted successfully".to_string(),
    }))
}

/// GET /api/users/friend-requests
/// Pending incoming requests plus the user's sent requests that were accepted
#[utoipa::path(
    get,
    path = "/api/users/friend-requests",
    tag = "friends",
    responses((status = 200, body = FriendRequestsResponse))
)]
pub async fn list_friend_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<FriendRequestsResponse>, SocialError> {
    let (incoming_reqs, accepted_reqs) = list_incoming(&state.db, auth.id).await?;

    Ok(Json(FriendRequestsResponse {
        incoming_reqs,
        accepted_reqs,
    }))
}

/// GET /api/users/outgoing-friend-requests
/// Pending requests the user sent
#[utoipa::path(
    get,
    path = "/api/users/outgoing-friend-requests",
    tag = "friends",
    responses((status = 200, body = OutgoingRequestsResponse))
)]
pub async fn list_outgoing_requests(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<OutgoingRequestsResponse>, SocialError> {
    let outgoing_requests = list_outgoing(&state.db, auth.id).await?;

    Ok(Json(OutgoingRequestsResponse { outgoing_requests }))
}

/// GET /api/users/friends
/// List the user's friends
#[utoipa::path(
    get,
    path = "/api/users/friends",
    tag = "friends",
    responses((status = 200, body = Vec<UserSummary>))
)]
pub async fn list_friends(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<UserSummary>>, SocialError> {
    let friends = db::list_friends(&state.db, auth.id).await?;
    Ok(Json(friends))
}
