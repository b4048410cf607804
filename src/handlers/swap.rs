use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{
    engine::SwapEngine,
    error::AppError,
    models::item::ItemSummary,
    models::swap::{
        RequesterInfo, RespondRequest, SwapAction, SwapProposal, SwapStatus, SwapType,
        SwapWithItems,
    },
    utils::jwt::Claims,
};

/// Creates a swap request for an item.
///
/// The body is a tagged proposal: direct swaps name an offered item,
/// points swaps name a points amount. All state checks and the points
/// hold happen inside the engine.
pub async fn create_swap_request(
    State(engine): State<SwapEngine>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let proposal: SwapProposal = serde_json::from_value(payload)
        .map_err(|e| AppError::BadRequest(format!("Invalid swap request: {}", e)))?;

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let swap = engine.create_swap_request(user_id, proposal).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Swap request created successfully",
            "swap_id": swap.id,
        })),
    ))
}

/// Accepts or rejects a pending swap, as the requested item's owner.
pub async fn respond_to_swap(
    State(engine): State<SwapEngine>,
    Extension(claims): Extension<Claims>,
    Path(swap_id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let payload: RespondRequest = serde_json::from_value(payload)
        .map_err(|_| AppError::BadRequest("Invalid action".to_string()))?;

    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    engine.respond_to_swap(swap_id, user_id, payload.action).await?;

    let message = match payload.action {
        SwapAction::Accept => "Swap request accepted successfully",
        SwapAction::Reject => "Swap request rejected successfully",
    };

    Ok(Json(json!({ "success": true, "message": message })))
}

/// Flat row for the requester-side listing, joined across both items.
#[derive(sqlx::FromRow)]
struct MyRequestRow {
    id: i64,
    swap_type: SwapType,
    status: SwapStatus,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    requested_item_id: i64,
    requested_title: String,
    requested_category: String,
    requested_condition: String,
    requested_uploader: String,
    offered_item_id: Option<i64>,
    offered_title: Option<String>,
    offered_category: Option<String>,
    offered_condition: Option<String>,
}

/// Lists every swap the current user has requested, any status.
/// Each entry carries the requested item (with its uploader's username)
/// and the offered item where one exists.
pub async fn my_requests(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let rows = sqlx::query_as::<_, MyRequestRow>(
        r#"
        SELECT
            s.id, s.swap_type, s.status, s.created_at,
            ri.id AS requested_item_id,
            ri.title AS requested_title,
            ri.category AS requested_category,
            ri.condition AS requested_condition,
            ru.username AS requested_uploader,
            oi.id AS offered_item_id,
            oi.title AS offered_title,
            oi.category AS offered_category,
            oi.condition AS offered_condition
        FROM swaps s
        JOIN items ri ON s.requested_item_id = ri.id
        JOIN users ru ON ri.uploader_id = ru.id
        LEFT JOIN items oi ON s.offered_item_id = oi.id
        WHERE s.requester_id = $1
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let swaps: Vec<SwapWithItems> = rows
        .into_iter()
        .map(|r| SwapWithItems {
            id: r.id,
            swap_type: r.swap_type,
            status: r.status,
            created_at: r.created_at,
            requester: None,
            requested_item: ItemSummary {
                id: r.requested_item_id,
                title: r.requested_title,
                category: r.requested_category,
                condition: r.requested_condition,
                uploader: Some(r.requested_uploader),
            },
            offered_item: r.offered_item_id.map(|oid| ItemSummary {
                id: oid,
                title: r.offered_title.unwrap_or_default(),
                category: r.offered_category.unwrap_or_default(),
                condition: r.offered_condition.unwrap_or_default(),
                uploader: None,
            }),
        })
        .collect();

    Ok(Json(json!({ "success": true, "swaps": swaps })))
}

/// Flat row for the owner-side listing.
#[derive(sqlx::FromRow)]
struct ReceivedRequestRow {
    id: i64,
    swap_type: SwapType,
    status: SwapStatus,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    requester_id: i64,
    requester_username: String,
    requester_name: String,
    requested_item_id: i64,
    requested_title: String,
    requested_category: String,
    requested_condition: String,
    offered_item_id: Option<i64>,
    offered_title: Option<String>,
    offered_category: Option<String>,
    offered_condition: Option<String>,
}

/// Lists pending swaps targeting the current user's items, with the
/// requester's identity so the owner knows who is asking.
pub async fn received_requests(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let rows = sqlx::query_as::<_, ReceivedRequestRow>(
        r#"
        SELECT
            s.id, s.swap_type, s.status, s.created_at,
            rq.id AS requester_id,
            rq.username AS requester_username,
            rq.name AS requester_name,
            ri.id AS requested_item_id,
            ri.title AS requested_title,
            ri.category AS requested_category,
            ri.condition AS requested_condition,
            oi.id AS offered_item_id,
            oi.title AS offered_title,
            oi.category AS offered_category,
            oi.condition AS offered_condition
        FROM swaps s
        JOIN items ri ON s.requested_item_id = ri.id
        JOIN users rq ON s.requester_id = rq.id
        LEFT JOIN items oi ON s.offered_item_id = oi.id
        WHERE ri.uploader_id = $1 AND s.status = 'pending'
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    let swaps: Vec<SwapWithItems> = rows
        .into_iter()
        .map(|r| SwapWithItems {
            id: r.id,
            swap_type: r.swap_type,
            status: r.status,
            created_at: r.created_at,
            requester: Some(RequesterInfo {
                id: r.requester_id,
                username: r.requester_username,
                name: r.requester_name,
            }),
            requested_item: ItemSummary {
                id: r.requested_item_id,
                title: r.requested_title,
                category: r.requested_category,
                condition: r.requested_condition,
                uploader: None,
            },
            offered_item: r.offered_item_id.map(|oid| ItemSummary {
                id: oid,
                title: r.offered_title.unwrap_or_default(),
                category: r.offered_category.unwrap_or_default(),
                condition: r.offered_condition.unwrap_or_default(),
                uploader: None,
            }),
        })
        .collect();

    Ok(Json(json!({ "success": true, "swaps": swaps })))
}
