// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::admin_action::{AddPointsRequest, AdminActionKind, ModerateItemRequest, PageParams},
    models::item::ItemStatus,
    models::swap::{SwapStatus, SwapType},
    utils::jwt::Claims,
};

#[derive(Debug, Serialize, sqlx::FromRow)]
struct DashboardStats {
    total_users: i64,
    total_items: i64,
    pending_items: i64,
    total_swaps: i64,
    completed_swaps: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct RecentItemRow {
    id: i64,
    title: String,
    category: String,
    status: ItemStatus,
    approved: bool,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    uploader: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct RecentSwapRow {
    id: i64,
    swap_type: SwapType,
    status: SwapStatus,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    requester: String,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct CategoryStatRow {
    category: String,
    count: i64,
}

/// Marketplace overview: headline counts, latest listings and swaps,
/// and the catalog broken down by category.
/// Admin only.
pub async fn dashboard(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let stats = sqlx::query_as::<_, DashboardStats>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM items) AS total_items,
            (SELECT COUNT(*) FROM items WHERE approved = FALSE) AS pending_items,
            (SELECT COUNT(*) FROM swaps) AS total_swaps,
            (SELECT COUNT(*) FROM swaps WHERE status = 'accepted') AS completed_swaps
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let recent_items = sqlx::query_as::<_, RecentItemRow>(
        r#"
        SELECT i.id, i.title, i.category, i.status, i.approved, i.created_at,
               u.username AS uploader
        FROM items i
        JOIN users u ON i.uploader_id = u.id
        ORDER BY i.created_at DESC
        LIMIT 5
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let recent_swaps = sqlx::query_as::<_, RecentSwapRow>(
        r#"
        SELECT s.id, s.swap_type, s.status, s.created_at,
               u.username AS requester
        FROM swaps s
        JOIN users u ON s.requester_id = u.id
        ORDER BY s.created_at DESC
        LIMIT 5
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let category_stats = sqlx::query_as::<_, CategoryStatRow>(
        "SELECT category, COUNT(*) AS count FROM items GROUP BY category ORDER BY count DESC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats,
        "recent_items": recent_items,
        "recent_swaps": recent_swaps,
        "category_stats": category_stats,
    })))
}

#[derive(sqlx::FromRow)]
struct PendingItemRow {
    id: i64,
    title: String,
    description: Option<String>,
    category: String,
    #[sqlx(rename = "type")]
    item_type: String,
    size: Option<String>,
    condition: String,
    tags: Option<String>,
    status: ItemStatus,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    uploader_id: i64,
    uploader_username: String,
    uploader_name: String,
    images: Vec<String>,
}

/// Moderation queue: items awaiting approval, oldest first, paginated.
/// Admin only.
pub async fn pending_items(
    State(pool): State<PgPool>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(10).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items WHERE approved = FALSE")
        .fetch_one(&pool)
        .await?;

    let rows = sqlx::query_as::<_, PendingItemRow>(
        r#"
        SELECT
            i.id, i.title, i.description, i.category, i.type, i.size,
            i.condition, i.tags, i.status, i.created_at,
            u.id AS uploader_id,
            u.username AS uploader_username,
            u.name AS uploader_name,
            COALESCE(
                ARRAY_AGG(im.image_url ORDER BY im.id)
                    FILTER (WHERE im.image_url IS NOT NULL),
                '{}'
            ) AS images
        FROM items i
        JOIN users u ON i.uploader_id = u.id
        LEFT JOIN item_images im ON im.item_id = i.id
        WHERE i.approved = FALSE
        GROUP BY i.id, u.id
        ORDER BY i.id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let items: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            json!({
                "id": r.id,
                "title": r.title,
                "description": r.description,
                "category": r.category,
                "type": r.item_type,
                "size": r.size,
                "condition": r.condition,
                "tags": r.tags,
                "status": r.status,
                "created_at": r.created_at,
                "uploader": {
                    "id": r.uploader_id,
                    "username": r.uploader_username,
                    "name": r.uploader_name,
                },
                "images": r.images,
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "items": items,
        "pagination": {
            "page": page,
            "per_page": per_page,
            "total": total,
            "pages": (total + per_page - 1) / per_page,
        },
    })))
}

/// Applies a moderation decision to an item and records it in the audit log.
///
/// Approve publishes the item; reject keeps it out of the catalog; remove
/// takes it down. The audit row and the item update commit together.
/// Admin only.
pub async fn moderate_item(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(item_id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let payload: ModerateItemRequest = serde_json::from_value(payload)
        .map_err(|_| AppError::BadRequest("Invalid action".to_string()))?;

    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let admin_id = claims.sub.parse::<i64>().unwrap_or(0);

    let mut tx = pool.begin().await?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM items WHERE id = $1 FOR UPDATE")
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;

    if exists.is_none() {
        return Err(AppError::NotFound("Item not found".to_string()));
    }

    sqlx::query(
        "INSERT INTO admin_actions (admin_id, item_id, action, reason) VALUES ($1, $2, $3, $4)",
    )
    .bind(admin_id)
    .bind(item_id)
    .bind(payload.action)
    .bind(&payload.reason)
    .execute(&mut *tx)
    .await?;

    match payload.action {
        AdminActionKind::Approve => {
            // A swapped item keeps its status; re-approval must not
            // resurrect something an accepted swap already consumed.
            sqlx::query(
                "UPDATE items SET approved = TRUE, \
                 status = CASE WHEN status = 'swapped' THEN status ELSE 'available' END \
                 WHERE id = $1",
            )
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        }
        AdminActionKind::Reject => {
            sqlx::query("UPDATE items SET approved = FALSE, status = 'rejected' WHERE id = $1")
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }
        AdminActionKind::Remove => {
            sqlx::query("UPDATE items SET status = 'removed' WHERE id = $1")
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    tx.commit().await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Item {} successfully", payload.action.past_tense()),
    })))
}

#[derive(sqlx::FromRow)]
struct AdminUserRow {
    id: i64,
    username: String,
    name: String,
    email: String,
    is_admin: bool,
    points_balance: i64,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    items_count: i64,
    swaps_count: i64,
}

/// Lists all users with their listing and swap counts, paginated.
/// Admin only.
pub async fn list_users(
    State(pool): State<PgPool>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await?;

    let rows = sqlx::query_as::<_, AdminUserRow>(
        r#"
        SELECT
            u.id, u.username, u.name, u.email, u.is_admin, u.points_balance, u.created_at,
            (SELECT COUNT(*) FROM items i WHERE i.uploader_id = u.id) AS items_count,
            (SELECT COUNT(*) FROM swaps s WHERE s.requester_id = u.id) AS swaps_count
        FROM users u
        ORDER BY u.id
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(per_page)
    .bind(offset)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let users: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|u| {
            json!({
                "id": u.id,
                "username": u.username,
                "name": u.name,
                "email": u.email,
                "is_admin": u.is_admin,
                "points_balance": u.points_balance,
                "created_at": u.created_at,
                "stats": {
                    "items_count": u.items_count,
                    "swaps_count": u.swaps_count,
                },
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "users": users,
        "pagination": {
            "page": page,
            "per_page": per_page,
            "total": total,
            "pages": (total + per_page - 1) / per_page,
        },
    })))
}

/// Flips another user's admin flag.
/// Admin only. Prevents changing your own status.
pub async fn toggle_admin(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let current_user_id = claims.sub.parse::<i64>().unwrap_or(0);
    if user_id == current_user_id {
        return Err(AppError::BadRequest(
            "Cannot modify your own admin status".to_string(),
        ));
    }

    let is_admin = sqlx::query_scalar::<_, bool>(
        "UPDATE users SET is_admin = NOT is_admin WHERE id = $1 RETURNING is_admin",
    )
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let message = if is_admin {
        "User admin status enabled"
    } else {
        "User admin status disabled"
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "is_admin": is_admin,
    })))
}

/// Credits points to a user's balance.
/// Admin only.
pub async fn add_points(
    State(pool): State<PgPool>,
    Path(user_id): Path<i64>,
    Json(payload): Json<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let payload: AddPointsRequest = serde_json::from_value(payload)
        .map_err(|_| AppError::BadRequest("Points amount required".to_string()))?;

    if payload.validate().is_err() {
        return Err(AppError::BadRequest(
            "Points must be a positive integer".to_string(),
        ));
    }

    let new_balance = sqlx::query_scalar::<_, i64>(
        "UPDATE users SET points_balance = points_balance + $1 WHERE id = $2 \
         RETURNING points_balance",
    )
    .bind(payload.points)
    .bind(user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "message": format!("{} points added to user", payload.points),
        "new_balance": new_balance,
    })))
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: i64,
    action: AdminActionKind,
    reason: Option<String>,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    admin_id: i64,
    admin_username: String,
    item_id: Option<i64>,
    item_title: Option<String>,
}

/// The latest moderation decisions, newest first.
/// Items deleted since their moderation show up with a null item.
/// Admin only.
pub async fn reports(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let rows = sqlx::query_as::<_, ReportRow>(
        r#"
        SELECT
            a.id, a.action, a.reason, a.created_at,
            u.id AS admin_id,
            u.username AS admin_username,
            i.id AS item_id,
            i.title AS item_title
        FROM admin_actions a
        JOIN users u ON a.admin_id = u.id
        LEFT JOIN items i ON a.item_id = i.id
        ORDER BY a.created_at DESC
        LIMIT 20
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let actions: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|r| {
            json!({
                "id": r.id,
                "action": r.action,
                "reason": r.reason,
                "created_at": r.created_at,
                "admin": {
                    "id": r.admin_id,
                    "username": r.admin_username,
                },
                "item": r.item_id.map(|id| json!({
                    "id": id,
                    "title": r.item_title,
                })),
            })
        })
        .collect();

    Ok(Json(json!({ "success": true, "recent_actions": actions })))
}
