// src/handlers/items.rs

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    config::MAX_ITEM_IMAGES,
    error::AppError,
    models::item::{Item, ItemListParams, ItemStatus},
    utils::{html::clean_html, jwt::Claims, upload::ImageStore},
};

/// Catalog row with its image URLs aggregated in.
#[derive(Debug, Serialize, sqlx::FromRow)]
struct CatalogItem {
    id: i64,
    title: String,
    description: Option<String>,
    category: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    item_type: String,
    size: Option<String>,
    condition: String,
    tags: Option<String>,
    status: ItemStatus,
    approved: bool,
    created_at: Option<chrono::DateTime<chrono::Utc>>,
    images: Vec<String>,
}

const CATALOG_SELECT: &str = r#"
    SELECT
        i.id, i.title, i.description, i.category, i.type, i.size,
        i.condition, i.tags, i.status, i.approved, i.created_at,
        COALESCE(
            ARRAY_AGG(im.image_url ORDER BY im.id)
                FILTER (WHERE im.image_url IS NOT NULL),
            '{}'
        ) AS images
    FROM items i
    LEFT JOIN item_images im ON im.item_id = i.id
"#;

/// Creates a new item listing from a multipart form.
///
/// Text fields carry the item metadata; any number of 'images' file parts
/// (capped) carry the photos. The item lands unapproved and stays out of
/// the public catalog until a moderator approves it. A failed image write
/// is logged and skipped rather than failing the whole upload.
pub async fn upload_item(
    State(pool): State<PgPool>,
    State(images): State<ImageStore>,
    Extension(claims): Extension<Claims>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let mut title = None;
    let mut category = None;
    let mut item_type = None;
    let mut condition = None;
    let mut description = None;
    let mut tags = None;
    let mut size = None;
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "title" => title = Some(read_text(field).await?),
            "category" => category = Some(read_text(field).await?),
            "type" => item_type = Some(read_text(field).await?),
            "condition" => condition = Some(read_text(field).await?),
            "description" => description = Some(read_text(field).await?),
            "tags" => tags = Some(read_text(field).await?),
            "size" => size = Some(read_text(field).await?),
            "images" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                files.push((filename, data.to_vec()));
            }
            _ => {}
        }
    }

    let (Some(title), Some(category), Some(item_type), Some(condition)) =
        (title, category, item_type, condition)
    else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    if title.is_empty() || category.is_empty() || item_type.is_empty() || condition.is_empty() {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    }

    // Descriptions get rendered by clients; sanitize on the way in.
    let description = description.map(|d| clean_html(&d));

    let item_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO items (title, description, category, type, size, condition, tags, uploader_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING id",
    )
    .bind(&title)
    .bind(&description)
    .bind(&category)
    .bind(&item_type)
    .bind(&size)
    .bind(&condition)
    .bind(&tags)
    .bind(user_id)
    .fetch_one(&pool)
    .await?;

    let mut image_urls = Vec::new();
    for (filename, data) in files.into_iter().take(MAX_ITEM_IMAGES) {
        if !ImageStore::allowed_file(&filename) {
            continue;
        }

        let url = match images.save(&filename, &data).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping image '{}' for item {}: {}", filename, item_id, e);
                continue;
            }
        };

        sqlx::query("INSERT INTO item_images (item_id, image_url) VALUES ($1, $2)")
            .bind(item_id)
            .bind(&url)
            .execute(&pool)
            .await?;

        image_urls.push(url);
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Item uploaded successfully",
            "item_id": item_id,
            "images": image_urls,
        })),
    ))
}

/// Browses the public catalog: approved, still-available items only.
/// Supports category and title-keyword filters plus cursor pagination.
pub async fn list_items(
    State(pool): State<PgPool>,
    Query(params): Query<ItemListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);

    let sql = format!(
        "{CATALOG_SELECT} \
         WHERE i.approved = TRUE AND i.status = 'available' \
           AND ($1::VARCHAR IS NULL OR i.category = $1) \
           AND ($2::VARCHAR IS NULL OR i.title ILIKE '%' || $2 || '%') \
           AND ($3::TIMESTAMPTZ IS NULL OR i.created_at < $3) \
         GROUP BY i.id \
         ORDER BY i.created_at DESC \
         LIMIT $4"
    );

    let items = sqlx::query_as::<_, CatalogItem>(&sql)
        .bind(&params.category)
        .bind(&params.q)
        .bind(params.cursor)
        .bind(limit)
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list items: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(Json(json!({ "success": true, "items": items })))
}

/// Fetches one item with its images and uploader.
/// Unapproved and removed items stay invisible here; owners see theirs
/// through the 'mine' listing instead.
pub async fn get_item(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let item = sqlx::query_as::<_, Item>(
        "SELECT * FROM items WHERE id = $1 AND approved = TRUE AND status <> 'removed'",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Item not found".to_string()))?;

    let images = sqlx::query_scalar::<_, String>(
        "SELECT image_url FROM item_images WHERE item_id = $1 ORDER BY id",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    let uploader = sqlx::query_as::<_, UploaderInfo>(
        "SELECT id, username, name FROM users WHERE id = $1",
    )
    .bind(item.uploader_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({
        "success": true,
        "item": item,
        "images": images,
        "uploader": uploader,
    })))
}

#[derive(Debug, Serialize, sqlx::FromRow)]
struct UploaderInfo {
    id: i64,
    username: String,
    name: String,
}

/// Lists the current user's own items, whatever their state.
pub async fn my_items(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let sql = format!(
        "{CATALOG_SELECT} \
         WHERE i.uploader_id = $1 \
         GROUP BY i.id \
         ORDER BY i.created_at DESC"
    );

    let items = sqlx::query_as::<_, CatalogItem>(&sql)
        .bind(user_id)
        .fetch_all(&pool)
        .await?;

    Ok(Json(json!({ "success": true, "items": items })))
}

/// Deletes one of the caller's own items.
///
/// Refused while any pending swap names the item, so an open negotiation
/// can never lose its subject. Image files are removed after the row
/// delete commits, as a fire-and-forget cleanup that logs failures.
pub async fn delete_item(
    State(pool): State<PgPool>,
    State(images): State<ImageStore>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.sub.parse::<i64>().unwrap_or(0);

    let uploader_id = sqlx::query_scalar::<_, i64>("SELECT uploader_id FROM items WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Item not found".to_string()))?;

    if uploader_id != user_id {
        return Err(AppError::Forbidden(
            "You can only delete your own items".to_string(),
        ));
    }

    let pending = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM swaps \
         WHERE (requested_item_id = $1 OR offered_item_id = $1) AND status = 'pending'",
    )
    .bind(id)
    .fetch_one(&pool)
    .await?;

    if pending > 0 {
        return Err(AppError::InvalidState(
            "Item has pending swap requests".to_string(),
        ));
    }

    let image_urls = sqlx::query_scalar::<_, String>(
        "SELECT image_url FROM item_images WHERE item_id = $1",
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;

    // Cascades take the image rows and any settled swap history with it.
    sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    tokio::spawn(async move {
        for url in image_urls {
            images.delete(&url).await;
        }
    });

    Ok(Json(json!({
        "success": true,
        "message": "Item deleted successfully",
    })))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}
