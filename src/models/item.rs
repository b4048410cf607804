// src/models/item.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a listed item, mapped to the Postgres 'item_status' enum.
///
/// 'available' items can be requested; 'swapped' is reached when an
/// associated swap is accepted; 'rejected' and 'removed' come from
/// moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "item_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Available,
    Swapped,
    Rejected,
    Removed,
}

/// Represents the 'items' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,

    pub title: String,

    pub description: Option<String>,

    /// Clothing category (e.g., "Tops", "Footwear").
    pub category: String,

    /// Garment type within the category.
    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub item_type: String,

    pub size: Option<String>,

    /// Wear condition (e.g., "New", "Gently used").
    pub condition: String,

    /// Comma-separated free-form tags.
    pub tags: Option<String>,

    pub status: ItemStatus,

    /// Whether a moderator has approved the listing for the public catalog.
    pub approved: bool,

    pub uploader_id: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'item_images' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ItemImage {
    pub id: i64,
    pub item_id: i64,
    pub image_url: String,
}

/// Condensed item info embedded in swap listings.
/// `uploader` is only populated where the caller does not already know the owner.
#[derive(Debug, Serialize)]
pub struct ItemSummary {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,
}

/// Query parameters for browsing the public catalog.
#[derive(Debug, Deserialize)]
pub struct ItemListParams {
    /// Filter by exact category.
    pub category: Option<String>,

    /// Search keyword for title match.
    pub q: Option<String>,

    /// Cursor for pagination: the created_at timestamp of the last item in the previous page.
    pub cursor: Option<chrono::DateTime<chrono::Utc>>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,
}
