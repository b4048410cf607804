// src/models/admin_action.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Moderation verb, mapped to the Postgres 'admin_action_kind' enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "admin_action_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdminActionKind {
    /// Publish the item to the catalog and reset it to 'available'.
    Approve,
    /// Keep the item out of the catalog and mark it 'rejected'.
    Reject,
    /// Take the item down entirely.
    Remove,
}

impl AdminActionKind {
    /// Past-tense label for response messages.
    pub fn past_tense(&self) -> &'static str {
        match self {
            AdminActionKind::Approve => "approved",
            AdminActionKind::Reject => "rejected",
            AdminActionKind::Remove => "removed",
        }
    }
}

/// Represents the 'admin_actions' table in the database.
/// Append-only; `item_id` goes NULL if the moderated item is later deleted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AdminAction {
    pub id: i64,
    pub admin_id: i64,
    pub item_id: Option<i64>,
    pub action: AdminActionKind,
    pub reason: Option<String>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for moderating an item.
#[derive(Debug, Deserialize, Validate)]
pub struct ModerateItemRequest {
    pub action: AdminActionKind,
    #[validate(length(max = 255, message = "Reason must be at most 255 characters."))]
    pub reason: Option<String>,
}

/// DTO for crediting points to a user.
#[derive(Debug, Deserialize, Validate)]
pub struct AddPointsRequest {
    #[validate(range(min = 1, message = "Points must be a positive integer"))]
    pub points: i64,
}

/// Query parameters for paginated admin listings.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}
