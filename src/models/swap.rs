// src/models/swap.rs

use crate::models::item::ItemSummary;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of exchange, mapped to the Postgres 'swap_type' enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "swap_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SwapType {
    /// Item-for-item exchange; the requester puts one of their own items up.
    Direct,
    /// Redemption paid from the requester's points balance.
    Points,
}

/// Swap lifecycle, mapped to the Postgres 'swap_status' enum.
/// 'cancelled' exists in the schema for future requester-side withdrawal
/// but no operation currently produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "swap_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

/// Represents the 'swaps' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Swap {
    pub id: i64,

    pub requester_id: i64,

    /// The item being asked for.
    pub requested_item_id: i64,

    /// The item put up in exchange. Present only for direct swaps.
    pub offered_item_id: Option<i64>,

    pub swap_type: SwapType,

    pub status: SwapStatus,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Incoming swap request, tagged by swap type.
///
/// The wire format is flat JSON with a `swap_type` discriminator, so a
/// direct proposal without `offered_item_id` (or a points proposal without
/// `points_used`) is rejected at parse time.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "swap_type", rename_all = "lowercase")]
pub enum SwapProposal {
    Direct {
        requested_item_id: i64,
        offered_item_id: i64,
    },
    Points {
        requested_item_id: i64,
        points_used: i64,
    },
}

impl SwapProposal {
    pub fn requested_item_id(&self) -> i64 {
        match self {
            SwapProposal::Direct {
                requested_item_id, ..
            }
            | SwapProposal::Points {
                requested_item_id, ..
            } => *requested_item_id,
        }
    }
}

/// Response action of the requested item's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapAction {
    Accept,
    Reject,
}

/// DTO for responding to a pending swap.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: SwapAction,
}

/// Requester identity embedded in received swap listings.
#[derive(Debug, Serialize)]
pub struct RequesterInfo {
    pub id: i64,
    pub username: String,
    pub name: String,
}

/// One entry in a swap listing, with both item sides joined in.
#[derive(Debug, Serialize)]
pub struct SwapWithItems {
    pub id: i64,
    pub swap_type: SwapType,
    pub status: SwapStatus,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<RequesterInfo>,
    pub requested_item: ItemSummary,
    pub offered_item: Option<ItemSummary>,
}
