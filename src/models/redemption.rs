use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Points-hold lifecycle, mapped to the Postgres 'redemption_status' enum.
/// 'pending' means the points are reserved; 'completed' means spent;
/// 'cancelled' means refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "redemption_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Pending,
    Completed,
    Cancelled,
}

/// Represents the 'redemptions' table in the database.
/// The durable record of a points hold taken for a points-type swap.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Redemption {
    pub id: i64,
    pub user_id: i64,
    pub item_id: i64,
    pub points_used: i64,
    pub status: RedemptionStatus,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}
