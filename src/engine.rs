// src/engine.rs

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::item::ItemStatus;
use crate::models::redemption::Redemption;
use crate::models::swap::{Swap, SwapAction, SwapProposal, SwapStatus, SwapType};

/// Minimal item projection for precondition checks.
#[derive(sqlx::FromRow)]
struct ItemRow {
    status: ItemStatus,
    uploader_id: i64,
}

/// Executes swap and redemption state transitions.
///
/// Every operation here runs as one transaction: either the swap, the item
/// statuses, the redemption and the points balance all move together, or
/// none of them do. Points are reserved pessimistically: a points-type
/// request deducts the balance immediately and a pending Redemption records
/// the hold, which is refunded if the owner rejects.
#[derive(Clone)]
pub struct SwapEngine {
    pool: PgPool,
}

impl SwapEngine {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new pending swap.
    ///
    /// Preconditions are checked in order, first failure wins:
    /// the requested item must exist, be available, and not belong to the
    /// requester; a direct proposal's offered item must exist, belong to the
    /// requester, and be available; a points proposal must fit within the
    /// requester's balance.
    pub async fn create_swap_request(
        &self,
        requester_id: i64,
        proposal: SwapProposal,
    ) -> Result<Swap, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Lock the requested item so its status cannot shift underneath us.
        let requested = sqlx::query_as::<_, ItemRow>(
            "SELECT status, uploader_id FROM items WHERE id = $1 FOR UPDATE",
        )
        .bind(proposal.requested_item_id())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Requested item not found".to_string()))?;

        if requested.status != ItemStatus::Available {
            return Err(AppError::InvalidState(
                "Item is not available for swap".to_string(),
            ));
        }

        if requested.uploader_id == requester_id {
            return Err(AppError::InvalidState(
                "Cannot request your own item".to_string(),
            ));
        }

        // 2. Type-specific preconditions and side effects.
        let (swap_type, offered_item_id) = match proposal {
            SwapProposal::Direct {
                offered_item_id, ..
            } => {
                let offered = sqlx::query_as::<_, ItemRow>(
                    "SELECT status, uploader_id FROM items WHERE id = $1 FOR UPDATE",
                )
                .bind(offered_item_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(AppError::NotFound("Offered item not found".to_string()))?;

                if offered.uploader_id != requester_id {
                    return Err(AppError::InvalidState(
                        "You can only offer your own items".to_string(),
                    ));
                }

                if offered.status != ItemStatus::Available {
                    return Err(AppError::InvalidState(
                        "Offered item is not available".to_string(),
                    ));
                }

                (SwapType::Direct, Some(offered_item_id))
            }
            SwapProposal::Points {
                requested_item_id,
                points_used,
            } => {
                if points_used < 1 {
                    return Err(AppError::BadRequest(
                        "points_used must be a positive integer".to_string(),
                    ));
                }

                // Conditional decrement: the WHERE clause makes the balance
                // check and the deduction one atomic statement, so two
                // concurrent requests can never jointly overdraw.
                let deducted = sqlx::query(
                    "UPDATE users SET points_balance = points_balance - $1 \
                     WHERE id = $2 AND points_balance >= $1",
                )
                .bind(points_used)
                .bind(requester_id)
                .execute(&mut *tx)
                .await?;

                if deducted.rows_affected() == 0 {
                    return Err(AppError::InsufficientPoints(
                        "Insufficient points".to_string(),
                    ));
                }

                // The pending redemption is the durable record of the hold.
                sqlx::query(
                    "INSERT INTO redemptions (user_id, item_id, points_used) VALUES ($1, $2, $3)",
                )
                .bind(requester_id)
                .bind(requested_item_id)
                .bind(points_used)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if e.to_string().contains("unique constraint") {
                        return AppError::Conflict(
                            "You already have a pending points request for this item".to_string(),
                        );
                    }
                    AppError::InternalServerError(e.to_string())
                })?;

                (SwapType::Points, None)
            }
        };

        // 3. Create the swap itself.
        let swap = sqlx::query_as::<_, Swap>(
            "INSERT INTO swaps (requester_id, requested_item_id, offered_item_id, swap_type) \
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(requester_id)
        .bind(proposal.requested_item_id())
        .bind(offered_item_id)
        .bind(swap_type)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(swap)
    }

    /// Applies the requested item owner's decision to a pending swap.
    ///
    /// Accept marks the swap accepted and both involved items swapped, and
    /// completes a points hold. Reject marks the swap rejected and refunds a
    /// points hold. Either way the whole transition commits atomically.
    pub async fn respond_to_swap(
        &self,
        swap_id: i64,
        acting_user_id: i64,
        action: SwapAction,
    ) -> Result<Swap, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Lock the swap row; concurrent responders serialize here.
        let swap = sqlx::query_as::<_, Swap>("SELECT * FROM swaps WHERE id = $1 FOR UPDATE")
            .bind(swap_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Swap request not found".to_string()))?;

        // 2. Only the owner of the requested item may respond.
        let owner_id = sqlx::query_scalar::<_, i64>("SELECT uploader_id FROM items WHERE id = $1")
            .bind(swap.requested_item_id)
            .fetch_one(&mut *tx)
            .await?;

        if owner_id != acting_user_id {
            return Err(AppError::Forbidden("Unauthorized".to_string()));
        }

        if swap.status != SwapStatus::Pending {
            return Err(AppError::InvalidState(
                "Swap request already processed".to_string(),
            ));
        }

        match action {
            SwapAction::Accept => {
                // Guarded transitions: if another accepted swap already took
                // either item, this one fails and rolls back untouched.
                let updated = sqlx::query(
                    "UPDATE items SET status = 'swapped' WHERE id = $1 AND status = 'available'",
                )
                .bind(swap.requested_item_id)
                .execute(&mut *tx)
                .await?;

                if updated.rows_affected() == 0 {
                    return Err(AppError::InvalidState(
                        "Item is no longer available".to_string(),
                    ));
                }

                if let Some(offered_item_id) = swap.offered_item_id {
                    let updated = sqlx::query(
                        "UPDATE items SET status = 'swapped' WHERE id = $1 AND status = 'available'",
                    )
                    .bind(offered_item_id)
                    .execute(&mut *tx)
                    .await?;

                    if updated.rows_affected() == 0 {
                        return Err(AppError::InvalidState(
                            "Offered item is no longer available".to_string(),
                        ));
                    }
                }

                // The balance was already deducted at request time; the hold
                // just becomes a spend.
                if swap.swap_type == SwapType::Points {
                    sqlx::query(
                        "UPDATE redemptions SET status = 'completed' \
                         WHERE user_id = $1 AND item_id = $2 AND status = 'pending'",
                    )
                    .bind(swap.requester_id)
                    .bind(swap.requested_item_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
            SwapAction::Reject => {
                // Cancel the hold and give the points back, if one exists.
                if swap.swap_type == SwapType::Points {
                    let refund = sqlx::query_as::<_, Redemption>(
                        "UPDATE redemptions SET status = 'cancelled' \
                         WHERE user_id = $1 AND item_id = $2 AND status = 'pending' \
                         RETURNING *",
                    )
                    .bind(swap.requester_id)
                    .bind(swap.requested_item_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    if let Some(hold) = refund {
                        sqlx::query(
                            "UPDATE users SET points_balance = points_balance + $1 WHERE id = $2",
                        )
                        .bind(hold.points_used)
                        .bind(hold.user_id)
                        .execute(&mut *tx)
                        .await?;
                    }
                }
            }
        }

        let new_status = match action {
            SwapAction::Accept => SwapStatus::Accepted,
            SwapAction::Reject => SwapStatus::Rejected,
        };

        let swap = sqlx::query_as::<_, Swap>(
            "UPDATE swaps SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(new_status)
        .bind(swap_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(swap)
    }
}
