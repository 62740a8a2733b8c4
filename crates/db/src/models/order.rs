//! Order model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tabsync_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: DbId,
    /// Owning session; implied by the enclosing snapshot, so not serialized.
    #[serde(skip)]
    pub session_code: String,
    pub product_id: DbId,
    #[sqlx(rename = "created_at")]
    pub timestamp: Timestamp,
}

/// Request body for `POST /api/v1/orders`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(required, length(min = 1))]
    pub session_code: Option<String>,
    #[validate(required, range(min = 1))]
    pub product_id: Option<DbId>,
}
