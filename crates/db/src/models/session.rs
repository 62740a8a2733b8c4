//! Session model, snapshot and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tabsync_core::session::SessionState;
use tabsync_core::types::{DbId, Timestamp};
use validator::Validate;

use crate::models::order::Order;

/// A row from the `sessions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub code: String,
    pub name: String,
    pub location_id: DbId,
    #[sqlx(try_from = "String")]
    pub state: SessionState,
    #[sqlx(rename = "created_at")]
    pub timestamp: Timestamp,
}

/// A session together with its orders, read at a single point in time.
///
/// Serialized flat: `{code, name, location_id, state, timestamp, orders}`.
/// Produced fresh for every read and every broadcast; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub session: Session,
    pub orders: Vec<Order>,
}

impl SessionSnapshot {
    pub fn code(&self) -> &str {
        &self.session.code
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }
}

/// DTO for inserting a new session. The code comes from the code service.
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub name: String,
    pub code: String,
    pub location_id: DbId,
}

/// Equality filters for session listing. `None` means "any".
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionFilter {
    pub location_id: Option<DbId>,
    pub state: Option<SessionState>,
}

impl SessionFilter {
    pub fn matches(&self, session: &Session) -> bool {
        self.location_id.is_none_or(|id| id == session.location_id)
            && self.state.is_none_or(|state| state == session.state)
    }
}

/// Request body for `POST /api/v1/sessions`.
///
/// Credentials are optional at the wire level: their absence is reported as
/// invalid credentials by the verification pipeline, not as a malformed body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSessionRequest {
    pub session_key: Option<String>,
    pub user_id: Option<DbId>,
    #[validate(required, range(min = 1))]
    pub location_id: Option<DbId>,
    #[validate(required, length(min = 1, max = 255))]
    pub name: Option<String>,
}

/// Query string for `GET /api/v1/sessions`.
///
/// `state` stays a raw string: matching is case-insensitive and an unknown
/// value simply matches nothing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionListParams {
    pub location_id: Option<DbId>,
    pub state: Option<String>,
    pub limit: Option<i64>,
}
