//! Opaque keyset cursor for the content feed.
//!
//! A cursor encodes the sort key of the last row on a page as
//! `"<epochMillis>:<id>"`, URL-safe base64 without padding.

use crate::HyuError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};

/// Decoded position in a `(timestamp DESC, id DESC)` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedCursor {
    pub timestamp: DateTime<Utc>,
    pub id: i64,
}

impl FeedCursor {
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, id: i64) -> Self {
        Self { timestamp, id }
    }

    /// Encodes the cursor for transport.
    #[must_use]
    pub fn encode(&self) -> String {
        let raw = format!("{}:{}", self.timestamp.timestamp_millis(), self.id);
        URL_SAFE_NO_PAD.encode(raw.as_bytes())
    }

    /// Decodes a cursor produced by [`FeedCursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns `HyuError::BadRequest("Invalid cursor")` for any malformed input.
    pub fn decode(cursor: &str) -> Result<Self, HyuError> {
        let invalid = || HyuError::bad_request("Invalid cursor");

        let bytes = URL_SAFE_NO_PAD.decode(cursor.trim()).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (millis, id) = raw.rsplit_once(':').ok_or_else(invalid)?;
        let millis: i64 = millis.parse().map_err(|_| invalid())?;
        let id: i64 = id.parse().map_err(|_| invalid())?;
        let timestamp = DateTime::from_timestamp_millis(millis).ok_or_else(invalid)?;

        Ok(Self { timestamp, id })
    }
}
