//! Data Transfer Objects (DTOs).

mod admin_dto;
mod assessment_dto;
mod auth_dto;
mod chat_dto;
mod checkin_dto;
mod content_dto;
mod goal_dto;
mod metrics_dto;
mod profile_dto;
mod report_dto;

pub use admin_dto::*;
pub use assessment_dto::*;
pub use auth_dto::*;
pub use chat_dto::*;
pub use checkin_dto::*;
pub use content_dto::*;
pub use goal_dto::*;
pub use metrics_dto::*;
pub use profile_dto::*;
pub use report_dto::*;

use serde::Deserialize;
use utoipa::IntoParams;

/// `page` (0-based) and `size` query values; each endpoint picks its default size.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<usize>,
    pub size: Option<usize>,
}

impl PageParams {
    #[must_use]
    pub fn to_request(self, default_size: usize) -> hyu_core::PageRequest {
        hyu_core::PageRequest::with_default(self.page, self.size, default_size)
    }
}

/// Parses an optional filter value, treating blanks as absent.
pub(crate) fn parse_filter<T>(value: Option<&str>) -> hyu_core::HyuResult<Option<T>>
where
    T: std::str::FromStr<Err = hyu_core::HyuError>,
{
    hyu_core::text::blank_to_none(value).map(|v| v.parse()).transpose()
}
