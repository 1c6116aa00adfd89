//! Domain entities.

pub mod assessment;
pub mod chat;
pub mod checkin;
pub mod content;
pub mod event;
pub mod goal;
pub mod metrics;
pub mod notification;
pub mod profile;
pub mod report;
pub mod user;
pub mod weekly_summary;

pub use assessment::*;
pub use chat::*;
pub use checkin::*;
pub use content::*;
pub use event::*;
pub use goal::*;
pub use metrics::*;
pub use notification::*;
pub use profile::*;
pub use report::*;
pub use user::*;
pub use weekly_summary::*;
