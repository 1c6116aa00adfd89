//! Collaborators outside the database: the chat assistant, the AI service,
//! mail and notification delivery.

mod ai_gateway;
mod assistant;
mod mail;
mod notification_sender;

pub use ai_gateway::*;
pub use assistant::*;
pub use mail::*;
pub use notification_sender::*;
