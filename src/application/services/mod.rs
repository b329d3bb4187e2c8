pub mod ai_service;
pub mod auth_service;
pub mod document_service;
pub mod message_service;
pub mod ticket_service;
pub mod user_service;

pub use ai_service::AiService;
pub use auth_service::{AuthResult, AuthService};
pub use document_service::DocumentService;
pub use message_service::MessageService;
pub use ticket_service::{TicketService, MAX_ACTIVE_TICKETS};
pub use user_service::UserService;
