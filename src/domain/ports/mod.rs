pub mod attachment_repository;
pub mod document_repository;
pub mod language_model;
pub mod message_repository;
pub mod session_repository;
pub mod ticket_repository;
pub mod user_repository;

pub use attachment_repository::AttachmentRepository;
pub use document_repository::DocumentRepository;
pub use language_model::{ChatModel, EmbeddingModel};
pub use message_repository::MessageRepository;
pub use session_repository::SessionRepository;
pub use ticket_repository::TicketRepository;
pub use user_repository::UserRepository;
