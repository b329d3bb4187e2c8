pub mod ai;
pub mod attachment;
pub mod document;
pub mod fields;
pub mod message;
pub mod pagination;
pub mod session;
pub mod ticket;
pub mod ticket_filter;
pub mod user;

pub use ai::*;
pub use attachment::*;
pub use document::*;
pub use fields::*;
pub use message::*;
pub use pagination::*;
pub use session::*;
pub use ticket::*;
pub use ticket_filter::*;
pub use user::*;
