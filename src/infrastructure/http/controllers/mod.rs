pub mod ai;
pub mod auth;
pub mod docs;
pub mod home;
pub mod messages;
pub mod tickets;
pub mod users;
