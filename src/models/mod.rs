pub mod chat;
pub mod upstream;
