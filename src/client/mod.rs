pub mod condition;
pub use condition::*;

pub mod document_client;
pub use document_client::*;
