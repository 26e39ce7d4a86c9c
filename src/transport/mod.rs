pub mod http_backend;
pub use http_backend::*;

pub mod reqwest_backend;
pub use reqwest_backend::*;

pub mod retry_policy;
pub use retry_policy::*;

pub mod transport;
pub use transport::*;

#[cfg(test)]
pub mod _tests;
