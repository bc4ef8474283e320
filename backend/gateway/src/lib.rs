//! shelfcount HTTP gateway
//!
//! Upload endpoint plus REST access to the running tallies.

pub mod error;
pub mod health_api;
pub mod records;
pub mod server;
pub mod upload;

pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState};

#[cfg(test)]
pub(crate) mod test_support;
