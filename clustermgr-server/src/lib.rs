//! Management API server for clustermgr

pub mod handlers;
pub mod server;

pub use handlers::{dispatch, handle_request};
pub use server::{simple_response, ManagementServer, ServerState};
