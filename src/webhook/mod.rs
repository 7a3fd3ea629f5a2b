pub mod handler;
pub mod signature;

pub use handler::{AppState, HEADER_EVENT, HEADER_SIGNATURE, Outcome, handle_pull_request};
pub use signature::{sign, verify_signature};
