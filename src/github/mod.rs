pub mod client;
pub mod types;

pub use client::GitHubClient;
pub use types::{PullRequestPayload, parse_pull_request_event};
