//! Optional outbound integrations behind the public API.

pub mod changelog;
pub mod chat;

pub use changelog::ChangelogService;
pub use chat::ChatProxy;
