pub mod address;
pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod constants;
pub mod embed;
pub mod error;
pub mod models;
pub mod page_url;
pub mod search;
pub mod store;
pub mod testing;
pub mod wallet;

pub use auth::{AuthSession, SessionState};
pub use cache::{QueryCache, QueryKey, Snapshot};
pub use config::CoreConfig;
pub use error::{ConvoError, Result};
pub use models::{Comment, Session, Thread};
pub use store::{CommentStore, ThreadStore};
