pub mod comments;
pub mod threads;

pub use comments::CommentStore;
pub use threads::ThreadStore;
