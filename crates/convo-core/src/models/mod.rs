pub mod comment;
pub mod session;
pub mod thread;

pub use comment::Comment;
pub use session::Session;
pub use thread::Thread;
