pub mod http;
pub mod session_file;

pub use http::HttpPortalClient;
pub use session_file::FileSessionStore;
