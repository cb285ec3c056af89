mod config;
mod errors;
mod manager;
mod types;

pub use config::SessionConfig;
pub use errors::SessionError;
pub use manager::{SessionLogin, SessionManager};
pub use types::{Flash, FlashLevel, FlashMessage};
