pub mod password;
pub mod session;
pub mod tokens;

pub use session::{SessionService, TokenPair};
