pub mod campaign;
pub mod leaderboard;
pub mod sos_request;
pub mod user;

pub use campaign::*;
pub use leaderboard::*;
pub use sos_request::*;
pub use user::*;
