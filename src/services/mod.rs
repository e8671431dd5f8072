pub mod auth_service;
pub mod campaign_service;
pub mod chatbot_service;
pub mod gemini_service;
pub mod leaderboard_service;
pub mod notifier;
pub mod sos_service;
pub mod user_service;

pub use gemini_service::{DisabledGenerator, GeminiClient, TextGenerator};
pub use notifier::{HttpMailer, LogNotifier, Notifier};
