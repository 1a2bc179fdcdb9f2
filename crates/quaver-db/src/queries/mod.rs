//! Database query modules.

pub mod attempts;
pub mod audios;
pub mod auth;
pub mod quizzes;
pub mod users;
