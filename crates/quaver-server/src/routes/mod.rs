//! Route handlers for the HTTP API.

pub mod attempts;
pub mod auth;
pub mod health;
pub mod media;
pub mod quizzes;
pub mod upload;
