//! API route handlers

pub mod health;
pub mod measurements;
pub mod series;
pub mod users;
pub mod views;
