//! HTTP route handlers.

pub mod channels;
pub mod health;
pub mod index;
pub mod serve;
pub mod stream;
