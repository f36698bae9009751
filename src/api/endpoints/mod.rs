//! HTTP endpoint handlers.

pub mod cases;
pub mod clinical;
pub mod feed;
pub mod health;
pub mod profile;
pub mod share;
