//! JSON HTTP surface.
//!
//! Owner routes (cases, profile, share token, clinical summary, tag and
//! search) and public routes (share links, anonymized feed), nested under
//! `/api/`. Handlers are thin: they load through the store, call the
//! engine and serialize its payloads.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::build_router;
pub use server::{serve, ServerError};
pub use types::ApiContext;
