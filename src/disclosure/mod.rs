//! Privacy Filter / Disclosure Gate.
//!
//! Decides which cases and which fields leave the system for a given
//! audience, and resolves share links to one of four terminal outcomes.
//! Legal name, hospital, doctor and caregiver names only ever appear in
//! owner-tier output.

mod filter;
mod share;

pub use filter::*;
pub use share::*;
