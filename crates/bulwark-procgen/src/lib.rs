//! Procedural content for BULWARK.
//!
//! Pure, stateless functions: per-wave balance formulas and the deterministic
//! spatial patterns that place burst spawns along the far edge. No world or
//! collaborator dependency, so every result can be asserted exactly.

pub mod balance;
pub mod patterns;

pub use bulwark_core as core;

#[cfg(test)]
mod tests;
