//! Core types and definitions for the BULWARK wave orchestration core.
//!
//! This crate defines the vocabulary shared across all other crates:
//! wave data, phases, commands, events, snapshots, configuration and
//! constants. It has no dependency on any game engine or runtime framework.

pub mod commands;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;
pub mod wave;

#[cfg(test)]
mod tests;
