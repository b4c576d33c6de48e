//! Elpriser Server Library
//!
//! Annotations, votes and moderation for the Swedish electricity spot
//! price chart. The server binary is in main.rs.

pub mod annotations;
pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
pub mod visitor;
