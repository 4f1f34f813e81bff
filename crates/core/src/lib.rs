//! Functional core for agendakit.
//!
//! Everything in this crate is free of I/O: key construction, credential
//! expiry arithmetic, request validation and embed snippet generation. The
//! `agendakit` binary wires these into cache backends, HTTP clients and
//! handlers.

pub mod cache;
pub mod embed;
pub mod resources;
pub mod token;
pub mod validation;
