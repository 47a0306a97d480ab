//! Core types shared across the dial-settings crates.
//!
//! This crate provides the identifier types used by the integration widget
//! and the rootcause-based `Result` alias used at I/O boundaries.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{IntegrationId, NotificationId, ParseIdError, ProjectId, SubmissionTicket};
