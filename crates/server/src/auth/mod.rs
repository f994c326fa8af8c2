//! # Authentication Module
//!
//! OAuth login, refresh sessions and invitations.

pub mod handlers;
pub mod invitations;
pub mod sessions;
