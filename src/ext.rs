//! Platform integrations.

pub mod windows;
