mod file_security;

pub use file_security::{FileSecurityError, read_file_security};
