//! Utility functions for input validation and display formatting.

pub mod format;
pub mod input;

pub use format::{format_remaining, format_timestamp, truncate_string};
pub use input::{can_add_email_char, can_add_password_char, validate_credentials};
