//! Headless UI components.
//!
//! These hold the view state a front end renders and react to the auth and
//! posts services. Rendering itself lives in whatever binary hosts them.

pub mod login;
pub mod post_list;

pub use login::LoginForm;
pub use post_list::{PageEvent, PostList, PAGE_SIZE_OPTIONS};
