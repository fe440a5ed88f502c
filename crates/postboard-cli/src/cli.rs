use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "postboard", version, about = "Sign up, log in and browse posts", long_about = None)]
pub struct Cli {
    /// Backend API base URL (overrides config and POSTBOARD_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new account
    Signup {
        #[arg(long)]
        email: Option<String>,
    },
    /// Log in and remember the session until it expires
    Login {
        #[arg(long)]
        email: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is active and when it expires
    Status,
    /// List one page of posts
    Posts {
        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Posts per page (1, 2, 5 or 10)
        #[arg(long)]
        page_size: Option<u32>,
        /// Print the page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete one of your posts
    Delete { post_id: String },
    /// Stay running and report login/logout transitions until the session ends
    Watch,
}
