//! Postboard CLI - a terminal client for the postboard blog backend.
//!
//! Logs in against the backend, keeps the session in local storage until the
//! token expires, and lists or deletes posts.

mod cli;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postboard_core::auth::FileStore;
use postboard_core::components::{LoginForm, PageEvent, PostList, PAGE_SIZE_OPTIONS};
use postboard_core::utils::{format_remaining, format_timestamp, truncate_string, validate_credentials};
use postboard_core::{ApiClient, AuthService, Config, Navigator, PostsService};

use cli::{Cli, Command};

/// Log file prefix inside the cache directory
const LOG_FILE_PREFIX: &str = "postboard.log";

/// Characters of post content shown in the listing
const CONTENT_PREVIEW_LEN: usize = 60;

/// The CLI has a single screen, so "home" is just a log line.
struct CliNavigator;

impl Navigator for CliNavigator {
    fn navigate_home(&self) {
        debug!("Navigate home");
    }
}

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Make sure the log directory exists before the appender writes into it.
fn create_log_dir(dir: PathBuf) -> Result<PathBuf> {
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    Ok(dir)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: failed to load config ({}), using defaults", e);
        Config::default()
    });
    if let Some(url) = cli.api_url.clone() {
        config.api_url = url;
    }

    let log_dir = config.cache_dir().and_then(create_log_dir);
    let _log_guard = init_tracing(log_dir.as_ref().ok().map(PathBuf::as_path));
    if let Err(e) = &log_dir {
        warn!(error = %e, "File logging disabled");
    }
    info!(api_url = %config.api_url, "Postboard starting");

    let data_dir = config.data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
    let api = ApiClient::new(&config.api_url)?;
    let api = Arc::new(api);
    let auth = AuthService::new(
        api.clone(),
        Arc::new(FileStore::open(&data_dir)),
        Arc::new(CliNavigator),
    );
    auth.auto_auth_user();

    match cli.command {
        Command::Signup { email } => signup(&auth, email).await,
        Command::Login { email } => login(&auth, &mut config, email).await,
        Command::Logout => {
            auth.logout();
            println!("Logged out.");
            Ok(())
        }
        Command::Status => {
            print_status(&auth);
            Ok(())
        }
        Command::Posts {
            page,
            page_size,
            json,
        } => {
            let posts = PostsService::new(api, auth.clone());
            list_posts(posts, auth, page, page_size.unwrap_or(config.posts_per_page), json).await
        }
        Command::Delete { post_id } => {
            let posts = PostsService::new(api, auth.clone());
            delete_post(posts, auth, &post_id).await
        }
        Command::Watch => watch(&auth).await,
    }
}

fn prompt_email(default: Option<&str>) -> Result<String> {
    match default {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    match default {
        Some(last) if input.is_empty() => Ok(last.to_string()),
        _ => Ok(input.to_string()),
    }
}

fn prompt_password() -> Result<String> {
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

async fn signup(auth: &AuthService, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_email(None)?,
    };
    let password = prompt_password()?;
    if let Err(msg) = validate_credentials(&email, &password) {
        anyhow::bail!(msg);
    }

    if auth.create_user(email.trim(), &password).await {
        println!("Account created. Run `postboard login` to sign in.");
        Ok(())
    } else {
        let message = auth
            .last_failure()
            .map(|f| f.message)
            .unwrap_or_else(|| "Signup failed".to_string());
        anyhow::bail!(message)
    }
}

async fn login(auth: &AuthService, config: &mut Config, email: Option<String>) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };

    let mut form = LoginForm::new(auth.clone());
    form.set_email(&email);
    form.set_password(&prompt_password()?);
    if let Some(msg) = form.validation_error() {
        anyhow::bail!(msg);
    }

    println!("\nAuthenticating...");
    if !form.on_login().await {
        anyhow::bail!(form.error.unwrap_or_else(|| "Login failed".to_string()));
    }

    config.last_email = Some(form.email().trim().to_string());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Login successful!");
    print_status(auth);
    Ok(())
}

fn print_status(auth: &AuthService) {
    match auth.session() {
        Some(session) if auth.is_auth() => {
            println!("Logged in as user {}", session.user_id);
            println!(
                "Session expires {} (in {})",
                format_timestamp(session.expires_at),
                format_remaining(session.time_until_expiry())
            );
        }
        _ => println!("Not logged in."),
    }
}

async fn list_posts(
    posts: PostsService,
    auth: AuthService,
    page: u32,
    page_size: u32,
    json: bool,
) -> Result<()> {
    if !PAGE_SIZE_OPTIONS.contains(&page_size) {
        anyhow::bail!("Page size must be one of {:?}", PAGE_SIZE_OPTIONS);
    }

    let mut list = PostList::new(posts, auth).with_posts_per_page(page_size);
    list.on_init().await;
    if page > 1 {
        list.on_changed_page(PageEvent {
            page_index: page - 1,
            page_size,
        })
        .await;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&list.posts)?);
        return Ok(());
    }

    if list.posts.is_empty() {
        println!("No posts added yet!");
    }
    for post in &list.posts {
        let marker = if list.can_edit(post) { "*" } else { " " };
        println!("{} [{}] {}", marker, post.id, post.title);
        println!("    {}", truncate_string(&post.content, CONTENT_PREVIEW_LEN));
    }
    println!(
        "\nPage {} of {} ({} posts total)",
        list.current_page,
        list.total_pages().max(1),
        list.total_posts
    );
    if list.user_is_authenticated {
        println!("* = your post");
    }
    list.on_destroy();
    Ok(())
}

async fn delete_post(posts: PostsService, auth: AuthService, post_id: &str) -> Result<()> {
    if !auth.is_auth() {
        anyhow::bail!("Not logged in. Run `postboard login` first.");
    }
    posts.delete_post(post_id).await?;
    println!("Deleted post {}.", post_id);
    Ok(())
}

async fn watch(auth: &AuthService) -> Result<()> {
    let mut status = auth.auth_status_listener();
    if !auth.is_auth() {
        println!("Not logged in.");
        return Ok(());
    }
    print_status(auth);
    println!("Waiting for the session to end (Ctrl+C to stop)...");

    loop {
        tokio::select! {
            event = status.recv() => match event {
                Some(true) => println!("Logged in."),
                Some(false) => {
                    println!("Session ended.");
                    return Ok(());
                }
                None => return Ok(()),
            },
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
