use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    controller::{password_change, user_edit},
    AppResources, DefaultResources, Effect, PasswordChangeController, SavedStateHandle,
    UseCases, UserEditController, UserEditState, UserListController,
};
use shared::domain::{seed_users, UserId, UserRecord};
use storage::{FsContentLoader, MemoryBlobStore, MemoryRecordStore};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(about = "Drives the user management screens against seeded in-memory stores")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all users.
    List,
    /// Load one user into the edit screen and print it.
    Show { id: String },
    /// Fill in the add-user form and submit it.
    Add {
        #[arg(long)]
        nickname: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        description: String,
        /// Path or file:// URL of the avatar image.
        #[arg(long)]
        avatar: Option<String>,
        /// Path or file:// URL of the ID scan.
        #[arg(long)]
        id_scan: Option<String>,
    },
    /// Ask for confirmation, then delete a user.
    Delete { id: String },
    /// Set a new password for a user.
    Passwd { id: String, password: String },
}

struct App {
    use_cases: UseCases,
    resources: Arc<dyn AppResources>,
    saved_state: SavedStateHandle,
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = config::load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .init();
    let args = Args::parse();

    let latency = Duration::from_millis(settings.latency_ms);
    let records = Arc::new(MemoryRecordStore::with_seed_users(latency, seed_users()));
    let blobs = Arc::new(MemoryBlobStore::new(latency));
    let saved_state = match &settings.saved_state_path {
        Some(path) => SavedStateHandle::load(path)?,
        None => SavedStateHandle::new(),
    };
    let app = App {
        use_cases: UseCases::from_stores(records, blobs, Arc::new(FsContentLoader::new())),
        resources: Arc::new(DefaultResources),
        saved_state,
    };
    info!(latency_ms = settings.latency_ms, "stores seeded");

    match args.command {
        Command::List => list(&app).await?,
        Command::Show { id } => show(&app, parse_id(&id)?).await?,
        Command::Add {
            nickname,
            email,
            description,
            avatar,
            id_scan,
        } => add(&app, nickname, email, description, avatar, id_scan).await?,
        Command::Delete { id } => delete(&app, parse_id(&id)?).await?,
        Command::Passwd { id, password } => passwd(&app, parse_id(&id)?, password).await?,
    }

    if let Some(path) = &settings.saved_state_path {
        app.saved_state.persist(path)?;
    }
    Ok(())
}

fn parse_id(raw: &str) -> Result<UserId> {
    match UserId::parse(raw) {
        Some(id) => Ok(id),
        None => bail!("user id must not be empty"),
    }
}

fn list_controller(app: &App) -> UserListController {
    UserListController::new(
        Arc::clone(&app.use_cases.list_users),
        Arc::clone(&app.use_cases.delete_user),
        Arc::clone(&app.resources),
    )
}

async fn list(app: &App) -> Result<()> {
    let controller = list_controller(app);
    let mut effects = controller.subscribe_effects();
    controller.load_users().join().await?;
    print_users(&controller.state().users);
    drain(&mut effects);
    Ok(())
}

async fn show(app: &App, id: UserId) -> Result<()> {
    // a leftover add-form snapshot would skip loading the stored user
    app.saved_state.remove(user_edit::SAVED_STATE_KEY);
    let controller = UserEditController::new(
        Some(id),
        app.saved_state.clone(),
        &app.use_cases,
        Arc::clone(&app.resources),
    );
    let mut effects = controller.subscribe_effects();
    controller.load_details().join().await?;
    let left = drain(&mut effects);
    if !left {
        print_form(&controller.state());
    }
    drop(controller);
    app.saved_state.remove(user_edit::SAVED_STATE_KEY);
    Ok(())
}

async fn add(
    app: &App,
    nickname: String,
    email: String,
    description: String,
    avatar: Option<String>,
    id_scan: Option<String>,
) -> Result<()> {
    let controller = UserEditController::new(
        None,
        app.saved_state.clone(),
        &app.use_cases,
        Arc::clone(&app.resources),
    );
    let mut effects = controller.subscribe_effects();
    controller.load_details().join().await?;
    controller.set_nickname(nickname);
    controller.set_email(email);
    controller.set_description(description);
    if let Some(content_ref) = avatar {
        controller.add_avatar(content_ref).join().await?;
    }
    if let Some(content_ref) = id_scan {
        controller.add_id_scan(content_ref).join().await?;
    }
    drain(&mut effects);

    let state = controller.state();
    print_form(&state);
    if !state.submit_enabled {
        println!("form incomplete; not submitted");
        return Ok(());
    }

    controller.submit().join().await?;
    let left = drain(&mut effects);
    drop(controller);
    if left {
        app.saved_state.remove(user_edit::SAVED_STATE_KEY);
        list(app).await?;
    }
    Ok(())
}

async fn delete(app: &App, id: UserId) -> Result<()> {
    let controller = list_controller(app);
    let mut effects = controller.subscribe_effects();
    controller.delete_user(id.clone());
    drain(&mut effects);

    controller.delete_user_confirmed(id).join().await?;
    print_users(&controller.state().users);
    drain(&mut effects);
    Ok(())
}

async fn passwd(app: &App, id: UserId, password: String) -> Result<()> {
    let controller = PasswordChangeController::new(
        Some(id),
        app.saved_state.clone(),
        Arc::clone(&app.use_cases.update_password),
        Arc::clone(&app.resources),
    );
    let mut effects = controller.subscribe_effects();
    controller.set_password(password.clone());
    controller.set_password_confirmed(password);

    let state = controller.state();
    if let Some(message) = &state.password_error {
        println!("{message}");
    }
    if !state.submit_enabled {
        println!("password not accepted; not submitted");
        return Ok(());
    }

    controller.submit().join().await?;
    let left = drain(&mut effects);
    drop(controller);
    if left {
        app.saved_state.remove(password_change::SAVED_STATE_KEY);
        println!("password updated");
    }
    Ok(())
}

/// Prints pending effects and reports whether one of them left the screen.
fn drain(effects: &mut broadcast::Receiver<Effect>) -> bool {
    let mut left = false;
    while let Ok(effect) = effects.try_recv() {
        left |= effect.is_back();
        println!("effect: {effect:?}");
    }
    left
}

fn print_users(users: &[UserRecord]) {
    for user in users {
        println!(
            "{:<38} {:<12} {:<24} {}",
            user.id.as_ref().map(UserId::as_str).unwrap_or("-"),
            user.nickname,
            user.email,
            user.description
        );
    }
}

fn print_form(state: &UserEditState) {
    println!("{}", state.header);
    for (label, value, error) in [
        ("nickname", &state.nickname, &state.nickname_error),
        ("email", &state.email, &state.email_error),
        ("description", &state.description, &state.description_error),
    ] {
        match error {
            Some(message) => println!("  {label:<12} {value}  ({message})"),
            None => println!("  {label:<12} {value}"),
        }
    }
    println!(
        "  avatar       {} bytes",
        state.avatar.as_ref().map_or(0, Vec::len)
    );
    println!(
        "  id scan      {} bytes",
        state.id_scan.as_ref().map_or(0, Vec::len)
    );
}
