mod adapters;
mod app_system;
mod auth;
mod domain;
mod engine;
mod error;
mod list_actor;
mod notify;
mod ports;
mod sync;

#[cfg(test)]
mod mock_framework;

use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn, Instrument};

use crate::adapters::ReqresClient;
use crate::app_system::{setup_tracing, Cli, Command, ConsoleConfig, ConsoleSystem};
use crate::domain::{CreateCandidate, Credentials};
use crate::list_actor::UserListClient;
use crate::ports::file_slot;
use crate::sync::SignalBus;

#[tokio::main]
async fn main() -> Result<(), String> {
    let cli = Cli::parse();

    let mut config = ConsoleConfig::load(cli.config.as_deref()).map_err(|e| e.to_string())?;
    config.apply_overrides(&cli.overrides);
    config.validate().map_err(|e| e.to_string())?;

    // Setup tracing once for the entire application
    setup_tracing(&config.log_filter);

    let settings = config.list_settings().map_err(|e| e.to_string())?;
    let remote = ReqresClient::new(&config.api_base_url, &config.api_key, config.request_timeout())
        .map_err(|e| e.to_string())?;
    let slot = file_slot(&config.storage_dir);

    info!(api = %config.api_base_url, storage = %config.storage_dir.display(), "Starting user console");

    let mut system = ConsoleSystem::new(settings, Arc::new(remote), slot, SignalBus::default());
    let mut notifications = system.notifier.subscribe();

    let span = tracing::info_span!("command", context = %system.context());
    let outcome = run_command(&mut system, cli.command).instrument(span).await;

    while let Ok(notification) = notifications.try_recv() {
        info!(kind = ?notification.kind, "{}", notification.message);
    }

    // Shutdown system gracefully
    system.shutdown().await?;

    match outcome {
        Ok(()) => {
            info!("Application completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e)
        }
    }
}

async fn run_command(system: &mut ConsoleSystem, command: Command) -> Result<(), String> {
    match command {
        Command::Login { email, password } => {
            let outcome = system
                .login(Credentials::new(email, password))
                .await
                .map_err(|e| e.to_string())?;
            info!(?outcome, "Login finished");
        }
        Command::List { search, page } => {
            let list = open_activated(system).await?;
            if let Some(term) = search {
                list.search(term).await.map_err(|e| e.to_string())?;
            }
            let view = list.go_to_page(page).await.map_err(|e| e.to_string())?;
            if !view.page_numbers().contains(&page) {
                warn!(requested = page, shown = view.current_page, "Requested page out of range");
            }
            print_json(&view)?;
        }
        Command::Create { name, job } => {
            let list = system.open_user_list().map_err(|e| e.to_string())?;
            let record = list
                .create_user(CreateCandidate::new(name, job))
                .await
                .map_err(|e| e.to_string())?;
            info!(user_id = record.id, "User created");
            print_json(&record)?;
        }
        Command::Delete { id } => {
            let list = open_activated(system).await?;
            let record = list
                .find_user(id)
                .await
                .map_err(|e| e.to_string())?
                .ok_or_else(|| format!("User {id} is not in the listing"))?;
            list.delete_user(record).await.map_err(|e| e.to_string())?;
            info!(user_id = id, "User deleted");
        }
    }
    Ok(())
}

async fn open_activated(system: &mut ConsoleSystem) -> Result<UserListClient, String> {
    let list = system.open_user_list().map_err(|e| e.to_string())?;
    let view = list.activate().await.map_err(|e| e.to_string())?;
    info!(total_pages = view.total_pages, "Listing loaded");
    Ok(list)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let rendered = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{rendered}");
    Ok(())
}
