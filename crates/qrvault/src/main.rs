//! `qrvault` - CLI for the QR history service
//!
//! This binary starts the HTTP API and provides maintenance commands over
//! the same database.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use qrvault::api::RecordResponse;
use qrvault::cli::{Cli, Command, ConfigCommand, HistoryCommand, OutputFormat, PurgeCommand};
use qrvault::{init_logging, vault, Config, Server, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;

    match cli.command {
        Command::Serve(cmd) => {
            let mut server_config = config.server.clone();
            if let Some(host) = cmd.host {
                server_config.host = host;
            }
            if let Some(port) = cmd.port {
                server_config.port = port;
            }
            let storage = open_storage(&config)?;
            Server::new(server_config, Arc::new(storage)).run().await?;
        }
        Command::Status(cmd) => handle_status(&config, cmd.json)?,
        Command::History(cmd) => handle_history(&config, &cmd)?,
        Command::Purge(cmd) => handle_purge(&config, &cmd)?,
        Command::Config(cmd) => handle_config(&config, cmd)?,
    }
    Ok(())
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening database {}", path.display()))
}

fn handle_status(config: &Config, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": storage.path(),
            "total_clients": stats.total_clients,
            "total_records": stats.total_records,
            "oldest_record": stats.oldest_record,
            "newest_record": stats.newest_record,
            "db_size_bytes": stats.db_size_bytes,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("qrvault status");
        println!("--------------");
        println!("Database:      {}", storage.path().display());
        println!("Clients:       {}", stats.total_clients);
        println!("Records:       {}", stats.total_records);
        if let (Some(oldest), Some(newest)) = (stats.oldest_record, stats.newest_record) {
            println!("Oldest record: {}", oldest.to_rfc3339());
            println!("Newest record: {}", newest.to_rfc3339());
        }
        println!("Size:          {} bytes", stats.db_size_bytes);
    }
    Ok(())
}

fn handle_history(config: &Config, cmd: &HistoryCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let session = storage.session()?;
    let records = vault::list_history(&session, Some(&cmd.user_id))?;

    match cmd.format {
        OutputFormat::Json => {
            let body: Vec<RecordResponse> = records.iter().map(RecordResponse::from).collect();
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Plain => {
            if records.is_empty() {
                println!("No records for {}", cmd.user_id);
            }
            for record in &records {
                println!(
                    "{:>6}  {}  {}",
                    record.id,
                    record.created_at.to_rfc3339(),
                    record.content
                );
            }
        }
    }
    Ok(())
}

fn handle_purge(config: &Config, cmd: &PurgeCommand) -> anyhow::Result<()> {
    if !cmd.yes {
        println!(
            "This will delete client {} and all of its records.",
            cmd.user_id
        );
        println!("Use --yes to confirm.");
        return Ok(());
    }

    let storage = open_storage(config)?;
    let mut session = storage.session()?;
    match vault::purge_client(&mut session, &cmd.user_id)? {
        Some(summary) => println!(
            "Purged client {} ({} records deleted)",
            cmd.user_id, summary.records_deleted
        ),
        None => println!("No client {}", cmd.user_id),
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Server]");
                println!("  Address:        {}", config.server.socket_addr());
                println!("  Base path:      {}", config.server.base_path);
                if config.server.cors_origins.is_empty() {
                    println!("  CORS origins:   any");
                } else {
                    let origins = config.server.cors_origins.join(", ");
                    println!("  CORS origins:   {origins}");
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
