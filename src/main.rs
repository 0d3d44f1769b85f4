//! task-tree CLI
//!
//! Drives one synchronizer session against the local SQLite store.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use task_tree_sync::cli::{Cli, Command, render_tree};
use task_tree_sync::config::Config;
use task_tree_sync::db::Database;
use task_tree_sync::error::SyncError;
use task_tree_sync::logging::{self, LogTarget};
use task_tree_sync::store::SqliteStore;
use task_tree_sync::sync::Synchronizer;
use task_tree_sync::types::RootQuery;
use tracing::debug;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::resolve(cli.config.as_deref().map(Path::new))?;
    if let Some(db_path) = &cli.database {
        config.store.db_path = db_path.into();
    }
    config.ensure_db_dir()?;
    debug!(db_path = %config.store.db_path.display(), max_depth = config.tree.max_depth, "Configuration resolved");

    let db = Database::open(&config.store.db_path)?;
    let store = Arc::new(SqliteStore::new(db));
    let sync = Synchronizer::new(store, cli.owner).with_depth_policy(config.depth_policy());

    // Populate the mirror so mutations start from the stored state.
    sync.refresh(&RootQuery::all()).await?;

    match cli.command {
        Command::Create { title, description } => {
            let root = sync.create_root(&title, description.as_deref()).await?;
            print_json(&root)?;
        }
        Command::List {
            search,
            hide_completed,
        } => {
            let query = RootQuery {
                search,
                show_completed: !hide_completed,
            };
            sync.refresh(&query).await?;
            for root in sync.mirror().list() {
                let progress = root.progress();
                println!(
                    "{}  {}{}  [{}/{}]{}",
                    root.id,
                    if root.is_completed { "(done) " } else { "" },
                    root.title,
                    progress.completed,
                    progress.total,
                    if root.tree_unreadable { "  (subtasks unreadable)" } else { "" }
                );
            }
        }
        Command::Show { root_id } => match sync.mirror().get(&root_id) {
            Some(root) => print!("{}", render_tree(&root)),
            None => return Err(SyncError::root_not_found(&root_id).into()),
        },
        Command::Toggle {
            root_id,
            target_id,
            undo,
        } => {
            let root = sync.toggle(&root_id, &target_id, !undo).await?;
            print!("{}", render_tree(&root));
        }
        Command::Edit {
            root_id,
            target_id,
            title,
            description,
        } => {
            let root = sync
                .edit(&root_id, &target_id, &title, description.as_deref())
                .await?;
            print!("{}", render_tree(&root));
        }
        Command::Delete { root_id, target_id } => match sync.delete(&root_id, &target_id).await? {
            Some(root) => print!("{}", render_tree(&root)),
            None => println!("Deleted {}", root_id),
        },
        Command::Add {
            root_id,
            parent_id,
            title,
        } => {
            let node = sync.add_subtask(&root_id, &parent_id, &title).await?;
            print_json(&node)?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    if let Err(e) = run(cli).await {
        match e.downcast::<SyncError>() {
            Ok(sync_err) => eprintln!(
                "{}",
                serde_json::to_string(&sync_err).unwrap_or_else(|_| sync_err.to_string())
            ),
            Err(e) => eprintln!("error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}
