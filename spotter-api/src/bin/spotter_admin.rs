//! spotter-admin - operator tooling for Swamp Spotter
//!
//! Registers identities, hands out their bearer tokens and promotes admins.
//! Works directly on the service database; the service may keep running.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use spotter_api::db::actors;
use spotter_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use spotter_common::Role;

#[derive(Parser, Debug)]
#[command(name = "spotter-admin")]
#[command(about = "Manage Swamp Spotter actors")]
#[command(version)]
struct Args {
    /// Root folder holding the database
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Config file (default: platform config directory)
    #[arg(short, long, global = true, env = "SPOTTER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register an actor and print its bearer token
    AddActor {
        email: String,

        #[arg(long)]
        display_name: Option<String>,

        /// Register directly as admin
        #[arg(long)]
        admin: bool,
    },
    /// Grant the admin role to an actor (by email or id)
    Promote { actor: String },
    /// List registered actors
    ListActors,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (config, config_source) = TomlConfig::load_or_default(args.config.as_deref());
    config_source.log();

    let root_folder = RootFolderResolver::new(args.root_folder, &config).resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to initialize root folder")?;
    let db_path = initializer.database_path();
    let db = spotter_common::db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    match args.command {
        Command::AddActor {
            email,
            display_name,
            admin,
        } => {
            let role = if admin { Role::Admin } else { Role::User };
            let (record, token) =
                actors::insert_actor(&db, &email, display_name.as_deref(), role).await?;
            println!("Registered {} ({}) as {}", record.email, record.id, record.role);
            println!("Bearer token (shown once): {}", token);
        }
        Command::Promote { actor } => {
            let Some(record) = actors::find_by_id_or_email(&db, &actor).await? else {
                bail!("No actor matches '{}'", actor);
            };
            if record.role == Role::Admin {
                println!("{} is already an admin", record.email);
            } else {
                actors::set_role(&db, &record.id, Role::Admin).await?;
                println!("Promoted {} ({}) to admin", record.email, record.id);
            }
        }
        Command::ListActors => {
            for record in actors::list_actors(&db).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    record.id,
                    record.email,
                    record.role,
                    record.display_label()
                );
            }
        }
    }

    db.close().await;
    Ok(())
}
