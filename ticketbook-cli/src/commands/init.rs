//! Init command implementation.
//!
//! This module implements the `init` command for explicitly initializing
//! the ticketbook data directory and database.

use crate::error::CliError;
use crate::utils::{resolve_data_dir, shorten_path, GlobalOptions};
use clap::Parser;
use std::path::PathBuf;
use ticketbook::config::loader::USER_CONFIG_FILE;
use ticketbook::database::DATABASE_FILE_NAME;
use ticketbook::workflow::{init_database, inspect_store, ConfigOutcome, InitOptions};

/// Initialize ticketbook data directory and database.
#[derive(Parser)]
#[command(about = "Initialize ticketbook data directory and database")]
pub struct InitCommand {
    /// Data directory to initialize
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    /// Overwrite existing database
    #[arg(long)]
    overwrite: bool,

    /// Create default configuration file
    #[arg(long)]
    with_config: bool,

    /// Preview actions without executing
    #[arg(long)]
    dry_run: bool,
}

impl InitCommand {
    /// Execute the init command.
    ///
    /// `--disable-autoinit` has no effect here; this command is how the
    /// database gets created when auto-init is off.
    pub fn execute(self, global: &GlobalOptions) -> Result<(), CliError> {
        // Priority: command flag > global flag > environment > default
        let data_dir = match self.data_dir {
            Some(dir) => dir,
            None => resolve_data_dir(global)?,
        };

        if self.dry_run {
            println!("Dry-run mode: no changes will be made");
            println!();
            println!("Would initialize ticketbook in: {}", shorten_path(&data_dir));

            if data_dir.exists() {
                println!("  - Data directory already exists: {}", data_dir.display());
            } else {
                println!("  - Create data directory: {}", data_dir.display());
            }

            let db_path = data_dir.join(DATABASE_FILE_NAME);
            match inspect_store(&db_path)? {
                None => println!("  - Create database: {}", db_path.display()),
                Some(existing) if self.overwrite => {
                    println!(
                        "  - Discard existing database ({} event(s), {} active reservation(s)): {}",
                        existing.events,
                        existing.active_reservations,
                        db_path.display()
                    );
                    println!("  - Create new database: {}", db_path.display());
                }
                Some(existing) => println!(
                    "  - ERROR: Database already holds {} event(s) (use --overwrite to replace): {}",
                    existing.events,
                    db_path.display()
                ),
            }

            if self.with_config {
                let config_path = data_dir.join(USER_CONFIG_FILE);
                if config_path.exists() {
                    println!(
                        "  - Configuration file already exists (will not overwrite): {}",
                        config_path.display()
                    );
                } else {
                    println!("  - Create configuration file: {}", config_path.display());
                }
            }

            return Ok(());
        }

        let options = InitOptions::new(data_dir)
            .with_overwrite(self.overwrite)
            .with_create_config(self.with_config);
        let result = init_database(&options)?;

        println!(
            "Initialized ticketbook in: {} (schema v{})",
            shorten_path(&result.data_dir),
            result.schema_version
        );

        if result.data_dir_created {
            println!("  - Created data directory");
        }

        match result.replaced {
            Some(old) => println!(
                "  - Recreated database, discarding {} event(s) and {} active reservation(s)",
                old.events, old.active_reservations
            ),
            None => println!("  - Created database"),
        }

        match result.config {
            ConfigOutcome::Written => println!("  - Created default configuration file"),
            ConfigOutcome::KeptExisting => {
                println!("  - Configuration file already exists (not overwritten)");
            }
            ConfigOutcome::NotRequested => {}
        }

        Ok(())
    }
}
