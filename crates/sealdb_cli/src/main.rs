//! SealDB CLI
//!
//! Command-line tools for encrypted SealDB collections.
//!
//! # Commands
//!
//! - `create` - Create an empty collection
//! - `insert` - Insert one record or an array of records
//! - `select` - Query records with a predicate and optional projection
//! - `update` - Patch records matching a predicate
//! - `delete` - Remove records matching a predicate
//! - `keys` - Show the inferred key skeleton
//! - `agg` - Reduce a numeric field (SUM/MIN/MAX/AVG/COUNT)
//! - `verify` - Check a collection still decrypts and decodes
//! - `backup` / `restore` - Snapshot and restore sealed bytes
//! - `rm` - Remove a collection or backup file
//! - `export` / `import` - Move plaintext JSON in and out of the vault
//!
//! The encryption context is derived from `--passphrase` (or the
//! `SEALDB_PASSPHRASE` environment variable) and `--salt`, so the same
//! pair always opens the same collections.

mod commands;

use clap::{Parser, Subcommand};
use sealdb_core::{CipherKind, EncryptionContext, RecordStore, Vault};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SealDB command-line collection tools.
#[derive(Parser)]
#[command(name = "sealdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the storage directory
    #[arg(global = true, short, long, default_value = ".")]
    path: PathBuf,

    /// Passphrase the encryption keys are derived from
    #[arg(global = true, long, env = "SEALDB_PASSPHRASE")]
    passphrase: Option<String>,

    /// Key derivation salt
    #[arg(global = true, long, default_value = "sealdb")]
    salt: String,

    /// Cipher (aes-256-gcm, aes-128-gcm)
    #[arg(global = true, long, default_value = "aes-256-gcm")]
    cipher: String,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty collection
    Create {
        /// Collection name
        collection: String,

        /// Overwrite an existing collection
        #[arg(short, long)]
        force: bool,
    },

    /// Insert a JSON record (or array of records) into a collection
    Insert {
        /// Collection name
        collection: String,

        /// Record as inline JSON; reads stdin when omitted
        record: Option<String>,
    },

    /// Query records
    Select {
        /// Collection name
        collection: String,

        /// Predicate as JSON, e.g. '{"age":[">",6]}'
        #[arg(short, long)]
        r#where: Option<String>,

        /// Projection spec as JSON, e.g. '{"full":{"concat":["s::Mr. ","name"]}}'
        #[arg(short, long)]
        fields: Option<String>,

        /// Newest-first output order
        #[arg(short, long)]
        reverse: bool,
    },

    /// Patch records matching a predicate
    Update {
        /// Collection name
        collection: String,

        /// Predicate as JSON
        #[arg(short, long)]
        r#where: String,

        /// Patch fields as a JSON object
        #[arg(short, long)]
        set: String,
    },

    /// Remove records matching a predicate
    Delete {
        /// Collection name
        collection: String,

        /// Predicate as JSON
        #[arg(short, long)]
        r#where: String,
    },

    /// Show the inferred key skeleton of a collection
    Keys {
        /// Collection name
        collection: String,
    },

    /// Reduce a numeric field across a collection
    Agg {
        /// Collection name
        collection: String,

        /// Field to reduce
        field: String,

        /// Operation: SUM, MIN, MAX, AVG or COUNT
        op: String,
    },

    /// Check that a collection still decrypts and decodes
    Verify {
        /// Collection name
        collection: String,
    },

    /// Snapshot a collection's sealed bytes
    Backup {
        /// Collection name
        collection: String,

        /// Backup name; default is `<collection>.<unix-timestamp>`
        #[arg(short, long)]
        name: Option<String>,

        /// Backup folder inside the storage directory
        #[arg(long, default_value = "backup")]
        folder: String,
    },

    /// Copy backup bytes back over a live collection
    Restore {
        /// Backup file name, e.g. `people.1700000000.bak`
        backup: String,

        /// Backup folder inside the storage directory
        #[arg(long, default_value = "backup")]
        folder: String,

        /// Target collection; default is the backup name up to the first `.`
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Remove a collection or backup file
    Rm {
        /// Collection name, or backup file name with --backup
        name: String,

        /// Remove a backup file instead of a collection
        #[arg(short, long)]
        backup: bool,

        /// Backup folder inside the storage directory
        #[arg(long, default_value = "backup")]
        folder: String,
    },

    /// Decrypt a collection into a plaintext .json file
    Export {
        /// Collection name
        collection: String,

        /// Output name; defaults to the collection name
        #[arg(short, long)]
        dest: Option<String>,
    },

    /// Seal a plaintext .json file into a collection
    Import {
        /// Source name of the .json file
        src: String,

        /// Target collection; defaults to the source name
        #[arg(short, long)]
        dest: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("SealDB CLI v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let store = open_store(&cli)?;

    match cli.command {
        Commands::Create { collection, force } => {
            commands::create::run(&store, &collection, force)?;
        }
        Commands::Insert { collection, record } => {
            commands::insert::run(&store, &collection, record.as_deref())?;
        }
        Commands::Select {
            collection,
            r#where,
            fields,
            reverse,
        } => {
            commands::select::run(
                &store,
                &collection,
                r#where.as_deref(),
                fields.as_deref(),
                reverse,
            )?;
        }
        Commands::Update {
            collection,
            r#where,
            set,
        } => {
            commands::update::run(&store, &collection, &r#where, &set)?;
        }
        Commands::Delete { collection, r#where } => {
            commands::delete::run(&store, &collection, &r#where)?;
        }
        Commands::Keys { collection } => {
            commands::keys::run(&store, &collection)?;
        }
        Commands::Agg {
            collection,
            field,
            op,
        } => {
            commands::agg::run(&store, &collection, &field, &op)?;
        }
        Commands::Verify { collection } => {
            commands::verify::run(&store, &collection)?;
        }
        Commands::Backup {
            collection,
            name,
            folder,
        } => {
            commands::backup::create(&store, &collection, name.as_deref(), &folder)?;
        }
        Commands::Restore {
            backup,
            folder,
            target,
        } => {
            commands::backup::restore(&store, &backup, &folder, target.as_deref())?;
        }
        Commands::Rm {
            name,
            backup,
            folder,
        } => {
            commands::rm::run(&store, &name, backup, &folder)?;
        }
        Commands::Export { collection, dest } => {
            commands::transfer::export(&store, &collection, dest.as_deref())?;
        }
        Commands::Import { src, dest } => {
            commands::transfer::import(&store, &src, dest.as_deref())?;
        }
        Commands::Version => unreachable!("handled above"),
    }

    Ok(())
}

fn open_store(cli: &Cli) -> Result<RecordStore, Box<dyn std::error::Error>> {
    let passphrase = cli
        .passphrase
        .as_deref()
        .ok_or("Passphrase required (--passphrase or SEALDB_PASSPHRASE)")?;
    let cipher: CipherKind = cli.cipher.parse()?;
    let context = EncryptionContext::derive_from_passphrase(
        cipher,
        passphrase.as_bytes(),
        cli.salt.as_bytes(),
    )?;
    Ok(RecordStore::new(Vault::new(&cli.path, context)))
}
