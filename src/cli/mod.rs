use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::addressbook::{AddressBookCatalog, ContactBackend, NextcloudCatalog};
use crate::config::{parse_dsn, Config};
use crate::db::{Database, TablePrefix};

pub mod books;
pub mod display;
pub mod list;
pub mod search;
pub mod show;

pub use books::run_books;
pub use list::run_list;
pub use search::run_search;
pub use show::run_show;

#[derive(Parser)]
#[command(name = "nc-addressbook")]
#[command(about = "Read-only access to Nextcloud address books straight from the database")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Nextcloud SQLite database (file path or sqlite: DSN)
    #[arg(short, long, global = true, value_name = "DSN")]
    pub database: Option<String>,

    /// Nextcloud table prefix
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Nextcloud user whose address books are read
    #[arg(short, long, global = true, default_value = "")]
    pub user: String,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Log every SQL statement with its parameters
    #[arg(long, global = true)]
    pub sql_debug: bool,

    /// More log output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Apply command line overrides on top of the environment configuration
    pub fn apply(&self, mut config: Config) -> Result<Config> {
        if let Some(ref dsn) = self.database {
            config.database = Some(parse_dsn(dsn)?);
        }
        if let Some(ref prefix) = self.prefix {
            config.table_prefix = TablePrefix::parse(prefix)?;
        }
        config.sql_debug |= self.sql_debug;
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the user's address books
    Books(BooksArgs),
    /// List contacts of an address book page by page
    List(ListArgs),
    /// Search contacts by name or email
    Search(SearchArgs),
    /// Show a single contact
    Show(ShowArgs),
}

#[derive(Args)]
pub struct BooksArgs {
    /// Print the autocomplete source list with these books merged in
    #[arg(short, long)]
    pub autocomplete: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Address book id, e.g. nextcloud_3
    pub book: String,
    #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
    pub page: i64,
    #[arg(short, long, default_value = "20", allow_negative_numbers = true)]
    pub limit: i64,
    /// Skip counting all contacts
    #[arg(short, long)]
    pub no_count: bool,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Address book id, e.g. nextcloud_3
    pub book: String,
    /// Search value
    pub query: String,
    /// Fields to search: "*", "ID", or a comma separated list of name,email
    #[arg(short, long, default_value = "*")]
    pub fields: String,
    /// strict, prefix or substring
    #[arg(short, long, default_value = "substring")]
    pub mode: String,
    #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
    pub page: i64,
    #[arg(short, long, default_value = "20", allow_negative_numbers = true)]
    pub limit: i64,
    /// Only print the number of matches
    #[arg(short, long)]
    pub count_only: bool,
    /// Skip counting all matches
    #[arg(short, long)]
    pub no_count: bool,
    /// Fields that must not be empty (name, email)
    #[arg(short, long, value_name = "FIELD")]
    pub require: Vec<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Address book id, e.g. nextcloud_3
    pub book: String,
    /// Contact (card) id
    pub id: i64,
}

/// Everything a command needs to talk to the database
pub struct Context {
    pub db: Database,
    pub config: Config,
    pub user: String,
    pub json: bool,
}

impl Context {
    pub fn open(config: Config, user: String, json: bool) -> Result<Self> {
        let path: PathBuf = config.database.clone().ok_or_else(|| {
            anyhow!("No database configured: pass --database or set NEXTCLOUD_SQL_ADDRESSBOOK_DSN")
        })?;
        let db = Database::open(&path)
            .map_err(|e| anyhow!("Could not open {}: {}", path.display(), e))?
            .with_sql_debug(config.sql_debug);
        Ok(Self {
            db,
            config,
            user,
            json,
        })
    }

    pub fn catalog(&self) -> NextcloudCatalog<'_, Database> {
        NextcloudCatalog::new(&self.db, self.config.table_prefix.clone())
    }

    /// Open an address book of the current user
    pub fn open_book(&self, public_id: &str) -> Result<ContactBackend<'_, Database>> {
        self.catalog()
            .open(public_id, &self.user)?
            .ok_or_else(|| anyhow!("'{}' is not a Nextcloud address book", public_id))
    }
}
