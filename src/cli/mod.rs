pub mod accounts;
pub mod categories;
pub mod import;
pub mod init;
pub mod mapping;
pub mod preview;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "milo", about = "CSV statement importer for personal ledgers.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up Milo: choose a data directory and initialize the database.
    Init {
        /// Path for Milo data (default: ~/Documents/milo)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// List categories.
    Categories,
    /// Show headers and the first rows of a CSV file without importing.
    Preview {
        /// Path to the CSV file
        file: String,
        /// Number of rows to show
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Show how a CSV file's columns map onto transaction fields.
    Mapping {
        /// Path to the CSV file
        file: String,
    },
    /// Import a CSV file of transactions into an account.
    Import {
        /// Path to the CSV file
        file: String,
        /// Account name to import into
        #[arg(long)]
        account: String,
        /// Date format: iso, us, eu, vn, uk, dot, text, auto (default: auto)
        #[arg(long = "date-format")]
        date_format: Option<String>,
        /// Category name assigned to rows without an explicit category
        #[arg(long = "default-category")]
        default_category: Option<String>,
        /// The file has no header line; --columns names them positionally
        #[arg(long = "no-header", requires = "columns")]
        no_header: bool,
        /// Comma-separated column names for --no-header files
        #[arg(long)]
        columns: Option<String>,
        /// Compute the full result without writing anything
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Add a new account.
    Add {
        /// Account name, e.g. 'VCB Checking'
        name: String,
        /// Account type: checking, savings, credit_card, cash
        #[arg(long = "type", default_value = "checking")]
        account_type: String,
        /// Institution name
        #[arg(long)]
        institution: Option<String>,
        /// Last 4 digits of account number
        #[arg(long = "last-four")]
        last_four: Option<String>,
    },
    /// List all accounts.
    List,
}
