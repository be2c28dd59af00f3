mod cli;
mod db;
mod detect;
mod error;
mod fmt;
mod importer;
mod mapping;
mod models;
mod normalize;
mod raw;
mod settings;
mod validate;

use clap::Parser;
use colored::Colorize;

use cli::{AccountsCommands, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Accounts { command } => match command {
            AccountsCommands::Add {
                name,
                account_type,
                institution,
                last_four,
            } => cli::accounts::add(
                &name,
                &account_type,
                institution.as_deref(),
                last_four.as_deref(),
            ),
            AccountsCommands::List => cli::accounts::list(),
        },
        Commands::Categories => cli::categories::list(),
        Commands::Preview { file, rows } => cli::preview::run(&file, rows),
        Commands::Mapping { file } => cli::mapping::run(&file),
        Commands::Import {
            file,
            account,
            date_format,
            default_category,
            no_header,
            columns,
            dry_run,
        } => cli::import::run(
            &file,
            &account,
            date_format.as_deref(),
            default_category.as_deref(),
            no_header,
            columns.as_deref(),
            dry_run,
        ),
    };

    if let Err(err) = result {
        eprintln!("{} {err}", "error:".red());
        std::process::exit(1);
    }
}
