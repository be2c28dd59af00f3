use std::path::PathBuf;

use colored::Colorize;

use crate::db::{category_id_by_name, get_connection, init_db};
use crate::detect::DateFormat;
use crate::error::{MiloError, Result};
use crate::importer::{import_file, ImportOptions};
use crate::settings::get_data_dir;

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: &str,
    account: &str,
    date_format: Option<&str>,
    default_category: Option<&str>,
    no_header: bool,
    columns: Option<&str>,
    dry_run: bool,
) -> Result<()> {
    let file_path = PathBuf::from(file);
    let conn = get_connection(&get_data_dir().join("milo.db"))?;
    init_db(&conn)?;

    // --date-format beats the settings default, which itself defaults to auto.
    let key = match date_format {
        Some(key) => key.to_string(),
        None => crate::settings::load_settings().date_format,
    };
    let format = DateFormat::from_key(&key)
        .ok_or_else(|| MiloError::UnknownDateFormat(key.clone()))?;

    let default_category_id = match default_category {
        Some(name) => Some(
            category_id_by_name(&conn, name)?
                .ok_or_else(|| MiloError::UnknownCategory(name.to_string()))?,
        ),
        None => None,
    };

    let options = ImportOptions {
        target_account_id: None, // resolved from the account name inside import_file
        default_category_id,
        date_format: format,
        skip_header_row: !no_header,
        synthetic_headers: columns
            .map(|c| c.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default(),
        dry_run,
    };

    let outcome = import_file(&conn, &file_path, account, &options)?;
    if outcome.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    let result = outcome.result;
    if dry_run {
        println!("{}", "Dry run: nothing was written.".yellow());
    }
    println!(
        "{} imported ({} net), {} skipped (duplicates), {} failed",
        result.imported,
        crate::fmt::money(result.net_imported),
        result.duplicates,
        result.failed
    );

    // The same warning can fire on every row; show each distinct one once.
    let mut seen = std::collections::HashSet::new();
    for warning in &result.warnings {
        if !seen.insert((warning.field.clone(), warning.message.clone())) {
            continue;
        }
        println!(
            "{} {}: {}",
            "warning".yellow(),
            warning.field,
            warning.message
        );
    }
    for error in &result.errors {
        let raw = if error.raw_value.is_empty() {
            String::new()
        } else {
            format!(" ('{}')", error.raw_value)
        };
        println!(
            "{} row {}, {}{}: {}",
            "error".red(),
            error.row,
            error.field,
            raw,
            error.message
        );
    }

    if !result.success() {
        println!("{}", "Some rows failed; fix the file or mapping and re-import.".red());
    }
    Ok(())
}
