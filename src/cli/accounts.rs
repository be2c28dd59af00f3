use comfy_table::Table;

use crate::db::{add_account, get_connection, init_db, list_accounts};
use crate::error::Result;
use crate::settings::get_data_dir;

pub fn add(
    name: &str,
    account_type: &str,
    institution: Option<&str>,
    last_four: Option<&str>,
) -> Result<()> {
    let conn = get_connection(&get_data_dir().join("milo.db"))?;
    init_db(&conn)?;
    add_account(&conn, name, account_type, institution, last_four)?;
    println!("Added account '{name}' ({account_type})");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("milo.db"))?;
    init_db(&conn)?;
    let accounts = list_accounts(&conn)?;
    if accounts.is_empty() {
        println!("No accounts yet. Add one with `milo accounts add <name>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Name", "Type", "Institution", "Last 4"]);
    for account in accounts {
        table.add_row(vec![
            account.name,
            account.account_type,
            account.institution.unwrap_or_default(),
            account.last_four.unwrap_or_default(),
        ]);
    }
    println!("{table}");
    Ok(())
}
