use comfy_table::Table;

use crate::db::{get_connection, init_db, list_categories};
use crate::error::Result;
use crate::settings::get_data_dir;

pub fn list() -> Result<()> {
    let conn = get_connection(&get_data_dir().join("milo.db"))?;
    init_db(&conn)?;
    let categories = list_categories(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["Name", "Type", "Description"]);
    for category in categories {
        table.add_row(vec![
            category.name,
            category.category_type,
            category.description.unwrap_or_default(),
        ]);
    }
    println!("{table}");
    Ok(())
}
