use comfy_table::Table;

use crate::error::Result;
use crate::raw::RawTable;

pub fn run(file: &str, rows: usize) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let table = RawTable::parse(&bytes)?;

    let mut out = Table::new();
    out.set_header(table.headers().to_vec());
    for row in table.rows().iter().take(rows) {
        out.add_row(row.clone());
    }
    println!("{out}");
    println!(
        "{} rows total, showing {}",
        table.row_count(),
        table.row_count().min(rows)
    );
    Ok(())
}
