use comfy_table::Table;

use crate::detect::detect;
use crate::error::Result;
use crate::mapping::{resolve_mapping, Field};
use crate::raw::RawTable;

pub fn run(file: &str) -> Result<()> {
    let bytes = std::fs::read(file)?;
    let table = RawTable::parse(&bytes)?;
    let (mapping, source) = resolve_mapping(table.headers(), None);

    let mut out = Table::new();
    out.set_header(vec!["Field", "Column"]);
    for field in Field::ALL {
        let header = mapping.get(field).unwrap_or("(unmapped)");
        out.add_row(vec![field.key(), header]);
    }
    println!("{out}");
    println!("Resolved via {} matching", source.label());

    if let Some(header) = mapping.get(Field::Date) {
        let samples: Vec<&str> = table.column(header).into_iter().take(20).collect();
        let detection = detect(&samples);
        println!(
            "Date format looks like {} (confidence {:.0}%)",
            detection.format.key(),
            detection.confidence * 100.0
        );
    }
    Ok(())
}
