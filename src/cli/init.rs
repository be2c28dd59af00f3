use std::path::PathBuf;

use colored::Colorize;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    // MILO_DATA_DIR wins and is never persisted, so scripted and test runs
    // do not touch the user's settings.json.
    if let Ok(env_dir) = std::env::var("MILO_DATA_DIR") {
        if !env_dir.is_empty() {
            return init_at(&PathBuf::from(env_dir));
        }
    }

    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }
    let dir = PathBuf::from(&settings.data_dir);
    init_at(&dir)?;
    save_settings(&settings)?;
    Ok(())
}

fn init_at(dir: &PathBuf) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let conn = get_connection(&dir.join("milo.db"))?;
    init_db(&conn)?;
    println!("{} {}", "Initialized Milo data in".green(), dir.display());
    println!("Next: add an account with `milo accounts add <name>`, then `milo import`.");
    Ok(())
}
