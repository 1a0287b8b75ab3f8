use std::path::PathBuf;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{self, Settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let dir = data_dir
        .map(PathBuf::from)
        .unwrap_or_else(settings::get_data_dir);
    std::fs::create_dir_all(&dir)?;

    let conn = get_connection(&dir.join("tally.db"))?;
    init_db(&conn)?;

    Settings {
        data_dir: dir.to_string_lossy().to_string(),
    }
    .save()?;

    println!("Initialized tally database at {}", dir.display());
    Ok(())
}
