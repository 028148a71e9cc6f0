use anyhow::Context;
use quadra_core::{config::Config, db::RosterDb, io, paths};
use std::path::Path;

use crate::output::print_json;

pub fn run(root: &Path, club: Option<&str>, json: bool) -> anyhow::Result<()> {
    let club_name = club.map(str::to_string).unwrap_or_else(|| {
        root.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "club".to_string())
    });

    if !json {
        println!("Initializing quadra in: {}", root.display());
    }

    let dir = paths::quadra_dir(root);
    io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = paths::config_path(root);
    let created_config = !config_path.exists();
    let config = if created_config {
        let cfg = Config::new(&club_name);
        cfg.save(root).context("failed to write config.yaml")?;
        cfg
    } else {
        Config::load(root).context("failed to load existing config.yaml")?
    };

    let db_path = config.db_path(root);
    let created_db = !db_path.exists();
    RosterDb::open_for(root, &config)
        .with_context(|| format!("failed to create {}", db_path.display()))?;

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "club": config.club.name,
            "config_created": created_config,
            "database_created": created_db,
        }))?;
        return Ok(());
    }

    let mark = |created: bool| if created { "created:" } else { "exists: " };
    println!("  {} {}", mark(created_config), paths::CONFIG_FILE);
    println!("  {} {}", mark(created_db), db_path.display());
    println!("\nClub: {}", config.club.name);
    println!("Next: quadra invite create --team <id> --team-name <name> --email <email> --role <role>");
    Ok(())
}
