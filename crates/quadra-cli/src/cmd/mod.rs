pub mod config;
pub mod init;
pub mod invite;
pub mod member;
pub mod serve;

use anyhow::Context;
use quadra_core::config::Config;
use quadra_core::db::RosterDb;
use std::path::Path;

/// Load the club config and open its roster database.
pub(crate) fn open_store(root: &Path) -> anyhow::Result<(Config, RosterDb)> {
    let config = Config::load(root).context("failed to load config")?;
    let db = RosterDb::open_for(root, &config).with_context(|| {
        format!(
            "failed to open roster database at {}",
            config.db_path(root).display()
        )
    })?;
    Ok((config, db))
}
