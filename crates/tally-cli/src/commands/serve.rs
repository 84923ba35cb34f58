//! Web server command

use std::path::Path;

use anyhow::Result;
use tally_server::ServerConfig;

use super::core::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<()> {
    let db = open_db(db_path)?;
    let config = ServerConfig::from_env();

    tally_server::serve(db, host, port, config).await
}
