//! `courier status`: what the relay would resume with.

use std::path::Path;

use {
    anyhow::Result,
    courier_config::CourierConfig,
    courier_routing::{PersistedState, RoutingStore},
};

use crate::settings;

pub async fn handle_status(config: &CourierConfig, data_dir: Option<&Path>) -> Result<()> {
    let Some(path) = settings::database_path(config, data_dir) else {
        println!("storage: in-memory (nothing persisted)");
        return Ok(());
    };
    if !path.exists() {
        println!("storage: {} (not created yet)", path.display());
        return Ok(());
    }

    let store = settings::open_store(config, data_dir).await?;
    let state = store.load().await?;
    let forwards = store.forward_count().await?;
    println!("storage: {}", path.display());
    print!("{}", render(&state, forwards));
    Ok(())
}

fn render(state: &PersistedState, forwards: u64) -> String {
    let availability = if state.admin_available {
        "available"
    } else {
        "away"
    };
    format!("admin: {availability}\ntracked forwards: {forwards}\n")
}
