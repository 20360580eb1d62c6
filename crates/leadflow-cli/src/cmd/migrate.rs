use std::path::Path;

use super::{connect_store, load_config};

pub fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let store = connect_store(&config).await?;
        store.migrate().await?;
        println!("Migrations applied.");
        Ok(())
    })
}
