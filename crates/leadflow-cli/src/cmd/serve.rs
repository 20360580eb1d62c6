use std::path::Path;
use std::sync::Arc;

use completion_client::{CompletionBackend, ScriptedBackend};
use leadflow_core::store::{MemoryStore, Store};
use leadflow_server::AppState;

use super::{completion_client, connect_store, load_config};

/// Canned reply used in memory mode when no API key is configured.
const OFFLINE_REPLY: &str = r#"{"messages":["Olá! Posso te mostrar como funciona em 5 minutos?","Oi! Vi seu interesse e separei um material rápido. Quer receber?","Olá, tudo bem? Que tal conversarmos sobre o que você precisa?"]}"#;

pub fn run(
    config_path: &Path,
    host: Option<String>,
    port: Option<u16>,
    memory: bool,
    seed: bool,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let store: Arc<dyn Store> = if memory {
            let store = MemoryStore::new();
            if seed {
                let ids = leadflow_core::demo::seed(&store).await?;
                println!("Demo workspace {}", ids.workspace_id);
                for (name, id) in &ids.stage_ids {
                    println!("  stage {name}: {id}");
                }
            }
            Arc::new(store)
        } else {
            let store = connect_store(&config).await?;
            store.migrate().await?;
            Arc::new(store)
        };

        let backend: Arc<dyn CompletionBackend> = match completion_client(&config) {
            Ok(client) => client,
            Err(e) if memory => {
                tracing::warn!(error = %e, "using canned replies for message generation");
                Arc::new(ScriptedBackend::always(OFFLINE_REPLY).without_recording())
            }
            Err(e) => return Err(e),
        };

        let state = AppState::new(store, backend, config.completion.generation_settings());
        let listener = tokio::net::TcpListener::bind(format!("{host}:{port}")).await?;
        println!("leadflow API → http://{}", listener.local_addr()?);

        tokio::select! {
            res = leadflow_server::serve_on(state, listener) => res,
            _ = tokio::signal::ctrl_c() => Ok(()),
        }
    })
}
