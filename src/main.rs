use color_eyre::Result;
use std::path::PathBuf;
use tenfoot::focus::graph::{FocusGraph, NodeKey, ScopeId};
use tenfoot::focus::list::ListGraph;
use tenfoot::router::{KeySink, SyntheticKeyEvent};
use tenfoot::{NavError, NavigatorHandle, NavigatorSettings};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Logs every synthetic key instead of handing it to a UI
struct TracingSink;

impl KeySink for TracingSink {
    fn dispatch(&mut self, event: &SyntheticKeyEvent) {
        info!(
            "{:?} {} (code {}) -> {:?}",
            event.phase, event.key, event.code, event.target
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    let settings = load_settings(std::env::args().nth(1).map(PathBuf::from))?;
    let graph = demo_graph()?;

    let handle = NavigatorHandle::spawn_with_gilrs(settings, graph, TracingSink)?;
    let mut mode = handle.mode();
    info!("Navigator running in {} mode, press Ctrl-C to stop", *mode.borrow());

    loop {
        tokio::select! {
            changed = mode.changed() => {
                if changed.is_err() {
                    warn!("Navigator stopped on its own");
                    break;
                }
                let current = *mode.borrow_and_update();
                info!("Input mode: {} (body class {})", current, current.body_class());
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl-C received");
                break;
            }
        }
    }

    handle.shutdown().await?;
    Ok(())
}

fn load_settings(path: Option<PathBuf>) -> Result<NavigatorSettings, NavError> {
    let settings = match path {
        Some(path) => {
            info!("Loading settings from {}", path.display());
            NavigatorSettings::load_or_default(&path)?
        }
        None => NavigatorSettings::load_default()?,
    };
    Ok(settings)
}

fn demo_graph() -> Result<ListGraph> {
    let mut graph = ListGraph::new();
    for key in ["home", "library", "downloads", "settings"] {
        graph.register_node(NodeKey::from(key), ScopeId::root())?;
    }
    info!("Demo graph with {} nodes", graph.len());
    Ok(graph)
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
