mod config;
mod server;
mod settings;
mod snapshot;

use anyhow::Result;
use config::parse_args;
use kubesonde_graph::{Explorer, SeededPalette};
use std::path::PathBuf;

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = parse_args()?;

    let mut settings = settings::load_or_default();
    if let Some(seed) = args.seed {
        settings.palette_seed = seed;
    }
    if let Some(socket) = &args.socket {
        settings.socket_path = socket.display().to_string();
    }
    tracing::info!(
        socket = %settings.socket_path,
        palette_seed = settings.palette_seed,
        cleanup = settings.cleanup && !args.raw,
        show_denied = settings.show_denied,
        "settings loaded"
    );
    if args.save_settings {
        settings::save(&settings)?;
        tracing::info!("settings saved");
    }

    let output = snapshot::load_snapshot(&args.snapshot)?;
    let (graph, ports) = snapshot::build_graph(&output, settings.cleanup && !args.raw);
    let palette = SeededPalette::new(settings.palette_seed);
    let explorer = Explorer::new(graph, &palette)
        .with_show_denied(settings.show_denied)
        .with_ports(ports);

    if args.once {
        println!("{}", serde_json::to_string_pretty(&explorer.report())?);
        return Ok(());
    }

    let sock_path = PathBuf::from(&settings.socket_path);
    // Clean stale socket
    let _ = std::fs::remove_file(&sock_path);
    server::run(&sock_path, explorer).await
}
