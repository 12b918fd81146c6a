use anyhow::{Context, Result};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use kubesonde_core::Msg;
use kubesonde_graph::Explorer;
use std::path::Path;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

type Transport = Framed<UnixStream, LengthDelimitedCodec>;

/// Accepts clients forever. Each connection explores its own copy of the
/// session, so one client's filters never leak into another's view.
pub async fn run(sock_path: &Path, explorer: Explorer) -> Result<()> {
    let listener = UnixListener::bind(sock_path)
        .with_context(|| format!("failed to bind {}", sock_path.display()))?;
    tracing::info!(path = %sock_path.display(), "kubesonde-agent listening");

    loop {
        let (stream, _addr) = listener.accept().await?;
        let explorer = explorer.clone();
        tokio::spawn(async move {
            if let Err(err) = serve_client(stream, explorer).await {
                tracing::warn!(error = %err, "client session failed");
            }
        });
    }
}

async fn send(framed: &mut Transport, msg: &Msg) -> Result<()> {
    let payload = Bytes::from(serde_json::to_vec(msg)?);
    framed.send(payload).await?;
    Ok(())
}

async fn serve_client(stream: UnixStream, mut explorer: Explorer) -> Result<()> {
    tracing::info!("client connected");
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
    let hello = Msg::Hello {
        version: env!("CARGO_PKG_VERSION").into(),
    };
    send(&mut framed, &hello).await?;

    while let Some(frame) = framed.next().await {
        let bytes = frame.context("failed to read frame")?;
        let msg: Msg = match serde_json::from_slice(&bytes) {
            Ok(msg) => msg,
            Err(err) => {
                tracing::warn!(error = %err, "dropping undecodable frame");
                let reply = Msg::Error {
                    message: format!("undecodable message: {err}"),
                };
                send(&mut framed, &reply).await?;
                continue;
            }
        };
        if let Some(reply) = handle(&mut explorer, msg) {
            send(&mut framed, &reply).await?;
        }
    }

    tracing::info!("client disconnected");
    Ok(())
}

fn view(explorer: &Explorer) -> Msg {
    Msg::View {
        report: Box::new(explorer.report()),
    }
}

/// Reply to one client message, if it warrants one.
pub fn handle(explorer: &mut Explorer, msg: Msg) -> Option<Msg> {
    match msg {
        Msg::Hello { version } => {
            tracing::debug!(%version, "client hello");
            Some(view(explorer))
        }
        Msg::RequestSnapshot => Some(Msg::Snapshot {
            graph: explorer.canonical().clone(),
        }),
        Msg::RequestPorts => Some(Msg::Ports {
            report: Box::new(explorer.ports_report().clone()),
        }),
        Msg::Command { command } => match explorer.apply(&command) {
            Ok(()) => Some(view(explorer)),
            Err(err) => Some(Msg::Error {
                message: err.to_string(),
            }),
        },
        Msg::Ping => Some(Msg::Pong),
        Msg::Snapshot { .. }
        | Msg::Ports { .. }
        | Msg::View { .. }
        | Msg::Error { .. }
        | Msg::Pong => {
            tracing::warn!("ignoring agent-to-client message sent by a client");
            None
        }
    }
}
