// src/server.rs
//! Network layer:
//! - listen on TCP
//! - one task per connection, all sharing one `Arc<Ds>`
//! - decode requests (RESP array or inline text)
//! - dispatch to `engine::execute` and write the rendered reply
use anyhow::Result;
use std::future::Future;
use std::io::ErrorKind;
use std::sync::Arc;

use tokio::{
    io::{AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, error, info, warn};

use crate::engine::{self, KvEngine};
use crate::protocol::{self, Reply};
use crate::types::Ds;

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn run<E, F>(addr: &str, ds: Arc<Ds<E>>, shutdown: F) -> Result<()>
where
    E: KvEngine + 'static,
    F: Future<Output = ()>,
{
    let listener = TcpListener::bind(addr).await?;
    info!("crabds listening on {}", listener.local_addr()?);
    serve(listener, ds, shutdown).await
}

/// Accept loop: spawn a task per connection until `shutdown` resolves.
pub async fn serve<E, F>(listener: TcpListener, ds: Arc<Ds<E>>, shutdown: F) -> Result<()>
where
    E: KvEngine + 'static,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutting down listener");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                debug!("Accepted connection from {}", peer);
                let ds = Arc::clone(&ds);
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, ds).await {
                        error!("Connection error from {}: {:#}", peer, err);
                    }
                });
            }
        }
    }
}

async fn handle_connection<E: KvEngine>(stream: TcpStream, ds: Arc<Ds<E>>) -> Result<()> {
    let peer = stream.peer_addr()?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut out = Vec::with_capacity(256);

    loop {
        let parts = match protocol::read_request(&mut reader).await {
            Ok(Some(parts)) => parts,
            Ok(None) => break,
            Err(e) if is_disconnect(&e) => break,
            Err(e) => {
                warn!("protocol error from {}: {:#}", peer, e);
                let reply = Reply::Error(format!("ERR Protocol error: {}", e));
                writer.write_all(&reply.to_bytes()).await?;
                break;
            }
        };
        if parts.is_empty() {
            continue;
        }

        let quit = engine::command_name(&parts).as_deref() == Some("quit");
        let reply = engine::execute(&ds, &parts);

        out.clear();
        reply.write_to(&mut out);
        writer.write_all(&out).await?;
        if quit {
            break;
        }
    }

    debug!("{} disconnected", peer);
    Ok(())
}

fn is_disconnect(err: &anyhow::Error) -> bool {
    err.downcast_ref::<std::io::Error>().is_some_and(|e| {
        matches!(
            e.kind(),
            ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::BrokenPipe
        )
    })
}
