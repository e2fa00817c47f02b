// tests/integration_server.rs

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crabds::{server, Ds};

async fn start() -> Result<(String, oneshot::Sender<()>, tokio::task::JoinHandle<Result<()>>)> {
    let db = sled::Config::new().temporary(true).open()?;
    let ds = Arc::new(Ds::new(db));
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::serve(listener, ds, async {
        let _ = rx.await;
    }));
    Ok((addr, tx, handle))
}

async fn read_line(reader: &mut BufReader<TcpStream>) -> Result<String> {
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    Ok(line)
}

#[tokio::test]
async fn resp_round_trip_over_tcp() -> Result<()> {
    let (addr, tx, handle) = start().await?;
    let mut conn = BufReader::new(TcpStream::connect(&addr).await?);

    conn.get_mut().write_all(b"*1\r\n$4\r\nPING\r\n").await?;
    assert_eq!(read_line(&mut conn).await?, "+PONG\r\n");

    conn.get_mut()
        .write_all(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$2\r\nv1\r\n")
        .await?;
    assert_eq!(read_line(&mut conn).await?, "+OK\r\n");

    conn.get_mut().write_all(b"APPEND k v2\r\n").await?;
    assert_eq!(read_line(&mut conn).await?, ":4\r\n");

    conn.get_mut().write_all(b"GET k\r\n").await?;
    assert_eq!(read_line(&mut conn).await?, "$4\r\n");
    assert_eq!(read_line(&mut conn).await?, "v1v2\r\n");

    conn.get_mut().write_all(b"TYPE missing\r\n").await?;
    assert_eq!(read_line(&mut conn).await?, "$-1\r\n");

    conn.get_mut().write_all(b"BOGUS\r\n").await?;
    assert!(read_line(&mut conn).await?.starts_with("-ERR unknown command"));

    conn.get_mut().write_all(b"QUIT\r\n").await?;
    assert_eq!(read_line(&mut conn).await?, "+OK\r\n");
    let mut rest = Vec::new();
    conn.read_to_end(&mut rest).await?;
    assert!(rest.is_empty());

    tx.send(()).ok();
    handle.await??;
    Ok(())
}

#[tokio::test]
async fn connections_share_one_service() -> Result<()> {
    let (addr, tx, handle) = start().await?;
    let mut a = BufReader::new(TcpStream::connect(&addr).await?);
    let mut b = BufReader::new(TcpStream::connect(&addr).await?);

    a.get_mut().write_all(b"SADD s x\r\n").await?;
    assert_eq!(read_line(&mut a).await?, ":1\r\n");
    b.get_mut().write_all(b"SADD s x\r\n").await?;
    assert_eq!(read_line(&mut b).await?, ":0\r\n");
    b.get_mut().write_all(b"SCARD s\r\n").await?;
    assert_eq!(read_line(&mut b).await?, ":1\r\n");

    tx.send(()).ok();
    handle.await??;
    Ok(())
}
