// src/protocol.rs

//! RESP2 framing.
//!
//! Requests arrive either as a RESP array of bulk strings
//! (`*2\r\n$3\r\nGET\r\n$1\r\nk\r\n`) or as one inline line split on
//! whitespace (`GET k\r\n`). Replies are rendered from [`Reply`].

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Largest bulk argument accepted from a client.
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;
/// Largest number of arguments in one request.
pub const MAX_ARGS: usize = 1024 * 1024;
/// Longest header or inline line, terminator included.
pub const MAX_LINE_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Null,
    Status(String),
    Error(String),
    Integer(i64),
    Bulk(Vec<u8>),
    Array(Vec<Reply>),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Status("OK".into())
    }

    pub fn from_bool(b: bool) -> Self {
        Reply::Integer(b as i64)
    }

    /// Floats travel as bulk strings, like Redis does for INCRBYFLOAT.
    pub fn from_f64(f: f64) -> Self {
        Reply::Bulk(f.to_string().into_bytes())
    }

    pub fn from_bytes_list(items: Vec<Vec<u8>>) -> Self {
        Reply::Array(items.into_iter().map(Reply::Bulk).collect())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Reply::Null => out.extend_from_slice(b"$-1\r\n"),
            Reply::Status(s) => {
                out.push(b'+');
                out.extend_from_slice(single_line(s).as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Error(s) => {
                out.push(b'-');
                out.extend_from_slice(single_line(s).as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Integer(n) => {
                out.extend_from_slice(format!(":{}\r\n", n).as_bytes());
            }
            Reply::Bulk(b) => {
                out.extend_from_slice(format!("${}\r\n", b.len()).as_bytes());
                out.extend_from_slice(b);
                out.extend_from_slice(b"\r\n");
            }
            Reply::Array(items) => {
                out.extend_from_slice(format!("*{}\r\n", items.len()).as_bytes());
                for item in items {
                    item.write_to(out);
                }
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }
}

// status and error lines must not break the framing
fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

/// Read one request. `Ok(None)` means the peer closed the connection cleanly
/// before sending anything; an empty `Vec` is a blank inline line.
pub async fn read_request<R>(reader: &mut R) -> Result<Option<Vec<Vec<u8>>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    if read_line(reader, &mut line).await? == 0 {
        return Ok(None);
    }
    trim_crlf(&mut line);

    if line.first() != Some(&b'*') {
        return Ok(Some(
            line.split(|b| b.is_ascii_whitespace())
                .filter(|part| !part.is_empty())
                .map(|part| part.to_vec())
                .collect(),
        ));
    }

    let count = parse_len(&line[1..]).context("invalid multibulk length")?;
    if count > MAX_ARGS {
        bail!("too many arguments: {}", count);
    }

    // `count` is client-supplied
    let mut args = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        line.clear();
        if read_line(reader, &mut line).await? == 0 {
            bail!("connection closed mid-request");
        }
        trim_crlf(&mut line);
        if line.first() != Some(&b'$') {
            bail!("expected '$', got {:?}", String::from_utf8_lossy(&line));
        }
        let len = parse_len(&line[1..]).context("invalid bulk length")?;
        if len > MAX_BULK_LEN {
            bail!("bulk argument too large: {}", len);
        }

        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).await?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await?;
        if &crlf != b"\r\n" {
            bail!("bulk argument not terminated by CRLF");
        }
        args.push(buf);
    }
    Ok(Some(args))
}

/// `read_until(b'\n')` capped at [`MAX_LINE_LEN`] bytes.
async fn read_line<R>(reader: &mut R, line: &mut Vec<u8>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let n = (&mut *reader)
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', line)
        .await?;
    if n == MAX_LINE_LEN && line.last() != Some(&b'\n') {
        bail!("line longer than {} bytes", MAX_LINE_LEN);
    }
    Ok(n)
}

fn trim_crlf(line: &mut Vec<u8>) {
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
}

fn parse_len(digits: &[u8]) -> Result<usize> {
    let s = std::str::from_utf8(digits)?;
    Ok(s.trim().parse::<usize>()?)
}
