//! Minimal NNTP posting client used by the feed worker
//!
//! One connection per delivery: connect, read the greeting, POST, stream
//! the article dot-stuffed, confirm, QUIT. Peers that refuse any step
//! produce an `UnexpectedResponse` with the offending status line.

use std::fmt;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::codec::CRLF;
use crate::storage::Article;

#[derive(Debug)]
pub enum FeedError {
    Io(std::io::Error),
    /// The peer answered a step of the posting exchange with a status
    /// outside the accepted class.
    UnexpectedResponse(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "i/o error: {e}"),
            Self::UnexpectedResponse(line) => write!(f, "unexpected peer response: {line}"),
        }
    }
}

impl std::error::Error for FeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::UnexpectedResponse(_) => None,
        }
    }
}

impl From<std::io::Error> for FeedError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Push a single article to `host:port` over a fresh connection.
pub async fn push_article(article: &Article, host: &str, port: u16) -> Result<(), FeedError> {
    let stream = TcpStream::connect((host, port)).await?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let greeting = read_status(&mut reader).await?;
    expect_class(&greeting, b'2')?;
    debug!("peer {}:{} greeted: {}", host, port, greeting);

    write_half.write_all(b"POST\r\n").await?;
    let ready = read_status(&mut reader).await?;
    expect_code(&ready, "340")?;

    let mut payload = Vec::new();
    for line in article.wire_lines() {
        if line.starts_with('.') {
            payload.push(b'.');
        }
        payload.extend_from_slice(line.as_bytes());
        payload.extend_from_slice(CRLF);
    }
    payload.extend_from_slice(b".\r\n");
    write_half.write_all(&payload).await?;

    let accepted = read_status(&mut reader).await?;
    expect_code(&accepted, "240")?;

    write_half.write_all(b"QUIT\r\n").await?;
    // Response to QUIT is not required for a completed transfer.
    let _ = read_status(&mut reader).await;
    Ok(())
}

async fn read_status(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>) -> Result<String, FeedError> {
    let mut line = String::new();
    let n = reader.read_line(&mut line).await?;
    if n == 0 {
        return Err(FeedError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "peer closed connection",
        )));
    }
    Ok(line.trim_end().to_string())
}

fn expect_class(line: &str, class: u8) -> Result<(), FeedError> {
    if line.as_bytes().first() == Some(&class) {
        Ok(())
    } else {
        Err(FeedError::UnexpectedResponse(line.to_string()))
    }
}

fn expect_code(line: &str, code: &str) -> Result<(), FeedError> {
    if line.starts_with(code) {
        Ok(())
    } else {
        Err(FeedError::UnexpectedResponse(line.to_string()))
    }
}
