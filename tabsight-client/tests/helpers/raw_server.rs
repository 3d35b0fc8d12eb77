//! Hand-written HTTP replies the mock service cannot produce

use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Headers promise 200 bytes; far fewer arrive before the connection closes
const TRUNCATED_REPLY: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: application/json\r\n\
Content-Length: 200\r\n\
\r\n\
{\"directory\":";

/// Serve one request at `path` with a 200 whose body is cut short
pub async fn truncated_reply_url(path: &str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            read_request(&mut socket).await;
            let _ = socket.write_all(TRUNCATED_REPLY).await;
            let _ = socket.shutdown().await;
        }
    });

    Url::parse(&format!("http://{}{}", addr, path)).unwrap()
}

/// Consume the whole request so the client finishes sending before the reply
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let body = &buf[head_end + 4..];

        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());

        match content_length {
            Some(len) if body.len() >= len => return,
            Some(_) => continue,
            None if body.ends_with(b"0\r\n\r\n") => return,
            None => continue,
        }
    }
}
