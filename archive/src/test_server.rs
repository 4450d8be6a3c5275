//! Minimal HTTP/1.1 server for exercising the archive client offline.
//!
//! Each connection carries one request; the handler sees the method, the
//! request target and the body, and answers with a canned response.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Debug, Clone)]
pub(crate) struct StubRequest {
    pub method: String,
    /// Path and query string
    pub target: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub(crate) struct StubResponse {
    pub status: u16,
    pub body: Vec<u8>,
    /// Content-Length to announce instead of the real body length
    pub declared_length: Option<usize>,
}

impl StubResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
            declared_length: None,
        }
    }

    /// Announce `declared` bytes but send only `body`, then hang up.
    pub fn truncated(body: impl Into<Vec<u8>>, declared: usize) -> Self {
        Self {
            declared_length: Some(declared),
            ..Self::ok(body)
        }
    }
}

pub(crate) struct StubServer {
    base_url: String,
    requests: Arc<Mutex<Vec<StubRequest>>>,
}

impl StubServer {
    /// Serve on an ephemeral localhost port until the test process exits.
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&StubRequest) -> StubResponse + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                serve(stream, &handler, &log);
            }
        });

        Self { base_url, requests }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve<F>(stream: TcpStream, handler: &F, log: &Mutex<Vec<StubRequest>>) -> Option<()>
where
    F: Fn(&StubRequest) -> StubResponse,
{
    let mut reader = BufReader::new(stream.try_clone().ok()?);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut content_length = 0;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    let request = StubRequest {
        method,
        target,
        body: String::from_utf8_lossy(&body).into_owned(),
    };

    let response = handler(&request);
    log.lock().unwrap().push(request);
    let mut stream = stream;
    let header = format!(
        "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        response.declared_length.unwrap_or(response.body.len())
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(&response.body);
    let _ = stream.flush();

    Some(())
}
