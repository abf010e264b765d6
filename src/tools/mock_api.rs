//! Local stand-in for the Appwrite REST API, used by the tool tests.
//!
//! One thread accepts connections on 127.0.0.1, reads a single request per
//! connection, logs it as `"METHOD /path"` (the `/v1` prefix stripped) and
//! answers with whatever the route closure returns. Every response carries
//! `Connection: close`.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use url::Url;

use crate::appwrite::Client;
use crate::config::parse_endpoint;

pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: String::new(),
        }
    }

    pub fn conflict() -> Self {
        Self {
            status: 409,
            body: r#"{"message":"Resource already exists","code":409,"type":"resource_already_exists"}"#
                .to_string(),
        }
    }

    pub fn error(status: u16) -> Self {
        Self {
            status,
            body: format!(r#"{{"message":"server error","code":{status},"type":"general_unknown"}}"#),
        }
    }
}

/// One recorded request.
#[derive(Debug, Clone)]
pub struct Request {
    pub line: String,
    pub body: String,
}

pub struct MockApi {
    pub endpoint: Url,
    log: Arc<Mutex<Vec<Request>>>,
}

impl MockApi {
    /// `route(&"METHOD /path", body)` decides every answer.
    pub fn start<F>(route: F) -> Self
    where
        F: FnMut(&str, &str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::clone(&log);

        thread::spawn(move || {
            let mut route = route;
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                serve(stream, &shared, &mut route);
            }
        });

        Self {
            endpoint: parse_endpoint(&format!("http://127.0.0.1:{port}/v1")).unwrap(),
            log,
        }
    }

    pub fn client(&self) -> Client {
        Client::new(&self.endpoint, "demo", "secret").unwrap()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    /// Request lines only, in arrival order.
    pub fn lines(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.line).collect()
    }
}

fn serve<F>(stream: TcpStream, log: &Mutex<Vec<Request>>, route: &mut F)
where
    F: FnMut(&str, &str) -> Reply,
{
    let mut reader = BufReader::new(stream);
    let mut first = String::new();
    if reader.read_line(&mut first).unwrap_or(0) == 0 {
        return;
    }
    let mut parts = first.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default();
    let path = target.strip_prefix("/v1").unwrap_or(target).to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap_or(0) == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body).is_err() {
        return;
    }
    let body = String::from_utf8_lossy(&body).into_owned();

    let line = format!("{method} {path}");
    let reply = route(&line, &body);
    log.lock().unwrap().push(Request { line, body });

    let response = format!(
        "HTTP/1.1 {} MOCK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        reply.status,
        reply.body.len(),
        reply.body
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
