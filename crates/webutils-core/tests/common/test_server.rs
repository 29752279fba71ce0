//! Minimal HTTP/1.1 server for integration tests.
//!
//! Routes:
//! - `/ok` → 200 "OK"
//! - `/status/<code>` → that status, body "status <code>"
//! - `/slow/<ms>` → sleeps, then 200 "slow"
//! - `/flaky/<n>` → 503 for the first n hits on that path, then 200 "recovered"
//! - `/echo` → 200 with "<METHOD>\n<content-type>\n<x-test>\n<body>"
//! - `/hold/<ms>` → sleeps, then 200; used to observe concurrency
//! - `/inspect` → 200 with "<METHOD> content-length=<value or ->"
//! - `/redirect303` → 303 See Other to `/landing`
//! - `/landing` → 200 with "<METHOD> <body>"
//!
//! Tracks total hits, request lines in arrival order and the peak number of
//! requests in flight.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct Stats {
    hits: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    per_path: Mutex<HashMap<String, usize>>,
    lines: Mutex<Vec<String>>,
}

pub struct TestServer {
    base: String,
    stats: Arc<Stats>,
}

impl TestServer {
    /// Starts the server on an ephemeral port. It runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let stats = Arc::new(Stats::default());
        let accept_stats = Arc::clone(&stats);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let stats = Arc::clone(&accept_stats);
                thread::spawn(move || handle(stream, &stats));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            stats,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self) -> usize {
        self.stats.hits.load(Ordering::SeqCst)
    }

    /// "METHOD /path" for every request received, in order.
    pub fn request_lines(&self) -> Vec<String> {
        self.stats.lines.lock().unwrap().clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.stats.peak.load(Ordering::SeqCst)
    }
}

/// A URL on a port nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/", port)
}

struct Parsed {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

fn read_request(stream: &mut TcpStream) -> Option<Parsed> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((k, v)) = line.split_once(':') {
            headers.insert(k.trim().to_ascii_lowercase(), v.trim().to_string());
        }
    }
    let len: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let mut body = buf[header_end..].to_vec();
    while body.len() < len {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Some(Parsed {
        method,
        path,
        headers,
        body,
    })
}

fn handle(mut stream: TcpStream, stats: &Stats) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };
    stats.hits.fetch_add(1, Ordering::SeqCst);
    stats
        .lines
        .lock()
        .unwrap()
        .push(format!("{} {}", req.method, req.path));
    let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stats.peak.fetch_max(now, Ordering::SeqCst);

    let seen = {
        let mut per_path = stats.per_path.lock().unwrap();
        let n = per_path.entry(req.path.clone()).or_insert(0);
        *n += 1;
        *n
    };

    let (status, body) = route(&req, seen);
    stats.in_flight.fetch_sub(1, Ordering::SeqCst);

    let location = if req.path == "/redirect303" {
        "Location: /landing\r\n"
    } else {
        ""
    };
    let head = format!(
        "HTTP/1.1 {} Test\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        location,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    if req.method != "HEAD" {
        let _ = stream.write_all(&body);
    }
}

fn route(req: &Parsed, seen: usize) -> (u16, Vec<u8>) {
    let path = req.path.as_str();
    if path == "/ok" {
        return (200, b"OK".to_vec());
    }
    if path == "/echo" {
        let header = |name: &str| req.headers.get(name).cloned().unwrap_or_default();
        let mut body = format!(
            "{}\n{}\n{}\n",
            req.method,
            header("content-type"),
            header("x-test")
        )
        .into_bytes();
        body.extend_from_slice(&req.body);
        return (200, body);
    }
    if path == "/inspect" {
        let len = req
            .headers
            .get("content-length")
            .cloned()
            .unwrap_or_else(|| "-".to_string());
        return (200, format!("{} content-length={}", req.method, len).into_bytes());
    }
    if path == "/redirect303" {
        return (303, b"see other".to_vec());
    }
    if path == "/landing" {
        let mut body = format!("{} ", req.method).into_bytes();
        body.extend_from_slice(&req.body);
        return (200, body);
    }
    if let Some(code) = path.strip_prefix("/status/") {
        let code: u16 = code.parse().unwrap_or(500);
        return (code, format!("status {}", code).into_bytes());
    }
    if let Some(ms) = path.strip_prefix("/slow/") {
        thread::sleep(Duration::from_millis(ms.parse().unwrap_or(0)));
        return (200, b"slow".to_vec());
    }
    if let Some(ms) = path.strip_prefix("/hold/") {
        thread::sleep(Duration::from_millis(ms.parse().unwrap_or(0)));
        return (200, b"held".to_vec());
    }
    if let Some(n) = path.strip_prefix("/flaky/") {
        let fail_first: usize = n.parse().unwrap_or(0);
        if seen <= fail_first {
            return (503, b"unavailable".to_vec());
        }
        return (200, b"recovered".to_vec());
    }
    (404, b"not found".to_vec())
}
