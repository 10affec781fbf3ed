//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed map of paths to responses. Each route can return a body,
//! a status code, a body after a delay, or hang without answering. Unknown
//! paths get 404. The query string is ignored for routing but recorded.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Route {
    Body(Vec<u8>),
    Status(u16),
    Delayed(Duration, Vec<u8>),
    /// Accept the request and never answer (up to 30 s).
    Hang,
}

impl Route {
    pub fn text(s: &str) -> Self {
        Route::Body(s.as_bytes().to_vec())
    }
}

pub struct SegmentServer {
    /// e.g. "http://127.0.0.1:12345"
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl SegmentServer {
    /// Requests received so far (any path).
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request targets (path + query) in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start(routes: HashMap<String, Route>) -> SegmentServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(routes);
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    {
        let hits = Arc::clone(&hits);
        let requests = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&hits);
                let requests = Arc::clone(&requests);
                thread::spawn(move || handle(stream, &routes, &hits, &requests));
            }
        });
    }
    SegmentServer {
        base_url: format!("http://127.0.0.1:{}", port),
        hits,
        requests,
    }
}

/// Builds a route map from `(path, route)` pairs.
pub fn routes<I, S>(pairs: I) -> HashMap<String, Route>
where
    I: IntoIterator<Item = (S, Route)>,
    S: Into<String>,
{
    pairs.into_iter().map(|(p, r)| (p.into(), r)).collect()
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    hits: &AtomicUsize,
    requests: &Mutex<Vec<String>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    hits.fetch_add(1, Ordering::SeqCst);
    requests.lock().unwrap().push(target.clone());

    let path = target.split('?').next().unwrap_or("/");
    match routes.get(path) {
        Some(Route::Body(body)) => respond(&mut stream, "200 OK", body),
        Some(Route::Delayed(delay, body)) => {
            thread::sleep(*delay);
            respond(&mut stream, "200 OK", body);
        }
        Some(Route::Status(code)) => respond(&mut stream, &format!("{} Test", code), b""),
        Some(Route::Hang) => thread::sleep(Duration::from_secs(30)),
        None => respond(&mut stream, "404 Not Found", b""),
    }
}

fn respond(stream: &mut TcpStream, status: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}
