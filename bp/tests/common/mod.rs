//! Shared helpers for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// A request as seen by the canned server
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

/// Local HTTP server answering each connection with the next scripted response
pub struct CannedServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl CannedServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let request = read_request(&mut stream).await;
                recorded.lock().unwrap().push(request);

                let reason = if status < 400 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self { addr, requests }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> RecordedRequest {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_string();
        let length = content_length(&head);
        let body_start = end + 4;
        if buf.len() >= body_start + length {
            let path = head.split_whitespace().nth(1).unwrap_or_default().to_string();
            let body = String::from_utf8_lossy(&buf[body_start..body_start + length]).to_string();
            return RecordedRequest { path, body };
        }
    }

    RecordedRequest {
        path: String::new(),
        body: String::new(),
    }
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

pub fn plan_body() -> String {
    serde_json::json!({
        "success": true,
        "plan": {
            "research_queries": ["office coffee spend", "competitor subscriptions"],
            "analysis_focus": ["pricing", "logistics"],
            "output_files": ["pain_points.md", "roadmap.md", "strategy.md"]
        }
    })
    .to_string()
}

pub fn documents_body() -> String {
    serde_json::json!({
        "success": true,
        "documents": [
            {"filename": "pain_points.md", "content": "# Pain points\n- stale coffee"},
            {"filename": "roadmap.md", "content": "# Roadmap\n1. pilot"}
        ],
        "result": "ignored",
        "message": "Analysis saved"
    })
    .to_string()
}

pub fn failure_body(error: &str) -> String {
    serde_json::json!({"success": false, "error": error}).to_string()
}

/// A port nothing listens on
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("local addr").port()
}
