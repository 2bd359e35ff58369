#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

/// One request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Serve `responses` (status, JSON body) to consecutive connections, one each.
/// Returns the endpoint URL and the log of received requests.
pub fn fake_graphql_server(
    responses: Vec<(u16, serde_json::Value)>,
) -> (String, Arc<Mutex<Vec<RecordedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/graphql", listener.local_addr().unwrap());
    let log = Arc::new(Mutex::new(Vec::new()));
    let server_log = log.clone();

    thread::spawn(move || {
        for (status, body) in responses {
            let Ok((stream, _)) = listener.accept() else {
                return;
            };
            let mut reader = BufReader::new(stream);

            let mut headers = Vec::new();
            let mut content_length = 0usize;
            let mut line = String::new();
            loop {
                line.clear();
                if reader.read_line(&mut line).unwrap_or(0) == 0 {
                    break;
                }
                let trimmed = line.trim_end();
                if trimmed.is_empty() {
                    break;
                }
                if let Some((k, v)) = trimmed.split_once(':') {
                    let (k, v) = (k.trim().to_string(), v.trim().to_string());
                    if k.eq_ignore_ascii_case("content-length") {
                        content_length = v.parse().unwrap_or(0);
                    }
                    headers.push((k, v));
                }
            }

            let mut raw = vec![0u8; content_length];
            reader.read_exact(&mut raw).unwrap();
            server_log.lock().unwrap().push(RecordedRequest {
                headers,
                body: serde_json::from_slice(&raw).unwrap_or(serde_json::Value::Null),
            });

            let payload = body.to_string();
            let response = format!(
                "HTTP/1.1 {status} Fake\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{payload}",
                payload.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
    });

    (url, log)
}

pub fn card_node(id: &str, phase: &str, created_at: &str, labels: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": format!("Card {id}"),
        "created_at": created_at,
        "current_phase": { "name": phase },
        "labels": labels.iter().map(|l| serde_json::json!({ "name": l })).collect::<Vec<_>>(),
    })
}

pub fn page(
    nodes: Vec<serde_json::Value>,
    end_cursor: Option<&str>,
    has_next: bool,
) -> serde_json::Value {
    let edges: Vec<serde_json::Value> = nodes
        .into_iter()
        .map(|n| serde_json::json!({ "node": n }))
        .collect();
    serde_json::json!({
        "data": {
            "allCards": {
                "edges": edges,
                "pageInfo": { "hasNextPage": has_next, "endCursor": end_cursor },
            }
        }
    })
}
