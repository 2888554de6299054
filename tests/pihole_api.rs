//! DNS-filter session flow against an in-process fake API server.

use pi_status::metrics::pihole::{PiholeClient, SID_HEADER};
use pi_status::{BlockingState, FilterStats, Reading};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    sid: Option<String>,
    body: String,
}

type Routes = fn(&str, &str) -> (u16, String);

/// Serve canned responses and record every request.
async fn fake_api(routes: Routes) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let log = Arc::new(Mutex::new(Vec::new()));
    let server_log = Arc::clone(&log);

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let log = Arc::clone(&server_log);
            tokio::spawn(async move {
                let (read, mut write) = stream.into_split();
                let mut reader = BufReader::new(read);

                let mut request_line = String::new();
                reader.read_line(&mut request_line).await.unwrap();
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();

                let mut content_length = 0;
                let mut sid = None;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).await.unwrap();
                    let header = header.trim_end();
                    if header.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = header.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            content_length = value.trim().parse().unwrap();
                        } else if name.eq_ignore_ascii_case(SID_HEADER) {
                            sid = Some(value.trim().to_string());
                        }
                    }
                }
                let mut body = vec![0; content_length];
                reader.read_exact(&mut body).await.unwrap();

                let (status, response) = routes(&method, &path);
                log.lock().unwrap().push(Recorded {
                    method,
                    path,
                    sid,
                    body: String::from_utf8_lossy(&body).into_owned(),
                });

                let reply = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response}",
                    response.len()
                );
                write.write_all(reply.as_bytes()).await.unwrap();
                write.shutdown().await.ok();
            });
        }
    });

    (url, log)
}

fn healthy_routes(method: &str, path: &str) -> (u16, String) {
    match (method, path) {
        ("POST", "/api/auth") => (
            200,
            r#"{"session":{"valid":true,"sid":"s3cr3t-sid","validity":300}}"#.to_string(),
        ),
        ("GET", "/api/dns/blocking") => (200, r#"{"blocking":"enabled","timer":null}"#.to_string()),
        ("GET", "/api/stats/summary") => (
            200,
            r#"{"queries":{"total":2000,"blocked":250,"percent_blocked":12.5}}"#.to_string(),
        ),
        ("DELETE", "/api/auth") => (200, "{}".to_string()),
        _ => (404, "{}".to_string()),
    }
}

fn client(url: &str) -> PiholeClient {
    PiholeClient::new(url, Some("hunter2".to_string()), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_full_session_flow() {
    let (url, log) = fake_api(healthy_routes).await;
    let stats = client(&url).fetch_stats().await;

    assert_eq!(stats.blocking, Reading::Value(BlockingState::Enabled));
    assert_eq!(stats.blocked_percent, Reading::Value(12.5));
    assert_eq!(stats.total_queries, Reading::Value(2000));
    assert_eq!(stats.blocked_queries, Reading::Value(250));

    let log = log.lock().unwrap().clone();
    assert_eq!(log.len(), 4);
    assert_eq!(log[0].method, "POST");
    assert!(log[0].body.contains("hunter2"));
    assert!(log[0].sid.is_none());

    // Queries and logout carry the session id.
    for request in &log[1..] {
        assert_eq!(request.sid.as_deref(), Some("s3cr3t-sid"), "{request:?}");
    }
    assert_eq!(log.last().map(|r| r.method.as_str()), Some("DELETE"));
}

#[tokio::test]
async fn test_failed_query_still_logs_out() {
    fn routes(method: &str, path: &str) -> (u16, String) {
        match (method, path) {
            ("GET", "/api/stats/summary") => (500, r#"{"error":"boom"}"#.to_string()),
            _ => healthy_routes(method, path),
        }
    }

    let (url, log) = fake_api(routes).await;
    let stats = client(&url).fetch_stats().await;

    assert_eq!(stats.blocking, Reading::Value(BlockingState::Enabled));
    assert_eq!(stats.blocked_percent, Reading::Unavailable);
    assert_eq!(stats.total_queries, Reading::Unavailable);

    let log = log.lock().unwrap().clone();
    assert!(log.iter().any(|r| r.method == "DELETE" && r.path == "/api/auth"));
}

#[tokio::test]
async fn test_rejected_password_yields_placeholders() {
    fn routes(method: &str, path: &str) -> (u16, String) {
        match (method, path) {
            ("POST", "/api/auth") => (
                200,
                r#"{"session":{"valid":false,"sid":null,"message":"password incorrect"}}"#.to_string(),
            ),
            _ => healthy_routes(method, path),
        }
    }

    let (url, log) = fake_api(routes).await;
    let pihole = client(&url);
    let err = pihole.login().await.unwrap_err();
    assert!(err.to_string().contains("password incorrect"));

    assert_eq!(pihole.fetch_stats().await, FilterStats::default());
    // Only the login attempts reached the server.
    assert!(log.lock().unwrap().iter().all(|r| r.path == "/api/auth" && r.method == "POST"));
}

#[tokio::test]
async fn test_passwordless_api_skips_logout() {
    fn routes(method: &str, path: &str) -> (u16, String) {
        match (method, path) {
            ("POST", "/api/auth") => (200, r#"{"session":{"valid":true,"sid":null}}"#.to_string()),
            _ => healthy_routes(method, path),
        }
    }

    let (url, log) = fake_api(routes).await;
    let stats = PiholeClient::new(&url, None, Duration::from_secs(2))
        .unwrap()
        .fetch_stats()
        .await;
    assert_eq!(stats.blocking, Reading::Value(BlockingState::Enabled));

    let log = log.lock().unwrap().clone();
    assert!(log.iter().all(|r| r.sid.is_none()));
    assert!(!log.iter().any(|r| r.method == "DELETE"));
}
