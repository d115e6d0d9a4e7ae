// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Logging
//!
//! Two sinks, each `stderr`, `stdout` or an append-only file:
//!
//! - `applog` receives the `tracing` output
//! - `httplog` receives one Common Log Format line per request
//!
//! Writes to a sink hold its lock for the whole line. Request headers are
//! never written to either sink.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::HttpBody as _,
    extract::{ConnectInfo, Request, State},
    http::{header::CONTENT_LENGTH, Method, StatusCode, Uri, Version},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, FixedOffset, Local};
use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::error::{Error, Result};

/// Environment variable selecting the application log format (`json` or
/// `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// A log destination.
#[derive(Debug, Clone)]
pub enum LogSink {
    Stderr,
    Stdout,
    File(Arc<Mutex<File>>),
}

impl LogSink {
    /// Open a sink: `stderr`, `stdout`, or a file path opened for append.
    pub fn open(target: &str) -> Result<Self> {
        Ok(match target {
            "stderr" => LogSink::Stderr,
            "stdout" => LogSink::Stdout,
            path => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                LogSink::File(Arc::new(Mutex::new(file)))
            }
        })
    }

    fn is_console(&self) -> bool {
        !matches!(self, LogSink::File(_))
    }

    /// Write one line, newline appended.
    pub fn write_line(&self, line: &str) {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        // Nowhere left to report a failing log sink.
        let _ = self.clone().write_all(&buf);
    }
}

impl Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            LogSink::Stderr => io::stderr().lock().write(buf),
            LogSink::Stdout => io::stdout().lock().write(buf),
            LogSink::File(file) => lock(file)?.write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            LogSink::Stderr => io::stderr().lock().write_all(buf),
            LogSink::Stdout => io::stdout().lock().write_all(buf),
            LogSink::File(file) => lock(file)?.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            LogSink::Stderr => io::stderr().flush(),
            LogSink::Stdout => io::stdout().flush(),
            LogSink::File(file) => lock(file)?.flush(),
        }
    }
}

fn lock(file: &Mutex<File>) -> io::Result<std::sync::MutexGuard<'_, File>> {
    file.lock()
        .map_err(|_| io::Error::other("log sink lock poisoned"))
}

/// Install the global `tracing` subscriber writing to `sink`.
///
/// `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(sink: LogSink, level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let ansi = sink.is_console();
    let writer = BoxMakeWriter::new(move || sink.clone());

    let subscriber = tracing_subscriber::registry().with(filter);
    let installed = match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => subscriber
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        _ => subscriber
            .with(fmt::layer().with_ansi(ansi).with_writer(writer))
            .try_init(),
    };

    installed.map_err(|e| Error::Config(format!("failed to install logger: {e}")))
}

/// Fields of one access log entry.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    pub client: Option<SocketAddr>,
    pub time: DateTime<FixedOffset>,
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub status: StatusCode,
    pub bytes: Option<u64>,
}

impl AccessRecord {
    /// Common Log Format line, without the trailing newline.
    pub fn to_clf(&self) -> String {
        let host = self
            .client
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_string());
        let target = self
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let bytes = self
            .bytes
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{host} - - [{}] \"{} {target} {:?}\" {} {bytes}",
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.version,
            self.status.as_u16(),
        )
    }
}

/// Middleware writing one Common Log Format line per request to `sink`.
pub async fn access_log(State(sink): State<LogSink>, request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();
    let time = Local::now().fixed_offset();

    let response = next.run(request).await;

    let bytes = response
        .body()
        .size_hint()
        .exact()
        .or_else(|| {
            response
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        });

    let record = AccessRecord {
        client,
        time,
        method,
        uri,
        version,
        status: response.status(),
        bytes,
    };
    sink.write_line(&record.to_clf());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, middleware, routing::get, Router};
    use chrono::TimeZone;
    use tempfile::TempDir;
    use tower::ServiceExt;

    #[test]
    fn clf_line_format() {
        let record = AccessRecord {
            client: Some("10.0.0.7:51234".parse().unwrap()),
            time: FixedOffset::east_opt(3600)
                .unwrap()
                .with_ymd_and_hms(2026, 10, 17, 9, 5, 3)
                .unwrap(),
            method: Method::GET,
            uri: "/swanapi/v1/share?project=p1".parse().unwrap(),
            version: Version::HTTP_11,
            status: StatusCode::OK,
            bytes: Some(13),
        };
        assert_eq!(
            record.to_clf(),
            r#"10.0.0.7 - - [17/Oct/2026:09:05:03 +0100] "GET /swanapi/v1/share?project=p1 HTTP/1.1" 200 13"#
        );
    }

    #[test]
    fn unknown_client_and_size_are_dashes() {
        let record = AccessRecord {
            client: None,
            time: Local::now().fixed_offset(),
            method: Method::DELETE,
            uri: "/x".parse().unwrap(),
            version: Version::HTTP_11,
            status: StatusCode::NOT_FOUND,
            bytes: None,
        };
        let line = record.to_clf();
        assert!(line.starts_with("- - - ["));
        assert!(line.ends_with("\"DELETE /x HTTP/1.1\" 404 -"));
    }

    #[test]
    fn file_sink_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("http.log");
        std::fs::write(&path, "existing\n").unwrap();

        let sink = LogSink::open(path.to_str().unwrap()).unwrap();
        sink.write_line("first");
        sink.write_line("second");

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "existing\nfirst\nsecond\n"
        );
    }

    #[test]
    fn unopenable_file_is_an_error() {
        assert!(LogSink::open("/nonexistent-dir/app.log").is_err());
    }

    #[tokio::test]
    async fn access_log_writes_one_line_per_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("http.log");
        let sink = LogSink::open(path.to_str().unwrap()).unwrap();

        let app = Router::new()
            .route("/hello", get(|| async { "hello" }))
            .layer(middleware::from_fn_with_state(sink, access_log));

        let request = Request::builder()
            .uri("/hello?x=1")
            .header("authorization", "Bearer do-not-log-me")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let log = std::fs::read_to_string(&path).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("\"GET /hello?x=1 HTTP/1.1\" 200 5"));
        assert!(!log.contains("do-not-log-me"));
    }
}
