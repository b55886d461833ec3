//! Common test utilities for integration tests

use async_trait::async_trait;
use std::fs;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use sv_isir_corrections::config::{Config, LoggingConfig, WrapRequest};
use sv_isir_corrections::errors::{AppError, AppResult};
use sv_isir_corrections::logging::{build_subscriber, LogHandle, RotatingFileWriter};
use sv_isir_corrections::models::{AuthorizationToken, CorrectionFile};
use sv_isir_corrections::orchestrator::{CorrectionsQuery, CorrectionsSource, TokenService};

/// Minimal valid configuration file content
#[allow(dead_code)]
pub const SAMPLE_CONFIG: &str = r#"
targetDir = "isirs"

[logging]
directory = "./logs"

[oauthWrapRequest]
url = "https://sts.example.com/wrap"
wrapScope = "https://api.example.com"

[oauthWrapRequest.creds]
uid = "user"
pwd = "secret"

[svApi]
rootUrl = "https://api.example.com"
"#;

#[allow(dead_code)]
pub fn sample_config() -> Config {
    Config::from_toml_str(SAMPLE_CONFIG).unwrap()
}

/// Token service double counting its calls.
#[allow(dead_code)]
pub struct FakeTokenService {
    pub calls: Arc<AtomicUsize>,
    pub fail: bool,
}

#[allow(dead_code)]
impl FakeTokenService {
    pub fn accepting() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: false,
        }
    }

    pub fn rejecting() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            fail: true,
        }
    }
}

#[async_trait]
impl TokenService for FakeTokenService {
    async fn authorization(&self, request: &WrapRequest) -> AppResult<AuthorizationToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Authentication(format!(
                "HTTP 401: invalid credentials for {}",
                request.creds.uid
            )));
        }
        Ok(AuthorizationToken::new("WRAP access_token=\"test-token\""))
    }
}

/// Corrections source double returning canned file names.
#[allow(dead_code)]
pub struct FakeCorrections {
    pub names: Vec<String>,
    pub fail: bool,
    pub queries: Arc<Mutex<Vec<CorrectionsQuery>>>,
}

#[allow(dead_code)]
impl FakeCorrections {
    pub fn returning(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(|n| n.to_string()).collect(),
            fail: false,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            names: Vec::new(),
            fail: true,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl CorrectionsSource for FakeCorrections {
    async fn corrections(&self, query: &CorrectionsQuery) -> AppResult<Vec<CorrectionFile>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.fail {
            return Err(AppError::Fetch("HTTP 500: listing failed".to_string()));
        }
        Ok(self
            .names
            .iter()
            .map(|name| CorrectionFile {
                name: name.clone(),
                path: query.target_dir.join(name),
            })
            .collect())
    }
}

/// Log handle writing to `<dir>/logs.log` plus a matching subscriber.
#[allow(dead_code)]
pub fn test_logging(
    dir: &Path,
) -> (
    LogHandle,
    impl tracing::Subscriber + Send + Sync,
    PathBuf,
) {
    let path = dir.join("logs.log");
    let writer = RotatingFileWriter::open(&path, 1024 * 1024, 1).unwrap();
    let handle = LogHandle::new(writer);
    let config = LoggingConfig {
        directory: dir.to_path_buf(),
        level: "debug".to_string(),
        ..LoggingConfig::default()
    };
    let subscriber = build_subscriber(&config, &handle).unwrap();
    (handle, subscriber, path)
}

#[allow(dead_code)]
pub fn read_log(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

/// Canned answer of a [`StubServer`].
#[allow(dead_code)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    /// Content-Length to announce; larger than the body cuts the transfer short
    pub declared_len: Option<usize>,
}

#[allow(dead_code)]
impl StubResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            declared_len: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            body: String::new(),
            declared_len: None,
        }
    }

    pub fn truncated(body: &str, declared_len: usize) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            declared_len: Some(declared_len),
        }
    }
}

/// Minimal HTTP/1.1 server on a loopback port, one connection at a time.
///
/// The handler receives the method and the request target (path and query).
/// Every raw request (head and body) is recorded.
#[allow(dead_code)]
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl StubServer {
    pub fn start<F>(handler: F) -> Self
    where
        F: Fn(&str, &str) -> StubResponse + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        let _ = serve_connection(stream, &handler, &recorded);
                    }
                    Err(_) => break,
                }
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve_connection<F>(
    stream: TcpStream,
    handler: &F,
    recorded: &Mutex<Vec<String>>,
) -> io::Result<()>
where
    F: Fn(&str, &str) -> StubResponse,
{
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut head = String::new();
    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 || line == "\r\n" {
            break;
        }
        if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
        head.push_str(&line);
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    let mut request_line = head.lines().next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("");
    let target = request_line.next().unwrap_or("");
    let response = handler(method, target);

    recorded
        .lock()
        .unwrap()
        .push(format!("{head}\r\n{}", String::from_utf8_lossy(&body)));

    let mut stream = stream;
    write!(
        stream,
        "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        response.status,
        response.declared_len.unwrap_or(response.body.len()),
        response.body
    )?;
    stream.flush()
}

/// File names in `dir`, sorted.
#[allow(dead_code)]
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
