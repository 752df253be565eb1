//! Semantic completion backends.
//!
//! Python completions come from `jedi` running in a helper process. The
//! helper speaks one JSON object per line over stdin/stdout; a writer thread
//! feeds it requests and a reader thread turns its output into
//! [`SemanticResponse`]s the UI thread polls with [`SemanticProvider::try_recv`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

const JEDI_SCRIPT: &str = include_str!("../assets/jedi_server.py");

/// One completion request. `line` is 1-based, `column` 0-based (chars).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemanticRequest {
    pub id: u64,
    pub source: String,
    pub path: Option<PathBuf>,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SemanticCompletion {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

impl SemanticCompletion {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SemanticResponse {
    pub id: u64,
    #[serde(default)]
    pub completions: Vec<SemanticCompletion>,
}

/// Asynchronous completion source.
pub trait SemanticProvider: Send {
    /// Queue a request. Only the most recent queued request is guaranteed
    /// to be answered.
    fn request(&mut self, request: SemanticRequest) -> Result<()>;

    /// Next finished response, if any.
    fn try_recv(&mut self) -> Option<SemanticResponse>;

    /// False once the backend is known to be unusable.
    fn is_available(&self) -> bool;
}

#[derive(Debug, Default)]
struct BackendState {
    ready: AtomicBool,
    failed: AtomicBool,
}

/// Lines the helper can print.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Inbound {
    Ready {
        ready: bool,
        #[serde(default)]
        error: Option<String>,
    },
    Response {
        id: u64,
        #[serde(default)]
        completions: Vec<SemanticCompletion>,
        #[serde(default)]
        error: Option<String>,
    },
}

pub struct JediProvider {
    child: Child,
    requests: Sender<SemanticRequest>,
    responses: Receiver<SemanticResponse>,
    state: Arc<BackendState>,
}

impl JediProvider {
    /// Start the helper with `python_command`.
    pub fn spawn(python_command: &str) -> Result<Self> {
        let mut child = Command::new(python_command)
            .arg("-u")
            .arg("-c")
            .arg(JEDI_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to start '{}'", python_command))?;

        let stdin = child
            .stdin
            .take()
            .context("Completion helper has no stdin")?;
        let stdout = child
            .stdout
            .take()
            .context("Completion helper has no stdout")?;

        let state = Arc::new(BackendState::default());
        let (req_tx, req_rx) = mpsc::channel::<SemanticRequest>();
        let (resp_tx, resp_rx) = mpsc::channel::<SemanticResponse>();

        {
            let state = Arc::clone(&state);
            thread::spawn(move || writer_loop(stdin, req_rx, state));
        }
        {
            let state = Arc::clone(&state);
            thread::spawn(move || reader_loop(stdout, resp_tx, state));
        }

        log::info!("Started jedi completion helper ({})", python_command);

        Ok(Self {
            child,
            requests: req_tx,
            responses: resp_rx,
            state,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.state.ready.load(Ordering::Relaxed)
    }
}

impl SemanticProvider for JediProvider {
    fn request(&mut self, request: SemanticRequest) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| anyhow::anyhow!("Completion helper is not running"))
    }

    fn try_recv(&mut self) -> Option<SemanticResponse> {
        self.responses.try_recv().ok()
    }

    fn is_available(&self) -> bool {
        !self.state.failed.load(Ordering::Relaxed)
    }
}

impl Drop for JediProvider {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Forward requests to the helper, skipping any superseded while the
/// previous one was being written.
fn writer_loop(mut stdin: impl Write, rx: Receiver<SemanticRequest>, state: Arc<BackendState>) {
    while let Ok(mut request) = rx.recv() {
        while let Ok(newer) = rx.try_recv() {
            request = newer;
        }
        let written = serde_json::to_string(&request)
            .map_err(std::io::Error::other)
            .and_then(|line| {
                stdin.write_all(line.as_bytes())?;
                stdin.write_all(b"\n")?;
                stdin.flush()
            });
        if let Err(e) = written {
            log::warn!("Completion helper write failed: {}", e);
            state.failed.store(true, Ordering::Relaxed);
            return;
        }
    }
}

fn reader_loop(stdout: impl Read, tx: Sender<SemanticResponse>, state: Arc<BackendState>) {
    let reader = BufReader::new(stdout);
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Inbound>(trimmed) {
            Ok(Inbound::Ready { ready: true, .. }) => {
                state.ready.store(true, Ordering::Relaxed);
            }
            Ok(Inbound::Ready { ready: false, error }) => {
                log::warn!(
                    "Python completion unavailable: {}",
                    error.unwrap_or_else(|| "jedi not installed".to_string())
                );
                state.failed.store(true, Ordering::Relaxed);
                return;
            }
            Ok(Inbound::Response {
                id,
                completions,
                error,
            }) => {
                if let Some(error) = error {
                    log::debug!("jedi request {} failed: {}", id, error);
                }
                if tx.send(SemanticResponse { id, completions }).is_err() {
                    return;
                }
            }
            Err(e) => log::debug!("Ignoring helper output '{}': {}", trimmed, e),
        }
    }
    state.failed.store(true, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_reader(output: &str) -> (Vec<SemanticResponse>, Arc<BackendState>) {
        let (tx, rx) = mpsc::channel();
        let state = Arc::new(BackendState::default());
        reader_loop(Cursor::new(output.to_string().into_bytes()), tx, Arc::clone(&state));
        (rx.try_iter().collect(), state)
    }

    #[test]
    fn reader_parses_ready_and_responses() {
        let output = concat!(
            "{\"ready\": true}\n",
            "garbage\n",
            "{\"id\": 3, \"completions\": [{\"name\": \"append\", \"type\": \"function\"}]}\n",
            "{\"id\": 4, \"completions\": [], \"error\": \"boom\"}\n",
        );
        let (responses, state) = run_reader(output);

        assert!(state.ready.load(Ordering::Relaxed));
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, 3);
        assert_eq!(responses[0].completions, vec![SemanticCompletion::new("append", "function")]);
        assert!(responses[1].completions.is_empty());
        // EOF means the helper is gone
        assert!(state.failed.load(Ordering::Relaxed));
    }

    #[test]
    fn reader_marks_missing_jedi_as_failed() {
        let (responses, state) = run_reader("{\"ready\": false, \"error\": \"No module named jedi\"}\n");
        assert!(responses.is_empty());
        assert!(!state.ready.load(Ordering::Relaxed));
        assert!(state.failed.load(Ordering::Relaxed));
    }

    #[test]
    fn writer_sends_json_lines() {
        let (tx, rx) = mpsc::channel();
        let state = Arc::new(BackendState::default());
        tx.send(SemanticRequest {
            id: 1,
            source: "import os\nos.".to_string(),
            path: None,
            line: 2,
            column: 3,
        })
        .unwrap();
        drop(tx);

        let mut out: Vec<u8> = Vec::new();
        writer_loop(&mut out, rx, state);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["line"], 2);
        assert_eq!(value["column"], 3);
        assert!(value["path"].is_null());
    }

    #[test]
    fn writer_coalesces_queued_requests() {
        let (tx, rx) = mpsc::channel();
        for id in 1..=3 {
            tx.send(SemanticRequest {
                id,
                source: String::new(),
                path: None,
                line: 1,
                column: 0,
            })
            .unwrap();
        }
        drop(tx);

        let mut out: Vec<u8> = Vec::new();
        writer_loop(&mut out, rx, Arc::new(BackendState::default()));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"id\":3"));
    }
}
