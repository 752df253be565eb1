//! Script runner for capi.
//!
//! Runs the active file with an interpreter picked by extension and streams
//! its stdout/stderr into an [`OutputLog`] through reader threads.

mod output;

pub use output::{OutputKind, OutputLine, OutputLog, MAX_OUTPUT_LINES};

use anyhow::{Context, Result};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

/// Program and leading arguments used to run a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

/// Interpreter for `path`, by extension.
pub fn interpreter_for(path: &Path, python_command: &str) -> Option<Invocation> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let (program, args): (&str, &[&str]) = match ext.as_str() {
        "py" | "pyw" => (python_command, &["-u"]),
        "php" => ("php", &[]),
        "js" => ("node", &[]),
        "sh" => ("bash", &[]),
        _ => return None,
    };
    Some(Invocation {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
    })
}

#[derive(Debug)]
enum StreamEvent {
    Chunk(OutputKind, String),
    Closed,
}

/// Output of one run, tagged with its run id.
#[derive(Debug)]
struct RunnerEvent {
    run: u64,
    event: StreamEvent,
}

/// Append `bytes` to `pending` and take out the text decoded so far.
/// A character split across reads stays in `pending` until it is complete;
/// invalid bytes become U+FFFD.
fn decode_utf8(pending: &mut Vec<u8>, bytes: &[u8]) -> String {
    pending.extend_from_slice(bytes);
    let mut text = String::new();
    loop {
        match std::str::from_utf8(pending) {
            Ok(valid) => {
                text.push_str(valid);
                pending.clear();
                return text;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match e.error_len() {
                    Some(bad) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + bad);
                    }
                    None => {
                        pending.drain(..valid);
                        return text;
                    }
                }
            }
        }
    }
}

fn pump(mut stream: impl Read, kind: OutputKind, run: u64, tx: Sender<RunnerEvent>) {
    let mut buf = [0u8; 4096];
    let mut pending = Vec::new();
    loop {
        match stream.read(&mut buf) {
            Ok(n) if n > 0 => {
                let text = decode_utf8(&mut pending, &buf[..n]);
                if text.is_empty() {
                    continue;
                }
                let event = StreamEvent::Chunk(kind, text);
                if tx.send(RunnerEvent { run, event }).is_err() {
                    return;
                }
            }
            _ => break,
        }
    }
    if !pending.is_empty() {
        let text = String::from_utf8_lossy(&pending).into_owned();
        let _ = tx.send(RunnerEvent {
            run,
            event: StreamEvent::Chunk(kind, text),
        });
    }
    let _ = tx.send(RunnerEvent {
        run,
        event: StreamEvent::Closed,
    });
}

struct Running {
    child: Child,
    stdin: Option<ChildStdin>,
    file_name: String,
    open_streams: usize,
}

pub struct Runner {
    python_command: String,
    working_dir: Option<PathBuf>,
    output: OutputLog,
    running: Option<Running>,
    run_id: u64,
    tx: Sender<RunnerEvent>,
    rx: Receiver<RunnerEvent>,
}

impl Runner {
    pub fn new(python_command: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            python_command: python_command.into(),
            working_dir: None,
            output: OutputLog::new(),
            running: None,
            run_id: 0,
            tx,
            rx,
        }
    }

    /// Directory new runs start in instead of the script's own directory.
    pub fn set_working_dir(&mut self, dir: Option<PathBuf>) {
        self.working_dir = dir;
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn output(&self) -> &OutputLog {
        &self.output
    }

    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn status_label(&self) -> String {
        match &self.running {
            Some(running) => format!("Running: {}...", running.file_name),
            None => "Terminal idle".to_string(),
        }
    }

    /// Stop any current run, clear the output and start `path`.
    pub fn run(&mut self, path: &Path) -> Result<()> {
        self.stop();
        self.output.clear();

        let Some(invocation) = interpreter_for(path, &self.python_command) else {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            self.output
                .append(OutputKind::Warning, &format!("Don't know how to run .{}\n", ext));
            return Ok(());
        };

        let cwd = self
            .working_dir
            .clone()
            .or_else(|| path.parent().map(Path::to_path_buf))
            .filter(|p| !p.as_os_str().is_empty());

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to start '{}'", invocation.program))?;

        self.run_id += 1;
        let run = self.run_id;
        let mut open_streams = 0;
        if let Some(stdout) = child.stdout.take() {
            let tx = self.tx.clone();
            thread::spawn(move || pump(stdout, OutputKind::Stdout, run, tx));
            open_streams += 1;
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = self.tx.clone();
            thread::spawn(move || pump(stderr, OutputKind::Stderr, run, tx));
            open_streams += 1;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("Running {} with {}", path.display(), invocation.program);

        self.running = Some(Running {
            stdin: child.stdin.take(),
            child,
            file_name,
            open_streams,
        });
        Ok(())
    }

    /// Write `line` to the program's stdin and echo it.
    pub fn send_input(&mut self, line: &str) -> Result<()> {
        let stdin = self
            .running
            .as_mut()
            .and_then(|r| r.stdin.as_mut())
            .context("No program is running")?;
        stdin
            .write_all(format!("{}\n", line).as_bytes())
            .and_then(|_| stdin.flush())
            .context("Failed to write to program input")?;
        self.output.append(OutputKind::Input, &format!("{}\n", line));
        Ok(())
    }

    /// Kill the running program, if any.
    pub fn stop(&mut self) {
        if let Some(mut running) = self.running.take() {
            let _ = running.child.kill();
            let _ = running.child.wait();
            log::info!("Stopped {}", running.file_name);
        }
        // Output still queued from the killed run is discarded
        self.run_id += 1;
    }

    /// Move queued output into the log and detect exit. Returns true if the
    /// log or the running state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(RunnerEvent { run, event }) = self.rx.try_recv() {
            if run != self.run_id {
                continue;
            }
            match event {
                StreamEvent::Chunk(kind, text) => {
                    self.output.append(kind, &text);
                    changed = true;
                }
                StreamEvent::Closed => {
                    if let Some(running) = self.running.as_mut() {
                        running.open_streams = running.open_streams.saturating_sub(1);
                    }
                }
            }
        }

        let finished = match self.running.as_mut() {
            Some(running) if running.open_streams == 0 => match running.child.try_wait() {
                Ok(Some(status)) => Some(status.code()),
                Ok(None) => None,
                Err(e) => {
                    log::warn!("Failed to query program status: {}", e);
                    Some(None)
                }
            },
            _ => None,
        };

        if let Some(code) = finished {
            let code = code.map_or_else(|| "?".to_string(), |c| c.to_string());
            self.output
                .append(OutputKind::Info, &format!("\n[Exit code {}]", code));
            self.running = None;
            changed = true;
        }
        changed
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop();
    }
}
