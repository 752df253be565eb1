/// Maximum lines kept; older lines are dropped first.
pub const MAX_OUTPUT_LINES: usize = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Stdout,
    Stderr,
    /// Text the user sent to stdin
    Input,
    /// Runner messages such as the exit code
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub kind: OutputKind,
    pub text: String,
}

/// Program output split into lines. Chunks arrive at arbitrary boundaries,
/// so an unterminated last line keeps growing until a newline arrives.
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    lines: Vec<OutputLine>,
    /// Last line has no newline yet
    open: bool,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.open = false;
    }

    pub fn lines(&self) -> &[OutputLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn append(&mut self, kind: OutputKind, text: &str) {
        if text.is_empty() {
            return;
        }
        let parts: Vec<&str> = text.split('\n').collect();
        let count = parts.len();
        for (i, part) in parts.into_iter().enumerate() {
            let is_last = i + 1 == count;
            if is_last && part.is_empty() {
                self.open = false;
                break;
            }
            let part = part.strip_suffix('\r').unwrap_or(part);
            let continues = i == 0 && self.open && self.lines.last().is_some_and(|l| l.kind == kind);
            match self.lines.last_mut() {
                Some(last) if continues => last.text.push_str(part),
                _ => self.lines.push(OutputLine {
                    kind,
                    text: part.to_string(),
                }),
            }
            self.open = is_last;
        }

        if self.lines.len() > MAX_OUTPUT_LINES {
            let excess = self.lines.len() - MAX_OUTPUT_LINES;
            self.lines.drain(..excess);
        }
    }
}
