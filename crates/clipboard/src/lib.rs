//! Clipboard access for capi.
//!
//! Text goes to the system clipboard through arboard when one is available
//! (on Linux both the CLIPBOARD and PRIMARY selections). Headless sessions
//! without a display keep the text in a process-local buffer instead, so
//! copy and paste still work inside the editor.

use anyhow::{anyhow, bail, Result};
use arboard::Clipboard;
use std::sync::{Mutex, OnceLock};

#[cfg(target_os = "linux")]
use arboard::{GetExtLinux, LinuxClipboardKind, SetExtLinux};

/// System clipboard, `None` when it could not be opened.
static SYSTEM: OnceLock<Option<Mutex<Clipboard>>> = OnceLock::new();

/// Last copied text, used when the system clipboard is missing or fails.
static LOCAL: Mutex<String> = Mutex::new(String::new());

fn system() -> Option<&'static Mutex<Clipboard>> {
    SYSTEM
        .get_or_init(|| match Clipboard::new() {
            Ok(clipboard) => Some(Mutex::new(clipboard)),
            Err(e) => {
                log::warn!("System clipboard unavailable, using internal buffer: {}", e);
                None
            }
        })
        .as_ref()
}

fn set_local(text: &str) -> Result<()> {
    let mut local = LOCAL
        .lock()
        .map_err(|e| anyhow!("Failed to lock clipboard: {}", e))?;
    *local = text.to_string();
    Ok(())
}

fn get_local() -> Option<String> {
    LOCAL
        .lock()
        .ok()
        .map(|s| s.clone())
        .filter(|s| !s.is_empty())
}

fn set_system(clipboard: &Mutex<Clipboard>, text: &str) -> Result<()> {
    let mut clipboard = clipboard
        .lock()
        .map_err(|e| anyhow!("Failed to lock clipboard: {}", e))?;

    #[cfg(target_os = "linux")]
    {
        clipboard
            .set()
            .clipboard(LinuxClipboardKind::Clipboard)
            .text(text.to_string())?;
        let _ = clipboard
            .set()
            .clipboard(LinuxClipboardKind::Primary)
            .text(text.to_string());
    }

    #[cfg(not(target_os = "linux"))]
    clipboard.set_text(text)?;

    Ok(())
}

fn get_system(clipboard: &Mutex<Clipboard>) -> Option<String> {
    let mut clipboard = clipboard.lock().ok()?;

    #[cfg(target_os = "linux")]
    {
        if let Ok(text) = clipboard
            .get()
            .clipboard(LinuxClipboardKind::Clipboard)
            .text()
        {
            if !text.is_empty() {
                return Some(text);
            }
        }
        clipboard
            .get()
            .clipboard(LinuxClipboardKind::Primary)
            .text()
            .ok()
    }

    #[cfg(not(target_os = "linux"))]
    clipboard.get_text().ok()
}

/// Copy text. The internal buffer is always updated.
pub fn copy(text: &str) -> Result<()> {
    if text.is_empty() {
        bail!("Nothing to copy");
    }
    set_local(text)?;
    if let Some(clipboard) = system() {
        if let Err(e) = set_system(clipboard, text) {
            log::debug!("System clipboard write failed: {:#}", e);
        }
    }
    Ok(())
}

/// Paste text, preferring the system clipboard.
pub fn paste() -> Option<String> {
    system()
        .and_then(get_system)
        .filter(|t| !t.is_empty())
        .or_else(get_local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_copy_is_rejected() {
        assert!(copy("").is_err());
    }

    #[test]
    fn local_buffer_round_trip() {
        set_local("fallback text").unwrap();
        assert_eq!(get_local().as_deref(), Some("fallback text"));
    }
}
