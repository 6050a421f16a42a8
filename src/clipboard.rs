//! Clipboard access and selection capture.

use std::time::Duration;
use thiserror::Error;

/// Time the foreground app gets to service the synthesized copy
pub const COPY_SETTLE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to send copy keystroke: {0}")]
    Keystroke(String),
}

pub trait ClipboardAccess: Send {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard via `arboard`
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let inner =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl ClipboardAccess for SystemClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        match self.inner.get_text() {
            Ok(text) => Ok(text),
            // Non-text content counts as nothing selected
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(ClipboardError::Unavailable(e.to_string())),
        }
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.inner
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::Unavailable(e.to_string()))
    }
}

/// Copy `text` to the system clipboard in one call
pub fn copy_to_system(text: &str) -> Result<(), ClipboardError> {
    SystemClipboard::new()?.write_text(text)
}

/// Press the platform copy shortcut in the focused application
#[cfg(feature = "desktop")]
pub fn send_copy_keystroke() -> Result<(), ClipboardError> {
    use enigo::{Direction, Enigo, Key, Keyboard, Settings};

    let modifier = if cfg!(target_os = "macos") {
        Key::Meta
    } else {
        Key::Control
    };

    let mut enigo =
        Enigo::new(&Settings::default()).map_err(|e| ClipboardError::Keystroke(e.to_string()))?;
    enigo
        .key(modifier, Direction::Press)
        .map_err(|e| ClipboardError::Keystroke(e.to_string()))?;
    let clicked = enigo
        .key(Key::Unicode('c'), Direction::Click)
        .map_err(|e| ClipboardError::Keystroke(e.to_string()));
    // Always let go of the modifier, even if the click failed
    let released = enigo
        .key(modifier, Direction::Release)
        .map_err(|e| ClipboardError::Keystroke(e.to_string()));
    clicked.and(released)
}

/// Copy the current selection and read it back, trimmed. Empty when nothing
/// was selected.
#[cfg(feature = "desktop")]
pub fn capture_selection(clipboard: &mut dyn ClipboardAccess) -> Result<String, ClipboardError> {
    send_copy_keystroke()?;
    std::thread::sleep(COPY_SETTLE_DELAY);
    read_trimmed(clipboard)
}

pub fn read_trimmed(clipboard: &mut dyn ClipboardAccess) -> Result<String, ClipboardError> {
    Ok(clipboard.read_text()?.trim().to_string())
}

/// In-memory clipboard for tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: String,
    pub writes: usize,
}

#[cfg(test)]
impl ClipboardAccess for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        Ok(self.contents.clone())
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents = text.to_string();
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_trimmed_strips_whitespace() {
        let mut clipboard = MemoryClipboard {
            contents: "\n  selected words \t\n".to_string(),
            writes: 0,
        };
        assert_eq!(read_trimmed(&mut clipboard).unwrap(), "selected words");
    }
}
