//! Hotkey strings as users type them ("ctrl+shift+r") turned into the
//! accelerator syntax the global-shortcut plugin parses
//! ("CommandOrControl+Shift+R").

use std::sync::Mutex;
use thiserror::Error;

pub const DEFAULT_HOTKEY: &str = "ctrl+shift+r";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HotkeyError {
    #[error("Hotkey is empty")]
    Empty,

    #[error("Unknown key '{0}'")]
    UnknownKey(String),

    #[error("Hotkey needs at least one modifier (Ctrl, Alt, Shift or Super)")]
    MissingModifier,

    #[error("Hotkey needs a key besides the modifiers")]
    MissingKey,

    #[error("Hotkey can only have one non-modifier key, found '{0}' and '{1}'")]
    MultipleKeys(String, String),

    #[error("Modifier '{0}' appears more than once")]
    DuplicateModifier(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Modifier {
    CommandOrControl,
    Super,
    Alt,
    Shift,
}

impl Modifier {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" | "cmdorctrl" | "commandorcontrol" => {
                Some(Modifier::CommandOrControl)
            }
            "cmd" | "command" | "super" | "win" | "meta" => Some(Modifier::Super),
            "alt" | "option" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Modifier::CommandOrControl => "CommandOrControl",
            Modifier::Super => "Super",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
        }
    }
}

fn parse_key(token: &str) -> Option<String> {
    let named = match token {
        "space" => "Space",
        "enter" | "return" => "Enter",
        "tab" => "Tab",
        "esc" | "escape" => "Escape",
        "backspace" => "Backspace",
        "delete" | "del" => "Delete",
        "insert" | "ins" => "Insert",
        "home" => "Home",
        "end" => "End",
        "pageup" | "pgup" => "PageUp",
        "pagedown" | "pgdn" => "PageDown",
        "up" | "arrowup" => "ArrowUp",
        "down" | "arrowdown" => "ArrowDown",
        "left" | "arrowleft" => "ArrowLeft",
        "right" | "arrowright" => "ArrowRight",
        _ => "",
    };
    if !named.is_empty() {
        return Some(named.to_string());
    }

    let mut chars = token.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_alphanumeric() {
            return Some(c.to_ascii_uppercase().to_string());
        }
    }

    let n: u8 = token.strip_prefix('f')?.parse().ok()?;
    (1..=24).contains(&n).then(|| format!("F{}", n))
}

/// Validate and rewrite a hotkey into accelerator form. Modifiers come out in
/// a fixed order so equivalent inputs normalize identically.
pub fn normalize_hotkey(input: &str) -> Result<String, HotkeyError> {
    let tokens: Vec<String> = input
        .split('+')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(HotkeyError::Empty);
    }

    let mut modifiers: Vec<Modifier> = Vec::new();
    let mut key: Option<String> = None;

    for token in &tokens {
        if let Some(modifier) = Modifier::parse(token) {
            if modifiers.contains(&modifier) {
                return Err(HotkeyError::DuplicateModifier(modifier.as_str().to_string()));
            }
            modifiers.push(modifier);
            continue;
        }

        let parsed = parse_key(token).ok_or_else(|| HotkeyError::UnknownKey(token.clone()))?;
        if let Some(existing) = &key {
            return Err(HotkeyError::MultipleKeys(existing.clone(), parsed));
        }
        key = Some(parsed);
    }

    if modifiers.is_empty() {
        return Err(HotkeyError::MissingModifier);
    }
    let key = key.ok_or(HotkeyError::MissingKey)?;

    modifiers.sort();
    let mut parts: Vec<&str> = modifiers.iter().map(|m| m.as_str()).collect();
    parts.push(&key);
    Ok(parts.join("+"))
}

/// Human-friendly label for menus and the settings view
pub fn display_hotkey(input: &str) -> String {
    let command_label = if cfg!(target_os = "macos") { "Cmd" } else { "Ctrl" };
    match normalize_hotkey(input) {
        Ok(normalized) => normalized.replace("CommandOrControl", command_label),
        Err(_) => input.to_string(),
    }
}

/// OS-level hotkey registration, keyed by accelerator string
pub trait ShortcutRegistry {
    fn register(&self, accelerator: &str) -> Result<(), String>;
    fn unregister(&self, accelerator: &str) -> Result<(), String>;
}

/// Swap the active hotkey for `accelerator`.
///
/// `active` tracks what is registered right now. When the new hotkey is
/// refused the previous one is registered again; if that fails too, `active`
/// is cleared so it never names a hotkey the OS doesn't hold.
pub fn replace_hotkey(
    registry: &dyn ShortcutRegistry,
    active: &Mutex<Option<String>>,
    accelerator: &str,
) -> Result<(), String> {
    let mut active = active.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let previous = active.take();

    if let Some(old) = previous.as_deref() {
        if let Err(e) = registry.unregister(old) {
            log::warn!("Failed to unregister previous hotkey: {}. Continuing anyway.", e);
        }
    }

    let error = match registry.register(accelerator) {
        Ok(()) => {
            *active = Some(accelerator.to_string());
            return Ok(());
        }
        Err(e) => e,
    };

    if let Some(old) = previous {
        match registry.register(&old) {
            Ok(()) => *active = Some(old),
            Err(e) => log::error!("Failed to restore previous hotkey '{}': {}", old, e),
        }
    }

    let lower = error.to_lowercase();
    Err(if lower.contains("already registered") || lower.contains("in use") {
        "Hotkey is already in use by another application. Please choose a different combination."
            .to_string()
    } else {
        format!("Failed to register hotkey: {}", error)
    })
}


#[cfg(test)]
mod tests {
    use super::fake::FakeRegistry;
    use super::*;

    #[test]
    fn test_default_hotkey() {
        assert_eq!(
            normalize_hotkey(DEFAULT_HOTKEY).unwrap(),
            "CommandOrControl+Shift+R"
        );
    }

    #[test]
    fn test_aliases_and_whitespace() {
        assert_eq!(
            normalize_hotkey(" Shift + CTRL + space ").unwrap(),
            "CommandOrControl+Shift+Space"
        );
        assert_eq!(normalize_hotkey("option+cmd+f12").unwrap(), "Super+Alt+F12");
        assert_eq!(normalize_hotkey("alt+7").unwrap(), "Alt+7");
        assert_eq!(
            normalize_hotkey("CommandOrControl+PgDn").unwrap(),
            "CommandOrControl+PageDown"
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(normalize_hotkey(" + "), Err(HotkeyError::Empty));
        assert_eq!(normalize_hotkey("r"), Err(HotkeyError::MissingModifier));
        assert_eq!(normalize_hotkey("ctrl+shift"), Err(HotkeyError::MissingKey));
        assert_eq!(
            normalize_hotkey("ctrl+control+r"),
            Err(HotkeyError::DuplicateModifier("CommandOrControl".to_string()))
        );
        assert_eq!(
            normalize_hotkey("ctrl+a+b"),
            Err(HotkeyError::MultipleKeys("A".to_string(), "B".to_string()))
        );
        assert_eq!(
            normalize_hotkey("ctrl+f25"),
            Err(HotkeyError::UnknownKey("f25".to_string()))
        );
        assert_eq!(
            normalize_hotkey("ctrl+%"),
            Err(HotkeyError::UnknownKey("%".to_string()))
        );
    }

    #[test]
    fn test_replace_hotkey_swaps_registration() {
        let registry = FakeRegistry::default();
        let active = Mutex::new(None);

        replace_hotkey(&registry, &active, "CommandOrControl+Shift+R").unwrap();
        replace_hotkey(&registry, &active, "Alt+Shift+E").unwrap();

        assert_eq!(active.lock().unwrap().as_deref(), Some("Alt+Shift+E"));
        assert!(registry.holds("Alt+Shift+E"));
        assert!(!registry.holds("CommandOrControl+Shift+R"));
    }

    #[test]
    fn test_refused_hotkey_restores_previous() {
        let registry = FakeRegistry::refusing(&["Alt+Space"]);
        let active = Mutex::new(None);
        replace_hotkey(&registry, &active, "CommandOrControl+Shift+R").unwrap();

        let err = replace_hotkey(&registry, &active, "Alt+Space").unwrap_err();
        assert!(err.contains("already in use"));
        assert_eq!(
            active.lock().unwrap().as_deref(),
            Some("CommandOrControl+Shift+R")
        );
        assert!(registry.holds("CommandOrControl+Shift+R"));
    }

    #[test]
    fn test_failed_restore_clears_active_hotkey() {
        let registry = FakeRegistry::default();
        let active = Mutex::new(None);
        replace_hotkey(&registry, &active, "CommandOrControl+Shift+R").unwrap();
        registry
            .refuse
            .lock()
            .unwrap()
            .extend(["Alt+Space".to_string(), "CommandOrControl+Shift+R".to_string()]);

        assert!(replace_hotkey(&registry, &active, "Alt+Space").is_err());
        assert_eq!(*active.lock().unwrap(), None);
        assert!(!registry.holds("CommandOrControl+Shift+R"));
        assert_eq!(
            registry.calls(),
            vec![
                "register CommandOrControl+Shift+R",
                "unregister CommandOrControl+Shift+R",
                "register Alt+Space",
                "register CommandOrControl+Shift+R",
            ]
        );
    }
}
