//! Key strings such as `"ctrl+u"` or `"shift+tab"`

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

/// Parse a key string into a `KeyEvent`.
///
/// Modifiers are `ctrl`, `shift` and `alt`, joined with `+`. Returns `None`
/// for anything unrecognized.
pub fn parse_key_string(key_str: &str) -> Option<KeyEvent> {
    let key_str = key_str.trim().to_lowercase();

    if key_str.is_empty() {
        return None;
    }

    if key_str == "shift+tab" || key_str == "backtab" {
        return Some(press(KeyCode::BackTab, KeyModifiers::SHIFT));
    }

    let parts: Vec<&str> = key_str.split('+').collect();
    let mut modifiers = KeyModifiers::empty();
    let key_part = parts.last()?.trim();

    for part in &parts[..parts.len() - 1] {
        match part.trim() {
            "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
            "shift" => modifiers |= KeyModifiers::SHIFT,
            "alt" => modifiers |= KeyModifiers::ALT,
            _ => return None,
        }
    }

    let code = match key_part {
        "esc" | "escape" => KeyCode::Esc,
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "delete" => KeyCode::Delete,
        "space" => KeyCode::Char(' '),
        f if f.len() > 1 && f.starts_with('f') => KeyCode::F(f[1..].parse().ok()?),
        c if c.chars().count() == 1 => KeyCode::Char(c.chars().next()?),
        _ => return None,
    };

    Some(press(code, modifiers))
}

/// Build a `KeyEvent` from a key string, panicking if it does not parse.
///
/// Meant for tests and fixed bindings.
///
/// ```
/// use surface_dispatch_widgets::keys::key;
/// use crossterm::event::{KeyCode, KeyModifiers};
///
/// let k = key("ctrl+u");
/// assert_eq!(k.code, KeyCode::Char('u'));
/// assert!(k.modifiers.contains(KeyModifiers::CONTROL));
/// ```
pub fn key(s: &str) -> KeyEvent {
    parse_key_string(s).unwrap_or_else(|| panic!("Invalid key string: {:?}", s))
}

fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
    KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press,
        state: KeyEventState::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_keys() {
        assert_eq!(parse_key_string("q").map(|k| k.code), Some(KeyCode::Char('q')));
        assert_eq!(parse_key_string("Enter").map(|k| k.code), Some(KeyCode::Enter));
        assert_eq!(parse_key_string("space").map(|k| k.code), Some(KeyCode::Char(' ')));
        assert_eq!(parse_key_string("f5").map(|k| k.code), Some(KeyCode::F(5)));
    }

    #[test]
    fn test_parse_modifiers() {
        let k = key("ctrl+shift+a");
        assert_eq!(k.code, KeyCode::Char('a'));
        assert!(k.modifiers.contains(KeyModifiers::CONTROL));
        assert!(k.modifiers.contains(KeyModifiers::SHIFT));
    }

    #[test]
    fn test_backtab() {
        let k = key("shift+tab");
        assert_eq!(k.code, KeyCode::BackTab);
        assert_eq!(k.modifiers, KeyModifiers::SHIFT);
    }

    #[test]
    fn test_rejects_unknown() {
        assert!(parse_key_string("").is_none());
        assert!(parse_key_string("hyper+a").is_none());
        assert!(parse_key_string("nonsense").is_none());
        assert!(parse_key_string("fx").is_none());
    }
}
