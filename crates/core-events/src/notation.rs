//! Vim-style key notation (`a`, `<Esc>`, `<C-r>`, `<S-Tab>`).
//!
//! Used by configuration (`[[keymap]]` entries) and trace scripts. Parsing and
//! display are inverse for every key the filter produces.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyParseError {
    #[error("empty key notation")]
    Empty,
    #[error("unterminated '<' in key notation {0:?}")]
    Unterminated(String),
    #[error("unknown key name <{0}>")]
    UnknownName(String),
    #[error("expected exactly one key, found {0}")]
    NotSingle(usize),
}

const NAMED: &[(&str, KeyCode)] = &[
    ("esc", KeyCode::Esc),
    ("cr", KeyCode::Enter),
    ("enter", KeyCode::Enter),
    ("return", KeyCode::Enter),
    ("bs", KeyCode::Backspace),
    ("backspace", KeyCode::Backspace),
    ("tab", KeyCode::Tab),
    ("del", KeyCode::Delete),
    ("delete", KeyCode::Delete),
    ("up", KeyCode::Up),
    ("down", KeyCode::Down),
    ("left", KeyCode::Left),
    ("right", KeyCode::Right),
    ("home", KeyCode::Home),
    ("end", KeyCode::End),
    ("pageup", KeyCode::PageUp),
    ("pagedown", KeyCode::PageDown),
    ("space", KeyCode::Char(' ')),
    ("lt", KeyCode::Char('<')),
];

fn parse_bracketed(body: &str) -> Result<KeyEvent, KeyParseError> {
    let mut mods = KeyModifiers::empty();
    let mut rest = body;
    // Modifier prefixes: C-, A-/M-, S- (case-insensitive), any order.
    while rest.len() > 2 && rest.as_bytes()[1] == b'-' {
        let flag = match rest.as_bytes()[0].to_ascii_lowercase() {
            b'c' => KeyModifiers::CTRL,
            b'a' | b'm' => KeyModifiers::ALT,
            b's' => KeyModifiers::SHIFT,
            _ => break,
        };
        mods |= flag;
        rest = &rest[2..];
    }
    let mut chars = rest.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyEvent::new(KeyCode::Char(c), mods));
    }
    let lower = rest.to_ascii_lowercase();
    if let Some((_, code)) = NAMED.iter().find(|(name, _)| *name == lower) {
        return Ok(KeyEvent::new(*code, mods));
    }
    if let Some(n) = lower.strip_prefix('f')
        && let Ok(n) = n.parse::<u8>()
        && (1..=24).contains(&n)
    {
        return Ok(KeyEvent::new(KeyCode::F(n), mods));
    }
    Err(KeyParseError::UnknownName(body.to_string()))
}

/// Parse a key sequence such as `jk<Esc>` into individual key events.
pub fn parse_keys(input: &str) -> Result<Vec<KeyEvent>, KeyParseError> {
    if input.is_empty() {
        return Err(KeyParseError::Empty);
    }
    let mut out = Vec::new();
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        if c == '<'
            && let Some(close) = rest.find('>')
            && close > 1
        {
            out.push(parse_bracketed(&rest[1..close])?);
            rest = &rest[close + 1..];
            continue;
        }
        if c == '<' && rest.len() > 1 && !rest.contains('>') {
            return Err(KeyParseError::Unterminated(input.to_string()));
        }
        out.push(KeyEvent::char(c));
        rest = &rest[c.len_utf8()..];
    }
    Ok(out)
}

impl FromStr for KeyEvent {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let keys = parse_keys(s)?;
        match keys.as_slice() {
            [single] => Ok(*single),
            other => Err(KeyParseError::NotSingle(other.len())),
        }
    }
}

fn code_name(code: KeyCode) -> Option<&'static str> {
    Some(match code {
        KeyCode::Esc => "Esc",
        KeyCode::Enter => "CR",
        KeyCode::Backspace => "BS",
        KeyCode::Tab => "Tab",
        KeyCode::Delete => "Del",
        KeyCode::Up => "Up",
        KeyCode::Down => "Down",
        KeyCode::Left => "Left",
        KeyCode::Right => "Right",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        KeyCode::PageUp => "PageUp",
        KeyCode::PageDown => "PageDown",
        KeyCode::Char(' ') => "Space",
        KeyCode::Char('<') => "lt",
        KeyCode::Char(_) | KeyCode::F(_) => return None,
    })
}

pub(crate) fn write_key(f: &mut fmt::Formatter<'_>, key: &KeyEvent) -> fmt::Result {
    if key.mods.is_empty()
        && let KeyCode::Char(c) = key.code
        && c != ' '
        && c != '<'
    {
        return write!(f, "{c}");
    }
    f.write_str("<")?;
    if key.mods.contains(KeyModifiers::CTRL) {
        f.write_str("C-")?;
    }
    if key.mods.contains(KeyModifiers::ALT) {
        f.write_str("A-")?;
    }
    if key.mods.contains(KeyModifiers::SHIFT) {
        f.write_str("S-")?;
    }
    match (key.code, code_name(key.code)) {
        (_, Some(name)) => f.write_str(name)?,
        (KeyCode::F(n), None) => write!(f, "F{n}")?,
        (KeyCode::Char(c), None) => write!(f, "{c}")?,
        _ => {}
    }
    f.write_str(">")
}
