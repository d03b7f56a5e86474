use crate::error::{CallCenterError, Result};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Default)]
pub struct Slots {
    values: HashMap<&'static str, String>,
}

impl Slots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

enum Piece<'a> {
    Text(&'a str),
    Slot(&'a str),
}

fn malformed(template: &str, reason: String) -> CallCenterError {
    CallCenterError::MalformedTemplate {
        template: template.to_string(),
        reason,
    }
}

fn parse<'a>(name: &str, template: &'a str) -> Result<Vec<Piece<'a>>> {
    let mut pieces = Vec::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        let (text, tail) = rest.split_at(pos);
        if !text.is_empty() {
            pieces.push(Piece::Text(text));
        }
        if tail.starts_with("{{") {
            pieces.push(Piece::Text("{"));
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            pieces.push(Piece::Text("}"));
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            return Err(malformed(name, "unmatched '}'".to_string()));
        }

        let close = tail
            .find('}')
            .ok_or_else(|| malformed(name, "unclosed '{'".to_string()))?;
        let slot = &tail[1..close];
        if slot.is_empty() || !slot.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(malformed(name, format!("invalid placeholder '{{{slot}}}'")));
        }
        pieces.push(Piece::Slot(slot));
        rest = &tail[close + 1..];
    }

    if !rest.is_empty() {
        pieces.push(Piece::Text(rest));
    }
    Ok(pieces)
}

/// Renders `template`; every referenced slot must be present in `slots`.
pub fn fill(name: &str, template: &str, slots: &Slots) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    for piece in parse(name, template)? {
        match piece {
            Piece::Text(text) => out.push_str(text),
            Piece::Slot(slot) => {
                let value = slots.get(slot).ok_or_else(|| CallCenterError::MissingPlaceholder {
                    template: name.to_string(),
                    placeholder: slot.to_string(),
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}

pub fn placeholders<'a>(name: &str, template: &'a str) -> Result<BTreeSet<&'a str>> {
    Ok(parse(name, template)?
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Slot(slot) => Some(slot),
            Piece::Text(_) => None,
        })
        .collect())
}

pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let end = a
        .char_indices()
        .zip(b.chars())
        .find(|((_, x), y)| x != y)
        .map(|((i, _), _)| i)
        .unwrap_or_else(|| a.len().min(b.len()));
    &a[..end]
}

/// Removes the whitespace margin common to all non-blank lines.
///
/// Blank lines are emptied and do not take part in the margin.
pub fn dedent(text: &str) -> String {
    let margin = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| &line[..line.len() - line.trim_start().len()])
        .reduce(common_prefix)
        .unwrap_or("");

    let mut out = text
        .lines()
        .map(|line| if line.trim().is_empty() { "" } else { &line[margin.len()..] })
        .collect::<Vec<_>>()
        .join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

pub fn collapse_lines(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_substitutes_once() {
        let slots = Slots::new().with("name", "{bot_name}").with("company", "More");
        let out = fill("t", "Hi {name} from {company} {{literal}}", &slots).unwrap();
        assert_eq!(out, "Hi {bot_name} from More {literal}");
    }

    #[test]
    fn test_fill_missing_slot_fails_loudly() {
        let err = fill("chat_system", "Objective: {task}", &Slots::new()).unwrap_err();
        match err {
            CallCenterError::MissingPlaceholder { template, placeholder } => {
                assert_eq!(template, "chat_system");
                assert_eq!(placeholder, "task");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_malformed_templates() {
        for template in ["open {task", "close }", "{not a slot}", "{}"] {
            let err = fill("t", template, &Slots::new()).unwrap_err();
            assert!(matches!(err, CallCenterError::MalformedTemplate { .. }), "{template}");
        }
    }

    #[test]
    fn test_placeholders_listed() {
        let found = placeholders("t", "{a} {{b}} {c} {a}").unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_escape_braces_round_trips_through_fill() {
        let text = "Press 1 for {weird} label.";
        assert_eq!(fill("t", &escape_braces(text), &Slots::new()).unwrap(), text);
    }

    #[test]
    fn test_dedent() {
        let text = "\n        # Objective\n          indented\n\n        done\n    ";
        assert_eq!(dedent(text), "\n# Objective\n  indented\n\ndone\n");
    }

    #[test]
    fn test_collapse_lines() {
        assert_eq!(collapse_lines("  a  \n b\r\nc"), "a b c");
        assert_eq!(collapse_lines("a\n\nb"), "a  b");
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b>"Tom's" & co</b>"#),
            "&lt;b&gt;&quot;Tom&#x27;s&quot; &amp; co&lt;/b&gt;"
        );
    }
}
