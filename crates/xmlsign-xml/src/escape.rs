#![forbid(unsafe_code)]

//! Character escaping shared by the serializer and the canonicalizer.
//!
//! | context   | escaped                                    |
//! |-----------|--------------------------------------------|
//! | text      | `&` `<` `>` `\r`                           |
//! | attribute | `&` `<` `"` `\t` `\n` `\r`                 |
//! | PI data   | `\r`                                       |

use std::borrow::Cow;

/// Where a string is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Text,
    Attribute,
    ProcessingInstruction,
}

impl Context {
    fn replacement(self, ch: char) -> Option<&'static str> {
        match (self, ch) {
            (_, '\r') => Some("&#xD;"),
            (Self::ProcessingInstruction, _) => None,
            (_, '&') => Some("&amp;"),
            (_, '<') => Some("&lt;"),
            (Self::Text, '>') => Some("&gt;"),
            (Self::Attribute, '"') => Some("&quot;"),
            (Self::Attribute, '\t') => Some("&#x9;"),
            (Self::Attribute, '\n') => Some("&#xA;"),
            _ => None,
        }
    }
}

/// Escape `s` for `context`, borrowing when nothing needs replacing.
pub fn escape(s: &str, context: Context) -> Cow<'_, str> {
    let Some(first) = s.find(|c: char| context.replacement(c).is_some()) else {
        return Cow::Borrowed(s);
    };
    let mut out = String::with_capacity(s.len() + 8);
    out.push_str(&s[..first]);
    for ch in s[first..].chars() {
        match context.replacement(ch) {
            Some(entity) => out.push_str(entity),
            None => out.push(ch),
        }
    }
    Cow::Owned(out)
}

pub fn escape_text(s: &str) -> Cow<'_, str> {
    escape(s, Context::Text)
}

pub fn escape_attr(s: &str) -> Cow<'_, str> {
    escape(s, Context::Attribute)
}

pub fn escape_pi(s: &str) -> Cow<'_, str> {
    escape(s, Context::ProcessingInstruction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text() {
        assert!(matches!(escape_text("plain"), Cow::Borrowed("plain")));
        assert_eq!(escape_text("a&b<c>d"), "a&amp;b&lt;c&gt;d");
        assert_eq!(escape_text("cr\rlf\n\"q\""), "cr&#xD;lf\n\"q\"");
    }

    #[test]
    fn test_attribute() {
        assert_eq!(escape_attr("x>y"), "x>y");
        assert_eq!(escape_attr("say \"hi\" & <go>"), "say &quot;hi&quot; &amp; &lt;go>");
        assert_eq!(escape_attr("a\tb\nc\rd"), "a&#x9;b&#xA;c&#xD;d");
    }

    #[test]
    fn test_processing_instruction() {
        assert_eq!(escape_pi("a<b & c\r"), "a<b & c&#xD;");
    }
}
