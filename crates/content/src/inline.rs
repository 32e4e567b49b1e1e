//! The limited inline HTML subset allowed inside text-bearing blocks.
//!
//! Header, paragraph and callout text may carry bold, italic, underline and line-break markup
//! produced by the editor's inline toolbar. Everything else is escaped so that the stored string
//! can be emitted verbatim as markup by the renderers.
//!
//! Sanitising happens once, at the normaliser boundary, and is idempotent:
//! `sanitise(&sanitise(s)) == sanitise(s)` for every input.

/// Tags kept by [`sanitise`]. Attributes are always dropped.
pub const ALLOWED_TAGS: &[&str] = &["b", "strong", "i", "em", "u", "br"];

/// Longest named character reference accepted as already-escaped.
const MAX_ENTITY_NAME_LEN: usize = 32;

/// Reduces `input` to the allow-listed inline subset.
///
/// - allowed tags are re-emitted in canonical lowercase form without attributes
///   (`<STRONG class="x">` becomes `<strong>`, `<br/>` becomes `<br>`)
/// - every other `<` and `>` is escaped
/// - `&` is escaped unless it already starts a well-formed character reference
pub fn sanitise(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find(['<', '>', '&']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match tail.as_bytes()[0] {
            b'<' => match allowed_tag(tail) {
                Some((canonical, consumed)) => {
                    out.push_str(&canonical);
                    rest = &tail[consumed..];
                }
                None => {
                    out.push_str("&lt;");
                    rest = &tail[1..];
                }
            },
            b'>' => {
                out.push_str("&gt;");
                rest = &tail[1..];
            }
            _ => {
                let len = char_reference_len(tail);
                if len > 0 {
                    out.push_str(&tail[..len]);
                    rest = &tail[len..];
                } else {
                    out.push_str("&amp;");
                    rest = &tail[1..];
                }
            }
        }
    }

    out.push_str(rest);
    out
}

/// Strips all tags and decodes common character references, producing display text.
///
/// Used for TOC entries, which are shown as plain text.
pub fn to_plain_text(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        stripped.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find('>') {
            Some(end) => {
                if is_line_break(&tail[1..end]) {
                    stripped.push(' ');
                }
                rest = &tail[end + 1..];
            }
            None => {
                stripped.push_str(tail);
                rest = "";
            }
        }
    }
    stripped.push_str(rest);

    decode_references(&stripped)
}

// ----------------------------------------------------------------------------
// helpers
// ----------------------------------------------------------------------------

/// If `tail` (starting with `<`) opens an allowed tag, returns its canonical form and the
/// number of bytes consumed.
fn allowed_tag(tail: &str) -> Option<(String, usize)> {
    let end = tail.find('>')?;
    let inner = &tail[1..end];
    if inner.contains('<') {
        return None;
    }

    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, inner),
    };

    let name_len = body
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 {
        return None;
    }

    let after_name = &body[name_len..];
    if !after_name.is_empty() && !after_name.starts_with(|c: char| c.is_whitespace() || c == '/')
    {
        return None;
    }

    let name = body[..name_len].to_ascii_lowercase();
    let name = ALLOWED_TAGS.iter().find(|allowed| **allowed == name)?;

    if closing && !after_name.trim().is_empty() {
        return None;
    }

    let canonical = if *name == "br" {
        "<br>".to_owned()
    } else if closing {
        format!("</{name}>")
    } else {
        format!("<{name}>")
    };

    Some((canonical, end + 1))
}

fn is_line_break(inner: &str) -> bool {
    let name = inner.trim_start_matches('/');
    let name_len = name
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    name[..name_len].eq_ignore_ascii_case("br")
}

/// Length of the character reference at the start of `tail` (which starts with `&`), or 0.
fn char_reference_len(tail: &str) -> usize {
    let bytes = tail.as_bytes();
    let mut i = 1;

    if bytes.get(i) == Some(&b'#') {
        i += 1;
        let hex = matches!(bytes.get(i), Some(b'x') | Some(b'X'));
        if hex {
            i += 1;
        }
        let digits_start = i;
        while i < bytes.len()
            && (if hex {
                bytes[i].is_ascii_hexdigit()
            } else {
                bytes[i].is_ascii_digit()
            })
        {
            i += 1;
        }
        if i == digits_start {
            return 0;
        }
    } else {
        let name_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
            i += 1;
        }
        if i == name_start || i - name_start > MAX_ENTITY_NAME_LEN {
            return 0;
        }
    }

    if bytes.get(i) == Some(&b';') {
        i + 1
    } else {
        0
    }
}

fn decode_references(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let len = char_reference_len(tail);
        let decoded = if len > 0 {
            decode_reference(&tail[1..len - 1])
        } else {
            None
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[len..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn decode_reference(body: &str) -> Option<char> {
    if let Some(num) = body.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }

    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    }
}
