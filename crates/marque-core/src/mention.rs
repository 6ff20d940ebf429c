//! `@username` mention scanning.
//!
//! Content is treated as an opaque string; the scanner only extracts
//! candidate tokens. Resolution against real usernames (and dropping
//! unknown or self mentions) happens in the engine.

fn is_word(b: u8) -> bool {
  b.is_ascii_alphanumeric() || b == b'_'
}

/// Extract mention tokens from `content`, in order of first occurrence,
/// deduplicated. A token is an `@` at a word boundary followed by one or
/// more `[A-Za-z0-9_]` characters; a bare `@` yields nothing.
pub fn mention_tokens(content: &str) -> Vec<&str> {
  let bytes = content.as_bytes();
  let mut out: Vec<&str> = Vec::new();
  let mut i = 0;

  while i < bytes.len() {
    if bytes[i] == b'@' && (i == 0 || !is_word(bytes[i - 1])) {
      let start = i + 1;
      let mut end = start;
      while end < bytes.len() && is_word(bytes[end]) {
        end += 1;
      }
      if end > start {
        let token = &content[start..end];
        if !out.contains(&token) {
          out.push(token);
        }
      }
      i = end.max(i + 1);
    } else {
      i += 1;
    }
  }

  out
}
