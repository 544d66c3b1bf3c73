//! URL extraction from cell text.
//!
//! A URL is a maximal run of non-whitespace characters that begins with
//! `http://` or `https://`. The scheme may start anywhere inside a run, so
//! `see:https://x/a.png` yields `https://x/a.png`; everything after the scheme
//! up to the next whitespace belongs to the URL, trailing punctuation included.

const SCHEMES: [&str; 2] = ["http://", "https://"];

/// Extract every URL in `text`, left to right, duplicates preserved.
pub fn extract(text: &str) -> Vec<String> {
    extract_iter(text).map(ToString::to_string).collect()
}

/// Borrowing iterator over the URLs in `text`.
pub fn extract_iter(text: &str) -> Urls<'_> {
    Urls { rest: text }
}

/// Iterator returned by [`extract_iter`].
#[derive(Debug, Clone)]
pub struct Urls<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Urls<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let start = find_scheme(self.rest)?;
            let candidate = self.rest.get(start..)?;
            let end = candidate
                .find(char::is_whitespace)
                .unwrap_or(candidate.len());
            let token = candidate.get(..end)?;
            self.rest = candidate.get(end..)?;

            // A bare scheme needs at least one character after it.
            if SCHEMES
                .iter()
                .any(|s| token.len() > s.len() && token.starts_with(s))
            {
                return Some(token);
            }
        }
    }
}

/// Byte offset of the earliest scheme occurrence (case-sensitive, like the
/// URL tokens users paste from browsers).
fn find_scheme(text: &str) -> Option<usize> {
    SCHEMES.iter().filter_map(|s| text.find(s)).min()
}
