//! Article representation: ordered header multimap plus body
//!
//! Headers keep their insertion order for output, while lookups are
//! case-insensitive by name. Once stored an article is treated as
//! immutable; the feed pipeline strips server-local headers from a clone
//! before pushing to peers.

/// Well-known header names used by the dispatch and feed paths.
pub mod header_names {
    pub const NEWSGROUPS: &str = "Newsgroups";
    pub const MESSAGE_ID: &str = "Message-ID";
    pub const PATH: &str = "Path";
    pub const SUBJECT: &str = "Subject";
    pub const NNTP_POSTING_DATE: &str = "NNTP-Posting-Date";
    pub const NNTP_POSTING_HOST: &str = "NNTP-Posting-Host";
    pub const X_COMPLAINTS_TO: &str = "X-Complaints-To";
    pub const X_TRACE: &str = "X-Trace";
    pub const XREF: &str = "Xref";
}

/// A news article: headers in insertion order, a body, and a globally
/// unique message identifier (the `Message-ID` header).
#[derive(Debug, Clone, Default)]
pub struct Article {
    headers: Vec<(String, String)>,
    body: Vec<String>,
}

impl Article {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header value, preserving insertion order. A name may occur
    /// more than once.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Replace every value of `name` with a single value, keeping the
    /// position of the first occurrence; appends when absent.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let mut kept_first = false;
        self.headers.retain_mut(|(n, v)| {
            if n.eq_ignore_ascii_case(name) {
                if kept_first {
                    return false;
                }
                kept_first = true;
                *v = value.clone();
            }
            true
        });
        if !kept_first {
            self.headers.push((name.to_string(), value));
        }
    }

    /// Remove every occurrence of a header.
    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// First value of a header, by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a header, in insertion order.
    #[must_use]
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Iterate headers in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The article's unique message identifier, when present.
    #[must_use]
    pub fn message_id(&self) -> Option<&str> {
        self.header(header_names::MESSAGE_ID)
    }

    /// Newsgroup names from the comma-separated `Newsgroups` header.
    #[must_use]
    pub fn newsgroups(&self) -> Vec<String> {
        self.header(header_names::NEWSGROUPS)
            .map(|v| {
                v.split(',')
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn push_body_line(&mut self, line: impl Into<String>) {
        self.body.push(line.into());
    }

    #[must_use]
    pub fn body_lines(&self) -> &[String] {
        &self.body
    }

    /// Serialize to wire form: header lines, a blank separator, then the
    /// body. Lines are unterminated; the codec appends CR LF on output.
    #[must_use]
    pub fn wire_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.headers.len() + 1 + self.body.len());
        for (name, value) in &self.headers {
            lines.push(format!("{}: {}", name, value));
        }
        lines.push(String::new());
        lines.extend(self.body.iter().cloned());
        lines
    }
}
