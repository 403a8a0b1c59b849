//! NNTP status code constants per RFC 3977
//!
//! Named constants for the response codes the daemon emits, organized by
//! category (informational, success, continuation, error).

// 1xx - Informational (RFC 3977 §3.2.1.1)

/// Capability list follows (RFC 3977 §5.2)
pub const CAPABILITY_LIST: u16 = 101;

// 2xx - Success (RFC 3977 §3.2.1.2)

/// Server ready, posting allowed (RFC 3977 §5.1.1)
pub const POSTING_ALLOWED: u16 = 200;
/// Connection closing (RFC 3977 §5.4)
pub const CONNECTION_CLOSING: u16 = 205;
/// Group selected (RFC 3977 §6.1.1)
pub const GROUP_SELECTED: u16 = 211;
/// Information follows (RFC 3977 §7.6.1)
pub const INFORMATION_FOLLOWS: u16 = 215;
/// Article follows (RFC 3977 §6.2.1)
pub const ARTICLE_FOLLOWS: u16 = 220;
/// Overview information follows (RFC 3977 §8.3)
pub const OVERVIEW_FOLLOWS: u16 = 224;
/// Article posted (RFC 3977 §6.3.1)
pub const ARTICLE_POSTED: u16 = 240;

// 3xx - Continuation (RFC 3977 §3.2.1.3)

/// Send article to be posted (RFC 3977 §6.3.1)
pub const SEND_ARTICLE_POST: u16 = 340;

// 4xx - Temporary errors (RFC 3977 §3.2.1.4)

/// Internal server fault (RFC 3977 §3.2.1.1)
pub const INTERNAL_ERROR: u16 = 403;
/// No such newsgroup (RFC 3977 §6.1.1)
pub const NO_SUCH_GROUP: u16 = 411;
/// No newsgroup selected (RFC 3977 §6.2.1)
pub const NO_GROUP_SELECTED: u16 = 412;
/// No article with that number (RFC 3977 §6.2.1)
pub const NO_SUCH_ARTICLE_NUMBER: u16 = 423;
/// Posting failed (RFC 3977 §6.3.1)
pub const POSTING_FAILED: u16 = 441;

// 5xx - Permanent errors (RFC 3977 §3.2.1.5)

/// Unknown command (RFC 3977 §3.2.1)
pub const UNKNOWN_COMMAND: u16 = 500;
/// Syntax error in command (RFC 3977 §3.2.1)
pub const SYNTAX_ERROR: u16 = 501;

/// Terminator line of every multi-line response block.
pub const MULTILINE_END: &str = ".";

/// Format a single-line response: `<3-digit-code> <text>`.
#[must_use]
pub fn response(code: u16, text: &str) -> String {
    format!("{} {}", code, text)
}
