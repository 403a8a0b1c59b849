//! Default values for configuration fields

pub fn host() -> String {
    "0.0.0.0".to_string()
}

pub fn port() -> u16 {
    1119
}

pub fn nntp_port() -> u16 {
    119
}

pub fn hostname() -> String {
    "localhost".to_string()
}

pub fn reader_workers() -> usize {
    2
}

pub fn idle_timeout_secs() -> u64 {
    0
}
