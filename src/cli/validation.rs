//! clap `value_parser` functions for arguments clap cannot check itself

use std::net::IpAddr;
use std::path::PathBuf;

/// Rolling back more than this many migrations at once is refused
pub const MAX_ROLLBACK_STEPS: u32 = 100;

pub fn validate_port(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(0) => Err("port 0 is not allowed; choose 1-65535".to_string()),
        Ok(port) => Ok(port),
        Err(_) => Err(format!("'{}' is not a port number (1-65535)", value)),
    }
}

/// Accepts an IP literal or an RFC 1123 hostname.
pub fn validate_host_address(value: &str) -> Result<String, String> {
    let host = value.trim();
    if host.is_empty() {
        return Err("host address cannot be empty".to_string());
    }

    if host.parse::<IpAddr>().is_ok() {
        return Ok(host.to_string());
    }

    // Dotted digits that failed to parse as an address are a typo, not a hostname
    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(format!("'{}' is not a valid IPv4 address", host));
    }

    if host.len() > 253 {
        return Err("host name is longer than 253 characters".to_string());
    }

    let valid_label = |label: &str| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    if host.split('.').all(valid_label) {
        Ok(host.to_string())
    } else {
        Err(format!("'{}' is not a valid host name", host))
    }
}

pub fn validate_config_file_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    let metadata =
        std::fs::metadata(&path).map_err(|e| format!("cannot access '{}': {}", value, e))?;
    if !metadata.is_file() {
        return Err(format!("'{}' is not a file", value));
    }
    std::fs::File::open(&path).map_err(|e| format!("cannot read '{}': {}", value, e))?;
    Ok(path)
}

pub fn validate_rollback_steps(value: &str) -> Result<u32, String> {
    let steps: u32 = value
        .parse()
        .map_err(|_| format!("'{}' is not a positive number of steps", value))?;
    match steps {
        0 => Err("rollback needs at least 1 step".to_string()),
        s if s > MAX_ROLLBACK_STEPS => Err(format!(
            "refusing to roll back more than {} migrations at once",
            MAX_ROLLBACK_STEPS
        )),
        s => Ok(s),
    }
}
