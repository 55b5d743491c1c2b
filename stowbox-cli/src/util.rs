use std::time::SystemTime;

/// Format a timestamp as RFC 3339, to the second
pub fn format_time(time: SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Format a box entry for display
pub fn format_path(box_name: &str, path: &str, is_dir: bool) -> String {
    let mut out: String = "[".into();
    out.push_str(box_name);
    out.push(':');
    out.push_str(path);
    if is_dir {
        out.push('/');
    }
    out.push(']');
    out
}

/// Format file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    use humansize::{format_size, BINARY};
    format_size(bytes, BINARY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn formats() {
        assert_eq!(
            format_time(UNIX_EPOCH + Duration::from_secs(1_594_051_142)),
            "2020-07-06T15:59:02Z"
        );
        assert_eq!(format_path("pics-myapp", "icons", true), "[pics-myapp:icons/]");
        assert!(format_size(4096).ends_with("KiB"));
    }
}
