use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Source length above which the user is told processing may take longer
pub const LONG_SOURCE_CHARS: usize = 8000;

/// Source length above which the user gets a warning
pub const VERY_LONG_SOURCE_CHARS: usize = 15000;

/// How a source length should be announced before generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthNotice {
    Normal,
    Long,
    VeryLong,
}

impl LengthNotice {
    pub fn for_length(chars: usize) -> Self {
        if chars > VERY_LONG_SOURCE_CHARS {
            LengthNotice::VeryLong
        } else if chars > LONG_SOURCE_CHARS {
            LengthNotice::Long
        } else {
            LengthNotice::Normal
        }
    }
}

/// First `max_chars` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Size of an export artifact for the save report, e.g. "2.4 KB"
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}

/// Elapsed generation time, whole seconds only
pub fn format_duration(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, secs) = (total / 3600, total % 3600 / 60, total % 60);

    match (hours, minutes) {
        (0, 0) => format!("{}s", secs),
        (0, _) => format!("{}m {}s", minutes, secs),
        _ => format!("{}h {}m {}s", hours, minutes, secs),
    }
}

/// Whether `command --version` runs and exits successfully
pub async fn check_command_available(command: &str) -> bool {
    Command::new(command)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
