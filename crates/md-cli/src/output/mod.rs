//! Output formatting utilities for the CLI
//!
//! Tables for metrics and stream statistics, one-line frame summaries and
//! coloured status messages.

use tabled::{settings::Style, Table, Tabled};

use md_client::{Frame, Metrics, StreamStatsSnapshot};
use md_core::time::age;

/// Format PC metrics as an ASCII table
pub fn format_metrics(metrics: &Metrics) -> String {
    #[derive(Tabled)]
    struct MetricRow {
        #[tabled(rename = "METRIC")]
        name: &'static str,
        #[tabled(rename = "VALUE")]
        value: String,
    }

    let rows = vec![
        MetricRow {
            name: "CPU",
            value: metrics.cpu.clone(),
        },
        MetricRow {
            name: "RAM",
            value: metrics.ram.clone(),
        },
        MetricRow {
            name: "Network",
            value: metrics.net.clone(),
        },
    ];

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format stream counters as an ASCII table
pub fn format_stream_stats(stats: &StreamStatsSnapshot) -> String {
    #[derive(Tabled)]
    struct StatsRow {
        #[tabled(rename = "TICKS")]
        ticks: u64,
        #[tabled(rename = "DECODED")]
        ok: u64,
        #[tabled(rename = "FAILED")]
        failed: u64,
        #[tabled(rename = "SKIPPED")]
        skipped: u64,
    }

    Table::new(vec![StatsRow {
        ticks: stats.ticks,
        ok: stats.frames_ok,
        failed: stats.frames_failed,
        skipped: stats.skipped,
    }])
    .with(Style::rounded())
    .to_string()
}

/// One-line summary of a frame
pub fn format_frame(index: u64, frame: &Frame) -> String {
    let received = frame
        .received_at
        .map(|at| format!("{}ms ago", age(at).as_millis()))
        .unwrap_or_else(|| "-".to_string());

    match (&frame.decoded, &frame.raw) {
        (Some(surface), _) => format!(
            "#{:<4} {} {}x{} {} ({})",
            index,
            surface.format,
            surface.width,
            surface.height,
            format_bytes(surface.data.len()),
            received
        ),
        (None, Some(raw)) => format!(
            "#{:<4} undecodable frame: {} ({})",
            index,
            truncate(raw, 40),
            received
        ),
        (None, None) => format!("#{:<4} no frame", index),
    }
}

/// Format a byte count in human-readable form
pub fn format_bytes(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Truncate a string with ellipsis if too long
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix, to stderr
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow, to stderr
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_core::{ImageFormat, ImageSurface};

    fn png_surface(width: u32, height: u32, len: usize) -> ImageSurface {
        ImageSurface {
            format: ImageFormat::Png,
            width,
            height,
            data: vec![0u8; len].into(),
        }
    }

    #[test]
    fn test_format_frame_decoded() {
        let frame = Frame {
            raw: Some("data:image/png;base64,AAAA".to_string()),
            decoded: Some(png_surface(1920, 1080, 2048)),
            received_at: None,
        };
        let line = format_frame(3, &frame);
        assert!(line.contains("PNG 1920x1080"));
        assert!(line.contains("2.0 KB"));
    }

    #[test]
    fn test_format_frame_undecodable() {
        let frame = Frame {
            raw: Some("x".repeat(100)),
            decoded: None,
            received_at: None,
        };
        let line = format_frame(1, &frame);
        assert!(line.contains("undecodable"));
        assert!(line.contains("..."));
    }

    #[test]
    fn test_format_metrics_table() {
        let table = format_metrics(&Metrics::default());
        assert!(table.contains("CPU"));
        assert!(table.contains("--"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
