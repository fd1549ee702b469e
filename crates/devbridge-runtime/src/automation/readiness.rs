//! Readiness detection over decoded server log lines.

/// Line the automation server prints once its HTTP listener is up.
pub const READINESS_MARKER: &str = "Appium REST http interface listener started";

pub fn is_ready_line(line: &str) -> bool {
    line.contains(READINESS_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_marker_inside_log_prefix() {
        assert!(is_ready_line(
            "[Appium] Appium REST http interface listener started on http://0.0.0.0:4723"
        ));
        assert!(!is_ready_line("[Appium] Welcome to Appium v2.5.1"));
        assert!(!is_ready_line("appium rest http interface listener started"));
    }
}
