use std::fmt::Display;

use crate::error::AppError;

/// Ordered transcript of one operation. Lines are echoed to stdout the
/// moment they are pushed, so the caller sees progress while the
/// operation is still running; the collected lines end up in the
/// [`OpReport`] afterwards.
pub struct OpLog {
    lines: Vec<String>,
    echo: bool,
}

impl OpLog {
    pub fn echoing() -> Self {
        Self {
            lines: Vec::new(),
            echo: true,
        }
    }

    /// Collect without printing. Used by tests.
    pub fn silent() -> Self {
        Self {
            lines: Vec::new(),
            echo: false,
        }
    }

    /// An untagged line, for free-form output like generated id listings.
    pub fn line(&mut self, msg: impl Display) {
        self.push(msg.to_string());
    }

    pub fn blank(&mut self) {
        self.push(String::new());
    }

    pub fn info(&mut self, msg: impl Display) {
        self.push(format!("[INFO] {msg}"));
    }

    pub fn ok(&mut self, msg: impl Display) {
        self.push(format!("[OK] {msg}"));
    }

    pub fn warn(&mut self, msg: impl Display) {
        self.push(format!("[WARN] {msg}"));
    }

    pub fn error(&mut self, msg: impl Display) {
        self.push(format!("[ERROR] {msg}"));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn push(&mut self, line: String) {
        if self.echo {
            println!("{line}");
        }
        self.lines.push(line);
    }
}

/// Outcome of one orchestrated operation: whether it succeeded, the
/// full ordered transcript, and the failure message if any.
#[derive(Debug)]
pub struct OpReport {
    pub success: bool,
    pub lines: Vec<String>,
    pub error: Option<String>,
}

impl OpReport {
    /// Run an operation to completion. Errors never cross this
    /// boundary: they become a failed report with the transcript
    /// collected so far plus a final `[ERROR]` line.
    pub fn capture<T>(
        mut log: OpLog,
        op: impl FnOnce(&mut OpLog) -> Result<T, AppError>,
    ) -> (Self, Option<T>) {
        match op(&mut log) {
            Ok(value) => (
                Self {
                    success: true,
                    lines: log.lines,
                    error: None,
                },
                Some(value),
            ),
            Err(err) => {
                let message = err.to_string();
                log.error(&message);
                (
                    Self {
                        success: false,
                        lines: log.lines,
                        error: Some(message),
                    },
                    None,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_arrival_order() {
        let mut log = OpLog::silent();
        log.info("first");
        log.ok("second");
        log.blank();
        log.warn("third");

        assert_eq!(
            log.lines(),
            ["[INFO] first", "[OK] second", "", "[WARN] third"]
        );
    }

    #[test]
    fn test_capture_converts_errors_into_reports() {
        let (report, value) = OpReport::capture(OpLog::silent(), |log| {
            log.info("about to fail");
            Err::<(), _>(AppError::InstallNotFound)
        });

        assert!(!report.success);
        assert!(value.is_none());
        assert_eq!(report.lines.len(), 2);
        assert!(report.lines[1].starts_with("[ERROR] "));
        assert!(report.error.unwrap().contains("not found"));
    }

    #[test]
    fn test_capture_passes_values_through() {
        let (report, value) = OpReport::capture(OpLog::silent(), |log| {
            log.ok("done");
            Ok(42)
        });

        assert!(report.success);
        assert_eq!(value, Some(42));
        assert!(report.error.is_none());
    }
}
