//! Chat history as the host shows it.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use reelsync_engine::ChatLine;

use crate::error::Result;

/// Chat lines in the order this host saw them.
///
/// Remote lines arrive in receive order and local lines are appended when
/// sent; there is no global ordering across members.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    lines: Vec<ChatLine>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: ChatLine) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Write every line, newline-terminated, to `path`.
    pub fn export_to(&self, path: &Path) -> Result<()> {
        let mut contents = String::new();
        for line in &self.lines {
            contents.push_str(&line.to_string());
            contents.push('\n');
        }
        fs::write(path, contents)?;
        Ok(())
    }

    /// Write the log into `dir` under a timestamped name. Returns the path
    /// written.
    pub fn export(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(export_file_name(&Local::now()));
        self.export_to(&path)?;
        tracing::info!(path = %path.display(), lines = self.lines.len(), "Exported chat log");
        Ok(path)
    }
}

/// File name for a chat log exported at `at`, e.g.
/// `reelsync-chat-16-Oct-26_09-05-07-PM.txt`.
pub fn export_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("reelsync-chat-{}.txt", at.format("%d-%b-%y_%I-%M-%S-%p"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn export_file_name_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 21, 5, 7).unwrap();
        assert_eq!(export_file_name(&at), "reelsync-chat-16-Oct-26_09-05-07-PM.txt");
    }

    #[test]
    fn export_writes_lines_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = ChatLog::new();
        log.push(ChatLine {
            user: "bob".into(),
            timecode: "01:00".into(),
            message: "ready?".into(),
        });
        log.push(ChatLine::local("01:02", "yes"));

        let path = log.export(dir.path()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "bob [01:00]: ready?\nYou [01:02]: yes\n");
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("reelsync-chat-"));
    }

    #[test]
    fn export_into_missing_dir_fails() {
        let log = ChatLog::new();
        assert!(log.export(Path::new("/definitely/not/here")).is_err());
    }
}
