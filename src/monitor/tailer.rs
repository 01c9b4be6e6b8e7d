use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::info;

/// Reads the lines appended to a file since the previous read
///
/// The tailer remembers the byte offset it has consumed. When the file is
/// shorter than that offset it was truncated or rotated and reading restarts
/// at the beginning. A trailing line without newline is held back until it
/// is completed.
#[derive(Debug)]
pub struct FileTailer {
    path: PathBuf,
    offset: u64,
    pending: Vec<u8>,
}

impl FileTailer {
    /// Opens a tailer at the end of the file, or at its start with `from_start`
    pub async fn open(path: impl Into<PathBuf>, from_start: bool) -> io::Result<Self> {
        let path = path.into();
        let len = fs::metadata(&path).await?.len();

        Ok(Self {
            path,
            offset: if from_start { 0 } else { len },
            pending: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns every complete line appended since the last call, in file order
    pub async fn read_new_lines(&mut self) -> io::Result<Vec<String>> {
        let len = match fs::metadata(&self.path).await {
            Ok(metadata) => metadata.len(),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if self.offset > 0 {
                    info!(path = %self.path.display(), "log file disappeared, waiting for it");
                }
                self.reset();
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        if len < self.offset {
            info!(
                path = %self.path.display(),
                offset = self.offset,
                len,
                "log file shrank, reading from start"
            );
            self.reset();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut chunk = Vec::new();
        file.take(len - self.offset).read_to_end(&mut chunk).await?;

        self.offset += chunk.len() as u64;
        self.pending.extend_from_slice(&chunk);
        Ok(self.drain_complete_lines())
    }

    fn reset(&mut self) {
        self.offset = 0;
        self.pending.clear();
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        String::from_utf8_lossy(&complete)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_owned)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn append(path: &Path, text: &str) {
        let mut file = OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn test_starts_at_end_of_file() {
        let file = NamedTempFile::new().unwrap();
        append(file.path(), "old line\n");

        let mut tailer = FileTailer::open(file.path(), false).await.unwrap();
        assert!(tailer.read_new_lines().await.unwrap().is_empty());

        append(file.path(), "new line\n");
        assert_eq!(tailer.read_new_lines().await.unwrap(), vec!["new line"]);
    }

    #[tokio::test]
    async fn test_reads_existing_content_from_start() {
        let file = NamedTempFile::new().unwrap();
        append(file.path(), "first\nsecond\n");

        let mut tailer = FileTailer::open(file.path(), true).await.unwrap();
        assert_eq!(tailer.read_new_lines().await.unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_returns_every_line_of_a_burst() {
        let file = NamedTempFile::new().unwrap();
        let mut tailer = FileTailer::open(file.path(), false).await.unwrap();

        append(file.path(), "one\ntwo\n\nthree\r\n");
        assert_eq!(
            tailer.read_new_lines().await.unwrap(),
            vec!["one", "two", "three"]
        );
    }

    #[tokio::test]
    async fn test_holds_back_partial_lines() {
        let file = NamedTempFile::new().unwrap();
        let mut tailer = FileTailer::open(file.path(), false).await.unwrap();

        append(file.path(), "{\"event_type\":");
        assert!(tailer.read_new_lines().await.unwrap().is_empty());

        append(file.path(), "\"error\"}\n");
        assert_eq!(
            tailer.read_new_lines().await.unwrap(),
            vec!["{\"event_type\":\"error\"}"]
        );
    }

    #[tokio::test]
    async fn test_truncation_restarts_from_beginning() {
        let file = NamedTempFile::new().unwrap();
        let mut tailer = FileTailer::open(file.path(), false).await.unwrap();

        append(file.path(), "a fairly long line before rotation\n");
        tailer.read_new_lines().await.unwrap();

        std::fs::write(file.path(), "rotated\n").unwrap();
        assert_eq!(tailer.read_new_lines().await.unwrap(), vec!["rotated"]);
        assert_eq!(tailer.offset(), 8);
    }

    #[tokio::test]
    async fn test_missing_file_is_waited_for() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "before\n").unwrap();

        let mut tailer = FileTailer::open(&path, false).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(tailer.read_new_lines().await.unwrap().is_empty());
        assert_eq!(tailer.offset(), 0);

        std::fs::write(&path, "after\n").unwrap();
        assert_eq!(tailer.read_new_lines().await.unwrap(), vec!["after"]);
    }
}
