//! Downloads uploaded documents from Telegram into the staging directory

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::path::{Path, PathBuf};
use teloxide::prelude::*;
use teloxide::types::FileId;
use tokio::io::AsyncWriteExt;
use unicore::config;
use unicore::upload::{FetchError, FileFetcher, FileRef, StagedFile};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// [`FileFetcher`] backed by the Bot API file endpoint
#[derive(Clone)]
pub struct TelegramFileFetcher {
    bot: Bot,
    client: reqwest::Client,
    dir: PathBuf,
}

impl TelegramFileFetcher {
    pub fn new(bot: Bot, dir: impl Into<PathBuf>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config::network::download_timeout())
            .build()?;
        Ok(Self {
            bot,
            client,
            dir: dir.into(),
        })
    }

    async fn download(&self, file: &FileRef) -> Result<StagedFile, FetchError> {
        let info = self
            .bot
            .get_file(FileId(file.id.clone()))
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        log::info!("File info retrieved: path = {}, size = {} bytes", info.path, info.size);

        let dest = self.dir.join(staged_name(&file.id));
        let part = dest.with_extension("csv.part");

        let url = file_url(self.bot.token(), &info.path)?;
        let mut resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() && status != StatusCode::PARTIAL_CONTENT {
            return Err(FetchError::Transport(format!(
                "Telegram file download failed (path={}, status={})",
                info.path, status
            )));
        }

        let staged = write_staged(&part, &dest, &mut resp).await?;
        log::info!("File downloaded to {:?}", dest);
        Ok(staged)
    }
}

/// Body of a download, read chunk by chunk
#[async_trait]
trait ChunkSource: Send {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError>;
}

#[async_trait]
impl ChunkSource for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
        let chunk = self.chunk().await.map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

/// Streams `source` into `part` and renames it to `dest`.
///
/// `part` is owned by a [`StagedFile`] from creation until the rename, so it is
/// removed on a failed chunk, write, flush or rename and when the future is
/// dropped mid-download.
async fn write_staged<S: ChunkSource>(part: &Path, dest: &Path, source: &mut S) -> Result<StagedFile, FetchError> {
    let part_guard = StagedFile::new(part);
    let mut dst = tokio::fs::File::create(part_guard.path()).await?;
    while let Some(chunk) = source.next_chunk().await? {
        dst.write_all(&chunk).await?;
    }
    dst.flush().await?;
    drop(dst);

    tokio::fs::rename(part_guard.path(), dest).await?;
    let staged = StagedFile::new(dest);
    // already renamed; removing the old path is a quiet no-op
    drop(part_guard);
    Ok(staged)
}

#[async_trait]
impl FileFetcher for TelegramFileFetcher {
    async fn fetch(&self, file: &FileRef) -> Result<StagedFile, FetchError> {
        match tokio::time::timeout(config::network::download_timeout(), self.download(file)).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Download of {} timed out", file.id);
                Err(FetchError::Timeout)
            }
        }
    }
}

/// Staging file name; file ids are url-safe but may be long
fn staged_name(file_id: &str) -> String {
    let short: String = file_id.chars().filter(|c| c.is_ascii_alphanumeric()).take(32).collect();
    format!("upload_{}_{}.csv", short, chrono::Utc::now().timestamp_millis())
}

fn file_url(token: &str, file_path: &str) -> Result<Url, FetchError> {
    Url::parse(&format!("{}/file/bot{}/{}", TELEGRAM_API_URL, token, file_path))
        .map_err(|e| FetchError::Transport(format!("invalid file url: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url() {
        let url = file_url("123:abc", "documents/file_1.csv").unwrap();
        assert_eq!(url.as_str(), "https://api.telegram.org/file/bot123:abc/documents/file_1.csv");
    }

    #[test]
    fn test_staged_name_is_sanitized() {
        let name = staged_name("BQAC-_/../x");
        assert!(name.starts_with("upload_BQACx_"));
        assert!(name.ends_with(".csv"));
        assert!(!name.contains('/'));
    }

    /// Yields its chunks, then either ends, fails or hangs
    struct ScriptedBody {
        chunks: Vec<Vec<u8>>,
        then: End,
    }

    enum End {
        Finish,
        Fail,
        Hang,
    }

    #[async_trait]
    impl ChunkSource for ScriptedBody {
        async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
            if !self.chunks.is_empty() {
                return Ok(Some(self.chunks.remove(0)));
            }
            match self.then {
                End::Finish => Ok(None),
                End::Fail => Err(FetchError::Transport("connection reset".into())),
                End::Hang => std::future::pending().await,
            }
        }
    }

    fn staging_paths(test: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("unibot-{}-{}", test, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let dest = dir.join("upload.csv");
        (dest.with_extension("csv.part"), dest)
    }

    #[tokio::test]
    async fn test_write_staged_renames_complete_download() {
        let (part, dest) = staging_paths("complete");
        let mut body = ScriptedBody {
            chunks: vec![b"a,b\n".to_vec(), b"1,2\n".to_vec()],
            then: End::Finish,
        };

        let staged = write_staged(&part, &dest, &mut body).await.unwrap();
        assert_eq!(std::fs::read_to_string(staged.path()).unwrap(), "a,b\n1,2\n");
        assert!(!part.exists());

        drop(staged);
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_write_staged_removes_part_on_transport_error() {
        let (part, dest) = staging_paths("broken");
        let mut body = ScriptedBody {
            chunks: vec![b"a,b\n".to_vec()],
            then: End::Fail,
        };

        let result = write_staged(&part, &dest, &mut body).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
        assert!(!part.exists());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_write_staged_removes_part_when_timed_out() {
        let (part, dest) = staging_paths("timeout");
        let mut body = ScriptedBody {
            chunks: vec![b"a,b\n".to_vec()],
            then: End::Hang,
        };

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(500),
            write_staged(&part, &dest, &mut body),
        )
        .await;
        assert!(result.is_err());
        assert!(!part.exists());
        assert!(!dest.exists());
    }
}
