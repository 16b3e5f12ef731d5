use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::models::TicketRequest;

/// Where the artifact's bytes come from.
#[derive(Debug, Clone)]
pub enum ArtifactSource {
    Memory(Bytes),
    /// Streamed from disk in chunks; never read whole into memory.
    File(PathBuf),
}

/// The recording selected for one upload attempt.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub content_type: String,
    pub size: u64,
    pub source: ArtifactSource,
}

impl Artifact {
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size: data.len() as u64,
            source: ArtifactSource::Memory(data),
        }
    }

    /// Build an artifact backed by a file. The content type is inferred from the
    /// extension when not given.
    pub fn from_path(path: impl AsRef<Path>, content_type: Option<String>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a regular file: {}", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("recording")
            .to_string();
        let content_type = content_type.unwrap_or_else(|| {
            content_type_for_path(path)
                .unwrap_or("application/octet-stream")
                .to_string()
        });

        Ok(Self {
            name,
            content_type,
            size: metadata.len(),
            source: ArtifactSource::File(path.to_path_buf()),
        })
    }

    pub fn ticket_request(&self) -> TicketRequest {
        TicketRequest {
            filename: self.name.clone(),
            content_type: self.content_type.clone(),
        }
    }
}

/// MIME type for the recording formats the service accepts.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    let content_type = match ext.as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "weba" => "audio/webm",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        _ => return None,
    };
    Some(content_type)
}
