//! Chunked artifact bodies with progress accounting.

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tokio_util::io::ReaderStream;
use vibecheck_core::{Artifact, ArtifactSource};

use crate::progress::{percent_of, TransferProgress};
use crate::traits::TransferResult;

pub(crate) const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Stream the artifact in chunks of at most `chunk_size` bytes.
///
/// Progress is raised as chunks are handed to the transport and held at 99: only
/// the storage's acceptance moves it to 100.
pub(crate) async fn artifact_stream(
    artifact: &Artifact,
    chunk_size: usize,
    progress: TransferProgress,
) -> TransferResult<BoxStream<'static, std::io::Result<Bytes>>> {
    let chunk_size = chunk_size.max(1);
    let chunks: BoxStream<'static, std::io::Result<Bytes>> = match &artifact.source {
        ArtifactSource::Memory(data) => {
            let data = data.clone();
            let ranges: Vec<_> = (0..data.len())
                .step_by(chunk_size)
                .map(|start| start..(start + chunk_size).min(data.len()))
                .collect();
            stream::iter(ranges.into_iter().map(move |range| Ok(data.slice(range)))).boxed()
        }
        ArtifactSource::File(path) => {
            let file = tokio::fs::File::open(path).await?;
            ReaderStream::with_capacity(file, chunk_size).boxed()
        }
    };

    let total = artifact.size;
    let mut sent: u64 = 0;
    Ok(chunks
        .map(move |chunk| {
            if let Ok(bytes) = &chunk {
                sent += bytes.len() as u64;
                progress.advance(percent_of(sent, total).min(99));
            }
            chunk
        })
        .boxed())
}
