//! # RunRecord — One Fetched Resource and Its Children
//!
//! `RunRecord::begin` turns a fetch result into a persisted run:
//!
//! 1. capture the current timestamp,
//! 2. digest the body,
//! 3. serialize the headers to their stable textual form,
//! 4. insert the run row once and keep the store-assigned [`RunId`].
//!
//! After `begin` returns, the run id, body digest and headers never change.
//! Child URLs and files are then recorded against the open record, each in
//! its own insert.
//!
//! ## File Ingestion
//!
//! [`RunRecord::add_file`] hashes the file in bounded chunks, rewinds, and
//! reads the full contents for storage. Both passes must observe the same
//! bytes: the stored contents are re-hashed and compared with the streamed
//! digest, and a mismatch (the file changed underneath us) fails with
//! [`RecordError::FileChanged`] without writing a row.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use archiver_core::{
    sha256_digest, ContentDigest, ContentHasher, ExternalUuid, FetchResult, FileId, HeaderMap,
    RunId, Timestamp, DEFAULT_CHUNK_SIZE,
};

use crate::error::RecordError;
use crate::model::{ChildUrlInsert, NewFile, NewRun};
use crate::store::ArchiveStore;

/// An open, persisted run.
#[derive(Debug, Clone)]
pub struct RunRecord {
    store: ArchiveStore,
    run_id: RunId,
    source_url: String,
    external_uuid: ExternalUuid,
    fetched_at: Timestamp,
    status: u16,
    body: Vec<u8>,
    content_digest: ContentDigest,
    headers: HeaderMap,
}

impl RunRecord {
    /// Persist a new run for `url` from an already completed fetch.
    ///
    /// # Errors
    ///
    /// Any insert failure is returned as-is; the insert is not retried.
    pub async fn begin(
        store: &ArchiveStore,
        url: &str,
        external_uuid: ExternalUuid,
        fetch: FetchResult,
    ) -> Result<Self, RecordError> {
        let fetched_at = Timestamp::now();
        let content_digest = ContentHasher::default().digest_bytes(&fetch.body);
        let headers_text = fetch.headers.to_stable_text()?;

        let run_id = store
            .insert_run(&NewRun {
                url,
                external_uuid: &external_uuid,
                fetched_at,
                body: &fetch.body,
                body_digest: &content_digest,
                headers: &headers_text,
            })
            .await?;

        tracing::info!(
            %run_id,
            url,
            status = fetch.status,
            bytes = fetch.body.len(),
            digest = %content_digest,
            "run recorded"
        );

        Ok(Self {
            store: store.clone(),
            run_id,
            source_url: url.to_string(),
            external_uuid,
            fetched_at,
            status: fetch.status,
            body: fetch.body,
            content_digest,
            headers: fetch.headers,
        })
    }

    /// Record a link discovered while processing this run.
    ///
    /// The child-URL table is a global dedup set: a URL already recorded by
    /// any run returns [`ChildUrlInsert::AlreadyExists`], not an error.
    pub async fn add_child_url(&self, url: &str) -> Result<ChildUrlInsert, RecordError> {
        Ok(self
            .store
            .insert_child_url(self.run_id, url, Timestamp::now())
            .await?)
    }

    /// Archive a local file, hashing it in 64 KiB chunks.
    pub async fn add_file(
        &self,
        path: impl AsRef<Path>,
        comments: Option<&str>,
    ) -> Result<FileId, RecordError> {
        self.add_file_chunked(path, comments, DEFAULT_CHUNK_SIZE)
            .await
    }

    /// Archive a local file, hashing it in `chunk_size` pieces
    /// (`0` hashes the whole file at once).
    pub async fn add_file_chunked(
        &self,
        path: impl AsRef<Path>,
        comments: Option<&str>,
        chunk_size: usize,
    ) -> Result<FileId, RecordError> {
        let path = path.as_ref().to_path_buf();
        let hasher = ContentHasher::new(chunk_size);
        let (digest, contents, path) =
            tokio::task::spawn_blocking(move || read_and_hash(path, hasher)).await??;

        let filename = path.to_string_lossy();
        let file_id = self
            .store
            .insert_file(&NewFile {
                run_id: self.run_id,
                contents: &contents,
                filename: &filename,
                digest: &digest,
                comments,
                stored_at: Timestamp::now(),
            })
            .await?;

        tracing::info!(
            run_id = %self.run_id,
            %file_id,
            filename = %filename,
            chunk_size,
            digest = %digest,
            "file archived"
        );
        Ok(file_id)
    }

    /// Whether the in-memory body still hashes to the recorded digest.
    pub fn verify_body(&self) -> bool {
        sha256_digest(&self.body) == self.content_digest
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn external_uuid(&self) -> &ExternalUuid {
        &self.external_uuid
    }

    pub fn fetched_at(&self) -> Timestamp {
        self.fetched_at
    }

    /// HTTP status of the fetch that produced this run.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn content_digest(&self) -> &ContentDigest {
        &self.content_digest
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The store this record writes to.
    pub fn store(&self) -> &ArchiveStore {
        &self.store
    }
}

/// Hash `path` in chunks, rewind, read it whole, and check both passes agree.
fn read_and_hash(
    path: PathBuf,
    hasher: ContentHasher,
) -> Result<(ContentDigest, Vec<u8>, PathBuf), RecordError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| RecordError::Io { path, source }
    };

    let mut file = File::open(&path).map_err(io_err(&path))?;
    let digest = hasher.digest_reader(&mut file).map_err(io_err(&path))?;

    file.seek(SeekFrom::Start(0)).map_err(io_err(&path))?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents).map_err(io_err(&path))?;

    if sha256_digest(&contents) != digest {
        return Err(RecordError::FileChanged { path });
    }
    Ok((digest, contents, path))
}
