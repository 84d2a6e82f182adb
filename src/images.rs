//! Media loading.
//!
//! Images are resolved before rendering starts: `ImageStore::preload` awaits
//! each reference in turn and keeps either the decoded bitmap or the reason it
//! failed. Renderers never see an error bubble up; they ask the store and
//! draw a placeholder when the entry is an `Err`.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("empty media reference")]
    EmptySource,

    #[error("invalid data URI")]
    InvalidDataUri,

    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to read {reference}: {source}")]
    Read {
        reference: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed: {0}")]
    Fetch(String),

    #[error("remote media is disabled")]
    RemoteDisabled,

    #[error("image data is empty")]
    EmptyData,

    #[error("failed to guess image format: {0}")]
    Format(std::io::Error),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// A decoded bitmap, flattened to 8-bit RGB.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl LoadedImage {
    /// Width over height; 1.0 for degenerate images.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Re-encode as PNG (used by the flow-document writer).
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut out = Cursor::new(Vec::new());
        image::write_buffer_with_format(
            &mut out,
            &self.pixels,
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
            image::ImageFormat::Png,
        )?;
        Ok(out.into_inner())
    }

    /// Uniform gray bitmap of the given size, for tests.
    #[cfg(test)]
    pub(crate) fn blank(width: u32, height: u32) -> Self {
        LoadedImage {
            width,
            height,
            pixels: vec![200; (width * height * 3) as usize],
        }
    }
}

pub fn decode_image(data: &[u8]) -> Result<LoadedImage, ImageError> {
    if data.is_empty() {
        return Err(ImageError::EmptyData);
    }
    let img = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(ImageError::Format)?
        .decode()?;
    let rgb = img.to_rgb8();
    Ok(LoadedImage {
        width: rgb.width(),
        height: rgb.height(),
        pixels: rgb.into_raw(),
    })
}

/// Decodes the payload of a `data:` URI. Non-base64 payloads are
/// percent-decoded.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ImageError> {
    let rest = uri.strip_prefix("data:").ok_or(ImageError::InvalidDataUri)?;
    let (header, payload) = rest.split_once(',').ok_or(ImageError::InvalidDataUri)?;
    if header.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(base64::engine::general_purpose::STANDARD.decode(payload)?)
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

// ============================================================================
// MEDIA READERS
// ============================================================================

/// Reads the bytes behind a media reference that is not an inline data URI.
#[async_trait]
pub trait MediaReader: Send + Sync {
    async fn read(&self, reference: &str) -> Result<Vec<u8>, ImageError>;
}

/// Local files. `file://` URLs are percent-decoded; relative paths resolve
/// against `root`.
#[derive(Debug, Clone)]
pub struct FsMediaReader {
    root: PathBuf,
}

impl FsMediaReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsMediaReader { root: root.into() }
    }

    /// Maps a reference onto a path. Plain references must stay inside
    /// `root`: absolute paths and `..` components are refused.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, ImageError> {
        if let Some(rest) = reference.strip_prefix("file://") {
            let raw = urlencoding::decode(rest)
                .map(|p| p.into_owned())
                .unwrap_or_else(|_| rest.to_string());
            return Ok(PathBuf::from(raw));
        }

        let path = Path::new(reference);
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ImageError::Read {
                reference: reference.to_string(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "path leaves the media root"),
            });
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl MediaReader for FsMediaReader {
    async fn read(&self, reference: &str) -> Result<Vec<u8>, ImageError> {
        let path = self.resolve(reference)?;
        tokio::fs::read(&path).await.map_err(|source| ImageError::Read {
            reference: path.display().to_string(),
            source,
        })
    }
}

/// Remote images over HTTP(S). ureq is blocking, so requests run on the
/// blocking pool.
#[derive(Debug, Clone, Default)]
pub struct HttpMediaReader;

#[async_trait]
impl MediaReader for HttpMediaReader {
    async fn read(&self, reference: &str) -> Result<Vec<u8>, ImageError> {
        let url = reference.to_string();
        tokio::task::spawn_blocking(move || {
            let response = ureq::get(&url)
                .call()
                .map_err(|e| ImageError::Fetch(e.to_string()))?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|e| ImageError::Fetch(e.to_string()))?;
            Ok(bytes)
        })
        .await
        .map_err(|e| ImageError::Fetch(e.to_string()))?
    }
}

/// Dispatches on the reference scheme.
#[derive(Debug, Clone)]
pub struct DefaultMediaReader {
    fs: FsMediaReader,
    http: Option<HttpMediaReader>,
}

impl DefaultMediaReader {
    pub fn new(media_root: impl Into<PathBuf>, allow_remote: bool) -> Self {
        DefaultMediaReader {
            fs: FsMediaReader::new(media_root),
            http: allow_remote.then_some(HttpMediaReader),
        }
    }
}

#[async_trait]
impl MediaReader for DefaultMediaReader {
    async fn read(&self, reference: &str) -> Result<Vec<u8>, ImageError> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            match &self.http {
                Some(http) => http.read(reference).await,
                None => Err(ImageError::RemoteDisabled),
            }
        } else {
            self.fs.read(reference).await
        }
    }
}

/// Resolve and decode one media reference.
pub async fn load_image(reference: &str, reader: &dyn MediaReader) -> Result<LoadedImage, ImageError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(ImageError::EmptySource);
    }
    let bytes = if reference.starts_with("data:") {
        decode_data_uri(reference)?
    } else {
        reader.read(reference).await?
    };
    decode_image(&bytes)
}

// ============================================================================
// IMAGE STORE
// ============================================================================

/// Outcome of loading every image a render will need, keyed by reference.
#[derive(Debug, Default)]
pub struct ImageStore {
    entries: HashMap<String, Result<Arc<LoadedImage>, ImageError>>,
}

impl ImageStore {
    pub fn new() -> Self {
        ImageStore::default()
    }

    /// Loads each distinct reference one after another.
    pub async fn preload<I, S>(references: I, reader: &dyn MediaReader) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut store = ImageStore::new();
        for reference in references {
            let reference = reference.as_ref();
            if reference.is_empty() || store.entries.contains_key(reference) {
                continue;
            }
            let result = load_image(reference, reader).await.map(Arc::new);
            match &result {
                Ok(img) => debug!(width = img.width, height = img.height, "image loaded"),
                Err(e) => {
                    let short: String = reference.chars().take(100).collect();
                    warn!("failed to load image {}: {}", short, e)
                }
            }
            store.entries.insert(reference.to_string(), result);
        }
        store
    }

    pub fn insert(&mut self, reference: impl Into<String>, image: LoadedImage) {
        self.entries.insert(reference.into(), Ok(Arc::new(image)));
    }

    pub fn insert_error(&mut self, reference: impl Into<String>, error: ImageError) {
        self.entries.insert(reference.into(), Err(error));
    }

    /// `None` when the reference was never preloaded.
    pub fn get(&self, reference: &str) -> Option<&Result<Arc<LoadedImage>, ImageError>> {
        self.entries.get(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        LoadedImage::blank(width, height).to_png().unwrap()
    }

    fn png_data_uri(width: u32, height: u32) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png_bytes(width, height))
        )
    }

    struct NoMedia;

    #[async_trait]
    impl MediaReader for NoMedia {
        async fn read(&self, reference: &str) -> Result<Vec<u8>, ImageError> {
            Err(ImageError::Fetch(format!("no media for {}", reference)))
        }
    }

    #[tokio::test]
    async fn test_data_uri_image() {
        let img = load_image(&png_data_uri(8, 4), &NoMedia).await.unwrap();
        assert_eq!((img.width, img.height), (8, 4));
        assert_eq!(img.pixels.len(), 8 * 4 * 3);
        assert_eq!(img.aspect(), 2.0);
    }

    #[test]
    fn test_plain_data_uri_is_percent_decoded() {
        assert_eq!(decode_data_uri("data:text/plain,a%20b").unwrap(), b"a b");
        assert!(matches!(decode_data_uri("data:nocomma"), Err(ImageError::InvalidDataUri)));
        assert!(matches!(
            decode_data_uri("data:image/png;base64,***"),
            Err(ImageError::Base64(_))
        ));
    }

    #[tokio::test]
    async fn test_garbage_bytes_fail_to_decode() {
        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"definitely not a png")
        );
        assert!(load_image(&uri, &NoMedia).await.is_err());
        assert!(matches!(load_image("  ", &NoMedia).await, Err(ImageError::EmptySource)));
    }

    #[tokio::test]
    async fn test_fs_reader_resolves_relative_and_file_urls() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("shot one.png"), png_bytes(3, 3)).unwrap();
        let reader = FsMediaReader::new(dir.path());

        let img = load_image("shot one.png", &reader).await.unwrap();
        assert_eq!(img.width, 3);

        let url = format!("file://{}", dir.path().join("shot%20one.png").display());
        let img = load_image(&url, &reader).await.unwrap();
        assert_eq!(img.height, 3);

        assert!(matches!(
            load_image("missing.png", &reader).await,
            Err(ImageError::Read { .. })
        ));
    }

    #[tokio::test]
    async fn test_fs_reader_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("media");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("x.png"), png_bytes(2, 2)).unwrap();
        std::fs::write(root.join("inner.png"), png_bytes(2, 2)).unwrap();
        let reader = FsMediaReader::new(&root);

        assert!(matches!(
            load_image("../x.png", &reader).await,
            Err(ImageError::Read { .. })
        ));
        let absolute = dir.path().join("x.png").display().to_string();
        assert!(matches!(
            load_image(&absolute, &reader).await,
            Err(ImageError::Read { .. })
        ));
        assert!(load_image("./inner.png", &reader).await.is_ok());
    }

    #[tokio::test]
    async fn test_remote_disabled() {
        let reader = DefaultMediaReader::new(".", false);
        assert!(matches!(
            reader.read("https://example.invalid/a.png").await,
            Err(ImageError::RemoteDisabled)
        ));
    }

    #[tokio::test]
    async fn test_preload_keeps_failures() {
        let good = png_data_uri(2, 2);
        let refs = vec![good.clone(), "broken.png".to_string(), good.clone(), String::new()];
        let store = ImageStore::preload(&refs, &NoMedia).await;

        assert_eq!(store.len(), 2);
        assert!(matches!(store.get(&good), Some(Ok(_))));
        assert!(matches!(store.get("broken.png"), Some(Err(_))));
        assert!(store.get("never-seen").is_none());
    }
}
