//! Image loading collaborators used by the resolver to measure candidates

use crate::io::configuration::MAX_PROBE_BYTES;
use crate::io::error::LoadError;
use async_trait::async_trait;
use image::{ImageError, ImageReader};
use reqwest::{Client, Url};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

/// Natural pixel size of a loaded image
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageDimensions {
    /// Create dimensions from width and height
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Non-zero and at least `min_dimension` on both axes
    pub const fn is_at_least(&self, min_dimension: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.width >= min_dimension
            && self.height >= min_dimension
    }
}

/// Resource-loading primitive supplied by the hosting environment
///
/// Given a reference, report asynchronously whether it loads as an image and
/// its natural dimensions. Timeouts are applied by the caller.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Load `url` and report its dimensions
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] when the reference cannot be fetched or decoded
    async fn load(&self, url: &str) -> Result<ImageDimensions, LoadError>;
}

/// Loads images over HTTP(S), resolving site-relative paths against a base URL
///
/// Responses are streamed and reading stops as soon as the dimensions can be
/// decoded, so at most `byte_limit` bytes of any body are held in memory.
#[derive(Clone, Debug)]
pub struct HttpImageLoader {
    client: Client,
    base_url: Option<Url>,
    byte_limit: usize,
}

impl Default for HttpImageLoader {
    fn default() -> Self {
        Self {
            client: Client::new(),
            base_url: None,
            byte_limit: MAX_PROBE_BYTES,
        }
    }
}

impl HttpImageLoader {
    /// Loader for absolute URLs only
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader that resolves `/path` and `./path` references against `base_url`
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Unresolvable`] if `base_url` is not a valid URL
    pub fn with_base_url(base_url: &str) -> Result<Self, LoadError> {
        let base = Url::parse(base_url).map_err(|err| LoadError::Unresolvable {
            reference: base_url.to_owned(),
            reason: err.to_string(),
        })?;

        Ok(Self {
            base_url: Some(base),
            ..Self::default()
        })
    }

    /// Use a preconfigured HTTP client, for example one with proxy or
    /// user-agent settings
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Replace the number of body bytes read before a response is abandoned
    #[must_use]
    pub const fn with_byte_limit(mut self, byte_limit: usize) -> Self {
        self.byte_limit = byte_limit;
        self
    }

    fn locate(&self, reference: &str) -> Result<Url, LoadError> {
        let unresolvable = |reason: String| LoadError::Unresolvable {
            reference: reference.to_owned(),
            reason,
        };

        if reference.starts_with('/') || reference.starts_with("./") {
            let base = self
                .base_url
                .as_ref()
                .ok_or_else(|| unresolvable("relative reference without base URL".to_owned()))?;
            return base.join(reference).map_err(|err| unresolvable(err.to_string()));
        }

        Url::parse(reference).map_err(|err| unresolvable(err.to_string()))
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn load(&self, url: &str) -> Result<ImageDimensions, LoadError> {
        let location = self.locate(url)?;
        let transport = |err: reqwest::Error| LoadError::Transport {
            location: location.to_string(),
            reason: err.to_string(),
        };

        let mut response = self
            .client
            .get(location.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                location: location.to_string(),
                status: status.as_u16(),
            });
        }

        let mut head = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(transport)? {
            head.extend_from_slice(&chunk);
            if let Ok(dimensions) = decode_dimensions(&head, location.as_str()) {
                return Ok(dimensions);
            }
            if head.len() >= self.byte_limit {
                return Err(LoadError::TooLarge {
                    location: location.to_string(),
                    limit: self.byte_limit,
                });
            }
        }

        decode_dimensions(&head, location.as_str())
    }
}

/// Read image dimensions from an in-memory payload without decoding pixels
///
/// # Errors
///
/// Returns [`LoadError::Decode`] when the payload is not a recognised image
pub fn decode_dimensions(bytes: &[u8], location: &str) -> Result<ImageDimensions, LoadError> {
    let decode = |source: ImageError| LoadError::Decode {
        location: location.to_owned(),
        source,
    };

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| decode(ImageError::IoError(err)))?
        .into_dimensions()
        .map_err(decode)?;

    Ok(ImageDimensions::new(width, height))
}

/// Loads site-relative references from a local directory tree
///
/// Useful for checking a catalog against a static asset export. Absolute
/// URLs and paths escaping the root are reported as unresolvable.
#[derive(Clone, Debug)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    /// Loader rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn locate(&self, reference: &str) -> Result<PathBuf, LoadError> {
        let relative = reference
            .strip_prefix("./")
            .or_else(|| reference.strip_prefix('/'))
            .ok_or_else(|| LoadError::Unresolvable {
                reference: reference.to_owned(),
                reason: "only site-relative paths are served from disk".to_owned(),
            })?;

        let relative = Path::new(relative);
        let escapes_root = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes_root {
            return Err(LoadError::Unresolvable {
                reference: reference.to_owned(),
                reason: "path leaves the asset root".to_owned(),
            });
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ImageLoader for FsImageLoader {
    async fn load(&self, url: &str) -> Result<ImageDimensions, LoadError> {
        let path = self.locate(url)?;
        let location = path.display().to_string();

        let measured = tokio::task::spawn_blocking(move || image::image_dimensions(&path))
            .await
            .map_err(|err| LoadError::Transport {
                location: location.clone(),
                reason: err.to_string(),
            })?;

        match measured {
            Ok((width, height)) => Ok(ImageDimensions::new(width, height)),
            Err(ImageError::IoError(err)) => Err(LoadError::Transport {
                location,
                reason: err.to_string(),
            }),
            Err(source) => Err(LoadError::Decode { location, source }),
        }
    }
}
