use std::fmt;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

/// Where a track's audio lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    File(PathBuf),
    Remote(Url),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("media locator is empty")]
    Empty,

    #[error("unsupported media locator scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("file URL does not name a local path: {0}")]
    InvalidFileUrl(String),
}

impl Locator {
    /// Accepts `http(s)://` and `file://` URLs and plain filesystem paths.
    pub fn parse(raw: &str) -> Result<Self, LocatorError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(LocatorError::Empty);
        }

        match Url::parse(raw) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Self::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::File)
                    .map_err(|()| LocatorError::InvalidFileUrl(raw.to_string())),
                // Windows drive letters parse as one-letter schemes.
                s if s.len() == 1 => Ok(Self::File(PathBuf::from(raw))),
                other => Err(LocatorError::UnsupportedScheme(other.to_string())),
            },
            Err(_) => Ok(Self::File(PathBuf::from(raw))),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}
