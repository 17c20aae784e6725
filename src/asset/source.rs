//! Where a sprite image comes from.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The source of a sprite image, parsed from the configured `image` string.
///
/// The configuration accepts a single string, classified as follows:
///
/// | Prefix                       | Variant   |
/// |------------------------------|-----------|
/// | `data:`                      | `DataUri` |
/// | `<svg` / `<?xml`             | `Svg`     |
/// | `emoji:`                     | `Emoji`   |
/// | `http://` / `https://`       | `Url`     |
/// | `file://` or anything else   | `Path`    |
///
/// # Example
///
/// ```
/// use pieces::AssetSource;
///
/// let svg = AssetSource::from("<svg xmlns=\"http://www.w3.org/2000/svg\"/>");
/// assert!(matches!(svg, AssetSource::Svg(_)));
///
/// let file = AssetSource::from("sprites/spark.png");
/// assert!(matches!(file, AssetSource::Path(_)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetSource {
    /// An inline `data:` URI, base64 or plain.
    DataUri(String),

    /// Inline SVG markup.
    Svg(String),

    /// An emoji character resolved through twemoji.
    ///
    /// Only loadable when the `twemoji` feature is enabled.
    Emoji(String),

    /// A remote URL.
    Url(String),

    /// A local file, absolute or relative to the loader's base directory.
    Path(PathBuf),
}

impl AssetSource {
    /// Returns the sprite bundled with the crate: a soft 32x32 PNG puff.
    pub fn bundled() -> Self {
        Self::DataUri(include_str!("../../assets/default-particle.datauri").trim().to_string())
    }

    /// Returns `true` if the image is carried inline in the configuration.
    pub fn is_inline(&self) -> bool {
        matches!(self, Self::DataUri(_) | Self::Svg(_) | Self::Emoji(_))
    }

    /// A short, log-friendly description that never includes inline payloads.
    pub fn describe(&self) -> String {
        match self {
            Self::DataUri(uri) => {
                let meta = uri.split_once(',').map(|(meta, _)| meta).unwrap_or(uri.as_str());
                format!("{meta},…")
            }
            Self::Svg(markup) => format!("inline svg ({} bytes)", markup.len()),
            Self::Emoji(emoji) => format!("emoji {emoji}"),
            Self::Url(url) => url.clone(),
            Self::Path(path) => path.display().to_string(),
        }
    }
}

impl Default for AssetSource {
    fn default() -> Self {
        Self::bundled()
    }
}

impl From<&str> for AssetSource {
    fn from(value: &str) -> Self {
        let trimmed = value.trim_start();
        if trimmed.starts_with("data:") {
            Self::DataUri(trimmed.to_string())
        } else if trimmed.starts_with("<svg") || trimmed.starts_with("<?xml") {
            Self::Svg(value.to_string())
        } else if let Some(emoji) = trimmed.strip_prefix("emoji:") {
            Self::Emoji(emoji.to_string())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else if let Some(path) = trimmed.strip_prefix("file://") {
            Self::Path(PathBuf::from(path))
        } else {
            Self::Path(PathBuf::from(value))
        }
    }
}

impl From<String> for AssetSource {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<AssetSource> for String {
    fn from(source: AssetSource) -> Self {
        match source {
            AssetSource::DataUri(s) | AssetSource::Svg(s) | AssetSource::Url(s) => s,
            AssetSource::Emoji(emoji) => format!("emoji:{emoji}"),
            AssetSource::Path(path) => path.to_string_lossy().into_owned(),
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

// ============================================================================
// Data URIs
// ============================================================================

/// A parsed `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataUri<'a> {
    pub mime: &'a str,
    pub base64: bool,
    pub payload: &'a str,
}

impl<'a> DataUri<'a> {
    /// Splits `data:<mime>[;params][;base64],<payload>`.
    pub fn parse(uri: &'a str) -> Option<Self> {
        let rest = uri.trim().strip_prefix("data:")?;
        let (meta, payload) = rest.split_once(',')?;
        let mut parts = meta.split(';');
        let mime = parts.next().unwrap_or_default();
        let base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));
        Some(Self {
            mime: if mime.is_empty() { "text/plain" } else { mime },
            base64,
            payload,
        })
    }

    pub fn is_svg(&self) -> bool {
        self.mime.eq_ignore_ascii_case("image/svg+xml")
    }
}
