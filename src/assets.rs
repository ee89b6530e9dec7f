//! Sprite tables and the static origin they are fetched from

use crate::{Error, Result};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;

/// Sub-path of the foreground sprites on the static origin
pub const FOREGROUND_DIR: [&str; 2] = ["emblems", "embems"];
/// Sub-path of the background sprites on the static origin
pub const BACKGROUND_DIR: [&str; 2] = ["emblems", "backgrounds"];

/// Foreground sprite names, indexed by `EF`
pub const FOREGROUNDS: [&str; 64] = [
    "Seventh Column", "Bullseye", "Vortex", "Halt", "Spartan", "Da Bomb", "Trinity", "Delta",
    "Rampancy", "Sergeant", "Phoenix", "Champion", "Jolly Roger", "Marathon", "Cube", "Radioactive",
    "Smiley", "Frowney", "Spearhead", "Sol", "Waypoint", "Ying Yang", "Helmet", "Triad",
    "Grunt Symbol", "Cleave", "Thor", "Skull King", "Triplicate", "Subnova", "Flaming Ninja", "Doubleplusgood",
    "Rising Sun", "Spades", "Clubs", "Hearts", "Diamonds", "Castle", "Cancer", "Crown",
    "Crossed Swords", "Wolf Head", "Eagle", "Bear Paw", "Atom", "Flower", "Crosshairs", "Lightning",
    "Anchor", "Star", "Moon", "Serpent", "Wings", "Tower", "Hammer", "Shield",
    "Arrowhead", "Gear", "Flame", "Eye", "Key", "Hourglass", "Infinity", "Number One",
];

/// Background sprite names, indexed by `EB`
pub const BACKGROUNDS: [&str; 32] = [
    "Solid", "Vertical Split", "Horizontal Split 1", "Horizontal Split 2", "Vertical Gradient",
    "Horizontal Gradient", "Triple Column", "Triple Row", "Quadrants 1", "Quadrants 2",
    "Diagonal Slice", "Cleft", "X1", "X2", "Circle", "Diamond", "Cross", "Square",
    "Dual Half-Circle", "Triangle", "Diagonal Quadrant", "Three Quarters", "Quarter",
    "Four Rows 1", "Four Rows 2", "Split Circle", "One Third", "Two Thirds", "Upper Field",
    "Top and Bottom", "Center Stripe", "Left and Right",
];

/// Which layer of the emblem a sprite belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Foreground,
    Background,
}

impl Layer {
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Layer::Foreground => &FOREGROUNDS,
            Layer::Background => &BACKGROUNDS,
        }
    }

    fn dir(self) -> [&'static str; 2] {
        match self {
            Layer::Foreground => FOREGROUND_DIR,
            Layer::Background => BACKGROUND_DIR,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Foreground => f.write_str("foreground"),
            Layer::Background => f.write_str("background"),
        }
    }
}

/// A path on the static origin, kept as unescaped segments.
///
/// Each origin joins the segments its own way: [`HttpOrigin`] percent-escapes
/// them into its base URL, [`DirOrigin`] joins them onto a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath {
    segments: Vec<String>,
}

impl AssetPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { segments: segments.into_iter().map(Into::into).collect() }
    }

    /// The sprite at `index` in the layer's table, if any
    pub fn sprite(layer: Layer, index: usize) -> Option<Self> {
        let name = layer.names().get(index)?;
        let [root, sub] = layer.dir();
        Some(Self::new([root.to_string(), sub.to_string(), format!("{name}.png")]))
    }

    /// `{prefix}/{key}.png` for a pre-rendered emblem
    pub fn fallback(prefix: &str, key: &str) -> Self {
        let mut segments: Vec<String> = prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        segments.push(format!("{key}.png"));
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Read-only source of sprite and fallback PNG bytes
pub trait AssetOrigin: Send + Sync {
    /// Fetch the bytes at `path`; any non-success answer is an error.
    fn fetch(&self, path: &AssetPath) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Static origin reached over HTTP(S)
#[cfg(feature = "http")]
pub struct HttpOrigin {
    client: reqwest::Client,
    base: url::Url,
}

#[cfg(feature = "http")]
impl HttpOrigin {
    pub fn new(config: &crate::ServiceConfig) -> Result<Self> {
        let base = url::Url::parse(&config.asset_origin)
            .map_err(|e| Error::ConfigError(format!("bad asset origin {:?}: {}", config.asset_origin, e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::ConfigError(format!("asset origin {} cannot be a base URL", base)));
        }

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(std::time::Duration::from_millis(ms));
        }
        let client = builder
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base })
    }

    /// Absolute URL of `path`, each segment percent-escaped
    pub fn url_for(&self, path: &AssetPath) -> url::Url {
        let mut url = self.base.clone();
        if let Ok(mut segs) = url.path_segments_mut() {
            segs.pop_if_empty().extend(path.segments());
        }
        url
    }
}

#[cfg(feature = "http")]
impl AssetOrigin for HttpOrigin {
    async fn fetch(&self, path: &AssetPath) -> Result<Vec<u8>> {
        let url = self.url_for(path);
        log::debug!("GET {}", url);

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Error::LoadError(format!("GET {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::LoadError(format!("GET {} returned {}", url, status)));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| Error::LoadError(format!("Failed to read body of {}: {}", url, e)))?;
        Ok(body.to_vec())
    }
}

/// Static origin backed by a local directory tree
#[derive(Debug, Clone)]
pub struct DirOrigin {
    root: PathBuf,
}

impl DirOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, path: &AssetPath) -> PathBuf {
        let mut p = self.root.clone();
        p.extend(path.segments());
        p
    }
}

impl AssetOrigin for DirOrigin {
    async fn fetch(&self, path: &AssetPath) -> Result<Vec<u8>> {
        let file = self.path_for(path);
        log::debug!("reading {}", file.display());
        tokio::fs::read(&file)
            .await
            .map_err(|e| Error::LoadError(format!("{}: {}", file.display(), e)))
    }
}
