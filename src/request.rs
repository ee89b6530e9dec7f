//! Emblem request parsing and validation
//!
//! A request is seven small integers, read either from a path segment such
//! as `/P10-S0-EP0-ES1-EF37-EB5-ET0.png` or from query parameters of the same
//! names. The canonical `P{P}-S{S}-...` string doubles as cache key and
//! fallback file stem.

use crate::assets::{Layer, BACKGROUNDS, FOREGROUNDS};
use crate::rendering::palette::{self, PALETTE};
use crate::rendering::EmblemColors;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Shown when a request carries no emblem parameters at all
pub const USAGE: &str = "Usage: /P{0-17}-S{0-17}-EP{0-17}-ES{0-17}-EF{0-63}-EB{0-31}-ET{0|1}.png \
or ?P=&S=&EP=&ES=&EF=&EB=&ET=";

/// Parameter tags in canonical order
const KEYS: [&str; 7] = ["P", "S", "EP", "ES", "EF", "EB", "ET"];

/// Query defaults, in `KEYS` order
const QUERY_DEFAULTS: [u32; 7] = [10, 0, 0, 1, 0, 0, 0];

/// One renderable emblem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmblemRequest {
    /// Background primary palette index (P)
    pub primary: u32,
    /// Background secondary palette index (S)
    pub secondary: u32,
    /// Foreground primary palette index (EP)
    pub emblem_primary: u32,
    /// Foreground secondary palette index (ES)
    pub emblem_secondary: u32,
    /// Foreground sprite index (EF)
    pub foreground: u32,
    /// Background sprite index (EB)
    pub background: u32,
    /// Foreground variant toggle (ET); only 1 selects the alternate variant
    pub toggle: u32,
}

impl Default for EmblemRequest {
    fn default() -> Self {
        Self::from_values(QUERY_DEFAULTS)
    }
}

impl EmblemRequest {
    fn from_values(v: [u32; 7]) -> Self {
        Self {
            primary: v[0],
            secondary: v[1],
            emblem_primary: v[2],
            emblem_secondary: v[3],
            foreground: v[4],
            background: v[5],
            toggle: v[6],
        }
    }

    /// Read a request from a URL: path form first, then query form.
    ///
    /// The result is validated.
    pub fn from_url(url: &Url) -> Result<Self> {
        if let Some(segments) = url.path_segments() {
            for segment in segments {
                if let Some(req) = parse_key(segment.strip_suffix(".png").unwrap_or(segment))? {
                    return req.validated();
                }
            }
        }

        if url.query_pairs().any(|(k, _)| k == "EF" || k == "P") {
            return Self::from_query(url)?.validated();
        }

        Err(Error::MissingParameters)
    }

    /// Read a request from a bare request target such as `/P1-...png?x=y`.
    pub fn from_target(target: &str) -> Result<Self> {
        let url = Url::parse("http://localhost/")
            .and_then(|base| base.join(target))
            .map_err(|e| Error::InvalidRequest(format!("bad request target: {}", e)))?;
        Self::from_url(&url)
    }

    fn from_query(url: &Url) -> Result<Self> {
        let mut values = QUERY_DEFAULTS;
        for (key, value) in url.query_pairs() {
            if let Some(i) = KEYS.iter().position(|k| *k == key) {
                values[i] = value.trim().parse().map_err(|_| {
                    Error::InvalidRequest(format!("{} must be a non-negative integer, got {:?}", key, value))
                })?;
            }
        }
        Ok(Self::from_values(values))
    }

    /// Check every index against its table.
    pub fn validated(self) -> Result<Self> {
        if self.foreground as usize >= FOREGROUNDS.len() {
            return Err(Error::InvalidRequest(format!(
                "EF={} is out of range (0-{})",
                self.foreground,
                FOREGROUNDS.len() - 1
            )));
        }
        if self.background as usize >= BACKGROUNDS.len() {
            return Err(Error::InvalidRequest(format!(
                "EB={} is out of range (0-{})",
                self.background,
                BACKGROUNDS.len() - 1
            )));
        }
        for (key, value) in [
            ("P", self.primary),
            ("S", self.secondary),
            ("EP", self.emblem_primary),
            ("ES", self.emblem_secondary),
        ] {
            if value as usize >= PALETTE.len() {
                return Err(Error::InvalidRequest(format!(
                    "{}={} is not a palette color (0-{})",
                    key,
                    value,
                    PALETTE.len() - 1
                )));
            }
        }
        Ok(self)
    }

    /// Canonical `P{P}-S{S}-EP{EP}-ES{ES}-EF{EF}-EB{EB}-ET{ET}` form
    pub fn cache_key(&self) -> String {
        self.to_string()
    }

    pub fn sprite_index(&self, layer: Layer) -> usize {
        match layer {
            Layer::Foreground => self.foreground as usize,
            Layer::Background => self.background as usize,
        }
    }

    /// Palette colors for this request; `None` if an index is out of range.
    pub fn colors(&self) -> Option<EmblemColors> {
        Some(EmblemColors {
            primary: palette::color(self.primary as usize)?,
            secondary: palette::color(self.secondary as usize)?,
            foreground_primary: palette::color(self.emblem_primary as usize)?,
            foreground_secondary: palette::color(self.emblem_secondary as usize)?,
            toggle: self.toggle == 1,
        })
    }
}

impl fmt::Display for EmblemRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P{}-S{}-EP{}-ES{}-EF{}-EB{}-ET{}",
            self.primary,
            self.secondary,
            self.emblem_primary,
            self.emblem_secondary,
            self.foreground,
            self.background,
            self.toggle
        )
    }
}

impl FromStr for EmblemRequest {
    type Err = Error;

    /// Parse the canonical key (no validation).
    fn from_str(s: &str) -> Result<Self> {
        parse_key(s)?.ok_or(Error::MissingParameters)
    }
}

/// `Ok(None)` when `s` is not shaped like a key at all.
fn parse_key(s: &str) -> Result<Option<EmblemRequest>> {
    let parts: Vec<&str> = s.split('-').collect();
    if parts.len() != KEYS.len() {
        return Ok(None);
    }

    let mut digits = [""; 7];
    for (i, (part, key)) in parts.iter().zip(KEYS).enumerate() {
        match part.strip_prefix(key) {
            Some(d) if !d.is_empty() && d.bytes().all(|b| b.is_ascii_digit()) => digits[i] = d,
            _ => return Ok(None),
        }
    }

    let mut values = [0u32; 7];
    for (i, d) in digits.iter().enumerate() {
        values[i] = d
            .parse()
            .map_err(|_| Error::InvalidRequest(format!("{}={} is out of range", KEYS[i], d)))?;
    }
    Ok(Some(EmblemRequest::from_values(values)))
}
