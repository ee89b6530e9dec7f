//! Request orchestration: parse, consult the cache, render or fall back.

use crate::assets::{AssetOrigin, AssetPath, Layer};
use crate::cache::ResponseCache;
use crate::rendering::compose_emblem;
use crate::request::EmblemRequest;
use crate::{png, Error, Result, ServiceConfig};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::task::JoinHandle;
use url::Url;

/// Where a PNG response came from, reported as `X-Emblem-Cache`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Fallback,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Fallback => "fallback",
        }
    }
}

/// A complete HTTP answer, independent of any server framework
#[derive(Debug, Clone)]
pub struct EmblemResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl EmblemResponse {
    /// First header named `name` (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn png(body: Vec<u8>, max_age: u64, status: CacheStatus) -> Self {
        let etag = format!("\"{}\"", hex::encode(&Sha256::digest(&body)[..16]));
        Self {
            status: 200,
            headers: vec![
                ("Content-Type".into(), "image/png".into()),
                ("Cache-Control".into(), format!("public, max-age={}", max_age)),
                ("Access-Control-Allow-Origin".into(), "*".into()),
                ("ETag".into(), etag),
                ("X-Emblem-Cache".into(), status.as_str().into()),
            ],
            body,
        }
    }

    fn error(err: &Error) -> Self {
        Self {
            status: err.status_code(),
            headers: vec![
                ("Content-Type".into(), "text/plain; charset=utf-8".into()),
                ("Access-Control-Allow-Origin".into(), "*".into()),
            ],
            body: err.to_string().into_bytes(),
        }
    }
}

/// The emblem endpoint: one instance serves every request.
///
/// Holds no per-request state; the cache is the only thing shared between
/// requests.
pub struct EmblemService<O, C> {
    origin: Arc<O>,
    cache: Arc<C>,
    config: ServiceConfig,
}

impl<O: AssetOrigin, C: ResponseCache> EmblemService<O, C> {
    pub fn new(origin: O, cache: C, config: ServiceConfig) -> Self {
        Self {
            origin: Arc::new(origin),
            cache: Arc::new(cache),
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn origin(&self) -> &O {
        &self.origin
    }

    /// Fetch both sprites, composite them and encode the emblem.
    ///
    /// The two fetches run concurrently; either failing fails the render.
    pub async fn render(&self, req: &EmblemRequest) -> Result<Vec<u8>> {
        let fg_path = sprite_path(req, Layer::Foreground)?;
        let bg_path = sprite_path(req, Layer::Background)?;
        let colors = req
            .colors()
            .ok_or_else(|| Error::InvalidRequest(format!("{} uses an unknown palette index", req)))?;

        let (fg_bytes, bg_bytes) =
            futures::future::try_join(self.origin.fetch(&fg_path), self.origin.fetch(&bg_path)).await?;

        let foreground = png::decode(&fg_bytes).map_err(|source| Error::Decode {
            layer: Layer::Foreground,
            source,
        })?;
        let background = png::decode(&bg_bytes).map_err(|source| Error::Decode {
            layer: Layer::Background,
            source,
        })?;

        let emblem = compose_emblem(&foreground, &background, &colors)?;
        Ok(png::encode(&emblem))
    }

    /// Answer one emblem URL.
    ///
    /// A freshly rendered emblem is written to the cache on a detached task;
    /// its handle is returned so callers can wait for it. The response never
    /// waits on the write.
    ///
    /// # Panics
    ///
    /// The write is started with [`tokio::spawn`], so this must be polled
    /// inside a Tokio runtime. Cache hits, rejected requests and fallbacks
    /// spawn nothing.
    pub async fn serve(&self, url: &Url) -> (EmblemResponse, Option<JoinHandle<()>>) {
        let req = match EmblemRequest::from_url(url) {
            Ok(req) => req,
            Err(e) => {
                log::debug!("rejected {}: {}", url, e);
                return (EmblemResponse::error(&e), None);
            }
        };
        let key = req.cache_key();

        if let Some(body) = self.cache.get(&key).await {
            log::debug!("cache hit {}", key);
            return (EmblemResponse::png(body, self.config.max_age_secs, CacheStatus::Hit), None);
        }
        log::debug!("cache miss {}", key);

        let err = match self.render(&req).await {
            Ok(body) => {
                log::info!("rendered {} ({} bytes)", key, body.len());
                let cache = Arc::clone(&self.cache);
                let stored = body.clone();
                let store_key = key.clone();
                let handle = tokio::spawn(async move { cache.put(store_key, stored).await });
                return (
                    EmblemResponse::png(body, self.config.max_age_secs, CacheStatus::Miss),
                    Some(handle),
                );
            }
            Err(e) => e,
        };

        let fallback = AssetPath::fallback(&self.config.fallback_prefix, &key);
        log::warn!("render of {} failed ({}), trying {}", key, err, fallback);
        match self.origin.fetch(&fallback).await {
            Ok(body) => (
                EmblemResponse::png(body, self.config.fallback_max_age_secs, CacheStatus::Fallback),
                None,
            ),
            Err(fallback_err) => {
                log::error!("{}: {}; fallback failed: {}", key, err, fallback_err);
                (EmblemResponse::error(&err), None)
            }
        }
    }

    /// [`serve`](Self::serve), dropping the cache write handle.
    ///
    /// Same runtime requirement as `serve`.
    pub async fn handle(&self, url: &Url) -> EmblemResponse {
        self.serve(url).await.0
    }
}

fn sprite_path(req: &EmblemRequest, layer: Layer) -> Result<AssetPath> {
    let index = req.sprite_index(layer);
    AssetPath::sprite(layer, index)
        .ok_or_else(|| Error::InvalidRequest(format!("no {} sprite at index {}", layer, index)))
}
