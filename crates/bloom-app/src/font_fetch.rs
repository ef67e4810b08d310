//! Typeface font acquisition over HTTP or from local files
//!
//! This module handles:
//! 1. Fetching typeface JSON from `http(s)://` sources, reporting progress per chunk
//! 2. Reading typeface JSON from `file://` URLs or plain paths
//! 3. Caching fetched fonts by SHA and serving the cached copy when the same
//!    URL is unreachable

use anyhow::{Context, Result};
use bloom_core::{
    Acquire, AcquireEvent, AcquisitionError, Progress, ResourceCache, SourceId, TypefaceFont,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

type EventSender = mpsc::UnboundedSender<AcquireEvent<TypefaceFont>>;

/// Where a candidate source points
#[derive(Debug, Clone, PartialEq, Eq)]
enum SourceKind {
    Http(String),
    File(PathBuf),
    Unsupported,
}

fn classify(source: &SourceId) -> SourceKind {
    let s = source.as_str();
    if s.starts_with("http://") || s.starts_with("https://") {
        SourceKind::Http(s.to_string())
    } else if let Some(path) = s.strip_prefix("file://") {
        SourceKind::File(PathBuf::from(path))
    } else if s.contains("://") || s.is_empty() {
        SourceKind::Unsupported
    } else {
        SourceKind::File(PathBuf::from(s))
    }
}

/// Font acquirer with an optional download cache
pub struct FontAcquirer {
    client: reqwest::Client,
    cache: Option<Arc<RwLock<ResourceCache>>>,
}

impl FontAcquirer {
    /// Create a new acquirer; `cache_dir` enables the download cache.
    ///
    /// A cache directory that cannot be opened disables the cache instead of
    /// failing.
    pub fn new(timeout: Duration, cache_dir: Option<PathBuf>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        let cache = match cache_dir {
            Some(dir) => match ResourceCache::new(dir.clone()) {
                Ok(cache) => Some(Arc::new(RwLock::new(cache))),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Font cache unavailable, continuing without it");
                    None
                }
            },
            None => None,
        };

        Ok(Self { client, cache })
    }

    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }
}

impl Acquire for FontAcquirer {
    type Resource = TypefaceFont;

    fn acquire(&self, source: &SourceId) -> mpsc::UnboundedReceiver<AcquireEvent<TypefaceFont>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = self.client.clone();
        let cache = self.cache.clone();
        let kind = classify(source);

        tokio::spawn(async move {
            let result = match kind {
                SourceKind::Http(url) => fetch_http(&client, cache.as_deref(), &url, &tx).await,
                SourceKind::File(path) => read_file(&path, &tx).await,
                SourceKind::Unsupported => Err(AcquisitionError::UnsupportedSource(
                    "expected http(s)://, file:// or a path".to_string(),
                )),
            };
            let event = match result {
                Ok(font) => AcquireEvent::Loaded(font),
                Err(e) => AcquireEvent::Failed(e),
            };
            // The loader may already have moved on; nothing to do if so
            let _ = tx.send(event);
        });

        rx
    }
}

async fn fetch_http(
    client: &reqwest::Client,
    cache: Option<&RwLock<ResourceCache>>,
    url: &str,
    tx: &EventSender,
) -> Result<TypefaceFont, AcquisitionError> {
    debug!(url = %url, "Fetching remote font");

    let mut response = match client.get(url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(url = %url, error = %e, "Failed to fetch font, trying cache fallback");
            return cached_or(cache, url, AcquisitionError::Network(e.to_string())).await;
        }
    };

    if !response.status().is_success() {
        let status = response.status().as_u16();
        warn!(url = %url, status = status, "Font fetch returned non-success status, trying cache fallback");
        return cached_or(cache, url, AcquisitionError::Http { status }).await;
    }

    let total = response.content_length();
    let mut body = Vec::new();
    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(e) => {
                warn!(url = %url, error = %e, "Font download interrupted, trying cache fallback");
                return cached_or(cache, url, AcquisitionError::Network(e.to_string())).await;
            }
        };
        body.extend_from_slice(&chunk);
        let _ = tx.send(AcquireEvent::Progress(Progress {
            loaded: body.len() as u64,
            total,
        }));
    }

    let content = String::from_utf8(body).map_err(|e| AcquisitionError::Parse(e.to_string()))?;
    let font = TypefaceFont::from_json(&content)?;

    if let Some(cache) = cache {
        match cache.write().await.store(url, content.as_bytes()) {
            Ok(path) => info!(url = %url, path = %path.display(), "Cached remote font"),
            Err(e) => warn!(url = %url, error = %e, "Failed to cache font"),
        }
    }

    Ok(font)
}

/// Serve `url` from the cache, or fail with `error` when it was never cached
async fn cached_or(
    cache: Option<&RwLock<ResourceCache>>,
    url: &str,
    error: AcquisitionError,
) -> Result<TypefaceFont, AcquisitionError> {
    let Some(cache) = cache else {
        return Err(error);
    };
    let content = match cache.read().await.read_by_url(url) {
        Ok(content) => content,
        Err(_) => return Err(error),
    };
    match TypefaceFont::from_json(&content) {
        Ok(font) => {
            info!(url = %url, "Using cached font fallback (offline)");
            Ok(font)
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Cached font is unreadable");
            Err(error)
        }
    }
}

async fn read_file(path: &Path, tx: &EventSender) -> Result<TypefaceFont, AcquisitionError> {
    debug!(path = %path.display(), "Reading local font");
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AcquisitionError::Io(format!("{}: {}", path.display(), e)))?;
    let len = content.len() as u64;
    let _ = tx.send(AcquireEvent::Progress(Progress {
        loaded: len,
        total: Some(len),
    }));
    Ok(TypefaceFont::from_json(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bloom_core::{FallbackLoader, RequestState};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FONT_JSON: &str = r#"{
        "familyName": "Mock",
        "resolution": 1000,
        "boundingBox": { "xMin": 0, "xMax": 700, "yMin": -200, "yMax": 800 },
        "glyphs": {
            "A": { "ha": 700, "x_min": 0, "x_max": 650, "o": "m 0 0 l 650 0 l 325 700 z" }
        }
    }"#;

    fn acquirer(cache_dir: Option<PathBuf>) -> FontAcquirer {
        FontAcquirer::new(Duration::from_secs(5), cache_dir).unwrap()
    }

    /// Drain progress and return the terminal event
    async fn outcome(
        mut rx: mpsc::UnboundedReceiver<AcquireEvent<TypefaceFont>>,
    ) -> Result<TypefaceFont, AcquisitionError> {
        while let Some(event) = rx.recv().await {
            match event {
                AcquireEvent::Progress(_) => continue,
                AcquireEvent::Loaded(font) => return Ok(font),
                AcquireEvent::Failed(e) => return Err(e),
            }
        }
        Err(AcquisitionError::Abandoned)
    }

    async fn serve(server: &MockServer, route: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    /// Serve one response that promises 5000 bytes and closes after a few
    async fn serve_truncated() -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/font.json", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5000\r\n\r\n{\"glyphs\"")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        url
    }

    #[test]
    fn test_classify_sources() {
        assert_eq!(
            classify(&SourceId::from("https://a.example/f.json")),
            SourceKind::Http("https://a.example/f.json".to_string())
        );
        assert_eq!(
            classify(&SourceId::from("file:///tmp/f.json")),
            SourceKind::File(PathBuf::from("/tmp/f.json"))
        );
        assert_eq!(
            classify(&SourceId::from("fonts/f.json")),
            SourceKind::File(PathBuf::from("fonts/f.json"))
        );
        assert_eq!(classify(&SourceId::from("ftp://a/f.json")), SourceKind::Unsupported);
    }

    #[tokio::test]
    async fn test_http_success() {
        let server = MockServer::start().await;
        serve(&server, "/font.json", 200, FONT_JSON).await;

        let url = format!("{}/font.json", server.uri());
        let font = outcome(acquirer(None).acquire(&SourceId::new(url))).await.unwrap();

        assert_eq!(font.family_name, "Mock");
    }

    #[tokio::test]
    async fn test_http_not_found_fails() {
        let server = MockServer::start().await;
        serve(&server, "/font.json", 404, "").await;

        let url = format!("{}/font.json", server.uri());
        let result = outcome(acquirer(None).acquire(&SourceId::new(url))).await;

        assert_eq!(result.unwrap_err(), AcquisitionError::Http { status: 404 });
    }

    #[tokio::test]
    async fn test_http_garbage_is_parse_error() {
        let server = MockServer::start().await;
        serve(&server, "/font.json", 200, "<html>not a font</html>").await;

        let url = format!("{}/font.json", server.uri());
        let result = outcome(acquirer(None).acquire(&SourceId::new(url))).await;

        assert!(matches!(result, Err(AcquisitionError::Parse(_))));
    }

    #[tokio::test]
    async fn test_http_failure_served_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        serve(&server, "/font.json", 503, "").await;
        let url = format!("{}/font.json", server.uri());

        {
            let mut cache = ResourceCache::new(temp_dir.path().to_path_buf()).unwrap();
            cache.store(&url, FONT_JSON.as_bytes()).unwrap();
        }

        let acquirer = acquirer(Some(temp_dir.path().to_path_buf()));
        let font = outcome(acquirer.acquire(&SourceId::new(url))).await.unwrap();

        assert_eq!(font.family_name, "Mock");
    }

    #[tokio::test]
    async fn test_truncated_body_served_from_cache() {
        let url = serve_truncated().await;
        let temp_dir = TempDir::new().unwrap();
        {
            let mut cache = ResourceCache::new(temp_dir.path().to_path_buf()).unwrap();
            cache.store(&url, FONT_JSON.as_bytes()).unwrap();
        }

        let acquirer = acquirer(Some(temp_dir.path().to_path_buf()));
        let font = outcome(acquirer.acquire(&SourceId::new(url))).await.unwrap();

        assert_eq!(font.family_name, "Mock");
    }

    #[tokio::test]
    async fn test_truncated_body_without_cache_is_network_error() {
        let url = serve_truncated().await;

        let result = outcome(acquirer(None).acquire(&SourceId::new(url))).await;

        assert!(matches!(result, Err(AcquisitionError::Network(_))));
    }

    #[test]
    fn test_corrupt_cache_manifest_does_not_block_acquirer() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("manifest.json"), "{not json").unwrap();

        let acquirer = acquirer(Some(temp_dir.path().to_path_buf()));

        assert!(acquirer.has_cache());
    }

    #[test]
    fn test_unusable_cache_dir_disables_cache() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let acquirer = acquirer(Some(blocker.join("fonts")));

        assert!(!acquirer.has_cache());
    }

    #[tokio::test]
    async fn test_successful_fetch_is_cached() {
        let temp_dir = TempDir::new().unwrap();
        let server = MockServer::start().await;
        serve(&server, "/font.json", 200, FONT_JSON).await;
        let url = format!("{}/font.json", server.uri());

        let acquirer = acquirer(Some(temp_dir.path().to_path_buf()));
        outcome(acquirer.acquire(&SourceId::new(url.as_str()))).await.unwrap();

        let cache = ResourceCache::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(cache.has_url(&url));
    }

    #[tokio::test]
    async fn test_local_file() {
        let temp_dir = TempDir::new().unwrap();
        let font_path = temp_dir.path().join("local.typeface.json");
        std::fs::write(&font_path, FONT_JSON).unwrap();

        let source = SourceId::new(format!("file://{}", font_path.display()));
        let font = outcome(acquirer(None).acquire(&source)).await.unwrap();

        assert_eq!(font.glyph_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_local_file_is_io_error() {
        let result = outcome(acquirer(None).acquire(&SourceId::from("/nonexistent/font.json"))).await;
        assert!(matches!(result, Err(AcquisitionError::Io(_))));
    }

    #[tokio::test]
    async fn test_loader_falls_back_across_backends() {
        let server = MockServer::start().await;
        serve(&server, "/gone.json", 404, "").await;
        serve(&server, "/font.json", 200, FONT_JSON).await;

        let candidates = vec![
            SourceId::new(format!("{}/gone.json", server.uri())),
            SourceId::from("/nonexistent/font.json"),
            SourceId::new(format!("{}/font.json", server.uri())),
        ];

        let loader = FallbackLoader::new(acquirer(None));
        let mut family = None;
        let report = loader
            .load(candidates, |font| family = Some(font.family_name), || {})
            .await;

        assert_eq!(report.state, RequestState::Succeeded);
        assert_eq!(report.attempts.len(), 3);
        assert_eq!(family.as_deref(), Some("Mock"));
    }
}
