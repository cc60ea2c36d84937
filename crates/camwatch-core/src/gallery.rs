//! Gallery — one-shot fetches of the saved-detections list.
//!
//! Unlike the status poller and stream supervisor, the gallery has no
//! schedule of its own: callers invoke [`GalleryFetcher::fetch_once`]
//! whenever they want a refresh (on startup, on a key press, on their own
//! timer).  Each successful fetch replaces the view's entry list wholesale.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::provider::{GalleryProvider, RawGallery};
use crate::view::ViewModel;

/// One saved detection, with its filename resolved to a full URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryEntry {
    pub filename: String,
    pub url: String,
}

/// A resolved gallery listing.  Ordering is the backend's: newest first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GalleryPage {
    pub entries: Vec<GalleryEntry>,
}

impl GalleryPage {
    /// Resolve a raw listing: every filename is joined onto the page's
    /// base URL.  A missing base falls back to `/`.
    pub fn from_raw(raw: RawGallery) -> Self {
        let base = raw.base_url.as_deref().unwrap_or("/");
        let entries = raw
            .images
            .into_iter()
            .map(|filename| GalleryEntry {
                url: join_url(base, &filename),
                filename,
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Join a base URL and a filename with exactly one `/` between them,
/// whatever combination of trailing/leading slashes the two carry.
fn join_url(base: &str, filename: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        filename.trim_start_matches('/')
    )
}

pub struct GalleryFetcher<P: GalleryProvider> {
    provider: Arc<P>,
    view: ViewModel,
}

// Derived Clone would require P: Clone; only the Arc is duplicated.
impl<P: GalleryProvider> Clone for GalleryFetcher<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            view: self.view.clone(),
        }
    }
}

impl<P: GalleryProvider> GalleryFetcher<P> {
    pub fn new(provider: Arc<P>, view: ViewModel) -> Self {
        Self { provider, view }
    }

    /// Fetch the listing once and replace the view's gallery with it.
    /// On error the previous list stays in place and the error is
    /// returned to the caller to surface.
    pub async fn fetch_once(&self) -> Result<GalleryPage, ProviderError> {
        let raw = match self.provider.fetch_gallery().await {
            Ok(raw) => raw,
            Err(err) => {
                warn!("gallery fetch failed: {}", err);
                return Err(err);
            }
        };

        let page = GalleryPage::from_raw(raw);
        debug!("gallery refreshed, {} entries", page.len());
        self.view.set_gallery(page.entries.clone()).await;
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedGallery {
        responses: Mutex<Vec<Result<RawGallery, ProviderError>>>,
    }

    impl ScriptedGallery {
        fn new(responses: Vec<Result<RawGallery, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    impl GalleryProvider for ScriptedGallery {
        async fn fetch_gallery(&self) -> Result<RawGallery, ProviderError> {
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn raw(images: &[&str], base_url: Option<&str>) -> RawGallery {
        RawGallery {
            images: images.iter().map(|s| s.to_string()).collect(),
            base_url: base_url.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_join_url_exactly_one_separator() {
        assert_eq!(join_url("/saved/", "a.jpg"), "/saved/a.jpg");
        assert_eq!(join_url("/saved", "a.jpg"), "/saved/a.jpg");
        assert_eq!(join_url("/saved/", "/a.jpg"), "/saved/a.jpg");
        assert_eq!(join_url("/saved", "/a.jpg"), "/saved/a.jpg");
    }

    #[test]
    fn test_missing_base_url_defaults_to_root() {
        let page = GalleryPage::from_raw(raw(&["a.jpg", "b.jpg"], None));
        assert_eq!(page.entries[0].url, "/a.jpg");
        assert_eq!(page.entries[1].url, "/b.jpg");
    }

    #[test]
    fn test_backend_order_preserved() {
        // The backend sends newest first; resolution must not reorder.
        let page = GalleryPage::from_raw(raw(&["det_3.jpg", "det_2.jpg", "det_1.jpg"], Some("/s")));
        let names: Vec<_> = page.entries.iter().map(|e| e.filename.as_str()).collect();
        assert_eq!(names, vec!["det_3.jpg", "det_2.jpg", "det_1.jpg"]);
    }

    #[tokio::test]
    async fn test_fetch_replaces_wholesale() {
        let provider = ScriptedGallery::new(vec![
            Ok(raw(&["a.jpg", "b.jpg"], Some("/saved/"))),
            Ok(raw(&["c.jpg"], Some("/saved/"))),
        ]);
        let view = ViewModel::new();
        let fetcher = GalleryFetcher::new(provider, view.clone());

        assert_eq!(fetcher.fetch_once().await.unwrap().len(), 2);
        assert_eq!(view.state().await.gallery.len(), 2);

        // The second fetch replaces, never merges: `a.jpg` and `b.jpg`
        // are gone even though the new listing is shorter.
        assert_eq!(fetcher.fetch_once().await.unwrap().len(), 1);
        let gallery = view.state().await.gallery;
        assert_eq!(gallery.len(), 1);
        assert_eq!(gallery[0].filename, "c.jpg");
        assert_eq!(gallery[0].url, "/saved/c.jpg");
    }

    #[tokio::test]
    async fn test_fetch_error_keeps_previous_list() {
        let provider = ScriptedGallery::new(vec![
            Ok(raw(&["a.jpg"], None)),
            Err(ProviderError::Unreachable("refused".into())),
        ]);
        let view = ViewModel::new();
        let fetcher = GalleryFetcher::new(provider, view.clone());

        fetcher.fetch_once().await.unwrap();
        let err = fetcher.fetch_once().await.unwrap_err();
        assert!(matches!(err, ProviderError::Unreachable(_)));
        assert_eq!(view.state().await.gallery.len(), 1);
    }
}
