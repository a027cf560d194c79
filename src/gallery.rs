//! Newest-first collection of completed generations.

use crate::image::GeneratedImage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// Size policy for a [`GalleryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GalleryLimit {
    /// Every committed image is kept for the lifetime of the session.
    #[default]
    Unbounded,
    /// At most this many images are kept; committing past the cap evicts
    /// the oldest entry. The newly committed image is always kept.
    Bounded(NonZeroUsize),
}

impl GalleryLimit {
    /// Builds a limit from an optional cap (`None` is unbounded).
    pub fn from_cap(cap: Option<NonZeroUsize>) -> Self {
        cap.map_or(Self::Unbounded, Self::Bounded)
    }

    /// A bounded limit of `cap` images, or `None` if `cap` is zero.
    pub fn bounded(cap: usize) -> Option<Self> {
        NonZeroUsize::new(cap).map(Self::Bounded)
    }
}

/// Ordered sequence of generated images, newest first.
///
/// Entries are only ever added at the front. Nothing is deduplicated:
/// repeating a prompt yields a new entry each time.
#[derive(Debug, Clone, Default)]
pub struct GalleryStore {
    images: VecDeque<GeneratedImage>,
    limit: GalleryLimit,
}

impl GalleryStore {
    /// Creates an empty, unbounded gallery.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty gallery with the given size policy.
    pub fn with_limit(limit: GalleryLimit) -> Self {
        Self {
            images: VecDeque::new(),
            limit,
        }
    }

    /// Prepends `image`, returning the evicted entry if the cap was hit.
    pub fn commit(&mut self, image: GeneratedImage) -> Option<GeneratedImage> {
        self.images.push_front(image);
        match self.limit {
            GalleryLimit::Bounded(cap) if self.images.len() > cap.get() => self.images.pop_back(),
            _ => None,
        }
    }

    /// Snapshot of the gallery in display order.
    pub fn list(&self) -> Vec<GeneratedImage> {
        self.images.iter().cloned().collect()
    }

    /// Iterates the gallery in display order without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &GeneratedImage> {
        self.images.iter()
    }

    /// Looks up an image by id.
    pub fn get(&self, id: &str) -> Option<&GeneratedImage> {
        self.images.iter().find(|img| img.id() == id)
    }

    /// The most recently committed image.
    pub fn latest(&self) -> Option<&GeneratedImage> {
        self.images.front()
    }

    /// Number of images held.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns true if nothing has been committed yet.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The size policy in force.
    pub fn limit(&self) -> GalleryLimit {
        self.limit
    }

    /// Timestamp for the next entry: `now`, unless the clock has stepped
    /// behind the newest entry.
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.latest() {
            Some(newest) if newest.timestamp() > now => newest.timestamp(),
            _ => now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{AspectRatio, InlineImage};
    use chrono::Duration;

    fn image(prompt: &str) -> GeneratedImage {
        let inline = InlineImage {
            mime_type: Some("image/png".into()),
            data: "AAAA".into(),
        };
        GeneratedImage::new(&inline, prompt, Utc::now(), AspectRatio::Square)
    }

    fn prompts(store: &GalleryStore) -> Vec<String> {
        store.iter().map(|i| i.prompt().to_string()).collect()
    }

    #[test]
    fn test_commit_prepends() {
        let mut store = GalleryStore::new();
        assert!(store.is_empty());

        store.commit(image("A"));
        store.commit(image("B"));
        store.commit(image("C"));

        assert_eq!(store.len(), 3);
        assert_eq!(prompts(&store), vec!["C", "B", "A"]);
        assert_eq!(store.latest().unwrap().prompt(), "C");
    }

    #[test]
    fn test_duplicate_prompts_are_kept() {
        let mut store = GalleryStore::new();
        store.commit(image("same"));
        store.commit(image("same"));

        let list = store.list();
        assert_eq!(list.len(), 2);
        assert_ne!(list[0].id(), list[1].id());
    }

    #[test]
    fn test_unbounded_by_default() {
        let mut store = GalleryStore::new();
        for i in 0..500 {
            assert!(store.commit(image(&i.to_string())).is_none());
        }
        assert_eq!(store.len(), 500);
        assert_eq!(store.limit(), GalleryLimit::Unbounded);
    }

    #[test]
    fn test_bounded_evicts_oldest() {
        let mut store = GalleryStore::with_limit(GalleryLimit::bounded(2).unwrap());
        assert!(store.commit(image("A")).is_none());
        assert!(store.commit(image("B")).is_none());

        let evicted = store.commit(image("C")).unwrap();
        assert_eq!(evicted.prompt(), "A");
        assert_eq!(prompts(&store), vec!["C", "B"]);
    }

    #[test]
    fn test_get_by_id() {
        let mut store = GalleryStore::new();
        let img = image("find me");
        let id = img.id().to_string();
        store.commit(img);
        store.commit(image("other"));

        assert_eq!(store.get(&id).unwrap().prompt(), "find me");
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_list_is_a_snapshot() {
        let mut store = GalleryStore::new();
        store.commit(image("A"));
        let snapshot = store.list();
        store.commit(image("B"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_next_timestamp_never_goes_backwards() {
        let mut store = GalleryStore::new();
        let now = Utc::now();
        assert_eq!(store.next_timestamp(now), now);

        store.commit(image("A"));
        let newest = store.latest().unwrap().timestamp();
        let earlier = newest - Duration::seconds(5);
        assert_eq!(store.next_timestamp(earlier), newest);

        let later = newest + Duration::seconds(5);
        assert_eq!(store.next_timestamp(later), later);
    }

    #[test]
    fn test_limit_from_cap() {
        assert_eq!(GalleryLimit::from_cap(None), GalleryLimit::Unbounded);
        assert_eq!(
            GalleryLimit::from_cap(NonZeroUsize::new(3)),
            GalleryLimit::bounded(3).unwrap()
        );
    }

    #[test]
    fn test_zero_cap_is_not_a_limit() {
        assert_eq!(GalleryLimit::bounded(0), None);
    }

    #[test]
    fn test_cap_of_one_keeps_newest() {
        let mut store = GalleryStore::with_limit(GalleryLimit::bounded(1).unwrap());
        assert!(store.commit(image("A")).is_none());

        let evicted = store.commit(image("B")).unwrap();
        assert_eq!(evicted.prompt(), "A");
        assert_eq!(prompts(&store), vec!["B"]);
    }
}
