//! The document controller: the single owner and mutator of an EmojiArt document.
//!
//! Every intent that changes the document rewrites the whole document to
//! storage and notifies subscribers. Selection and the decoded background
//! image live here too but are never persisted.

use crate::background::{
    BackgroundFetcher, BackgroundImage, FetchState, ImageDecoder, ImageSource, RasterDecoder,
    Resolution, UrlImageSource, image_url,
};
use crate::config::EditorConfig;
use crate::drop::DropPayload;
use crate::emoji_art::{Emoji, EmojiArt, EmojiId};
use crate::observer::{ChangeEvent, Observers, SubscriptionId};
use crate::storage::{Storage, StorageError, StorageResult};
use kurbo::{Point, Vec2};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Controller for one EmojiArt document.
pub struct EmojiArtDocument {
    emoji_art: EmojiArt,
    selected: HashSet<EmojiId>,
    background_image: Option<BackgroundImage>,
    fetcher: BackgroundFetcher,
    storage: Arc<dyn Storage>,
    observers: Observers,
    config: EditorConfig,
}

impl EmojiArtDocument {
    /// Open the document stored under `config.storage_key`, or start empty.
    ///
    /// A persisted background URL is fetched right away.
    pub fn new(
        storage: Arc<dyn Storage>,
        source: Arc<dyn ImageSource>,
        decoder: Arc<dyn ImageDecoder>,
        config: EditorConfig,
    ) -> Self {
        let emoji_art = load_or_default(storage.as_ref(), &config.storage_key);
        let mut document = Self {
            emoji_art,
            selected: HashSet::new(),
            background_image: None,
            fetcher: BackgroundFetcher::new(source, decoder),
            storage,
            observers: Observers::new(),
            config,
        };
        document.fetcher.start(document.emoji_art.background_url.as_ref());
        document
    }

    /// Open with URL retrieval, raster decoding and the default configuration.
    pub fn open(storage: Arc<dyn Storage>) -> Self {
        Self::new(
            storage,
            Arc::new(UrlImageSource::new()),
            Arc::new(RasterDecoder),
            EditorConfig::default(),
        )
    }

    // --- Reads ---

    /// The underlying document.
    pub fn emoji_art(&self) -> &EmojiArt {
        &self.emoji_art
    }

    /// Emoji in render order.
    pub fn emojis(&self) -> &[Emoji] {
        &self.emoji_art.emojis
    }

    pub fn emoji(&self, id: EmojiId) -> Option<&Emoji> {
        self.emoji_art.emoji(id)
    }

    pub fn background_url(&self) -> Option<&Url> {
        self.emoji_art.background_url.as_ref()
    }

    /// Decoded background, absent while loading or after a failure.
    pub fn background_image(&self) -> Option<&BackgroundImage> {
        self.background_image.as_ref()
    }

    pub fn fetch_state(&self) -> &FetchState {
        self.fetcher.state()
    }

    pub fn selection(&self) -> &HashSet<EmojiId> {
        &self.selected
    }

    pub fn is_selected(&self, id: EmojiId) -> bool {
        self.selected.contains(&id)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // --- Subscriptions ---

    /// Register a callback for every state change.
    pub fn subscribe(&mut self, callback: impl FnMut(&ChangeEvent) + 'static) -> SubscriptionId {
        self.observers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    // --- Document intents ---

    /// Add an emoji at a document-space location. Coordinates and size are
    /// truncated toward zero.
    pub fn add_emoji(&mut self, text: &str, location: Point, size: f64) -> EmojiId {
        let id = self
            .emoji_art
            .add_emoji(text, location.x as i32, location.y as i32, size as i32);
        self.document_changed();
        id
    }

    /// Remove an emoji. Unknown ids are ignored.
    pub fn remove_emoji(&mut self, id: EmojiId) -> bool {
        if self.emoji_art.remove_emoji(id).is_none() {
            return false;
        }
        if self.selected.remove(&id) {
            self.observers.notify(ChangeEvent::SelectionChanged);
        }
        self.document_changed();
        true
    }

    /// Move an emoji by a document-space offset, truncated toward zero.
    pub fn move_emoji(&mut self, id: EmojiId, offset: Vec2) -> bool {
        let moved = self
            .emoji_art
            .move_emoji(id, offset.x as i32, offset.y as i32);
        if moved {
            self.document_changed();
        }
        moved
    }

    /// Scale an emoji's size, rounding to nearest even.
    pub fn scale_emoji(&mut self, id: EmojiId, factor: f64) -> bool {
        let scaled = self.emoji_art.scale_emoji(id, factor);
        if scaled {
            self.document_changed();
        }
        scaled
    }

    /// Replace the background. The decoded image is dropped immediately and
    /// the new one fetched in the background.
    pub fn set_background_url(&mut self, url: Option<Url>) {
        if self.background_image.take().is_some() {
            self.observers.notify(ChangeEvent::BackgroundChanged);
        }

        self.emoji_art.background_url = url.map(image_url);
        self.document_changed();
        self.fetcher.start(self.emoji_art.background_url.as_ref());
    }

    /// Apply dropped payloads at a document-space location.
    ///
    /// A URL becomes the background and nothing else is used; otherwise each
    /// non-empty text is added as an emoji of the default size.
    pub fn drop_payloads(&mut self, payloads: &[DropPayload], at: Point) -> bool {
        let url = payloads.iter().find_map(|payload| match payload {
            DropPayload::Url(url) => Some(url),
            DropPayload::Text(_) => None,
        });
        if let Some(url) = url {
            self.set_background_url(Some(url.clone()));
            return true;
        }

        let size = self.config.default_emoji_size;
        let mut accepted = false;
        for payload in payloads {
            if let DropPayload::Text(text) = payload {
                if !text.trim().is_empty() {
                    self.add_emoji(text, at, size);
                    accepted = true;
                }
            }
        }
        accepted
    }

    // --- Selection intents ---

    /// Toggle an emoji's selection. Returns whether it is now selected.
    ///
    /// Ids that are not in the document are never added.
    pub fn select(&mut self, id: EmojiId) -> bool {
        let selected = if self.selected.remove(&id) {
            false
        } else if self.emoji_art.emoji(id).is_some() {
            self.selected.insert(id);
            true
        } else {
            return false;
        };
        self.observers.notify(ChangeEvent::SelectionChanged);
        selected
    }

    pub fn clear_selection(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.observers.notify(ChangeEvent::SelectionChanged);
    }

    /// Scale every selected emoji. Each emoji scales independently, so
    /// iteration order does not matter.
    pub fn scale_selection(&mut self, factor: f64) {
        let mut changed = false;
        for &id in &self.selected {
            changed |= self.emoji_art.scale_emoji(id, factor);
        }
        if changed {
            self.document_changed();
        }
    }

    /// Move every selected emoji by the same offset.
    pub fn move_selection(&mut self, offset: Vec2) {
        let (dx, dy) = (offset.x as i32, offset.y as i32);
        let mut changed = false;
        for &id in &self.selected {
            changed |= self.emoji_art.move_emoji(id, dx, dy);
        }
        if changed {
            self.document_changed();
        }
    }

    // --- Background handback ---

    /// Apply every fetch that has finished, without blocking.
    /// Returns how many completions were handled.
    pub fn poll_background(&mut self) -> usize {
        let mut handled = 0;
        while let Some(completion) = self.fetcher.try_next() {
            self.apply_resolution(completion);
            handled += 1;
        }
        handled
    }

    /// Block until one fetch finishes (or `timeout` passes) and apply it.
    pub fn wait_for_background(&mut self, timeout: Duration) -> bool {
        match self.fetcher.next_timeout(timeout) {
            Some(completion) => {
                self.apply_resolution(completion);
                true
            }
            None => false,
        }
    }

    /// Number of fetches still outstanding.
    pub fn pending_fetches(&self) -> usize {
        self.fetcher.in_flight()
    }

    fn apply_resolution(&mut self, completion: crate::background::Completion) {
        let current = self.emoji_art.background_url.as_ref();
        match self.fetcher.resolve(completion, current) {
            Resolution::Applied(image) => {
                self.background_image = Some(image);
                self.observers.notify(ChangeEvent::BackgroundChanged);
            }
            Resolution::Failed => {
                if self.background_image.take().is_some() {
                    self.observers.notify(ChangeEvent::BackgroundChanged);
                }
            }
            Resolution::Stale => {}
        }
    }

    // --- Persistence ---

    fn document_changed(&mut self) {
        self.persist();
        self.observers.notify(ChangeEvent::DocumentChanged);
    }

    /// Best effort: failures are logged and otherwise ignored.
    fn persist(&self) {
        if let Err(e) = self.save() {
            log::warn!("Failed to save document: {}", e);
        }
    }

    fn save(&self) -> StorageResult<()> {
        let bytes = self.emoji_art.to_bytes()?;
        self.storage.save(&self.config.storage_key, &bytes)
    }
}

fn load_or_default(storage: &dyn Storage, key: &str) -> EmojiArt {
    match storage.load(key) {
        Ok(bytes) => {
            let emoji_art = EmojiArt::from_bytes_or_default(&bytes);
            log::info!("Document loaded: {} emoji", emoji_art.len());
            emoji_art
        }
        Err(StorageError::NotFound(_)) => {
            log::info!("No saved document found, starting empty");
            EmojiArt::new()
        }
        Err(e) => {
            log::warn!("Failed to load document, starting empty: {}", e);
            EmojiArt::new()
        }
    }
}

impl std::fmt::Debug for EmojiArtDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmojiArtDocument")
            .field("emoji_art", &self.emoji_art)
            .field("selected", &self.selected)
            .field("fetch_state", self.fetcher.state())
            .field("observers", &self.observers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background::fakes::{FakeSource, SizeDecoder};
    use crate::emoji_art::scaled_size;
    use crate::storage::MemoryStorage;
    use std::cell::RefCell;
    use std::rc::Rc;

    const WAIT: Duration = Duration::from_secs(5);
    const KEY: &str = "EmojiArtDocument.Untitled";

    fn open_with(storage: Arc<dyn Storage>, source: FakeSource) -> EmojiArtDocument {
        EmojiArtDocument::new(storage, Arc::new(source), Arc::new(SizeDecoder), EditorConfig::default())
    }

    fn open(storage: Arc<MemoryStorage>) -> EmojiArtDocument {
        open_with(storage, FakeSource::new())
    }

    fn stored(storage: &MemoryStorage) -> EmojiArt {
        EmojiArt::from_bytes(&storage.load(KEY).unwrap()).unwrap()
    }

    fn record_events(document: &mut EmojiArtDocument) -> Rc<RefCell<Vec<ChangeEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        document.subscribe(move |e| sink.borrow_mut().push(*e));
        events
    }

    struct FailingStorage;

    impl Storage for FailingStorage {
        fn save(&self, _key: &str, _value: &[u8]) -> StorageResult<()> {
            Err(StorageError::Io("disk full".to_string()))
        }
        fn load(&self, key: &str) -> StorageResult<Vec<u8>> {
            Err(StorageError::NotFound(key.to_string()))
        }
        fn delete(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }
        fn list(&self) -> StorageResult<Vec<String>> {
            Ok(vec![])
        }
        fn exists(&self, _key: &str) -> StorageResult<bool> {
            Ok(false)
        }
    }

    #[test]
    fn test_opens_empty_without_saved_document() {
        let doc = open(Arc::new(MemoryStorage::new()));
        assert!(doc.emojis().is_empty());
        assert!(doc.background_url().is_none());
        assert_eq!(doc.fetch_state(), &FetchState::Idle);
    }

    #[test]
    fn test_opens_empty_with_unreadable_document() {
        let storage = Arc::new(MemoryStorage::with_value(KEY, b"{{{".to_vec()));
        let doc = open(storage);
        assert!(doc.emojis().is_empty());
    }

    #[test]
    fn test_open_raises_stored_sizes_to_one() {
        let blob = br#"{"emojis":[{"id":"5f0c2a8e-6b1d-4c3a-9e7f-0a1b2c3d4e5f","text":"x","x":0,"y":0,"size":-7}]}"#;
        let storage = Arc::new(MemoryStorage::with_value(KEY, blob.to_vec()));
        let doc = open(storage);

        assert_eq!(doc.emojis().len(), 1);
        assert!(doc.emojis().iter().all(|e| e.size > 0));
        let viewport = crate::viewport::Viewport::new();
        assert!(viewport.font_size(&doc.emojis()[0], &doc) > 0.0);
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let storage = Arc::new(MemoryStorage::new());
        let mut doc = open(Arc::clone(&storage));

        let id = doc.add_emoji("🍎", Point::new(12.7, -3.9), 40.0);
        let saved = stored(&storage);
        assert_eq!(saved.len(), 1);
        assert_eq!((saved.emojis[0].x, saved.emojis[0].y), (12, -3));

        doc.move_emoji(id, Vec2::new(5.0, 5.0));
        assert_eq!(stored(&storage).emoji(id).map(|e| (e.x, e.y)), Some((17, 2)));

        doc.scale_emoji(id, 0.5);
        assert_eq!(stored(&storage).emoji(id).map(|e| e.size), Some(20));

        doc.remove_emoji(id);
        assert!(stored(&storage).is_empty());
    }

    #[test]
    fn test_reopen_restores_document() {
        let storage = Arc::new(MemoryStorage::new());
        let (a, b) = {
            let mut doc = open(Arc::clone(&storage));
            let a = doc.add_emoji("🌏", Point::new(1.0, 2.0), 30.0);
            let b = doc.add_emoji("🥨", Point::new(-4.0, 8.0), 50.0);
            (a, b)
        };

        let doc = open(storage);
        let ids: Vec<_> = doc.emojis().iter().map(Emoji::id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(doc.emoji(b).map(|e| e.size), Some(50));
    }

    #[test]
    fn test_id_stable_across_operations() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let id = doc.add_emoji("⭐️", Point::ZERO, 40.0);

        doc.move_emoji(id, Vec2::new(3.0, 4.0));
        doc.scale_emoji(id, 2.0);
        doc.select(id);
        doc.scale_selection(1.5);
        doc.move_selection(Vec2::new(-1.0, -1.0));
        doc.clear_selection();

        assert_eq!(doc.emojis().len(), 1);
        assert_eq!(doc.emojis()[0].id(), id);
    }

    #[test]
    fn test_missing_id_changes_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let mut doc = open(Arc::clone(&storage));
        doc.add_emoji("⚾️", Point::new(1.0, 1.0), 40.0);
        let before = storage.load(KEY).unwrap();
        let events = record_events(&mut doc);

        let missing = uuid::Uuid::new_v4();
        assert!(!doc.move_emoji(missing, Vec2::new(10.0, 10.0)));
        assert!(!doc.scale_emoji(missing, 3.0));
        assert!(!doc.remove_emoji(missing));

        assert_eq!(storage.load(KEY).unwrap(), before);
        assert_eq!(doc.emoji_art().to_bytes().unwrap(), before);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_select_toggles() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let id = doc.add_emoji("🍎", Point::ZERO, 40.0);

        assert!(!doc.is_selected(id));
        assert!(doc.select(id));
        assert!(doc.is_selected(id));
        assert!(!doc.select(id));
        assert!(!doc.is_selected(id));
        assert!(doc.selection().is_empty());
    }

    #[test]
    fn test_select_unknown_id_is_ignored() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let events = record_events(&mut doc);
        assert!(!doc.select(uuid::Uuid::new_v4()));
        assert!(doc.selection().is_empty());
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_clear_selection() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let a = doc.add_emoji("a", Point::ZERO, 40.0);
        let b = doc.add_emoji("b", Point::ZERO, 40.0);
        doc.select(a);
        doc.select(b);

        doc.clear_selection();
        assert!(!doc.is_selected(a));
        assert!(!doc.is_selected(b));
    }

    #[test]
    fn test_remove_drops_selection() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let id = doc.add_emoji("🍎", Point::ZERO, 40.0);
        doc.select(id);

        assert!(doc.remove_emoji(id));
        assert!(doc.selection().is_empty());
    }

    #[test]
    fn test_scale_selection_is_order_independent() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let sizes = [7, 13, 40, 41, 99];
        let ids: Vec<_> = sizes
            .iter()
            .map(|&s| doc.add_emoji("x", Point::ZERO, f64::from(s)))
            .collect();
        let unselected = doc.add_emoji("y", Point::ZERO, 10.0);
        for &id in &ids {
            doc.select(id);
        }

        doc.scale_selection(1.5);

        // Same result as scaling each emoji on its own, in reverse order.
        let mut reference = EmojiArt::new();
        let reference_ids: Vec<_> = sizes.iter().map(|&s| reference.add_emoji("x", 0, 0, s)).collect();
        for &id in reference_ids.iter().rev() {
            reference.scale_emoji(id, 1.5);
        }

        for (i, &id) in ids.iter().enumerate() {
            let size = doc.emoji(id).unwrap().size;
            assert_eq!(size, reference.emoji(reference_ids[i]).unwrap().size);
            assert_eq!(Some(size), scaled_size(sizes[i], 1.5));
        }
        assert_eq!(doc.emoji(unselected).unwrap().size, 10);
    }

    #[test]
    fn test_move_selection() {
        let storage = Arc::new(MemoryStorage::new());
        let mut doc = open(Arc::clone(&storage));
        let a = doc.add_emoji("a", Point::new(0.0, 0.0), 40.0);
        let b = doc.add_emoji("b", Point::new(10.0, 10.0), 40.0);
        doc.select(a);

        doc.move_selection(Vec2::new(5.9, -2.2));

        assert_eq!(doc.emoji(a).map(|e| (e.x, e.y)), Some((5, -2)));
        assert_eq!(doc.emoji(b).map(|e| (e.x, e.y)), Some((10, 10)));
        assert_eq!(stored(&storage).emoji(a).map(|e| e.x), Some(5));
    }

    #[test]
    fn test_notifications() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let events = record_events(&mut doc);

        let id = doc.add_emoji("🍎", Point::ZERO, 40.0);
        doc.select(id);
        doc.remove_emoji(id);

        assert_eq!(
            *events.borrow(),
            vec![
                ChangeEvent::DocumentChanged,
                ChangeEvent::SelectionChanged,
                ChangeEvent::SelectionChanged,
                ChangeEvent::DocumentChanged,
            ]
        );
    }

    #[test]
    fn test_persistence_failure_is_ignored() {
        let mut doc = open_with(Arc::new(FailingStorage), FakeSource::new());
        let id = doc.add_emoji("🍎", Point::ZERO, 40.0);
        assert!(doc.move_emoji(id, Vec2::new(1.0, 1.0)));
        assert_eq!(doc.emoji(id).map(|e| e.x), Some(1));
    }

    #[test]
    fn test_background_resolves() {
        let url = Url::parse("https://example.com/sky.png").unwrap();
        let source = FakeSource::new().respond(url.as_str(), b"640x480");
        let storage = Arc::new(MemoryStorage::new());
        let mut doc = open_with(storage.clone(), source);
        let events = record_events(&mut doc);

        doc.set_background_url(Some(url.clone()));
        assert_eq!(doc.fetch_state(), &FetchState::Fetching(url.clone()));
        assert_eq!(stored(&storage).background_url, Some(url.clone()));

        assert!(doc.wait_for_background(WAIT));
        let image = doc.background_image().expect("image should be set");
        assert_eq!((image.width(), image.height()), (640, 480));
        assert_eq!(doc.fetch_state(), &FetchState::Resolved(url));
        assert_eq!(
            *events.borrow(),
            vec![ChangeEvent::DocumentChanged, ChangeEvent::BackgroundChanged]
        );
    }

    #[test]
    fn test_background_cleared_immediately_on_change() {
        let a = Url::parse("https://example.com/a.png").unwrap();
        let b = Url::parse("https://example.com/b.png").unwrap();
        let source = FakeSource::new().respond(a.as_str(), b"10x10");
        let release_b = source.gate(b.as_str());
        let mut doc = open_with(Arc::new(MemoryStorage::new()), source);

        doc.set_background_url(Some(a));
        assert!(doc.wait_for_background(WAIT));
        assert!(doc.background_image().is_some());

        let events = record_events(&mut doc);
        doc.set_background_url(Some(b));
        assert!(doc.background_image().is_none());
        // The stale image is gone before the document change is announced.
        assert_eq!(
            *events.borrow(),
            vec![ChangeEvent::BackgroundChanged, ChangeEvent::DocumentChanged]
        );
        release_b.send(()).unwrap();
    }

    #[test]
    fn test_stale_fetch_is_discarded() {
        let a = Url::parse("https://example.com/a.png").unwrap();
        let b = Url::parse("https://example.com/b.png").unwrap();
        let source = FakeSource::new()
            .respond(a.as_str(), b"1x1")
            .respond(b.as_str(), b"2x2");
        let release_a = source.gate(a.as_str());
        let mut doc = open_with(Arc::new(MemoryStorage::new()), source);

        doc.set_background_url(Some(a));
        doc.set_background_url(Some(b.clone()));

        assert!(doc.wait_for_background(WAIT));
        assert_eq!(doc.background_image().map(|i| i.width()), Some(2));

        release_a.send(()).unwrap();
        assert!(doc.wait_for_background(WAIT));
        assert_eq!(doc.background_image().map(|i| i.width()), Some(2));
        assert_eq!(doc.fetch_state(), &FetchState::Resolved(b));
        assert_eq!(doc.pending_fetches(), 0);
    }

    #[test]
    fn test_stale_fetch_finishing_first_leaves_no_image() {
        let a = Url::parse("https://example.com/a.png").unwrap();
        let b = Url::parse("https://example.com/b.png").unwrap();
        let source = FakeSource::new()
            .respond(a.as_str(), b"1x1")
            .respond(b.as_str(), b"2x2");
        let release_a = source.gate(a.as_str());
        let release_b = source.gate(b.as_str());
        let mut doc = open_with(Arc::new(MemoryStorage::new()), source);

        doc.set_background_url(Some(a));
        doc.set_background_url(Some(b.clone()));

        release_a.send(()).unwrap();
        assert!(doc.wait_for_background(WAIT));
        assert!(doc.background_image().is_none());
        assert_eq!(doc.fetch_state(), &FetchState::Fetching(b));

        release_b.send(()).unwrap();
        assert!(doc.wait_for_background(WAIT));
        assert_eq!(doc.background_image().map(|i| i.width()), Some(2));
    }

    #[test]
    fn test_failed_fetch_leaves_no_image() {
        let url = Url::parse("https://example.com/missing.png").unwrap();
        let mut doc = open_with(Arc::new(MemoryStorage::new()), FakeSource::new());

        doc.set_background_url(Some(url));
        assert!(doc.wait_for_background(WAIT));
        assert!(doc.background_image().is_none());
        assert_eq!(doc.fetch_state(), &FetchState::Discarded);
    }

    #[test]
    fn test_clearing_background() {
        let storage = Arc::new(MemoryStorage::new());
        let mut doc = open(Arc::clone(&storage));
        doc.set_background_url(Some(Url::parse("https://example.com/a.png").unwrap()));
        doc.set_background_url(None);

        assert!(doc.background_url().is_none());
        assert_eq!(doc.fetch_state(), &FetchState::Idle);
        assert!(stored(&storage).background_url.is_none());

        // The first fetch still finishes, but no longer matches.
        assert!(doc.wait_for_background(WAIT));
        assert!(doc.background_image().is_none());
        assert_eq!(doc.fetch_state(), &FetchState::Idle);
    }

    #[test]
    fn test_background_url_uses_embedded_image() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let link = Url::parse("https://search.example.com/imgres?imgurl=https://cdn.example.com/cat.jpg").unwrap();
        doc.set_background_url(Some(link));
        assert_eq!(
            doc.background_url().map(Url::as_str),
            Some("https://cdn.example.com/cat.jpg")
        );
    }

    #[test]
    fn test_reopen_fetches_saved_background() {
        let url = Url::parse("https://example.com/saved.png").unwrap();
        let mut saved = EmojiArt::new();
        saved.background_url = Some(url.clone());
        let storage = Arc::new(MemoryStorage::with_value(KEY, saved.to_bytes().unwrap()));

        let mut doc = open_with(storage, FakeSource::new().respond(url.as_str(), b"3x3"));
        assert_eq!(doc.fetch_state(), &FetchState::Fetching(url));
        assert!(doc.wait_for_background(WAIT));
        assert_eq!(doc.background_image().map(|i| i.height()), Some(3));
    }

    #[test]
    fn test_poll_background_drains() {
        let url = Url::parse("https://example.com/a.png").unwrap();
        let mut doc = open_with(
            Arc::new(MemoryStorage::new()),
            FakeSource::new().respond(url.as_str(), b"5x5"),
        );
        doc.set_background_url(Some(url));

        let deadline = std::time::Instant::now() + WAIT;
        while doc.poll_background() == 0 && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(doc.background_image().is_some());
    }

    #[test]
    fn test_drop_multiple_texts() {
        let mut doc = open(Arc::new(MemoryStorage::new()));
        let accepted = doc.drop_payloads(
            &[DropPayload::Text("🍎".to_string()), DropPayload::Text("🌏".to_string())],
            Point::new(3.0, 4.0),
        );
        assert!(accepted);
        let texts: Vec<_> = doc.emojis().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["🍎", "🌏"]);
        assert!(doc.emojis().iter().all(|e| e.size == 40 && e.x == 3 && e.y == 4));
    }
}
