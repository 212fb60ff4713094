//! Content engine facade.
//!
//! Ties the pipeline, the cache components and the mutation coordinator
//! together behind one handle. Reads are cache-first; mutations are reported
//! by the caller through the `invalidate_on_*` operations, which complete
//! their cache work before returning.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{
    CacheConfig, CacheStore, ListCache, MemoryStore, MutationCoordinator, PageViewCache,
    SiteCache, UpdateTarget,
};
use crate::config::Settings;
use crate::domain::entities::{LATEST_VERSION, PageContentVersion};
use crate::domain::views::PageView;

use super::error::EngineError;
use super::render::{CustomToken, PageReference, TextPipeline, TextPlugin};
use super::repos::PageStore;

pub struct ContentEngine {
    settings: Settings,
    store: Arc<dyn PageStore>,
    lists: Arc<ListCache>,
    site: Arc<SiteCache>,
    views: Arc<PageViewCache>,
    pipeline: TextPipeline,
    coordinator: MutationCoordinator,
}

impl ContentEngine {
    pub fn builder(settings: Settings, store: Arc<dyn PageStore>) -> ContentEngineBuilder {
        ContentEngineBuilder::new(settings, store)
    }

    /// Render one page version, serving from the page view cache when
    /// possible. [`LATEST_VERSION`] resolves to the current latest content.
    pub fn render_page(
        &self,
        page_id: i64,
        version_number: u32,
    ) -> Result<PageView, EngineError> {
        // Captured before any content load: a mutation reported while this
        // render is in flight moves the stamp and voids the write-back below.
        let observed = self.views.generation();
        if let Some(view) = self.views.get(page_id, version_number) {
            return Ok(view);
        }

        let page = self
            .store
            .find_by_id(page_id)?
            .ok_or(EngineError::PageNotFound { page_id })?;
        let content = self.load_content(page_id, version_number)?;

        let reference = PageReference::new(page_id, content.version_number);
        let output = self.pipeline.execute(&reference, &content.text);
        let view = PageView::assemble(&page, &content, output.html);

        let stored = self.views.add_guarded(page_id, version_number, &view, observed);
        if stored
            && version_number == LATEST_VERSION
            && page.has_tag(&self.settings.wiki.homepage_tag)
        {
            self.views.add_homepage_guarded(&view, observed);
        }

        debug!(page_id, version_number, degraded = output.degraded, "Rendered page view");
        Ok(view)
    }

    /// The cached homepage view, if one is designated and cached.
    pub fn cached_homepage(&self) -> Option<PageView> {
        self.views.get_homepage()
    }

    // ========================================================================
    // Mutation reporting
    // ========================================================================

    /// A page was created.
    pub fn invalidate_on_page_add(&self, page_id: i64) {
        self.coordinator.page_added(page_id);
    }

    /// A page's content or metadata changed. Call after the write is
    /// durable, passing the version number that was latest before the write
    /// so its stale entry is dropped along with the latest-sentinel. Pass
    /// `None` for metadata-only edits; the entry under the current latest
    /// version number is dropped instead, since its metadata went stale.
    pub fn invalidate_on_page_update(
        &self,
        page_id: i64,
        replaced_version: Option<u32>,
    ) -> Result<(), EngineError> {
        let target = self.update_target(page_id, replaced_version)?;
        self.coordinator.page_updated(target);
        Ok(())
    }

    /// A page was deleted.
    pub fn invalidate_on_page_delete(&self, page_id: i64) {
        self.coordinator.page_deleted(page_id);
    }

    /// A tag was renamed. Call with the tag as currently persisted, so the
    /// lookup finds every page carrying it.
    pub fn invalidate_on_tag_rename(&self, tag: &str) -> Result<(), EngineError> {
        let pages = self.store.find_by_tag(tag)?;
        let mut targets = Vec::with_capacity(pages.len());
        for page in &pages {
            targets.push(self.update_target(page.id, None)?);
        }
        self.coordinator.tag_renamed(&targets);
        Ok(())
    }

    // ========================================================================
    // Cache access
    // ========================================================================

    pub fn list_cache(&self) -> &Arc<ListCache> {
        &self.lists
    }

    pub fn site_cache(&self) -> &Arc<SiteCache> {
        &self.site
    }

    pub fn page_view_cache(&self) -> &Arc<PageViewCache> {
        &self.views
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn load_content(
        &self,
        page_id: i64,
        version_number: u32,
    ) -> Result<PageContentVersion, EngineError> {
        let content = if version_number == LATEST_VERSION {
            self.store.latest_version(page_id)?
        } else {
            self.store.version(page_id, version_number)?
        };
        content.ok_or(EngineError::VersionNotFound {
            page_id,
            version_number,
        })
    }

    fn update_target(
        &self,
        page_id: i64,
        replaced_version: Option<u32>,
    ) -> Result<UpdateTarget, EngineError> {
        let record = self.store.find_by_id(page_id)?;
        let replaced_version = match replaced_version {
            Some(version) => Some(version),
            None => self
                .store
                .latest_version(page_id)?
                .map(|version| version.version_number),
        };
        // Carries the tag now, or owns the cached homepage entry from before
        // the mutation stripped the tag.
        let is_homepage = record
            .map(|page| page.has_tag(&self.settings.wiki.homepage_tag))
            .unwrap_or(false)
            || self
                .views
                .get_homepage()
                .is_some_and(|view| view.page_id == page_id);
        Ok(UpdateTarget {
            page_id,
            replaced_version,
            is_homepage,
        })
    }
}

pub struct ContentEngineBuilder {
    settings: Settings,
    store: Arc<dyn PageStore>,
    cache_store: Option<Arc<dyn CacheStore>>,
    plugins: Vec<Arc<dyn TextPlugin>>,
    tokens: Vec<CustomToken>,
}

impl ContentEngineBuilder {
    pub fn new(settings: Settings, store: Arc<dyn PageStore>) -> Self {
        Self {
            settings,
            store,
            cache_store: None,
            plugins: Vec::new(),
            tokens: Vec::new(),
        }
    }

    /// Replace the default in-process cache store.
    pub fn with_cache_store(mut self, cache_store: Arc<dyn CacheStore>) -> Self {
        self.cache_store = Some(cache_store);
        self
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn TextPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_token(mut self, token: CustomToken) -> Self {
        self.tokens.push(token);
        self
    }

    pub fn build(self) -> ContentEngine {
        let cache_config = CacheConfig::from(&self.settings.cache);
        let cache_store = self
            .cache_store
            .unwrap_or_else(|| Arc::new(MemoryStore::new(&cache_config)));

        let lists = Arc::new(ListCache::new(cache_config.clone(), cache_store.clone()));
        let site = Arc::new(SiteCache::new(cache_config.clone(), cache_store.clone()));
        let views = Arc::new(PageViewCache::new(cache_config, cache_store));

        let mut pipeline = TextPipeline::builder(&self.settings, self.store.clone())
            .with_site_cache(site.clone());
        for plugin in self.plugins {
            pipeline = pipeline.with_plugin(plugin);
        }
        for token in self.tokens {
            pipeline = pipeline.with_token(token);
        }
        let pipeline = pipeline.build();

        let coordinator = MutationCoordinator::new(lists.clone(), views.clone());

        ContentEngine {
            settings: self.settings,
            store: self.store,
            lists,
            site,
            views,
            pipeline,
            coordinator,
        }
    }
}
