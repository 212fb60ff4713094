//! Markup transform pipeline.
//!
//! Raw wiki markup becomes servable HTML through a fixed stage order:
//!
//! 1. pre-parse plugin hooks (markup in, markup out)
//! 2. markup conversion, with link and image targets resolved in the AST
//! 3. harmful-tag removal
//! 4. token substitution
//! 5. post-parse plugin hooks (HTML in, HTML out)
//!
//! Token values are sanitized once at pipeline construction, so substitution
//! after the scrub stage cannot reintroduce denied markup. A conversion
//! failure degrades to escaped plain text instead of failing the render.

mod images;
mod links;
mod markup;
mod plugins;
mod sanitize;
mod tokens;
mod types;

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::cache::{HookStage, SiteCache};
use crate::config::Settings;

use super::repos::PageStore;

pub use images::ImageResolver;
pub use links::LinkResolver;
pub use plugins::{PluginError, PluginRunner, TextPlugin};
pub use tokens::{CustomToken, TokenSet};
pub use types::{PageHtml, PageReference, RenderError};

use markup::MarkupConverter;

/// Marker replaced with the configured public site URL.
pub const SITE_URL_MARKER: &str = "%SITEURL%";

pub struct TextPipeline {
    sanitizer: crate::config::SanitizerSettings,
    converter: MarkupConverter,
    links: LinkResolver,
    images: ImageResolver,
    plugins: PluginRunner,
    tokens: TokenSet,
}

impl TextPipeline {
    pub fn builder(settings: &Settings, store: Arc<dyn PageStore>) -> TextPipelineBuilder {
        TextPipelineBuilder::new(settings, store)
    }

    /// Run the full pipeline for one page version.
    pub fn execute(&self, reference: &PageReference, markup: &str) -> PageHtml {
        counter!("foliant_render_total").increment(1);

        let markup = self
            .plugins
            .run(HookStage::BeforeParse, reference, markup);

        let converted = match self.converter.convert(&markup, &self.links, &self.images) {
            Ok(html) => html,
            Err(err) => {
                counter!("foliant_render_degraded_total").increment(1);
                warn!(
                    page_id = reference.page_id,
                    version = reference.version_number,
                    error = %err,
                    "Markup conversion failed; serving escaped plain text"
                );
                return PageHtml::degraded(sanitize::plain_text(&markup));
            }
        };

        let scrubbed = sanitize::scrub(&self.sanitizer, &converted);
        let substituted = self.tokens.apply(&scrubbed);
        let html = self
            .plugins
            .run(HookStage::AfterParse, reference, &substituted);

        PageHtml::converted(html)
    }
}

pub struct TextPipelineBuilder {
    settings: Settings,
    store: Arc<dyn PageStore>,
    plugins: Vec<Arc<dyn TextPlugin>>,
    site: Option<Arc<SiteCache>>,
    tokens: Vec<CustomToken>,
}

impl TextPipelineBuilder {
    pub fn new(settings: &Settings, store: Arc<dyn PageStore>) -> Self {
        Self {
            settings: settings.clone(),
            store,
            plugins: Vec::new(),
            site: None,
            tokens: Vec::new(),
        }
    }

    pub fn with_plugin(mut self, plugin: Arc<dyn TextPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Attach the site cache, enabling plugin output caching and settings
    /// snapshot publication.
    pub fn with_site_cache(mut self, site: Arc<SiteCache>) -> Self {
        self.site = Some(site);
        self
    }

    pub fn with_token(mut self, token: CustomToken) -> Self {
        self.tokens.push(token);
        self
    }

    pub fn build(self) -> TextPipeline {
        let sanitizer = self.settings.sanitizer.clone();

        let mut tokens = TokenSet::new();
        if !self.settings.wiki.site_url.is_empty() {
            tokens.register(CustomToken::new(
                SITE_URL_MARKER,
                sanitize::plain_text(&self.settings.wiki.site_url),
            ));
        }
        for token in self.tokens {
            let replacement = sanitize::scrub(&sanitizer, &token.replacement);
            if replacement != token.replacement {
                debug!(marker = token.marker, "Token replacement was sanitized");
            }
            tokens.register(CustomToken::new(token.marker, replacement));
        }

        let plugins = PluginRunner::new(
            self.plugins,
            self.site,
            self.settings.render.cache_plugin_output,
        );
        plugins.publish_settings();

        TextPipeline {
            sanitizer,
            converter: MarkupConverter::new(),
            links: LinkResolver::new(self.store.clone()),
            images: ImageResolver::new(self.settings.wiki.attachments_url_path.clone()),
            plugins,
            tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::application::repos::tests::FakePageStore;
    use crate::config::Settings;

    use super::*;

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.wiki.site_url = "https://wiki.example.com".to_string();
        settings
    }

    fn pipeline_with(tokens: Vec<CustomToken>) -> TextPipeline {
        let store = FakePageStore::new();
        store.insert_page(3, "Getting Started", "guide", "# hi");
        let mut builder = TextPipeline::builder(&settings(), Arc::new(store));
        for token in tokens {
            builder = builder.with_token(token);
        }
        builder.build()
    }

    fn pipeline() -> TextPipeline {
        pipeline_with(Vec::new())
    }

    #[test]
    fn renders_markup_to_sanitized_html() {
        let pipeline = pipeline();

        let out = pipeline.execute(&PageReference::new(1, 1), "# Hello\n\n*world*");

        assert!(out.html.contains("<h1>Hello</h1>"));
        assert!(out.html.contains("<em>world</em>"));
        assert!(!out.degraded);
    }

    #[test]
    fn raw_script_in_markup_is_removed() {
        let pipeline = pipeline();

        let out = pipeline.execute(
            &PageReference::new(1, 1),
            "before\n\n<script>alert(1)</script>\n\nafter",
        );

        assert!(!out.html.contains("<script"));
        assert!(!out.html.contains("alert(1)"));
        assert!(out.html.contains("before"));
        assert!(out.html.contains("after"));
    }

    #[test]
    fn empty_input_renders_empty_output() {
        let pipeline = pipeline();

        let out = pipeline.execute(&PageReference::new(1, 1), "");

        assert!(out.html.is_empty());
        assert!(!out.degraded);
    }

    #[test]
    fn site_url_token_is_substituted() {
        let pipeline = pipeline();

        let out = pipeline.execute(&PageReference::new(1, 1), "Visit %SITEURL%/about");

        assert!(out.html.contains("https://wiki.example.com/about"));
    }

    #[test]
    fn benign_token_markup_survives_substitution() {
        let pipeline = pipeline_with(vec![CustomToken::new("%WARN%", "<b>Warning</b>")]);

        let out = pipeline.execute(&PageReference::new(1, 1), "note: %WARN%");

        assert!(out.html.contains("<b>Warning</b>"));
    }

    #[test]
    fn script_emitting_token_is_neutralized() {
        let pipeline = pipeline_with(vec![CustomToken::new(
            "%EVIL%",
            "<script>alert(1)</script>",
        )]);

        let out = pipeline.execute(&PageReference::new(1, 1), "x %EVIL% y");

        assert!(!out.html.contains("<script"));
        assert!(!out.html.contains("alert(1)"));
    }

    #[test]
    fn internal_links_resolve_through_the_store() {
        let pipeline = pipeline();

        let out = pipeline.execute(&PageReference::new(1, 1), "[guide](<Getting Started>)");

        assert!(out.html.contains("href=\"/wiki/3/Getting+Started\""));
    }

    #[test]
    fn rendering_is_deterministic() {
        let pipeline = pipeline();
        let reference = PageReference::new(1, 1);
        let markup = "# T\n\n[a](https://example.com) ![i](pic.png) %SITEURL%";

        let first = pipeline.execute(&reference, markup);
        let second = pipeline.execute(&reference, markup);

        assert_eq!(first, second);
    }
}
