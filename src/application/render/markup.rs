//! Markup conversion.
//!
//! Parses wiki markup into an AST, rewrites link and image targets in place,
//! then renders HTML. Raw HTML in the markup is passed through here; the
//! sanitize stage downstream is the only defense, so conversion must always
//! be followed by it.

use comrak::nodes::{AstNode, NodeValue};
use comrak::options::Options;
use comrak::{Arena, format_html, parse_document};

use super::images::ImageResolver;
use super::links::LinkResolver;
use super::types::RenderError;

pub struct MarkupConverter {
    options: Options<'static>,
}

impl MarkupConverter {
    pub fn new() -> Self {
        Self {
            options: default_options(),
        }
    }

    /// Convert markup to HTML with link and image targets resolved.
    pub fn convert(
        &self,
        markup: &str,
        links: &LinkResolver,
        images: &ImageResolver,
    ) -> Result<String, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markup, &self.options);

        rewrite_targets(root, links, images);

        let mut html = String::new();
        format_html(root, &self.options, &mut html).map_err(|err| RenderError::Markdown {
            message: err.to_string(),
        })?;
        Ok(html)
    }
}

impl Default for MarkupConverter {
    fn default() -> Self {
        Self::new()
    }
}

fn default_options() -> Options<'static> {
    let mut options = Options::default();

    let ext = &mut options.extension;
    ext.strikethrough = true;
    ext.table = true;
    ext.autolink = true;
    ext.tasklist = true;
    ext.wikilinks_title_after_pipe = true;

    let render = &mut options.render;
    render.github_pre_lang = true;
    // Raw HTML survives conversion; the sanitize stage strips it.
    render.r#unsafe = true;

    options
}

fn rewrite_targets<'a>(node: &'a AstNode<'a>, links: &LinkResolver, images: &ImageResolver) {
    {
        let mut data = node.data.borrow_mut();
        match &mut data.value {
            NodeValue::Link(link) => link.url = links.resolve(&link.url),
            NodeValue::Image(image) => image.url = images.resolve(&image.url),
            NodeValue::WikiLink(wikilink) => wikilink.url = links.resolve(&wikilink.url),
            _ => {}
        }
    }

    let mut child = node.first_child();
    while let Some(next) = child {
        rewrite_targets(next, links, images);
        child = next.next_sibling();
    }
}
