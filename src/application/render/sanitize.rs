//! Harmful-tag removal.
//!
//! Runs after markup conversion, so raw HTML embedded in the markup passes
//! through the converter and is stripped here. Denied tags are removed
//! together with their content; everything else falls back to the library's
//! conservative allow list, widened by configuration.

use ammonia::Builder as AmmoniaBuilder;

use crate::config::SanitizerSettings;

/// Remove denied markup from converted HTML.
pub fn scrub(settings: &SanitizerSettings, html: &str) -> String {
    build_sanitizer(settings).clean(html).to_string()
}

/// Escape raw markup into displayable plain text. Used when conversion fails
/// and the raw text must still be safe to serve.
pub fn plain_text(raw: &str) -> String {
    ammonia::clean_text(raw)
}

fn build_sanitizer(settings: &SanitizerSettings) -> AmmoniaBuilder<'_> {
    let mut builder = AmmoniaBuilder::default();

    // Denied tags leave the allow list before entering the clean-content set;
    // a tag in both makes `clean` panic.
    builder.rm_tags(settings.denied_tags.iter().map(String::as_str));
    builder.add_clean_content_tags(settings.denied_tags.iter().map(String::as_str));

    // The default clean-content set holds style; an allowed tag must leave
    // that set too, for the same panic.
    let allowed: Vec<&str> = settings
        .allowed_tags
        .iter()
        .map(String::as_str)
        .filter(|tag| !settings.denied_tags.iter().any(|denied| denied == tag))
        .collect();
    builder.rm_clean_content_tags(allowed.iter().copied());
    builder.add_tags(allowed);
    builder.add_generic_attributes(settings.allowed_attributes.iter().map(String::as_str));

    builder
}
