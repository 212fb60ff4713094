//! Image source resolution.
//!
//! Relative image sources are rewritten under the configured attachments URL
//! path. Absolute sources pass through untouched.

const FILE_PREFIX: &str = "file:";

const PASSTHROUGH_PREFIXES: &[&str] = &["http://", "https://", "www."];

pub struct ImageResolver {
    attachments_url_path: String,
}

impl ImageResolver {
    pub fn new(attachments_url_path: impl Into<String>) -> Self {
        Self {
            attachments_url_path: attachments_url_path.into(),
        }
    }

    /// Resolve one image source to its final src attribute.
    pub fn resolve(&self, src: &str) -> String {
        if is_passthrough(src) {
            return src.to_string();
        }

        let relative = strip_file_prefix(src);
        join_single_slash(&self.attachments_url_path, relative)
    }
}

fn is_passthrough(src: &str) -> bool {
    PASSTHROUGH_PREFIXES
        .iter()
        .any(|prefix| starts_with_ignore_case(src, prefix))
}

fn strip_file_prefix(src: &str) -> &str {
    if starts_with_ignore_case(src, FILE_PREFIX) {
        &src[FILE_PREFIX.len()..]
    } else {
        src
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Join base and path with exactly one `/` between them.
fn join_single_slash(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
