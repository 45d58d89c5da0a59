//! Stylesheet post-processing.
//!
//! Rules carrying a trailing marker comment are rewritten after a package is
//! concatenated:
//!
//! ```css
//! a { background: #fff url(/img/home.png) no-repeat 0 0; /* 2sprite */ }
//! b { background-image: url(/img/logo.png); /* 2b64 */ }
//! ```
//!
//! `2sprite` points the rule at the sheet containing the image and shifts
//! the background position to the image's placement. `2b64` inlines the
//! image as a base64 data URI.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

const COLOR: &str = r"(?P<bg_color>#[a-fA-F0-9]{6}|#[a-fA-F0-9]{3}|[a-zA-Z]+)";
const IMAGE: &str = r#"(?P<bg_image>url\(['"]?(?P<bg_image_url>[^)'"]+)['"]?\))"#;
const REPEAT: &str = r"(?P<bg_repeat>repeat-x|repeat-y|no-repeat|repeat)";
const POSITION: &str = r"(?P<bg_position>[a-zA-Z0-9%-]+ +[a-zA-Z0-9%-]+)";

const SPRITE_MARKER: &str = r"\s*/\*\s*2sprite\s*\*/\s*";
const B64_MARKER: &str = r"\s*/\*\s*2b64\s*\*/\s*";

fn background() -> String {
    format!(r"background:\s+{}\s+{}\s+{}\s+{}\s*;", COLOR, IMAGE, REPEAT, POSITION)
}

fn background_image() -> String {
    format!(r"background-image:\s+{}\s*;", IMAGE)
}

static BACKGROUND_SPRITE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{}{}", background(), SPRITE_MARKER)).unwrap());

static BACKGROUND_B64_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{}{}", background(), B64_MARKER)).unwrap());

static BACKGROUND_IMAGE_B64_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{}{}", background_image(), B64_MARKER)).unwrap());

/// Error while rewriting a stylesheet.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RewriteError {
    /// An image referenced by a `2b64` rule could not be read
    #[error("Failed to embed {url} ({}): {source}", path.display())]
    ReadImage {
        url: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Location of an image inside a sprite sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteReference {
    /// URL of the sheet
    pub url: String,
    pub x: u32,
    pub y: u32,
}

/// Strip the longest common prefix of `url` and `media_url` from `url`.
pub fn strip_media_url<'a>(url: &'a str, media_url: &str) -> &'a str {
    let common = url
        .char_indices()
        .zip(media_url.chars())
        .take_while(|((_, a), b)| a == b)
        .last()
        .map_or(0, |((i, c), _)| i + c.len_utf8());
    &url[common..]
}

/// Join a file name onto a URL prefix with exactly one `/` between them.
pub fn join_url(prefix: &str, name: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        format!("{}{}", prefix, name)
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Replace every `2sprite`-marked `background` rule with a sheet reference.
///
/// `resolve` receives the image URL with the media prefix stripped. Rules
/// it cannot resolve become `background: none;`.
pub fn apply_sprites<F>(content: &str, media_url: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> Option<SpriteReference>,
{
    BACKGROUND_SPRITE_RE
        .replace_all(content, |caps: &Captures| {
            let url = &caps["bg_image_url"];
            match resolve(strip_media_url(url, media_url)) {
                Some(sprite) => format!(
                    "background: {} url({}) {} {}px {}px;",
                    &caps["bg_color"],
                    sprite.url,
                    &caps["bg_repeat"],
                    -i64::from(sprite.x),
                    -i64::from(sprite.y)
                ),
                None => {
                    tracing::warn!(url, "No sprite found for image, dropping background");
                    "background: none;".to_string()
                }
            }
        })
        .into_owned()
}

/// Image URLs of every `2sprite`-marked `background` rule, in document
/// order, with the media prefix stripped.
pub fn sprite_images<'a>(content: &'a str, media_url: &str) -> Vec<&'a str> {
    BACKGROUND_SPRITE_RE
        .captures_iter(content)
        .filter_map(|caps| caps.name("bg_image_url"))
        .map(|m| strip_media_url(m.as_str(), media_url))
        .collect()
}

/// Inline every `2b64`-marked image as a base64 data URI.
///
/// Images resolve to `media_root/<url without media_url prefix>`. The data
/// URI subtype is the URL's file extension.
pub fn embed_images(content: &str, media_url: &str, media_root: &Path) -> Result<String, RewriteError> {
    let mut failure: Option<RewriteError> = None;

    let mut encode = |url: &str| -> Option<(String, String)> {
        if failure.is_some() {
            return None;
        }
        let path = media_root.join(strip_media_url(url, media_url));
        match fs::read(&path) {
            Ok(bytes) => Some((extension(url).to_string(), STANDARD.encode(bytes))),
            Err(source) => {
                failure = Some(RewriteError::ReadImage { url: url.to_string(), path, source });
                None
            }
        }
    };

    let content = BACKGROUND_IMAGE_B64_RE
        .replace_all(content, |caps: &Captures| match encode(&caps["bg_image_url"]) {
            Some((ext, b64)) => {
                format!("background-image: url(\"data:image/{};base64,{}\");", ext, b64)
            }
            None => caps[0].to_string(),
        })
        .into_owned();

    let content = BACKGROUND_B64_RE
        .replace_all(&content, |caps: &Captures| match encode(&caps["bg_image_url"]) {
            Some((ext, b64)) => format!(
                "background: {} url(\"data:image/{};base64,{}\") {} {};",
                &caps["bg_color"], ext, b64, &caps["bg_repeat"], &caps["bg_position"]
            ),
            None => caps[0].to_string(),
        })
        .into_owned();

    match failure {
        Some(err) => Err(err),
        None => Ok(content),
    }
}

fn extension(url: &str) -> &str {
    let name = url.rsplit('/').next().unwrap_or(url);
    match name.rfind('.') {
        Some(i) if i > 0 => &name[i + 1..],
        _ => "",
    }
}
