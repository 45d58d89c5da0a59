//! Pattern tokens for file discovery.
//!
//! A discovery pattern is a `/`-separated list of tokens. Each token is
//! matched against a single directory entry name:
//!
//! - a *literal* token must equal the name exactly (`a.css`)
//! - a *regex* token is matched from the start of the name (`.*\.css`)
//! - a *recursive* token (`**` or `***`) matches any directory
//!
//! The literal/regex split is decided by [`is_regex_token`]. A dot in a file
//! extension does not make a token a regex, but a dot followed by a
//! quantifier does.

use regex::Regex;
use std::path::Path;
use thiserror::Error;

/// Token matching exactly one directory level.
pub const SINGLE_LEVEL: &str = "**";

/// Token matching the current directory and every nested one.
pub const DEEP: &str = "***";

/// Error while compiling a pattern token.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PatternError {
    /// The token looks like a regular expression but does not compile
    #[error("Invalid pattern token '{token}': {source}")]
    InvalidRegex {
        token: String,
        #[source]
        source: regex::Error,
    },
}

/// Depth of a recursive token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// `**` - one directory level
    Single,
    /// `***` - this directory and all descendants
    Deep,
}

/// A compiled pattern token.
#[derive(Debug, Clone)]
pub enum Token {
    /// Exact name
    Literal(String),
    /// Start-anchored regular expression
    Regex(Regex),
    /// Directory-only recursive marker
    Recursive(Depth),
}

impl Token {
    /// Compile a raw token string.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if let Some(depth) = recursive_depth(raw) {
            return Ok(Token::Recursive(depth));
        }

        if is_regex_token(raw) {
            // Anchor at the start only; a prefix match is enough.
            let regex = Regex::new(&format!("^(?:{})", raw)).map_err(|source| {
                PatternError::InvalidRegex { token: raw.to_string(), source }
            })?;
            return Ok(Token::Regex(regex));
        }

        Ok(Token::Literal(raw.to_string()))
    }

    /// Check whether a directory entry matches this token.
    ///
    /// `parent` is the directory containing the entry. It is only consulted
    /// for recursive tokens, which accept directories and nothing else.
    pub fn matches(&self, name: &str, parent: &Path) -> bool {
        match self {
            Token::Literal(literal) => literal == name,
            Token::Regex(regex) => regex.is_match(name),
            Token::Recursive(_) => parent.join(name).is_dir(),
        }
    }
}

fn recursive_depth(raw: &str) -> Option<Depth> {
    match raw {
        SINGLE_LEVEL => Some(Depth::Single),
        DEEP => Some(Depth::Deep),
        _ => None,
    }
}

/// Check whether a token string should be treated as a regular expression.
///
/// True when the token contains any of `\ * ? + [ ] |`, or a `.` directly
/// followed by `?`, `+` or `*`.
pub fn is_regex_token(raw: &str) -> bool {
    const META: [char; 7] = ['\\', '*', '?', '+', '[', ']', '|'];

    if raw.chars().any(|c| META.contains(&c)) {
        return true;
    }

    raw.as_bytes()
        .windows(2)
        .any(|pair| pair[0] == b'.' && matches!(pair[1], b'?' | b'+' | b'*'))
}

/// Match a raw token against a directory entry.
///
/// Convenience wrapper around [`Token::parse`] and [`Token::matches`].
pub fn match_name(token: &str, name: &str, parent: &Path) -> Result<bool, PatternError> {
    Ok(Token::parse(token)?.matches(name, parent))
}
