//! Content locator parsing and rendering.
//!
//! Format: `content://<authority>/<segment>/<segment>...`
//!
//! The `content://` scheme is optional on input and always present on output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Scheme prefix rendered on every locator.
pub const CONTENT_SCHEME: &str = "content://";

static LOCATOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:content://)?([A-Za-z0-9][A-Za-z0-9._-]*)((?:/[^/\s?#]+)*)/?$")
        .expect("valid locator regex")
});

/// Locator that cannot be parsed or routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// Input does not follow `content://<authority>/<path>`.
    Malformed(String),
    /// Authority does not belong to this store.
    UnknownAuthority(String),
    /// Path does not name the collection or one of its items.
    UnknownPath(String),
    /// Trailing item segment is not a positive integer.
    InvalidId(String),
}

impl Display for LocatorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(f, "malformed locator `{value}`"),
            Self::UnknownAuthority(value) => write!(f, "unknown locator authority `{value}`"),
            Self::UnknownPath(value) => write!(f, "unknown locator `{value}`"),
            Self::InvalidId(value) => write!(f, "invalid item id `{value}` in locator"),
        }
    }
}

impl Error for LocatorError {}

/// Parsed resource locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentUri {
    authority: String,
    segments: Vec<String>,
}

impl ContentUri {
    /// Builds a locator from an authority and path segments.
    pub fn new<I, S>(authority: impl Into<String>, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            authority: authority.into(),
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a locator string.
    ///
    /// # Errors
    /// - `Malformed` when the scheme is not `content://`, the authority is
    ///   missing, or a path segment is empty.
    pub fn parse(value: &str) -> Result<Self, LocatorError> {
        let captures = LOCATOR_RE
            .captures(value.trim())
            .ok_or_else(|| LocatorError::Malformed(value.to_string()))?;

        let authority = captures
            .get(1)
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| LocatorError::Malformed(value.to_string()))?;
        let segments = captures
            .get(2)
            .map(|m| {
                m.as_str()
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            authority,
            segments,
        })
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns a new locator with `segment` appended to the path.
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self {
            authority: self.authority.clone(),
            segments,
        }
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    pub fn contains(&self, other: &ContentUri) -> bool {
        self.authority == other.authority
            && self.segments.len() <= other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|(left, right)| left == right)
    }

    /// Whether one locator contains the other.
    pub fn overlaps(&self, other: &ContentUri) -> bool {
        self.contains(other) || other.contains(self)
    }

    pub fn to_uri_string(&self) -> String {
        let mut out = format!("{CONTENT_SCHEME}{}", self.authority);
        for segment in &self.segments {
            out.push('/');
            out.push_str(segment);
        }
        out
    }
}

impl Display for ContentUri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_uri_string())
    }
}

impl FromStr for ContentUri {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::{ContentUri, LocatorError};

    #[test]
    fn parse_accepts_optional_scheme() {
        let with_scheme = ContentUri::parse("content://shop/products/3").unwrap();
        let without_scheme = ContentUri::parse("shop/products/3").unwrap();
        assert_eq!(with_scheme, without_scheme);
        assert_eq!(with_scheme.authority(), "shop");
        assert_eq!(with_scheme.segments(), ["products", "3"]);
        assert_eq!(with_scheme.to_uri_string(), "content://shop/products/3");
    }

    #[test]
    fn parse_tolerates_single_trailing_slash() {
        let uri = ContentUri::parse("content://shop/products/").unwrap();
        assert_eq!(uri.segments(), ["products"]);
    }

    #[test]
    fn parse_rejects_foreign_scheme_and_empty_segments() {
        for input in [
            "http://shop/products",
            "content:///products",
            "content://shop//products",
            "",
        ] {
            assert!(
                matches!(ContentUri::parse(input), Err(LocatorError::Malformed(_))),
                "{input} should be malformed"
            );
        }
    }

    #[test]
    fn contains_follows_path_prefixes() {
        let collection = ContentUri::new("shop", ["products"]);
        let item = collection.join("7");
        let other = ContentUri::new("shop", ["orders"]);

        assert!(collection.contains(&item));
        assert!(!item.contains(&collection));
        assert!(item.overlaps(&collection));
        assert!(!collection.overlaps(&other));
        assert!(!collection.contains(&ContentUri::new("elsewhere", ["products"])));
    }
}
