//! Out-of-band value tags and the `Tagged` wrapper.

use crate::Origin;
use serde::{Deserialize, Serialize};

/// The out-of-band tags a value can carry.
///
/// Two tag kinds exist: the value's [`Origin`], and the `TrustedAsTemplate`
/// marker. The marker is presence-only; it never carries data. Absence is the
/// safe default for trust.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSet {
    origin: Option<Origin>,
    trusted_as_template: bool,
}

impl TagSet {
    /// A tag set carrying only the given Origin.
    pub fn from_origin(origin: Origin) -> Self {
        Self {
            origin: Some(origin),
            trusted_as_template: false,
        }
    }

    /// Return a copy with the Origin attached.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Return a copy with the `TrustedAsTemplate` marker present.
    pub fn with_trusted_as_template(mut self) -> Self {
        self.trusted_as_template = true;
        self
    }

    /// The attached Origin, if any.
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// Whether the `TrustedAsTemplate` marker is present.
    pub fn trusted_as_template(&self) -> bool {
        self.trusted_as_template
    }

    /// Overlay `other` onto `self`: tags present on `other` win.
    ///
    /// Presence markers can be set by an overlay but never cleared; clearing
    /// would silently discard provenance the earlier layer attached.
    pub fn overlay(&mut self, other: &TagSet) {
        if let Some(origin) = &other.origin {
            self.origin = Some(origin.clone());
        }
        if other.trusted_as_template {
            self.trusted_as_template = true;
        }
    }
}

/// A value paired with its out-of-band tags.
///
/// This is the explicit-wrapper rendering of "values that carry metadata":
/// the host keeps ordinary ownership of the value while the tags ride along.
#[derive(Debug, Clone)]
pub struct Tagged<T> {
    value: T,
    tags: TagSet,
}

impl<T> Tagged<T> {
    /// Wrap a value with no tags attached yet.
    pub fn new(value: T) -> Self {
        Self {
            value,
            tags: TagSet::default(),
        }
    }

    /// Return a copy with the given tags overlaid onto any existing ones.
    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags.overlay(&tags);
        self
    }

    /// Return a copy carrying all tags from `src` (overlaid onto its own).
    pub fn copying_tags_from<U>(self, src: &Tagged<U>) -> Self {
        self.with_tags(src.tags.clone())
    }

    /// The wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// The attached tags.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// Unwrap, discarding the tags.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Map the wrapped value, preserving the tags.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tagged<U> {
        Tagged {
            value: f(self.value),
            tags: self.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_later_wins() {
        let first = Origin::new(Some("a".into()), 1, Some(1));
        let second = Origin::new(Some("b".into()), 2, Some(2));

        let mut tags = TagSet::from_origin(first);
        tags.overlay(&TagSet::from_origin(second.clone()));
        assert_eq!(tags.origin(), Some(&second));
    }

    #[test]
    fn test_overlay_never_clears_marker() {
        let mut tags = TagSet::default().with_trusted_as_template();
        tags.overlay(&TagSet::default());
        assert!(tags.trusted_as_template());
    }

    #[test]
    fn test_tag_copy() {
        let src = Tagged::new(1u8).with_tags(
            TagSet::from_origin(Origin::new(Some("f".into()), 4, Some(2)))
                .with_trusted_as_template(),
        );
        let dst = Tagged::new("x").copying_tags_from(&src);

        assert_eq!(dst.tags(), src.tags());
        assert_eq!(*dst.value(), "x");
    }

    #[test]
    fn test_untag() {
        let tagged = Tagged::new(vec![1, 2])
            .with_tags(TagSet::from_origin(Origin::default()));
        assert_eq!(tagged.into_inner(), vec![1, 2]);
    }
}
