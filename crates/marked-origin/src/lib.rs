//! # marked-origin
//!
//! Source-position provenance and out-of-band value tags.
//!
//! This crate provides the primitives used by the YAML construction layer to
//! attach metadata to constructed values without changing their shape:
//!
//! - [`Origin`]: an immutable record of where a value came from (document
//!   identity, line, column).
//! - [`TagSet`]: the set of out-of-band tags a value carries (its Origin and
//!   the `TrustedAsTemplate` marker).
//! - [`Tagged`]: an explicit wrapper pairing a value with its tags.
//!
//! The wrapper approach replaces the "subclass primitives so they can carry
//! attributes" trick available in dynamic languages: a constructed string is
//! a `Tagged<String>` (or a string-bearing variant of a host value enum), and
//! the tags travel with it through the tree.
//!
//! ## Example
//!
//! ```rust
//! use marked_origin::{Origin, TagSet, Tagged};
//!
//! let origin = Origin::new(Some("site.yml".into()), 3, Some(7));
//! let tagged = Tagged::new("hello".to_string())
//!     .with_tags(TagSet::default().with_origin(origin.clone()));
//!
//! assert_eq!(tagged.tags().origin(), Some(&origin));
//! assert!(!tagged.tags().trusted_as_template());
//! assert_eq!(tagged.into_inner(), "hello");
//! ```

mod origin;
mod tags;

pub use origin::Origin;
pub use tags::{TagSet, Tagged};
