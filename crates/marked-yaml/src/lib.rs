//! # marked-yaml
//!
//! YAML construction with per-node provenance, trust marking, and precise
//! diagnostics.
//!
//! This crate turns a YAML document into a [`TaggedValue`] tree in which
//! every node carries an [`Origin`](marked_origin::Origin) (document
//! identity, line, column) and every string conditionally carries a
//! `TrustedAsTemplate` marker deciding whether it may be expanded as a
//! template downstream. Grammar-level parsing is delegated to `yaml-rust2`;
//! this layer owns construction, tagging and diagnostics.
//!
//! Beyond the standard YAML 1.1 tags, the extended loader understands:
//!
//! - `!unsafe <node>` — suppress the trust marker for the whole subtree;
//! - `!vault <string>` — carry vault ciphertext as an
//!   [`EncryptedString`] without decrypting it;
//! - `!vault-encrypted <string>` — deprecated alias for `!vault`.
//!
//! Mapping construction detects duplicate keys and applies a caller-chosen
//! [`DuplicateKeyPolicy`]; there is no default, the host must pick one.
//!
//! Parse failures come back as a single [`LoadError`] whose message has been
//! refined by line heuristics (tabs, unquoted template expressions, stray
//! colons, quoting mistakes) with the offending source excerpt attached.
//!
//! ## Example
//!
//! ```rust
//! use marked_yaml::{DuplicateKeyPolicy, Input, LoadOptions, Loader};
//!
//! let loader = Loader::extended(LoadOptions::new(DuplicateKeyPolicy::Error));
//! let doc = loader
//!     .load(&Input::new("webster: daniel\n").with_name("dictionary.yml").trusted())
//!     .unwrap();
//!
//! let value = doc.value().get("webster").unwrap();
//! assert_eq!(value.value().as_str(), Some("daniel"));
//! let origin = value.tags().origin().unwrap();
//! assert_eq!((origin.line_num(), origin.col_num()), (1, Some(10)));
//! assert!(value.tags().trusted_as_template());
//! ```

mod classify;
mod constructor;
mod error;
mod loader;
mod node;
mod resolver;
mod trust;
mod value;
pub mod warnings;

pub use constructor::DuplicateKeyPolicy;
pub use error::{ErrorKind, LoadError, Result};
pub use loader::{Input, LoadOptions, Loader};
pub use marked_origin::{Origin, TagSet, Tagged};
pub use value::{EncryptedString, TaggedValue, Value};
pub use warnings::{TracingSink, WarningSink};
