//! The load pipeline: grammar engine, constructor and classifier wired into
//! one call.
//!
//! A [`Loader`] holds configuration only; every [`Loader::load`] call gets a
//! fresh constructor (and with it a fresh unsafe-depth counter), so loads
//! never share mutable state and independent loaders on separate threads
//! cannot interfere.

use crate::classify::classify;
use crate::constructor::{Constructor, DuplicateKeyPolicy};
use crate::error::Result;
use crate::node::compose;
use crate::value::TaggedValue;
use crate::warnings::{TracingSink, WarningSink};
use marked_origin::{Origin, TagSet};

/// Configuration the surrounding system must supply.
///
/// `DuplicateKeyPolicy` has no default, so this type has none either.
#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub duplicate_key_policy: DuplicateKeyPolicy,
}

impl LoadOptions {
    pub fn new(duplicate_key_policy: DuplicateKeyPolicy) -> Self {
        Self {
            duplicate_key_policy,
        }
    }
}

/// An input stream: text plus an optional caller-supplied name, and any
/// tags the stream itself already carries.
///
/// A stream tagged with an [`Origin`] passes that Origin on as the document
/// base (its line number offsets every constructed position). A stream
/// carrying the trust marker makes every constructed string eligible for
/// template expansion, unless an `!unsafe` subtree suppresses it.
#[derive(Debug, Clone)]
pub struct Input {
    text: String,
    name: Option<String>,
    tags: TagSet,
}

impl Input {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            name: None,
            tags: TagSet::default(),
        }
    }

    /// Attach a stream name; used as the document identity when the stream
    /// carries no Origin of its own.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Pre-attach an Origin to the stream.
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.tags = self.tags.with_origin(origin);
        self
    }

    /// Mark the stream's contents as trusted for template expansion.
    pub fn trusted(mut self) -> Self {
        self.tags = self.tags.with_trusted_as_template();
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// The document base Origin: the stream's own Origin tag when present,
    /// else a synthesized `{path: name, line: 1}`.
    pub fn base_origin(&self) -> Origin {
        match self.tags.origin() {
            Some(origin) => origin.clone(),
            None => Origin::new(self.name.clone(), 1, None),
        }
    }
}

/// Which tag set a loader constructs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagVariant {
    Generic,
    Extended,
}

/// One parse pipeline: grammar engine + constructor + resolver.
pub struct Loader {
    options: LoadOptions,
    variant: TagVariant,
    sink: Box<dyn WarningSink>,
}

impl Loader {
    /// A loader handling only the standard YAML 1.1 tags.
    pub fn generic(options: LoadOptions) -> Self {
        Self {
            options,
            variant: TagVariant::Generic,
            sink: Box::new(TracingSink),
        }
    }

    /// A loader handling the standard tags plus `!unsafe`, `!vault` and
    /// `!vault-encrypted`.
    pub fn extended(options: LoadOptions) -> Self {
        Self {
            options,
            variant: TagVariant::Extended,
            sink: Box::new(TracingSink),
        }
    }

    /// Replace the warnings sink.
    pub fn with_warning_sink(mut self, sink: Box<dyn WarningSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Parse one document from the input.
    ///
    /// Every failure, from the scanner up to the tag handlers, is converted
    /// here — exactly once — into a [`crate::LoadError`] by the classifier.
    pub fn load(&self, input: &Input) -> Result<TaggedValue> {
        let base = input.base_origin();
        let trusted = input.tags().trusted_as_template();

        let constructor = match self.variant {
            TagVariant::Generic => Constructor::generic(
                self.options.duplicate_key_policy,
                trusted,
                base.clone(),
                self.sink.as_ref(),
            ),
            TagVariant::Extended => Constructor::extended(
                self.options.duplicate_key_policy,
                trusted,
                base.clone(),
                self.sink.as_ref(),
            ),
        };

        let outcome = compose(input.text())
            .and_then(|root| constructor.construct_document(root.as_ref()));
        outcome.map_err(|failure| classify(input.text(), &base, failure))
    }
}
