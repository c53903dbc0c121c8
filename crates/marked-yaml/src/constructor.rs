//! Node-tree construction with provenance and trust tagging.
//!
//! The [`Constructor`] walks the composed node tree and produces the
//! document value. Every constructed node gets an [`Origin`]; strings
//! additionally get the `TrustedAsTemplate` marker when the trust tracker
//! grants it. Construction is driven by a tag-handler registry: the resolved
//! tag of each node (explicit, or implicit via the resolver) selects the
//! handler. The base registry covers the standard YAML 1.1 tag set; the
//! extended registry layers `!unsafe`, `!vault` and `!vault-encrypted` on
//! top of it.

use crate::error::Failure;
use crate::node::{Node, NodeKind, Pos};
use crate::resolver;
use crate::trust::TrustTracker;
use crate::value::{EncryptedString, TaggedValue, Value};
use crate::warnings::WarningSink;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use marked_origin::{Origin, TagSet, Tagged};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do when a mapping repeats a key.
///
/// There is deliberately no default: the surrounding system must choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateKeyPolicy {
    /// Fail construction, naming the key.
    Error,
    /// Keep the last value and emit one warning per duplicate occurrence.
    Warn,
    /// Keep the last value silently.
    Ignore,
}

/// A tag handler: constructs one node under a given tag.
pub(crate) type TagHandler = fn(&Constructor<'_>, &Node) -> Result<TaggedValue, Failure>;

const TAG_UNSAFE: &str = "!unsafe";
const TAG_VAULT: &str = "!vault";
const TAG_VAULT_ENCRYPTED: &str = "!vault-encrypted";

/// Register handlers for the standard YAML 1.1 tag set.
fn register_base_tags(handlers: &mut HashMap<String, TagHandler>) {
    // registered as closures: the handler type is higher-ranked over the
    // constructor's lifetime, which the plain method fn items are not
    let entries: &[(&str, TagHandler)] = &[
        (resolver::TAG_NULL, |c, n| c.construct_yaml_null(n)),
        (resolver::TAG_BOOL, |c, n| c.construct_yaml_bool(n)),
        (resolver::TAG_INT, |c, n| c.construct_yaml_int(n)),
        (resolver::TAG_FLOAT, |c, n| c.construct_yaml_float(n)),
        (resolver::TAG_STR, |c, n| c.construct_yaml_str(n)),
        ("tag:yaml.org,2002:value", |c, n| c.construct_yaml_str(n)),
        (resolver::TAG_TIMESTAMP, |c, n| c.construct_yaml_timestamp(n)),
        ("tag:yaml.org,2002:binary", |c, n| c.construct_yaml_binary(n)),
        ("tag:yaml.org,2002:set", |c, n| c.construct_yaml_set(n)),
        ("tag:yaml.org,2002:omap", |c, n| c.construct_yaml_omap(n)),
        ("tag:yaml.org,2002:pairs", |c, n| c.construct_yaml_pairs(n)),
        (resolver::TAG_SEQ, |c, n| c.construct_yaml_seq(n)),
        (resolver::TAG_MAP, |c, n| c.construct_yaml_map(n)),
    ];
    for (tag, handler) in entries {
        handlers.insert((*tag).to_string(), *handler);
    }
}

/// Register the extended tag set: base tags first, custom tags layered on
/// top. Ordering matters — a later registration may override an earlier one.
fn register_extended_tags(handlers: &mut HashMap<String, TagHandler>) {
    register_base_tags(handlers);
    handlers.insert(TAG_UNSAFE.to_string(), (|c, n| c.construct_unsafe(n)) as TagHandler);
    handlers.insert(TAG_VAULT.to_string(), (|c, n| c.construct_vault(n)) as TagHandler);
    handlers.insert(
        TAG_VAULT_ENCRYPTED.to_string(),
        (|c, n| c.construct_vault_encrypted(n)) as TagHandler,
    );
}

/// Per-parse constructor state.
pub(crate) struct Constructor<'a> {
    handlers: HashMap<String, TagHandler>,
    policy: DuplicateKeyPolicy,
    trust: TrustTracker,
    base: Origin,
    sink: &'a dyn WarningSink,
}

impl<'a> Constructor<'a> {
    /// A constructor handling only the standard tag set.
    pub fn generic(
        policy: DuplicateKeyPolicy,
        trusted_source: bool,
        base: Origin,
        sink: &'a dyn WarningSink,
    ) -> Self {
        let mut handlers = HashMap::new();
        register_base_tags(&mut handlers);
        Self {
            handlers,
            policy,
            trust: TrustTracker::new(trusted_source),
            base,
            sink,
        }
    }

    /// A constructor handling the standard tags plus the custom tag set.
    pub fn extended(
        policy: DuplicateKeyPolicy,
        trusted_source: bool,
        base: Origin,
        sink: &'a dyn WarningSink,
    ) -> Self {
        let mut handlers = HashMap::new();
        register_extended_tags(&mut handlers);
        Self {
            handlers,
            policy,
            trust: TrustTracker::new(trusted_source),
            base,
            sink,
        }
    }

    /// Construct the document value from the composed root, or a null
    /// document carrying the base Origin when the stream held no content.
    pub fn construct_document(&self, root: Option<&Node>) -> Result<TaggedValue, Failure> {
        match root {
            Some(node) => self.construct_object(node),
            None => Ok(Tagged::new(Value::Null).with_tags(TagSet::from_origin(self.base.clone()))),
        }
    }

    /// Construct one node: resolve its tag, dispatch to the handler.
    pub fn construct_object(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let tag = match &node.tag {
            Some(tag) => tag.as_str(),
            None => resolver::resolve(node),
        };
        match self.handlers.get(tag) {
            Some(handler) => handler(self, node),
            None => Err(Failure::syntax_at(
                node.pos,
                format!("could not determine a constructor for the tag {tag:?}"),
            )),
        }
    }

    /// The Origin for a node: grammar positions are 0-based, so both line
    /// and column get +1, and the line is offset by the document's base line.
    fn origin(&self, pos: Pos) -> Origin {
        Origin::new(
            self.base.path().map(str::to_string),
            self.base.line_num() + pos.line0,
            Some(pos.col0 + 1),
        )
    }

    fn origin_tags(&self, pos: Pos) -> TagSet {
        TagSet::from_origin(self.origin(pos))
    }

    fn scalar_text<'n>(&self, node: &'n Node) -> Result<&'n str, Failure> {
        match &node.kind {
            NodeKind::Scalar { value, .. } => Ok(value),
            NodeKind::Sequence(_) => Err(Failure::syntax_at(
                node.pos,
                "expected a scalar node, but found a sequence",
            )),
            NodeKind::Mapping(_) => Err(Failure::syntax_at(
                node.pos,
                "expected a scalar node, but found a mapping",
            )),
        }
    }

    // ---- standard tag handlers -------------------------------------------

    fn construct_yaml_null(&self, node: &Node) -> Result<TaggedValue, Failure> {
        self.scalar_text(node)?;
        Ok(Tagged::new(Value::Null).with_tags(self.origin_tags(node.pos)))
    }

    fn construct_yaml_bool(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let text = self.scalar_text(node)?;
        let value = match text.to_ascii_lowercase().as_str() {
            "yes" | "true" | "on" => true,
            "no" | "false" | "off" => false,
            _ => {
                return Err(Failure::syntax_at(
                    node.pos,
                    format!("invalid boolean scalar {text:?}"),
                ));
            }
        };
        Ok(Tagged::new(Value::Bool(value)).with_tags(self.origin_tags(node.pos)))
    }

    fn construct_yaml_int(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let text = self.scalar_text(node)?;
        let value = resolver::parse_int(text).ok_or_else(|| {
            Failure::syntax_at(node.pos, format!("invalid integer scalar {text:?}"))
        })?;
        Ok(Tagged::new(Value::Int(value)).with_tags(self.origin_tags(node.pos)))
    }

    fn construct_yaml_float(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let text = self.scalar_text(node)?;
        let value = resolver::parse_float(text).ok_or_else(|| {
            Failure::syntax_at(node.pos, format!("invalid float scalar {text:?}"))
        })?;
        Ok(Tagged::new(Value::Float(value)).with_tags(self.origin_tags(node.pos)))
    }

    fn construct_yaml_timestamp(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let text = self.scalar_text(node)?;
        if !resolver::is_timestamp(text) {
            return Err(Failure::syntax_at(
                node.pos,
                format!("invalid timestamp scalar {text:?}"),
            ));
        }
        Ok(Tagged::new(Value::Timestamp(text.to_string())).with_tags(self.origin_tags(node.pos)))
    }

    /// Strings are the only values that can carry the trust marker. Mapping
    /// keys go through this same path, so keys are marked exactly like
    /// values; downstream consumers rely on that.
    fn construct_yaml_str(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let text = self.scalar_text(node)?;
        let mut tags = self.origin_tags(node.pos);
        if self.trust.grants_trust() {
            tags = tags.with_trusted_as_template();
        }
        Ok(Tagged::new(Value::Str(text.to_string())).with_tags(tags))
    }

    fn construct_yaml_binary(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let text = self.scalar_text(node)?;
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64.decode(compact.as_bytes()).map_err(|err| {
            Failure::syntax_at(node.pos, format!("failed to decode base64 data: {err}"))
        })?;
        Ok(Tagged::new(Value::Binary(bytes)).with_tags(self.origin_tags(node.pos)))
    }

    fn construct_yaml_seq(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let NodeKind::Sequence(items) = &node.kind else {
            return Err(Failure::syntax_at(
                node.pos,
                "expected a sequence node",
            ));
        };
        let items = items
            .iter()
            .map(|item| self.construct_object(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Tagged::new(Value::Seq(items)).with_tags(self.origin_tags(node.pos)))
    }

    fn construct_yaml_map(&self, node: &Node) -> Result<TaggedValue, Failure> {
        self.construct_mapping(node)
    }

    /// Sets are mappings with null values; the constructed value is the
    /// sequence of members.
    fn construct_yaml_set(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let NodeKind::Mapping(entries) = &node.kind else {
            return Err(Failure::syntax_at(node.pos, "expected a mapping node"));
        };
        let members = entries
            .iter()
            .map(|(key, _)| self.construct_object(key))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Tagged::new(Value::Seq(members)).with_tags(self.origin_tags(node.pos)))
    }

    fn construct_yaml_omap(&self, node: &Node) -> Result<TaggedValue, Failure> {
        self.sink.deprecation(
            "the !!omap tag is deprecated; use an ordinary mapping instead",
            None,
            Some(&self.origin(node.pos)),
            None,
        );
        self.construct_pairs(node, "an ordered mapping")
    }

    fn construct_yaml_pairs(&self, node: &Node) -> Result<TaggedValue, Failure> {
        self.sink.deprecation(
            "the !!pairs tag is deprecated; use an ordinary mapping instead",
            None,
            Some(&self.origin(node.pos)),
            None,
        );
        self.construct_pairs(node, "pairs")
    }

    /// omap/pairs: a sequence of single-entry mappings, constructed to a
    /// sequence of `[key, value]` pairs. The outer sequence and every pair
    /// carry an Origin.
    fn construct_pairs(&self, node: &Node, what: &str) -> Result<TaggedValue, Failure> {
        let NodeKind::Sequence(items) = &node.kind else {
            return Err(Failure::syntax_at(
                node.pos,
                format!("expected a sequence node while constructing {what}"),
            ));
        };
        let mut pairs = Vec::with_capacity(items.len());
        for item in items {
            let NodeKind::Mapping(entries) = &item.kind else {
                return Err(Failure::syntax_at(
                    item.pos,
                    format!("expected a mapping of length 1 while constructing {what}"),
                ));
            };
            let [(key_node, value_node)] = entries.as_slice() else {
                return Err(Failure::syntax_at(
                    item.pos,
                    format!("expected a single mapping item while constructing {what}"),
                ));
            };
            let key = self.construct_object(key_node)?;
            let value = self.construct_object(value_node)?;
            pairs.push(
                Tagged::new(Value::Seq(vec![key, value])).with_tags(self.origin_tags(item.pos)),
            );
        }
        Ok(Tagged::new(Value::Seq(pairs)).with_tags(self.origin_tags(node.pos)))
    }

    fn construct_mapping(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let NodeKind::Mapping(raw_entries) = &node.kind else {
            return Err(Failure::syntax_at(node.pos, "expected a mapping node"));
        };

        let mut entries: Vec<(TaggedValue, TaggedValue)> = Vec::with_capacity(raw_entries.len());
        for (key_node, value_node) in raw_entries {
            let key = self.construct_object(key_node)?;
            if !key.value().is_hashable_key() {
                return Err(Failure::syntax_at(
                    key_node.pos,
                    "found an unhashable key in a mapping",
                ));
            }
            let value = self.construct_object(value_node)?;

            // structural comparison against the keys seen so far; this
            // handles non-string keys (ints, timestamps, null) uniformly
            let seen = entries
                .iter()
                .position(|(existing, _)| existing.value() == key.value());
            match seen {
                None => entries.push((key, value)),
                Some(index) => {
                    match self.policy {
                        DuplicateKeyPolicy::Error => {
                            return Err(Failure::structural(
                                format!(
                                    "duplicate mapping key {}",
                                    key.value().describe_key()
                                ),
                                self.origin(key_node.pos),
                            ));
                        }
                        DuplicateKeyPolicy::Warn => {
                            self.sink.warning(
                                &format!(
                                    "found a duplicate mapping key {}; using the last defined value only",
                                    key.value().describe_key()
                                ),
                                Some(&self.origin(key_node.pos)),
                            );
                        }
                        DuplicateKeyPolicy::Ignore => {}
                    }
                    // last wins, at the first occurrence's position
                    entries[index].1 = value;
                }
            }
        }
        Ok(Tagged::new(Value::Map(entries)).with_tags(self.origin_tags(node.pos)))
    }

    // ---- custom tag handlers ---------------------------------------------

    /// `!unsafe`: suppress the trust marker for the whole subtree. The node
    /// is re-resolved with its tag cleared and constructed eagerly inside
    /// the scope, so the depth counter brackets every nested string.
    fn construct_unsafe(&self, node: &Node) -> Result<TaggedValue, Failure> {
        let _scope = self.trust.enter_unsafe();
        self.construct_object(&node.untagged())
    }

    fn construct_vault(&self, node: &Node) -> Result<TaggedValue, Failure> {
        self.construct_encrypted(node, TAG_VAULT)
    }

    fn construct_vault_encrypted(&self, node: &Node) -> Result<TaggedValue, Failure> {
        self.sink.deprecation(
            "the !vault-encrypted tag is deprecated; use !vault instead",
            None,
            Some(&self.origin(node.pos)),
            None,
        );
        self.construct_encrypted(node, TAG_VAULT_ENCRYPTED)
    }

    /// `!vault`: the tagged node must construct to a string; the ciphertext
    /// is wrapped as an encrypted string carrying all of the source value's
    /// tags.
    fn construct_encrypted(&self, node: &Node, tag_name: &str) -> Result<TaggedValue, Failure> {
        let inner = self.construct_object(&node.untagged())?;
        let Value::Str(ciphertext) = inner.value() else {
            return Err(Failure::structural(
                format!("the {tag_name} tag requires a string value"),
                self.origin(node.pos),
            ));
        };
        let wrapped = Tagged::new(Value::Encrypted(EncryptedString::new(ciphertext.clone())));
        Ok(wrapped.copying_tags_from(&inner))
    }
}
