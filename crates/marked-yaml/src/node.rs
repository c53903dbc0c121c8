//! Raw node tree assembled from the grammar engine's event stream.
//!
//! `yaml-rust2` exposes parsing as a marked event stream rather than a node
//! tree, so this module rebuilds the tree: a [`NodeBuilder`] implements
//! `MarkedEventReceiver` and stacks open collections until their end events
//! arrive. The resulting [`Node`]s carry document-relative 0-based positions
//! and canonicalized tag names; everything downstream (resolution,
//! construction, diagnostics) works on this tree.

use crate::error::Failure;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// A document-relative position, 0-based. Ordering is lexicographic on
/// (line, column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Pos {
    pub line0: usize,
    pub col0: usize,
}

impl Pos {
    /// yaml-rust2 markers carry 1-based lines and 0-based columns.
    pub(crate) fn from_marker(marker: &Marker) -> Self {
        Self {
            line0: marker.line().saturating_sub(1),
            col0: marker.col(),
        }
    }
}

/// One node of the composed tree.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub kind: NodeKind,
    /// Canonical explicit tag, e.g. `!unsafe` or `tag:yaml.org,2002:str`.
    pub tag: Option<String>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Scalar {
        value: String,
        style: TScalarStyle,
    },
    Sequence(Vec<Node>),
    Mapping(Vec<(Node, Node)>),
}

impl Node {
    /// A copy of this node with its explicit tag cleared, so it resolves as
    /// if the tag were absent.
    pub fn untagged(&self) -> Node {
        Node {
            kind: self.kind.clone(),
            tag: None,
            pos: self.pos,
        }
    }
}

/// Compose `content` into a node tree; only the first document is kept.
pub(crate) fn compose(content: &str) -> Result<Option<Node>, Failure> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = NodeBuilder::new();

    parser
        .load(&mut builder, false) // false = single document only
        .map_err(Failure::from_scan_error)?;

    builder.result()
}

/// Normalize a grammar-engine tag to one canonical spelling.
///
/// The standard handle arrives either pre-resolved (`tag:yaml.org,2002:`) or
/// as the shorthand `!!`, depending on how the document spelled it.
fn canonical_tag(tag: &Tag) -> String {
    match tag.handle.as_str() {
        "tag:yaml.org,2002:" | "!!" => format!("tag:yaml.org,2002:{}", tag.suffix),
        "!" => format!("!{}", tag.suffix),
        handle => format!("{handle}{}", tag.suffix),
    }
}

/// Builder that implements `MarkedEventReceiver` to assemble the node tree.
struct NodeBuilder {
    /// Stack of open collections.
    stack: Vec<BuildNode>,

    /// Completed anchored nodes, by anchor id.
    anchors: Vec<(usize, Node)>,

    /// The completed root node.
    root: Option<Node>,

    /// First composition error; events after it are ignored.
    error: Option<Failure>,
}

/// A collection being assembled.
enum BuildNode {
    Sequence {
        pos: Pos,
        tag: Option<String>,
        anchor_id: usize,
        items: Vec<Node>,
    },
    Mapping {
        pos: Pos,
        tag: Option<String>,
        anchor_id: usize,
        entries: Vec<(Node, Option<Node>)>,
    },
}

impl NodeBuilder {
    fn new() -> Self {
        Self {
            stack: Vec::new(),
            anchors: Vec::new(),
            root: None,
            error: None,
        }
    }

    fn result(self) -> Result<Option<Node>, Failure> {
        match self.error {
            Some(failure) => Err(failure),
            None => Ok(self.root),
        }
    }

    fn register_anchor(&mut self, anchor_id: usize, node: &Node) {
        // anchor id 0 means the node carries no anchor
        if anchor_id > 0 {
            self.anchors.push((anchor_id, node.clone()));
        }
    }

    fn lookup_anchor(&self, anchor_id: usize) -> Option<&Node> {
        self.anchors
            .iter()
            .find(|(id, _)| *id == anchor_id)
            .map(|(_, node)| node)
    }

    fn push_complete(&mut self, node: Node) {
        match self.stack.last_mut() {
            None => {
                self.root = Some(node);
            }
            Some(BuildNode::Sequence { items, .. }) => {
                items.push(node);
            }
            Some(BuildNode::Mapping { pos, entries, .. }) => {
                match entries.last_mut() {
                    Some((_, value @ None)) => {
                        *value = Some(node);
                    }
                    _ => {
                        // the engine reports an implicit block mapping only
                        // once its first key has been scanned, so the start
                        // marker lands past the key; pull the mapping's
                        // position back to the key. Flow mappings start at
                        // `{`, which precedes the key, and keep it.
                        if entries.is_empty() && node.pos < *pos {
                            *pos = node.pos;
                        }
                        entries.push((node, None));
                    }
                }
            }
        }
    }
}

impl MarkedEventReceiver for NodeBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }
        let pos = Pos::from_marker(&marker);

        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, style, anchor_id, tag) => {
                let node = Node {
                    kind: NodeKind::Scalar { value, style },
                    tag: tag.as_ref().map(canonical_tag),
                    pos,
                };
                self.register_anchor(anchor_id, &node);
                self.push_complete(node);
            }

            Event::SequenceStart(anchor_id, tag) => {
                self.stack.push(BuildNode::Sequence {
                    pos,
                    tag: tag.as_ref().map(canonical_tag),
                    anchor_id,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                let Some(BuildNode::Sequence {
                    pos,
                    tag,
                    anchor_id,
                    items,
                }) = self.stack.pop()
                else {
                    self.error = Some(Failure::unexpected(
                        "sequence end without a matching sequence start",
                    ));
                    return;
                };
                let node = Node {
                    kind: NodeKind::Sequence(items),
                    tag,
                    pos,
                };
                self.register_anchor(anchor_id, &node);
                self.push_complete(node);
            }

            Event::MappingStart(anchor_id, tag) => {
                self.stack.push(BuildNode::Mapping {
                    pos,
                    tag: tag.as_ref().map(canonical_tag),
                    anchor_id,
                    entries: Vec::new(),
                });
            }

            Event::MappingEnd => {
                let Some(BuildNode::Mapping {
                    pos,
                    tag,
                    anchor_id,
                    entries,
                }) = self.stack.pop()
                else {
                    self.error = Some(Failure::unexpected(
                        "mapping end without a matching mapping start",
                    ));
                    return;
                };
                let entries = entries
                    .into_iter()
                    .map(|(key, value)| {
                        // the engine emits an empty plain scalar for a
                        // missing value, so this arm is for an end event
                        // cutting an entry short; the same empty scalar
                        // (resolving to null) keeps the shapes identical
                        let value = value.unwrap_or(Node {
                            kind: NodeKind::Scalar {
                                value: String::new(),
                                style: TScalarStyle::Plain,
                            },
                            tag: None,
                            pos: key.pos,
                        });
                        (key, value)
                    })
                    .collect();
                let node = Node {
                    kind: NodeKind::Mapping(entries),
                    tag,
                    pos,
                };
                self.register_anchor(anchor_id, &node);
                self.push_complete(node);
            }

            Event::Alias(anchor_id) => {
                match self.lookup_anchor(anchor_id) {
                    Some(anchored) => {
                        // the alias reuses the anchored subtree, source
                        // positions included
                        let node = anchored.clone();
                        self.push_complete(node);
                    }
                    None => {
                        // either an undefined anchor or an alias back into a
                        // still-open collection (a self-referential node)
                        self.error = Some(Failure::syntax_at(
                            pos,
                            "found an alias to an undefined or still-open anchor",
                        ));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar_value(node: &Node) -> &str {
        match &node.kind {
            NodeKind::Scalar { value, .. } => value,
            other => panic!("expected scalar, got {other:?}"),
        }
    }

    #[test]
    fn test_compose_mapping_positions() {
        let root = compose("webster: daniel\noed: oxford\n").unwrap().unwrap();
        assert_eq!(root.pos, Pos { line0: 0, col0: 0 });

        let NodeKind::Mapping(entries) = &root.kind else {
            panic!("expected mapping");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(scalar_value(&entries[0].1), "daniel");
        assert_eq!(entries[0].1.pos, Pos { line0: 0, col0: 9 });
        assert_eq!(scalar_value(&entries[1].1), "oxford");
        assert_eq!(entries[1].1.pos, Pos { line0: 1, col0: 5 });
    }

    #[test]
    fn test_compose_tagged_sequence() {
        let root = compose("!unsafe [a, b]").unwrap().unwrap();
        assert_eq!(root.tag.as_deref(), Some("!unsafe"));
        let NodeKind::Sequence(items) = &root.kind else {
            panic!("expected sequence");
        };
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_compose_standard_tag_canonicalized() {
        let root = compose("!!str 17").unwrap().unwrap();
        assert_eq!(root.tag.as_deref(), Some("tag:yaml.org,2002:str"));
    }

    #[test]
    fn test_compose_alias_reuses_anchor() {
        let root = compose("a: &x hello\nb: *x\n").unwrap().unwrap();
        let NodeKind::Mapping(entries) = &root.kind else {
            panic!("expected mapping");
        };
        assert_eq!(scalar_value(&entries[1].1), "hello");
        // alias keeps the anchored node's position
        assert_eq!(entries[1].1.pos, entries[0].1.pos);
    }

    #[test]
    fn test_compose_empty_document() {
        assert!(compose("").unwrap().is_none());
    }

    #[test]
    fn test_compose_missing_value_is_empty_plain_scalar() {
        let root = compose("a:\n").unwrap().unwrap();
        let NodeKind::Mapping(entries) = &root.kind else {
            panic!("expected mapping");
        };
        // resolves to null downstream
        assert_eq!(scalar_value(&entries[0].1), "");
        assert!(matches!(
            &entries[0].1.kind,
            NodeKind::Scalar {
                style: TScalarStyle::Plain,
                ..
            }
        ));
    }

    #[test]
    fn test_compose_nested_block_mapping_starts_at_first_key() {
        let root = compose("outer:\n  inner: 1\n").unwrap().unwrap();
        assert_eq!(root.pos, Pos { line0: 0, col0: 0 });
        let NodeKind::Mapping(entries) = &root.kind else {
            panic!("expected mapping");
        };
        assert_eq!(entries[0].1.pos, Pos { line0: 1, col0: 2 });
    }

    #[test]
    fn test_compose_flow_mapping_starts_at_brace() {
        let root = compose("m: {a: 1}\n").unwrap().unwrap();
        let NodeKind::Mapping(entries) = &root.kind else {
            panic!("expected mapping");
        };
        assert_eq!(entries[0].1.pos, Pos { line0: 0, col0: 3 });
    }

    #[test]
    fn test_compose_scan_error() {
        let err = compose("a: [1, 2\n").unwrap_err();
        assert!(err.is_position_bearing());
    }
}
