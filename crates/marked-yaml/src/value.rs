//! The constructed document value type.

use marked_origin::Tagged;

/// A constructed YAML value with tagged children.
pub type TaggedValue = Tagged<Value>;

/// An encrypted-string value produced by the `!vault` tag.
///
/// The construction layer does not decrypt anything; it only carries the
/// ciphertext forward, with the provenance tags of the node it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedString {
    ciphertext: String,
}

impl EncryptedString {
    /// Wrap ciphertext text.
    pub fn new(ciphertext: impl Into<String>) -> Self {
        Self {
            ciphertext: ciphertext.into(),
        }
    }

    /// The ciphertext, exactly as it appeared in the source.
    pub fn ciphertext(&self) -> &str {
        &self.ciphertext
    }
}

/// A YAML document value.
///
/// Collections hold [`TaggedValue`] children so every node in the tree keeps
/// its own provenance. Mappings preserve source order.
///
/// Two representation choices worth knowing about:
///
/// - `!!set` constructs to a [`Value::Seq`] of the set's members.
/// - `!!omap` / `!!pairs` construct to a [`Value::Seq`] of two-element
///   `[key, value]` sequences.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Decoded `!!binary` contents.
    Binary(Vec<u8>),
    /// A `!!timestamp` scalar, kept as its canonical source text.
    Timestamp(String),
    Seq(Vec<TaggedValue>),
    /// Order-preserving mapping entries.
    Map(Vec<(TaggedValue, TaggedValue)>),
    /// Ciphertext produced by `!vault` / `!vault-encrypted`.
    Encrypted(EncryptedString),
}

impl Value {
    /// String contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer contents, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Sequence children, if this is a sequence.
    pub fn as_seq(&self) -> Option<&[TaggedValue]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Mapping entries, if this is a mapping.
    pub fn as_map(&self) -> Option<&[(TaggedValue, TaggedValue)]> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a mapping value by string key.
    pub fn get(&self, key: &str) -> Option<&TaggedValue> {
        self.as_map()?.iter().find_map(|(k, v)| {
            if k.value().as_str() == Some(key) {
                Some(v)
            } else {
                None
            }
        })
    }

    /// Whether a mapping key of this shape can participate in duplicate
    /// detection. Collections cannot: they have no identity a mapping can
    /// key on.
    pub fn is_hashable_key(&self) -> bool {
        !matches!(self, Value::Seq(_) | Value::Map(_))
    }

    /// A short human-readable description of the key, for error messages.
    pub fn describe_key(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => format!("\"{s}\""),
            Value::Timestamp(t) => t.clone(),
            Value::Binary(_) => "<binary>".to_string(),
            Value::Encrypted(_) => "<encrypted>".to_string(),
            Value::Seq(_) => "<sequence>".to_string(),
            Value::Map(_) => "<mapping>".to_string(),
        }
    }
}

/// Structural equality, ignoring tags everywhere.
///
/// Duplicate-key detection compares freshly constructed keys against keys
/// seen earlier in the same mapping; those keys carry different Origins by
/// definition, so equality must look through the tags.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Encrypted(a), Value::Encrypted(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x.value() == y.value())
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, va), (kb, vb))| {
                        ka.value() == kb.value() && va.value() == vb.value()
                    })
            }
            _ => false,
        }
    }
}
