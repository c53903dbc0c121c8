//! Implicit tag resolution for untagged nodes.
//!
//! Plain scalars resolve against the YAML 1.1 patterns (null, bool, int,
//! float, timestamp); quoted and block scalars are always strings.
//! Collections resolve to the standard seq/map tags.

use crate::node::{Node, NodeKind};
use once_cell::sync::Lazy;
use regex::Regex;
use yaml_rust2::scanner::TScalarStyle;

pub(crate) const TAG_NULL: &str = "tag:yaml.org,2002:null";
pub(crate) const TAG_BOOL: &str = "tag:yaml.org,2002:bool";
pub(crate) const TAG_INT: &str = "tag:yaml.org,2002:int";
pub(crate) const TAG_FLOAT: &str = "tag:yaml.org,2002:float";
pub(crate) const TAG_STR: &str = "tag:yaml.org,2002:str";
pub(crate) const TAG_TIMESTAMP: &str = "tag:yaml.org,2002:timestamp";
pub(crate) const TAG_SEQ: &str = "tag:yaml.org,2002:seq";
pub(crate) const TAG_MAP: &str = "tag:yaml.org,2002:map";

static NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:~|null|Null|NULL|)$").unwrap());

static BOOL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:yes|Yes|YES|no|No|NO|true|True|TRUE|false|False|FALSE|on|On|ON|off|Off|OFF)$")
        .unwrap()
});

static INT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[-+]?0b[0-1_]+|[-+]?0[0-7_]+|[-+]?(?:0|[1-9][0-9_]*)|[-+]?0x[0-9a-fA-F_]+|[-+]?[1-9][0-9_]*(?::[0-5]?[0-9])+)$",
    )
    .unwrap()
});

static FLOAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[-+]?(?:[0-9][0-9_]*)\.[0-9_]*(?:[eE][-+]?[0-9]+)?|\.[0-9_]+(?:[eE][-+]?[0-9]+)?|[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+\.[0-9_]*|[-+]?\.(?:inf|Inf|INF)|\.(?:nan|NaN|NAN))$",
    )
    .unwrap()
});

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:[0-9][0-9][0-9][0-9]-[0-9][0-9]-[0-9][0-9]|[0-9][0-9][0-9][0-9]-[0-9][0-9]?-[0-9][0-9]?(?:[Tt]|[ \t]+)[0-9][0-9]?:[0-9][0-9]:[0-9][0-9](?:\.[0-9]*)?(?:[ \t]*(?:Z|[-+][0-9][0-9]?(?::[0-9][0-9])?))?)$",
    )
    .unwrap()
});

/// Resolve the implicit tag of an untagged node.
pub(crate) fn resolve(node: &Node) -> &'static str {
    match &node.kind {
        NodeKind::Sequence(_) => TAG_SEQ,
        NodeKind::Mapping(_) => TAG_MAP,
        NodeKind::Scalar { value, style } => resolve_scalar(value, *style),
    }
}

fn resolve_scalar(value: &str, style: TScalarStyle) -> &'static str {
    // only plain scalars participate in implicit resolution
    if !matches!(style, TScalarStyle::Plain) {
        return TAG_STR;
    }
    if NULL_RE.is_match(value) {
        TAG_NULL
    } else if BOOL_RE.is_match(value) {
        TAG_BOOL
    } else if INT_RE.is_match(value) {
        TAG_INT
    } else if FLOAT_RE.is_match(value) {
        TAG_FLOAT
    } else if TIMESTAMP_RE.is_match(value) {
        TAG_TIMESTAMP
    } else {
        TAG_STR
    }
}

/// Whether `text` is a well-formed YAML 1.1 timestamp.
pub(crate) fn is_timestamp(text: &str) -> bool {
    TIMESTAMP_RE.is_match(text)
}

/// Parse a YAML 1.1 integer: decimal, binary, octal, hex or sexagesimal,
/// with optional `_` separators.
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    let cleaned = text.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix(['-', '+']) {
        Some(rest) => (cleaned.starts_with('-'), rest),
        None => (false, cleaned.as_str()),
    };

    let magnitude = if let Some(bin) = digits.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()?
    } else if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()?
    } else if digits.contains(':') {
        digits
            .split(':')
            .try_fold(0i64, |acc, part| -> Option<i64> {
                let part: i64 = part.parse().ok()?;
                acc.checked_mul(60)?.checked_add(part)
            })?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse().ok()?
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// Parse a YAML 1.1 float, including `.inf`/`.nan` and sexagesimal forms.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let cleaned = text.replace('_', "");
    let lowered = cleaned.to_ascii_lowercase();

    match lowered.as_str() {
        ".inf" | "+.inf" => return Some(f64::INFINITY),
        "-.inf" => return Some(f64::NEG_INFINITY),
        ".nan" => return Some(f64::NAN),
        _ => {}
    }

    if cleaned.contains(':') {
        let (negative, rest) = match cleaned.strip_prefix(['-', '+']) {
            Some(r) => (cleaned.starts_with('-'), r),
            None => (false, cleaned.as_str()),
        };
        let value = rest
            .split(':')
            .try_fold(0f64, |acc, part| -> Option<f64> {
                let part: f64 = part.parse().ok()?;
                Some(acc * 60.0 + part)
            })?;
        return Some(if negative { -value } else { value });
    }

    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Pos;

    fn scalar(value: &str, style: TScalarStyle) -> Node {
        Node {
            kind: NodeKind::Scalar {
                value: value.to_string(),
                style,
            },
            tag: None,
            pos: Pos { line0: 0, col0: 0 },
        }
    }

    #[test]
    fn test_plain_scalar_resolution() {
        let cases = [
            ("~", TAG_NULL),
            ("", TAG_NULL),
            ("yes", TAG_BOOL),
            ("False", TAG_BOOL),
            ("42", TAG_INT),
            ("-0x1f", TAG_INT),
            ("190:20:30", TAG_INT),
            ("3.14", TAG_FLOAT),
            (".inf", TAG_FLOAT),
            ("2001-12-14 21:59:43.10 -5", TAG_TIMESTAMP),
            ("2002-12-14", TAG_TIMESTAMP),
            ("hello", TAG_STR),
            ("12 monkeys", TAG_STR),
        ];
        for (value, expected) in cases {
            assert_eq!(
                resolve(&scalar(value, TScalarStyle::Plain)),
                expected,
                "resolving {value:?}"
            );
        }
    }

    #[test]
    fn test_quoted_scalars_stay_strings() {
        assert_eq!(resolve(&scalar("42", TScalarStyle::SingleQuoted)), TAG_STR);
        assert_eq!(resolve(&scalar("null", TScalarStyle::DoubleQuoted)), TAG_STR);
        assert_eq!(resolve(&scalar("1.5", TScalarStyle::Literal)), TAG_STR);
    }

    #[test]
    fn test_parse_int_forms() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-17"), Some(-17));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("0b1010"), Some(10));
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("0755"), Some(493));
        assert_eq!(parse_int("190:20:30"), Some(685_230));
        assert_eq!(parse_int("0"), Some(0));
    }

    #[test]
    fn test_parse_float_forms() {
        assert_eq!(parse_float("3.25"), Some(3.25));
        assert_eq!(parse_float("-1_2.5"), Some(-12.5));
        assert_eq!(parse_float(".inf"), Some(f64::INFINITY));
        assert_eq!(parse_float("-.Inf"), Some(f64::NEG_INFINITY));
        assert!(parse_float(".nan").unwrap().is_nan());
        assert!((parse_float("190:20:30.15").unwrap() - 685_230.15).abs() < 1e-6);
    }
}
