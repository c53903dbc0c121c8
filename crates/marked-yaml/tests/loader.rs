//! End-to-end loader behavior: provenance, trust propagation, custom tags,
//! duplicate-key policies.

use marked_yaml::warnings::recording::RecordingSink;
use marked_yaml::{
    DuplicateKeyPolicy, ErrorKind, Input, LoadOptions, Loader, TaggedValue, Value,
};
use std::rc::Rc;

fn extended(policy: DuplicateKeyPolicy) -> Loader {
    Loader::extended(LoadOptions::new(policy))
}

fn load_trusted(content: &str) -> TaggedValue {
    extended(DuplicateKeyPolicy::Error)
        .load(&Input::new(content).with_name("f").trusted())
        .unwrap()
}

fn origin_of(value: &TaggedValue) -> (Option<&str>, usize, Option<usize>) {
    let origin = value.tags().origin().expect("missing origin");
    (origin.path(), origin.line_num(), origin.col_num())
}

#[test]
fn mapping_origins_are_exact() {
    let doc = load_trusted("webster: daniel\noed: oxford\n");

    assert_eq!(origin_of(&doc), (Some("f"), 1, Some(1)));

    let daniel = doc.value().get("webster").unwrap();
    assert_eq!(daniel.value().as_str(), Some("daniel"));
    assert_eq!(origin_of(daniel), (Some("f"), 1, Some(10)));

    let oxford = doc.value().get("oed").unwrap();
    assert_eq!(oxford.value().as_str(), Some("oxford"));
    assert_eq!(origin_of(oxford), (Some("f"), 2, Some(6)));
}

#[test]
fn block_collection_origins_point_at_first_entry() {
    let doc = load_trusted("outer:\n  inner: 1\n");
    assert_eq!(origin_of(&doc), (Some("f"), 1, Some(1)));

    let nested = doc.value().get("outer").unwrap();
    assert_eq!(origin_of(nested), (Some("f"), 2, Some(3)));

    let seq = load_trusted("- a\n- b\n");
    assert_eq!(origin_of(&seq), (Some("f"), 1, Some(1)));
}

#[test]
fn trusted_stream_marks_keys_and_values() {
    let doc = load_trusted("key: value\n");
    let (key, value) = &doc.value().as_map().unwrap()[0];
    // keys are marked exactly like values
    assert!(key.tags().trusted_as_template());
    assert!(value.tags().trusted_as_template());
}

#[test]
fn untrusted_stream_marks_nothing() {
    let doc = extended(DuplicateKeyPolicy::Error)
        .load(&Input::new("key: value\n"))
        .unwrap();
    let (key, value) = &doc.value().as_map().unwrap()[0];
    assert!(!key.tags().trusted_as_template());
    assert!(!value.tags().trusted_as_template());
    // origin is attached regardless of trust
    assert!(value.tags().origin().is_some());
}

#[test]
fn unsafe_scalar_suppresses_trust() {
    let doc = load_trusted("!unsafe \"{{ x }}\"");
    assert_eq!(doc.value().as_str(), Some("{{ x }}"));
    assert!(doc.tags().origin().is_some());
    assert!(!doc.tags().trusted_as_template());
}

#[test]
fn unsafe_sequence_suppresses_trust_for_nested_strings() {
    let doc = load_trusted("!unsafe [\"{{ x }}\"]");
    let items = doc.value().as_seq().unwrap();
    assert!(items[0].tags().origin().is_some());
    assert!(!items[0].tags().trusted_as_template());
}

#[test]
fn nested_unsafe_does_not_restore_trust_early() {
    // the inner scope closes first; the outer subtree must stay suppressed
    let doc = load_trusted("!unsafe\n- !unsafe inner\n- outer\n");
    let items = doc.value().as_seq().unwrap();
    assert!(!items[0].tags().trusted_as_template());
    assert!(!items[1].tags().trusted_as_template());
}

#[test]
fn trust_restored_for_siblings_after_unsafe() {
    let doc = load_trusted("a: !unsafe \"{{ x }}\"\nb: plain\n");
    let suppressed = doc.value().get("a").unwrap();
    let restored = doc.value().get("b").unwrap();
    assert!(!suppressed.tags().trusted_as_template());
    assert!(restored.tags().trusted_as_template());
}

#[test]
fn unsafe_reresolves_the_underlying_scalar() {
    let doc = load_trusted("!unsafe 123");
    assert_eq!(doc.value().as_int(), Some(123));
}

#[test]
fn vault_wraps_ciphertext_with_provenance() {
    let doc = load_trusted("secret: !vault \"CIPHER\"\n");
    let secret = doc.value().get("secret").unwrap();
    match secret.value() {
        Value::Encrypted(enc) => assert_eq!(enc.ciphertext(), "CIPHER"),
        other => panic!("expected encrypted string, got {other:?}"),
    }
    let origin = secret.tags().origin().unwrap();
    assert_eq!(origin.path(), Some("f"));
    assert_eq!(origin.line_num(), 1);
    // tags are copied forward from the constructed string
    assert!(secret.tags().trusted_as_template());
}

#[test]
fn vault_on_non_string_is_structural() {
    let err = extended(DuplicateKeyPolicy::Error)
        .load(&Input::new("!vault 123").with_name("f"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(err.message().contains("!vault"));
}

#[test]
fn vault_encrypted_is_deprecated_alias() {
    let sink = Rc::new(RecordingSink::default());
    let loader = extended(DuplicateKeyPolicy::Error)
        .with_warning_sink(Box::new(Rc::clone(&sink)));
    let doc = loader
        .load(&Input::new("!vault-encrypted \"CIPHER\""))
        .unwrap();

    match doc.value() {
        Value::Encrypted(enc) => assert_eq!(enc.ciphertext(), "CIPHER"),
        other => panic!("expected encrypted string, got {other:?}"),
    }
    let deprecations = sink.deprecations.borrow();
    assert_eq!(deprecations.len(), 1);
    assert!(deprecations[0].contains("!vault-encrypted"));
}

#[test]
fn duplicate_key_error_policy() {
    let err = extended(DuplicateKeyPolicy::Error)
        .load(&Input::new("{a: 1, a: 2}").with_name("f"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(err.message().contains("\"a\""));
    assert!(err.origin().is_some());
}

#[test]
fn duplicate_key_warn_policy_keeps_last_value() {
    let sink = Rc::new(RecordingSink::default());
    let loader = extended(DuplicateKeyPolicy::Warn)
        .with_warning_sink(Box::new(Rc::clone(&sink)));
    let doc = loader.load(&Input::new("{a: 1, a: 2}")).unwrap();

    let entries = doc.value().as_map().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1.value().as_int(), Some(2));
    assert_eq!(sink.warnings.borrow().len(), 1);
}

#[test]
fn duplicate_key_ignore_policy_is_silent() {
    let sink = Rc::new(RecordingSink::default());
    let loader = extended(DuplicateKeyPolicy::Ignore)
        .with_warning_sink(Box::new(Rc::clone(&sink)));
    let doc = loader.load(&Input::new("{a: 1, a: 2}")).unwrap();

    assert_eq!(doc.value().get("a").unwrap().value().as_int(), Some(2));
    assert!(sink.warnings.borrow().is_empty());
}

#[test]
fn duplicate_key_warn_warns_once_per_occurrence() {
    let sink = Rc::new(RecordingSink::default());
    let loader = extended(DuplicateKeyPolicy::Warn)
        .with_warning_sink(Box::new(Rc::clone(&sink)));
    let doc = loader.load(&Input::new("{a: 1, a: 2, a: 3}")).unwrap();

    assert_eq!(doc.value().get("a").unwrap().value().as_int(), Some(3));
    assert_eq!(sink.warnings.borrow().len(), 2);
}

fn deep_eq(a: &TaggedValue, b: &TaggedValue) -> bool {
    if a.tags() != b.tags() {
        return false;
    }
    match (a.value(), b.value()) {
        (Value::Seq(xs), Value::Seq(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_eq(x, y))
        }
        (Value::Map(xs), Value::Map(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|((ka, va), (kb, vb))| deep_eq(ka, kb) && deep_eq(va, vb))
        }
        (x, y) => x == y,
    }
}

#[test]
fn independent_loads_are_identical() {
    let content = "a: !unsafe \"{{ x }}\"\nb:\n  - 1\n  - !vault \"C\"\n";
    let first = load_trusted(content);
    let second = load_trusted(content);
    assert!(deep_eq(&first, &second));
}

#[test]
fn unsafe_failure_does_not_leak_suppression() {
    // first load fails inside an !unsafe subtree; a subsequent load on the
    // same loader must grant trust again
    let loader = extended(DuplicateKeyPolicy::Error);
    let bad = loader.load(&Input::new("!unsafe [a, b").trusted());
    assert!(bad.is_err());

    let good = loader.load(&Input::new("plain").trusted()).unwrap();
    assert!(good.tags().trusted_as_template());
}

#[test]
fn sequence_elements_carry_positions() {
    let doc = load_trusted("- alpha\n- beta\n");
    let items = doc.value().as_seq().unwrap();
    assert_eq!(origin_of(&items[0]), (Some("f"), 1, Some(3)));
    assert_eq!(origin_of(&items[1]), (Some("f"), 2, Some(3)));
}
