//! Deterministic providers for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use sdjwt_crypto::{DecoyGenerator, DisclosureDigest, HashAlgorithm, Salt, SaltProvider};

/// Hands out `salt-0`, `salt-1`, ...
#[derive(Debug, Default)]
pub struct SequentialSalts {
    next: AtomicUsize,
}

impl SaltProvider for SequentialSalts {
    fn salt(&self) -> Salt {
        Salt::new(format!("salt-{}", self.next.fetch_add(1, Ordering::Relaxed)))
    }
}

/// Hashes `decoy-0`, `decoy-1`, ...
#[derive(Debug, Default)]
pub struct CountingDecoys {
    next: AtomicUsize,
}

impl DecoyGenerator for CountingDecoys {
    fn decoy(&self, algorithm: HashAlgorithm) -> DisclosureDigest {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        algorithm.digest(format!("decoy-{n}").as_bytes())
    }
}

/// Tree shapes for property tests: every node carries its `Always` flag
/// and containers carry an optional minimum-digests hint.
pub mod arb {
    use proptest::prelude::*;
    use sdjwt_core::{
        ArrayBuilder, Disclosable, DisclosableValue, ObjectBuilder, SdArray, SdObject,
    };
    use serde_json::Value;

    #[derive(Debug, Clone)]
    pub enum Shape {
        Leaf(Value),
        Object(Vec<(bool, Shape)>, Option<u32>),
        Array(Vec<(bool, Shape)>, Option<u32>),
    }

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,8}".prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            Just(Value::Null),
        ]
    }

    pub fn shape() -> impl Strategy<Value = Shape> {
        leaf().prop_map(Shape::Leaf).prop_recursive(4, 40, 4, |inner| {
            let children = prop::collection::vec((any::<bool>(), inner), 0..4);
            let hint = prop::option::of(1u32..6);
            prop_oneof![
                (children.clone(), hint.clone()).prop_map(|(c, h)| Shape::Object(c, h)),
                (children, hint).prop_map(|(c, h)| Shape::Array(c, h)),
            ]
        })
    }

    /// Root entries and the root's own hint.
    pub fn claims() -> impl Strategy<Value = SdObject> {
        (
            prop::collection::vec((any::<bool>(), shape()), 0..5),
            prop::option::of(1u32..6),
        )
            .prop_map(|(entries, hint)| object(&entries, hint))
    }

    fn element(always: bool, shape: &Shape) -> Disclosable<String, Value> {
        let value = match shape {
            Shape::Leaf(v) => DisclosableValue::Leaf(v.clone()),
            Shape::Object(entries, hint) => DisclosableValue::Object(object(entries, *hint)),
            Shape::Array(elements, hint) => DisclosableValue::Array(array(elements, *hint)),
        };
        if always {
            Disclosable::Always(value)
        } else {
            Disclosable::Never(value)
        }
    }

    pub fn object(entries: &[(bool, Shape)], hint: Option<u32>) -> SdObject {
        let mut builder = ObjectBuilder::new();
        for (i, (always, shape)) in entries.iter().enumerate() {
            builder = builder.element(format!("k{i}"), element(*always, shape));
        }
        if let Some(hint) = hint {
            builder = builder.minimum_digests(hint);
        }
        builder.build().unwrap()
    }

    fn array(elements: &[(bool, Shape)], hint: Option<u32>) -> SdArray {
        let mut builder = ArrayBuilder::new();
        for (always, shape) in elements {
            builder = builder.push(element(*always, shape));
        }
        if let Some(hint) = hint {
            builder = builder.minimum_digests(hint);
        }
        builder.build().unwrap()
    }
}
