//! Fold consumers over claim trees keyed by claim name: plain-value
//! projection and claim-path collection.

use serde_json::{Map, Value};

use crate::path::ClaimPath;
use crate::traversal::{fold, walk, Flow, Fold, Node, Visit, Walk};
use crate::tree::{DisclosableArray, DisclosableObject, DisclosureTag};

struct PlainFold;

impl<M> Fold<String, Value, M> for PlainFold {
    type Output = Value;

    fn leaf(&mut self, _visit: &Visit<'_, '_, String>, value: &Value) -> Value {
        value.clone()
    }

    fn object(
        &mut self,
        _visit: &Visit<'_, '_, String>,
        object: &DisclosableObject<String, Value, M>,
        children: Vec<Value>,
    ) -> Value {
        let map: Map<String, Value> = object
            .entries()
            .iter()
            .map(|(k, _)| k.clone())
            .zip(children)
            .collect();
        Value::Object(map)
    }

    fn array(
        &mut self,
        _visit: &Visit<'_, '_, String>,
        _array: &DisclosableArray<String, Value, M>,
        children: Vec<Value>,
    ) -> Value {
        Value::Array(children)
    }
}

struct PathCollector {
    paths: Vec<(ClaimPath, DisclosureTag)>,
}

impl<A, M> Walk<String, A, M> for PathCollector {
    fn enter(&mut self, visit: &Visit<'_, '_, String>, _node: Node<'_, String, A, M>) -> Flow {
        if let (Some(path), Some(tag)) = (visit.claim_path(), visit.tag()) {
            self.paths.push((path, tag));
        }
        Flow::Continue
    }
}

impl<M> DisclosableObject<String, Value, M> {
    /// The claim set this tree describes, with every tag erased.
    pub fn to_plain(&self) -> Value {
        fold(self, &mut PlainFold)
    }
}

impl<A, M> DisclosableObject<String, A, M> {
    /// Every node's claim path with its tag, in pre-order.
    pub fn claim_paths(&self) -> Vec<(ClaimPath, DisclosureTag)> {
        let mut collector = PathCollector { paths: Vec::new() };
        walk(self, &mut collector);
        collector.paths
    }
}
