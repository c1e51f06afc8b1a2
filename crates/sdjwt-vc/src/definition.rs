//! # Credential Definitions
//!
//! A definition is a disclosure tree that carries claim metadata where an
//! instance carries values: leaves hold a [`ClaimDef`], and every object and
//! array carries its own [`ClaimDef`] as container metadata. A node is
//! tagged `Always` exactly when its policy is
//! [`SelectivelyDisclosable::Always`].
//!
//! ## Conversion from Type Metadata
//!
//! Type metadata lists claim paths flat. [`SdJwtDefinition::from_metadata`]
//! groups them by parent and builds the tree bottom-up:
//!
//! - a node with no declared children is a leaf;
//! - a node whose children are all named is an object;
//! - a node whose children are all positional is an array, its elements
//!   ordered wildcard first, then by index;
//! - anything else is [`DefinitionError::MixedChildren`].
//!
//! Intermediate nodes that are never declared themselves get
//! [`ClaimDef::default`].

use std::collections::HashMap;

use sdjwt_core::{
    ArrayBuilder, ClaimPath, ClaimPathElement, Disclosable, DisclosableObject, DisclosableValue,
    DisclosureTag, ObjectBuilder,
};

use crate::error::DefinitionError;
use crate::metadata::{
    ClaimDisplay, ClaimMetadata, ClaimType, DisplayMetadata, SelectivelyDisclosable, TypeMetadata,
};

/// Metadata of one node of a definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimDef {
    /// Per-language display properties.
    pub display: Vec<ClaimDisplay>,
    /// Disclosure policy.
    pub sd: SelectivelyDisclosable,
    /// Placeholder identifier in an SVG rendering template.
    pub svg_id: Option<String>,
    /// Declared JSON type, for leaves.
    pub claim_type: Option<ClaimType>,
}

impl ClaimDef {
    fn from_metadata(metadata: &ClaimMetadata) -> Self {
        Self {
            display: metadata.display.clone(),
            sd: metadata.sd,
            svg_id: metadata.svg_id.clone(),
            claim_type: metadata.value_type.clone(),
        }
    }

    fn tag(&self) -> DisclosureTag {
        match self.sd {
            SelectivelyDisclosable::Always => DisclosureTag::Always,
            SelectivelyDisclosable::Allowed | SelectivelyDisclosable::Never => DisclosureTag::Never,
        }
    }
}

/// An element of a definition tree.
pub type DefinitionElement = Disclosable<String, ClaimDef, ClaimDef>;
/// A keyed container of a definition tree.
pub type DefinitionObject = DisclosableObject<String, ClaimDef, ClaimDef>;

/// The issuer-declared contract a credential of one type must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdJwtDefinition {
    /// The credential type identifier.
    pub vct: String,
    /// Human-readable name of the type.
    pub name: Option<String>,
    /// Human-readable description of the type.
    pub description: Option<String>,
    /// Per-language display properties.
    pub display: Vec<DisplayMetadata>,
    /// Declared claims.
    pub claims: DefinitionObject,
}

impl SdJwtDefinition {
    /// Build a definition from flat type metadata.
    pub fn from_metadata(metadata: &TypeMetadata) -> Result<Self, DefinitionError> {
        let claims = build_tree(&metadata.claims)?;
        Ok(Self {
            vct: metadata.vct.clone(),
            name: metadata.name.clone(),
            description: metadata.description.clone(),
            display: metadata.display.clone(),
            claims,
        })
    }

    /// The definition of the claim at `path`, if declared. Concrete indices
    /// resolve through a homogeneous array's single element definition.
    pub fn find(&self, path: &ClaimPath) -> Option<&DefinitionElement> {
        let mut elements = path.elements().iter();
        let mut current = match elements.next() {
            Some(ClaimPathElement::Claim(name)) => self.claims.get_claim(name)?,
            _ => return None,
        };
        for element in elements {
            current = match (current.value(), element) {
                (DisclosableValue::Object(object), ClaimPathElement::Claim(name)) => {
                    object.get_claim(name)?
                }
                (DisclosableValue::Array(array), ClaimPathElement::ArrayElement(_))
                | (DisclosableValue::Array(array), ClaimPathElement::AllArrayElements)
                    if array.len() == 1 =>
                {
                    array.elements().first()?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

/// Key under which a node's children are grouped; `None` is the root.
type Parent = Option<ClaimPath>;

fn build_tree(claims: &[ClaimMetadata]) -> Result<DefinitionObject, DefinitionError> {
    let mut declared: HashMap<&ClaimPath, ClaimDef> = HashMap::new();
    for claim in claims {
        if let Some(ty) = &claim.value_type {
            ty.validate()?;
        }
        if declared.insert(&claim.path, ClaimDef::from_metadata(claim)).is_some() {
            return Err(DefinitionError::DuplicateClaimPath(claim.path.to_string()));
        }
    }

    // Children of every node in first-declaration order.
    let mut children: HashMap<Parent, Vec<ClaimPath>> = HashMap::new();
    let mut nodes: Vec<ClaimPath> = Vec::new();
    for claim in claims {
        if claim.path.head().is_positional() {
            return Err(DefinitionError::PositionalTopLevelClaim(claim.path.to_string()));
        }
        for node in claim.path.ancestors_inclusive() {
            let siblings = children.entry(node.parent()).or_default();
            if !siblings.contains(&node) {
                siblings.push(node.clone());
                nodes.push(node);
            }
        }
    }

    // Deepest first, so every child is built before its parent.
    nodes.sort_by_key(|n| std::cmp::Reverse(n.len()));
    let mut built: HashMap<ClaimPath, DefinitionElement> = HashMap::new();
    for node in nodes {
        let def = declared.remove(&node).unwrap_or_default();
        let tag = def.tag();
        let value = match children.remove(&Some(node.clone())) {
            None => DisclosableValue::Leaf(def),
            Some(kids) => assemble(&node, def, kids, &mut built)?,
        };
        built.insert(node, Disclosable::tagged(tag, value));
    }

    let mut root = ObjectBuilder::new();
    for child in children.remove(&None).unwrap_or_default() {
        if let (ClaimPathElement::Claim(name), Some(element)) =
            (child.last().clone(), built.remove(&child))
        {
            root = root.element(name, element);
        }
    }
    Ok(root.build()?)
}

/// Build the container at `node` from its already-built children.
fn assemble(
    node: &ClaimPath,
    def: ClaimDef,
    mut kids: Vec<ClaimPath>,
    built: &mut HashMap<ClaimPath, DefinitionElement>,
) -> Result<DisclosableValue<String, ClaimDef, ClaimDef>, DefinitionError> {
    let positional = kids.iter().filter(|k| k.last().is_positional()).count();
    if positional == 0 {
        let mut object = ObjectBuilder::with_metadata(def);
        for kid in kids {
            if let (ClaimPathElement::Claim(name), Some(element)) =
                (kid.last().clone(), built.remove(&kid))
            {
                object = object.element(name, element);
            }
        }
        return Ok(DisclosableValue::Object(object.build()?));
    }
    if positional != kids.len() {
        return Err(DefinitionError::MixedChildren {
            path: node.to_string(),
        });
    }

    kids.sort_by_key(|k| match k.last() {
        ClaimPathElement::ArrayElement(index) => Some(*index),
        _ => None,
    });
    let mut array = ArrayBuilder::with_metadata(def);
    for kid in kids {
        if let Some(element) = built.remove(&kid) {
            array = array.push(element);
        }
    }
    Ok(DisclosableValue::Array(array.build()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(claims: serde_json::Value) -> TypeMetadata {
        serde_json::from_value(json!({
            "vct": "https://credentials.example.com/identity_credential",
            "claims": claims
        }))
        .unwrap()
    }

    fn definition(claims: serde_json::Value) -> SdJwtDefinition {
        SdJwtDefinition::from_metadata(&metadata(claims)).unwrap()
    }

    #[test]
    fn test_groups_paths_into_objects_arrays_and_leaves() {
        let def = definition(json!([
            {"path": ["given_name"], "sd": "always", "value_type": "string"},
            {"path": ["address"], "sd": "always"},
            {"path": ["address", "region"], "sd": "always"},
            {"path": ["address", "country"]},
            {"path": ["nationalities", null], "sd": "never"}
        ]));
        assert_eq!(def.claims.len(), 3);

        let given = def.claims.get_claim("given_name").unwrap();
        assert_eq!(given.tag(), DisclosureTag::Always);
        match given.value() {
            DisclosableValue::Leaf(c) => assert_eq!(c.claim_type, Some(ClaimType::String)),
            other => panic!("expected leaf, got {other:?}"),
        }

        let address = def.claims.get_claim("address").unwrap();
        assert_eq!(address.tag(), DisclosureTag::Always);
        match address.value() {
            DisclosableValue::Object(o) => {
                assert_eq!(o.metadata().sd, SelectivelyDisclosable::Always);
                let keys: Vec<&str> = o.entries().iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["region", "country"]);
            }
            other => panic!("expected object, got {other:?}"),
        }

        // Undeclared intermediate container defaults to `allowed`.
        let nationalities = def.claims.get_claim("nationalities").unwrap();
        assert_eq!(nationalities.tag(), DisclosureTag::Never);
        match nationalities.value() {
            DisclosableValue::Array(a) => {
                assert_eq!(a.metadata().sd, SelectivelyDisclosable::Allowed);
                assert_eq!(a.len(), 1);
            }
            other => panic!("expected array, got {other:?}"),
        }
    }

    #[test]
    fn test_positional_children_are_ordered() {
        let def = definition(json!([
            {"path": ["degrees", 2], "value_type": "number"},
            {"path": ["degrees", 0], "value_type": "string"}
        ]));
        let DisclosableValue::Array(degrees) = def.claims.get_claim("degrees").unwrap().value() else {
            panic!("expected array");
        };
        let types: Vec<_> = degrees
            .elements()
            .iter()
            .map(|e| match e.value() {
                DisclosableValue::Leaf(c) => c.claim_type.clone(),
                _ => None,
            })
            .collect();
        assert_eq!(types, vec![Some(ClaimType::String), Some(ClaimType::Number)]);
    }

    #[test]
    fn test_mixed_children_rejected() {
        let err = SdJwtDefinition::from_metadata(&metadata(json!([
            {"path": ["degrees", 0]},
            {"path": ["degrees", "type"]}
        ])))
        .unwrap_err();
        assert_eq!(
            err,
            DefinitionError::MixedChildren {
                path: "degrees".into()
            }
        );
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let err = SdJwtDefinition::from_metadata(&metadata(json!([
            {"path": ["address", "region"]},
            {"path": ["address", "region"], "sd": "never"}
        ])))
        .unwrap_err();
        assert_eq!(err, DefinitionError::DuplicateClaimPath("address.region".into()));
    }

    #[test]
    fn test_malformed_declarations_rejected() {
        assert!(matches!(
            SdJwtDefinition::from_metadata(&metadata(json!([{"path": [0]}]))),
            Err(DefinitionError::PositionalTopLevelClaim(_))
        ));
        assert!(matches!(
            SdJwtDefinition::from_metadata(&metadata(json!([{"path": ["_sd"]}]))),
            Err(DefinitionError::Tree(_))
        ));
        assert!(matches!(
            SdJwtDefinition::from_metadata(&metadata(json!([
                {"path": ["x"], "value_type": {"any_of": ["string"]}}
            ]))),
            Err(DefinitionError::Tree(_))
        ));
    }

    #[test]
    fn test_find_resolves_through_homogeneous_arrays() {
        let def = definition(json!([
            {"path": ["degrees", null, "type"], "sd": "always"},
            {"path": ["address", "region"]}
        ]));
        let path = ClaimPath::claim("degrees").element(4).child("type");
        assert_eq!(def.find(&path).map(Disclosable::tag), Some(DisclosureTag::Always));
        assert!(def.find(&ClaimPath::claim("address").child("region")).is_some());
        assert!(def.find(&ClaimPath::claim("address").child("street")).is_none());
        assert!(def.find(&ClaimPath::claim("degrees").child("type")).is_none());
    }

    #[test]
    fn test_deeply_nested_declaration() {
        let mut path = vec![json!("root")];
        for _ in 0..2_000 {
            path.push(json!("child"));
        }
        let def = definition(json!([{ "path": path }]));
        assert_eq!(def.claims.len(), 1);
    }
}
