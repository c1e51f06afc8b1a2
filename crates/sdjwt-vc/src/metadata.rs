//! # Credential Type Metadata
//!
//! The flat, JSON-serializable description of a credential type: its
//! identifier (`vct`), what it extends, how to display it, and one entry
//! per declared claim path.
//!
//! ```json
//! {
//!   "vct": "https://credentials.example.com/identity_credential",
//!   "name": "Identity Credential",
//!   "claims": [
//!     { "path": ["given_name"], "sd": "always" },
//!     { "path": ["address", "country"], "display": [{ "lang": "en", "label": "Country" }] },
//!     { "path": ["nationalities", null], "value_type": "string" }
//!   ]
//! }
//! ```
//!
//! `value_type` is a local extension declaring the JSON type of a leaf.
//! It is optional; leaves without it accept any value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use sdjwt_core::{ClaimPath, TreeError};

/// Metadata describing one credential type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeMetadata {
    /// The credential type identifier.
    pub vct: String,
    /// Human-readable name of the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-readable description of the type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Identifier of the type this one extends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    /// Per-language display properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display: Vec<DisplayMetadata>,
    /// Declared claims.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<ClaimMetadata>,
}

/// Display properties of a credential type in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetadata {
    /// Language tag.
    pub lang: String,
    /// Display name.
    pub name: String,
    /// Display description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Display properties of a claim in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimDisplay {
    /// Language tag.
    pub lang: String,
    /// Label shown next to the value.
    pub label: String,
    /// Longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Whether a claim may, must or must not be selectively disclosed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectivelyDisclosable {
    /// The claim must be revealed through its own disclosure.
    Always,
    /// Either way. Not enforced.
    #[default]
    Allowed,
    /// The claim must be plain.
    Never,
}

impl fmt::Display for SelectivelyDisclosable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Always => "always",
            Self::Allowed => "allowed",
            Self::Never => "never",
        })
    }
}

/// One declared claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimMetadata {
    /// Where the claim sits.
    pub path: ClaimPath,
    /// Per-language display properties.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub display: Vec<ClaimDisplay>,
    /// Disclosure policy.
    #[serde(default)]
    pub sd: SelectivelyDisclosable,
    /// Placeholder identifier in an SVG rendering template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg_id: Option<String>,
    /// Declared JSON type of a leaf value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ClaimType>,
}

impl ClaimMetadata {
    /// A claim at `path` with default policy and no display data.
    pub fn new(path: ClaimPath) -> Self {
        Self {
            path,
            display: Vec::new(),
            sd: SelectivelyDisclosable::default(),
            svg_id: None,
            value_type: None,
        }
    }

    /// Set the disclosure policy.
    pub fn with_sd(mut self, sd: SelectivelyDisclosable) -> Self {
        self.sd = sd;
        self
    }

    /// Set the declared leaf type.
    pub fn with_value_type(mut self, value_type: ClaimType) -> Self {
        self.value_type = Some(value_type);
        self
    }
}

/// The JSON type a leaf claim must have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// `true` or `false`.
    Boolean,
    /// Any JSON object.
    Object,
    /// Any JSON array.
    Array,
    /// `null`.
    Null,
    /// Any one of at least two alternatives.
    AnyOf(Vec<ClaimType>),
}

impl ClaimType {
    /// A union of alternatives. Fewer than two members are rejected.
    pub fn any_of(alternatives: Vec<ClaimType>) -> Result<Self, TreeError> {
        if alternatives.len() < 2 {
            return Err(TreeError::EmptyAlternatives(alternatives.len()));
        }
        Ok(Self::AnyOf(alternatives))
    }

    /// Check every nested union, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), TreeError> {
        let mut pending = vec![self];
        while let Some(ty) = pending.pop() {
            if let Self::AnyOf(alternatives) = ty {
                if alternatives.len() < 2 {
                    return Err(TreeError::EmptyAlternatives(alternatives.len()));
                }
                pending.extend(alternatives);
            }
        }
        Ok(())
    }

    /// Whether `value` has this type.
    pub fn matches(&self, value: &Value) -> bool {
        let mut pending = vec![self];
        while let Some(ty) = pending.pop() {
            let matched = match ty {
                Self::String => value.is_string(),
                Self::Number => value.is_number(),
                Self::Boolean => value.is_boolean(),
                Self::Object => value.is_object(),
                Self::Array => value.is_array(),
                Self::Null => value.is_null(),
                Self::AnyOf(alternatives) => {
                    pending.extend(alternatives);
                    false
                }
            };
            if matched {
                return true;
            }
        }
        false
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Boolean => f.write_str("boolean"),
            Self::Object => f.write_str("object"),
            Self::Array => f.write_str("array"),
            Self::Null => f.write_str("null"),
            Self::AnyOf(alternatives) => {
                f.write_str("any of [")?;
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// JSON type name of a value.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
