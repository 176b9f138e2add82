//! JSON type catalogs.
//!
//! LCM message types are described at runtime instead of being generated
//! into code. A catalog file lists types with their members:
//!
//! ```json
//! {
//!   "package": "nav",
//!   "types": [
//!     {"name": "pose_t", "members": [
//!       {"name": "utime", "type": "int64_t"},
//!       {"name": "n", "type": "int32_t"},
//!       {"name": "pos", "type": "double", "dims": [3]},
//!       {"name": "cov", "type": "float", "dims": ["n", 3]}
//!     ]}
//!   ]
//! }
//! ```
//!
//! A type's own `package` overrides the catalog-wide one.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog loading and resolution errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("type {0} defined more than once")]
    DuplicateType(String),

    #[error("{owner}.{member}: unknown type '{type_name}'")]
    UnresolvedType {
        owner: String,
        member: String,
        type_name: String,
    },

    #[error("{owner}.{member}: type '{type_name}' is ambiguous; qualify it with a package")]
    AmbiguousType {
        owner: String,
        member: String,
        type_name: String,
    },

    #[error("{owner}.{member}: bad dimension: {reason}")]
    BadDimension {
        owner: String,
        member: String,
        reason: String,
    },

    #[error("fingerprint {fingerprint:#018x} shared by {first} and {second}")]
    FingerprintCollision {
        fingerprint: u64,
        first: String,
        second: String,
    },
}

impl From<CatalogError> for lt_common::Error {
    fn from(err: CatalogError) -> Self {
        lt_common::Error::InvalidCatalog(err.to_string())
    }
}

/// One catalog file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeCatalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub types: Vec<TypeDef>,
}

/// A message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberDef>,
}

/// A member of a message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dims: Vec<Dim>,
}

/// Array dimension: a fixed size or the name of an earlier integer member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dim {
    Fixed(u32),
    Var(String),
}

impl Dim {
    /// Size as written in the type definition.
    pub fn size_text(&self) -> String {
        match self {
            Dim::Fixed(n) => n.to_string(),
            Dim::Var(name) => name.clone(),
        }
    }
}

/// LCM primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Int8,
    Int16,
    Int32,
    Int64,
    Byte,
    Float,
    Double,
    String,
    Boolean,
}

impl Primitive {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "int8_t" => Primitive::Int8,
            "int16_t" => Primitive::Int16,
            "int32_t" => Primitive::Int32,
            "int64_t" => Primitive::Int64,
            "byte" => Primitive::Byte,
            "float" => Primitive::Float,
            "double" => Primitive::Double,
            "string" => Primitive::String,
            "boolean" => Primitive::Boolean,
            _ => return None,
        })
    }

    /// Name used in `.lcm` files and in fingerprints.
    pub fn lcm_name(self) -> &'static str {
        match self {
            Primitive::Int8 => "int8_t",
            Primitive::Int16 => "int16_t",
            Primitive::Int32 => "int32_t",
            Primitive::Int64 => "int64_t",
            Primitive::Byte => "byte",
            Primitive::Float => "float",
            Primitive::Double => "double",
            Primitive::String => "string",
            Primitive::Boolean => "boolean",
        }
    }

    /// Integer types usable as variable array lengths.
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Primitive::Int8 | Primitive::Int16 | Primitive::Int32 | Primitive::Int64 | Primitive::Byte
        )
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lcm_name())
    }
}

impl TypeDef {
    /// `package.name`, or the bare name without a package.
    pub fn full_name(&self) -> String {
        match &self.package {
            Some(p) if !p.is_empty() => format!("{}.{}", p, self.name),
            _ => self.name.clone(),
        }
    }
}

impl TypeCatalog {
    /// Load a catalog file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse_json(&content).map_err(|e| match e {
            CatalogError::Parse { reason, .. } => CatalogError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse catalog JSON; type packages are filled from the catalog default.
    pub fn parse_json(content: &str) -> Result<Self, CatalogError> {
        let mut catalog: TypeCatalog =
            serde_json::from_str(content).map_err(|e| CatalogError::Parse {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;
        if let Some(default) = &catalog.package {
            for ty in catalog.types.iter_mut().filter(|t| t.package.is_none()) {
                ty.package = Some(default.clone());
            }
        }
        Ok(catalog)
    }
}
