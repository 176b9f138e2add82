//! Type registry: resolved catalog types indexed by fingerprint.

use std::collections::HashMap;
use std::path::PathBuf;

use lt_common::{Message, Record};
use thiserror::Error;
use tracing::debug;

use super::catalog::{CatalogError, Dim, Primitive, TypeCatalog, TypeDef};
use super::codec::{self, EncodeError};
use super::fingerprint::{base_hash, fingerprint};

/// Failure to turn a raw payload into a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown type fingerprint {fingerprint:#018x}")]
    UnknownType { fingerprint: u64 },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl DecodeError {
    /// Attach the channel name.
    pub fn on_channel(self, channel: &str) -> lt_common::Error {
        match self {
            DecodeError::UnknownType { fingerprint } => lt_common::Error::UnknownType {
                channel: channel.to_string(),
                fingerprint,
            },
            DecodeError::Malformed(reason) => lt_common::Error::Decode {
                channel: channel.to_string(),
                reason,
            },
        }
    }
}

/// Turns raw message payloads into records.
pub trait MessageDecoder {
    fn decode(&self, payload: &[u8]) -> Result<Box<dyn Record>, DecodeError>;
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MemberType {
    Primitive(Primitive),
    Struct(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Extent {
    Fixed(usize),
    /// Length held by an earlier member of the same record.
    Var(String),
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedMember {
    pub name: String,
    pub ty: MemberType,
    pub dims: Vec<Extent>,
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedType {
    pub full_name: String,
    pub name: String,
    pub members: Vec<ResolvedMember>,
    pub fingerprint: u64,
}

/// All known message types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: Vec<ResolvedType>,
    by_fingerprint: HashMap<u64, usize>,
    by_name: HashMap<String, usize>,
}

impl TypeRegistry {
    /// Load and resolve every catalog file.
    pub fn from_files(paths: &[PathBuf]) -> Result<Self, CatalogError> {
        let catalogs = paths
            .iter()
            .map(|p| TypeCatalog::from_file(p))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_catalogs(catalogs)
    }

    /// Resolve member types across all catalogs and compute fingerprints.
    pub fn from_catalogs(catalogs: Vec<TypeCatalog>) -> Result<Self, CatalogError> {
        let defs: Vec<TypeDef> = catalogs.into_iter().flat_map(|c| c.types).collect();

        let mut by_name = HashMap::new();
        for (i, def) in defs.iter().enumerate() {
            if by_name.insert(def.full_name(), i).is_some() {
                return Err(CatalogError::DuplicateType(def.full_name()));
            }
        }

        let mut types = Vec::with_capacity(defs.len());
        let mut children = Vec::with_capacity(defs.len());
        for def in &defs {
            let members = resolve_members(def, &defs, &by_name)?;
            children.push(
                members
                    .iter()
                    .filter_map(|m| match m.ty {
                        MemberType::Struct(i) => Some(i),
                        MemberType::Primitive(_) => None,
                    })
                    .collect::<Vec<_>>(),
            );
            types.push(ResolvedType {
                full_name: def.full_name(),
                name: def.name.clone(),
                members,
                fingerprint: 0,
            });
        }

        let bases: Vec<u64> = defs.iter().map(base_hash).collect();
        let mut by_fingerprint = HashMap::new();
        for i in 0..types.len() {
            let fp = fingerprint(&bases, &children, i);
            types[i].fingerprint = fp;
            if let Some(prev) = by_fingerprint.insert(fp, i) {
                return Err(CatalogError::FingerprintCollision {
                    fingerprint: fp,
                    first: types[prev].full_name.clone(),
                    second: types[i].full_name.clone(),
                });
            }
            debug!(
                type_name = %types[i].full_name,
                fingerprint = %format!("{:#018x}", fp),
                "registered type"
            );
        }

        Ok(Self {
            types,
            by_fingerprint,
            by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Fully qualified names of all registered types.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.full_name.as_str())
    }

    pub fn fingerprint_of(&self, full_name: &str) -> Option<u64> {
        self.by_name.get(full_name).map(|&i| self.types[i].fingerprint)
    }

    /// Decode a payload into a dynamic message.
    pub fn decode_message(&self, payload: &[u8]) -> Result<Message, DecodeError> {
        codec::decode(self, payload)
    }

    /// Encode a message as type `full_name`, fingerprint included.
    pub fn encode(&self, full_name: &str, message: &Message) -> Result<Vec<u8>, EncodeError> {
        let index = *self
            .by_name
            .get(full_name)
            .ok_or_else(|| EncodeError::UnknownType(full_name.to_string()))?;
        codec::encode(self, index, message)
    }

    pub(crate) fn index_of_fingerprint(&self, fp: u64) -> Option<usize> {
        self.by_fingerprint.get(&fp).copied()
    }

    pub(crate) fn resolved(&self, index: usize) -> &ResolvedType {
        &self.types[index]
    }
}

impl MessageDecoder for TypeRegistry {
    fn decode(&self, payload: &[u8]) -> Result<Box<dyn Record>, DecodeError> {
        Ok(Box::new(self.decode_message(payload)?))
    }
}

fn resolve_members(
    def: &TypeDef,
    defs: &[TypeDef],
    by_name: &HashMap<String, usize>,
) -> Result<Vec<ResolvedMember>, CatalogError> {
    let owner = def.full_name();
    let mut resolved: Vec<ResolvedMember> = Vec::with_capacity(def.members.len());

    for member in &def.members {
        let ty = match Primitive::parse(&member.type_name) {
            Some(p) => MemberType::Primitive(p),
            None => MemberType::Struct(lookup_type(def, &member.name, &member.type_name, defs, by_name)?),
        };

        let bad_dim = |reason: String| CatalogError::BadDimension {
            owner: owner.clone(),
            member: member.name.clone(),
            reason,
        };
        let mut dims = Vec::with_capacity(member.dims.len());
        for dim in &member.dims {
            match dim {
                Dim::Fixed(n) => dims.push(Extent::Fixed(*n as usize)),
                Dim::Var(name) => {
                    let length = resolved.iter().find(|m| &m.name == name).ok_or_else(|| {
                        bad_dim(format!("'{}' is not an earlier member", name))
                    })?;
                    let is_int_scalar = length.dims.is_empty()
                        && matches!(length.ty, MemberType::Primitive(p) if p.is_integer());
                    if !is_int_scalar {
                        return Err(bad_dim(format!("'{}' is not an integer scalar", name)));
                    }
                    dims.push(Extent::Var(name.clone()));
                }
            }
        }

        resolved.push(ResolvedMember {
            name: member.name.clone(),
            ty,
            dims,
        });
    }
    Ok(resolved)
}

fn lookup_type(
    owner: &TypeDef,
    member: &str,
    type_name: &str,
    defs: &[TypeDef],
    by_name: &HashMap<String, usize>,
) -> Result<usize, CatalogError> {
    let err_fields = || (owner.full_name(), member.to_string(), type_name.to_string());

    if type_name.contains('.') {
        return by_name.get(type_name).copied().ok_or_else(|| {
            let (owner, member, type_name) = err_fields();
            CatalogError::UnresolvedType { owner, member, type_name }
        });
    }

    if let Some(pkg) = owner.package.as_deref().filter(|p| !p.is_empty()) {
        if let Some(&i) = by_name.get(&format!("{}.{}", pkg, type_name)) {
            return Ok(i);
        }
    }

    let mut matches = defs.iter().enumerate().filter(|(_, d)| d.name == type_name);
    match (matches.next(), matches.next()) {
        (Some((i, _)), None) => Ok(i),
        (None, _) => {
            let (owner, member, type_name) = err_fields();
            Err(CatalogError::UnresolvedType { owner, member, type_name })
        }
        (Some(_), Some(_)) => {
            let (owner, member, type_name) = err_fields();
            Err(CatalogError::AmbiguousType { owner, member, type_name })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(json: &str) -> Result<TypeRegistry, CatalogError> {
        TypeRegistry::from_catalogs(vec![TypeCatalog::parse_json(json)?])
    }

    const NAV: &str = r#"{"package": "nav", "types": [
        {"name": "pt_t", "members": [{"name": "x", "type": "int32_t"}]},
        {"name": "path_t", "members": [
            {"name": "n", "type": "int32_t"},
            {"name": "pts", "type": "pt_t", "dims": ["n"]}
        ]}
    ]}"#;

    #[test]
    fn resolves_same_package_types() {
        let reg = registry(NAV).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(
            reg.type_names().collect::<Vec<_>>(),
            vec!["nav.pt_t", "nav.path_t"]
        );
        assert!(reg.fingerprint_of("nav.path_t").is_some());
        assert_ne!(reg.fingerprint_of("nav.pt_t"), reg.fingerprint_of("nav.path_t"));
    }

    #[test]
    fn duplicate_types_rejected() {
        let json = r#"{"types": [{"name": "a_t"}, {"name": "a_t"}]}"#;
        assert!(matches!(registry(json), Err(CatalogError::DuplicateType(_))));
    }

    #[test]
    fn unknown_member_type_rejected() {
        let json = r#"{"types": [{"name": "a_t", "members": [{"name": "b", "type": "b_t"}]}]}"#;
        assert!(matches!(registry(json), Err(CatalogError::UnresolvedType { .. })));
    }

    #[test]
    fn ambiguous_bare_name_rejected() {
        let json = r#"{"types": [
            {"package": "p", "name": "pt_t"},
            {"package": "q", "name": "pt_t"},
            {"name": "a_t", "members": [{"name": "p", "type": "pt_t"}]}
        ]}"#;
        assert!(matches!(registry(json), Err(CatalogError::AmbiguousType { .. })));
    }

    #[test]
    fn variable_dimension_must_be_earlier_integer() {
        let later = r#"{"types": [{"name": "a_t", "members": [
            {"name": "v", "type": "double", "dims": ["n"]},
            {"name": "n", "type": "int32_t"}
        ]}]}"#;
        assert!(matches!(registry(later), Err(CatalogError::BadDimension { .. })));

        let float_len = r#"{"types": [{"name": "a_t", "members": [
            {"name": "n", "type": "double"},
            {"name": "v", "type": "double", "dims": ["n"]}
        ]}]}"#;
        assert!(matches!(registry(float_len), Err(CatalogError::BadDimension { .. })));
    }

    #[test]
    fn unknown_fingerprint_reported() {
        let reg = registry(NAV).unwrap();
        let payload = 0xdead_beef_u64.to_be_bytes();
        assert_eq!(
            reg.decode_message(&payload).unwrap_err(),
            DecodeError::UnknownType {
                fingerprint: 0xdead_beef
            }
        );
    }

    #[test]
    fn decode_errors_carry_channel_and_severity() {
        let err = DecodeError::Malformed("short".into()).on_channel("POSE");
        assert_eq!(err.severity(), lt_common::Severity::Skip);
        assert!(err.to_string().contains("POSE"));
        let err = DecodeError::UnknownType { fingerprint: 1 }.on_channel("POSE");
        assert_eq!(err.severity(), lt_common::Severity::DropChannel);
        assert_eq!(err.code(), 30);
    }
}
