//! LCM type fingerprints.
//!
//! Every encoded message starts with a 64-bit fingerprint derived from the
//! structure of its type: member names, primitive type names and array
//! dimensions, plus the fingerprints of nested types. Names of nested types
//! do not contribute, so renaming a nested type keeps the fingerprint.

use super::catalog::{Dim, Primitive, TypeDef};

const BASE_SEED: i64 = 0x1234_5678;

fn hash_update(v: i64, c: i8) -> i64 {
    ((v << 8) ^ (v >> 55)).wrapping_add(c as i64)
}

fn hash_string_update(mut v: i64, s: &str) -> i64 {
    v = hash_update(v, s.len() as u8 as i8);
    for b in s.bytes() {
        v = hash_update(v, b as i8);
    }
    v
}

/// Hash of a type's own members, ignoring nested types.
pub fn base_hash(def: &TypeDef) -> u64 {
    let mut v = BASE_SEED;
    for member in &def.members {
        v = hash_string_update(v, &member.name);
        if Primitive::parse(&member.type_name).is_some() {
            v = hash_string_update(v, &member.type_name);
        }
        v = hash_update(v, member.dims.len() as u8 as i8);
        for dim in &member.dims {
            let mode = match dim {
                Dim::Fixed(_) => 0,
                Dim::Var(_) => 1,
            };
            v = hash_update(v, mode);
            v = hash_string_update(v, &dim.size_text());
        }
    }
    v as u64
}

/// Full fingerprint of type `index`.
///
/// `bases[i]` is the base hash of type `i` and `children[i]` lists the type
/// index of every non-primitive member of type `i`, one entry per member. A
/// type reached again through its own members contributes nothing.
pub fn fingerprint(bases: &[u64], children: &[Vec<usize>], index: usize) -> u64 {
    let mut parents = Vec::new();
    recursive_hash(bases, children, index, &mut parents)
}

fn recursive_hash(bases: &[u64], children: &[Vec<usize>], index: usize, parents: &mut Vec<usize>) -> u64 {
    if parents.contains(&index) {
        return 0;
    }
    parents.push(index);
    let mut hash = bases[index];
    for &child in &children[index] {
        hash = hash.wrapping_add(recursive_hash(bases, children, child, parents));
    }
    parents.pop();
    hash.rotate_left(1)
}
