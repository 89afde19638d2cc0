//! Assignability rules.
//!
//! Determines if a value of one type can be used where another is requested.
//! Supports:
//! - Identity
//! - The top type (everything is assignable to `java.lang.Object`)
//! - Raw classes (extends/implements, transitively)
//! - Parameterized types (argument containment with wildcards)
//! - Arrays of equal dimension (covariant)
//!
//! Unresolved type variables on either side are treated as instantiable and
//! always match; a raw view of a generic supertype is accepted as an
//! unchecked conversion.

use crate::substitution::Substitution;
use crate::type_system::TypeHierarchy;
use lodestar_api::models::TypeRef;
use std::collections::{HashSet, VecDeque};

/// Check if a value whose raw class is `implementation` can be assigned to `target`.
pub fn is_assignable<H: TypeHierarchy + ?Sized>(
    target: &TypeRef,
    implementation: &str,
    hierarchy: &H,
) -> bool {
    let source = match hierarchy.declaration(implementation) {
        Some(decl) => decl.self_type(),
        None => TypeRef::id(implementation),
    };
    is_type_assignable(target, &source, hierarchy)
}

/// Check if `from` can be assigned to `to`.
pub fn is_type_assignable<H: TypeHierarchy + ?Sized>(
    to: &TypeRef,
    from: &TypeRef,
    hierarchy: &H,
) -> bool {
    // 1. Reflexivity
    if to == from {
        return true;
    }

    match (to, from) {
        (_, TypeRef::Variable(_)) | (TypeRef::Variable(_), _) => true,

        (TypeRef::Id(t), _) if t == TypeRef::OBJECT_FQN => true,

        (TypeRef::Wildcard { .. }, _) => contains(to, from, hierarchy),

        (TypeRef::Id(t), TypeRef::Id(_) | TypeRef::Generic { .. }) => from
            .raw_class()
            .is_some_and(|raw| hierarchy.is_subclass(raw, t)),

        (TypeRef::Generic { base, args }, TypeRef::Id(_) | TypeRef::Generic { .. }) => {
            match supertype_view(from, base, hierarchy) {
                Some(TypeRef::Generic {
                    args: view_args, ..
                }) => {
                    args.len() == view_args.len()
                        && args
                            .iter()
                            .zip(view_args.iter())
                            .all(|(t, c)| contains(t, c, hierarchy))
                }
                // Raw supertype: unchecked conversion
                Some(_) => true,
                None => false,
            }
        }

        (
            TypeRef::Array {
                element: e1,
                dimensions: d1,
            },
            TypeRef::Array {
                element: e2,
                dimensions: d2,
            },
        ) => d1 == d2 && is_type_assignable(e1, e2, hierarchy),

        _ => false,
    }
}

/// Check if type argument `target` contains type argument `candidate`.
fn contains<H: TypeHierarchy + ?Sized>(
    target: &TypeRef,
    candidate: &TypeRef,
    hierarchy: &H,
) -> bool {
    if target == candidate {
        return true;
    }

    match (target, candidate) {
        (_, TypeRef::Variable(_)) | (TypeRef::Variable(_), _) => true,

        (TypeRef::Wildcard { bound: None, .. }, _) => true,

        // Unbounded candidate behaves like `? extends Object`
        (
            TypeRef::Wildcard {
                bound: Some(b),
                is_upper_bound,
            },
            TypeRef::Wildcard { bound: None, .. },
        ) => *is_upper_bound && b.is_object(),

        (
            TypeRef::Wildcard {
                bound: Some(b),
                is_upper_bound: upper,
            },
            TypeRef::Wildcard {
                bound: Some(cb),
                is_upper_bound: candidate_upper,
            },
        ) => match (upper, candidate_upper) {
            (true, true) => is_type_assignable(b, cb, hierarchy),
            (false, false) => is_type_assignable(cb, b, hierarchy),
            _ => false,
        },

        (
            TypeRef::Wildcard {
                bound: Some(b),
                is_upper_bound: true,
            },
            _,
        ) => is_type_assignable(b, candidate, hierarchy),

        (
            TypeRef::Wildcard {
                bound: Some(b),
                is_upper_bound: false,
            },
            _,
        ) => is_type_assignable(candidate, b, hierarchy),

        // Invariant arguments, but nested wildcards/variables still apply
        (
            TypeRef::Generic { base: b1, args: a1 },
            TypeRef::Generic { base: b2, args: a2 },
        ) => {
            b1 == b2
                && a1.len() == a2.len()
                && a1
                    .iter()
                    .zip(a2.iter())
                    .all(|(x, y)| contains(x, y, hierarchy))
        }

        _ => false,
    }
}

/// View `from` as an instance of raw class `base`, carrying type arguments
/// up the supertype chain. Returns `None` when `base` is not an ancestor.
pub fn supertype_view<H: TypeHierarchy + ?Sized>(
    from: &TypeRef,
    base: &str,
    hierarchy: &H,
) -> Option<TypeRef> {
    let raw = from.raw_class()?;
    if raw == base {
        return Some(from.clone());
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(raw.to_string());
    queue.push_back(from.clone());

    while let Some(current) = queue.pop_front() {
        let Some(decl) = current.raw_class().and_then(|r| hierarchy.declaration(r)) else {
            continue;
        };

        // A raw use of a generic class erases its supertypes
        let erased = current.is_raw() && !decl.type_params.is_empty();
        let subst = match &current {
            TypeRef::Generic { args, .. } => Substitution::zip(&decl.type_params, args),
            _ => Substitution::new(),
        };

        for declared in &decl.supertypes {
            let view = if erased {
                match declared.raw_type() {
                    Some(raw_view) => raw_view,
                    None => continue,
                }
            } else {
                subst.apply(declared)
            };

            let Some(view_raw) = view.raw_class() else {
                continue;
            };
            if view_raw == base {
                return Some(view);
            }
            if visited.insert(view_raw.to_string()) {
                queue.push_back(view);
            }
        }
    }

    None
}
