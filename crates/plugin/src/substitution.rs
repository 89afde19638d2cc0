//! Type variable substitution.
//!
//! Used to carry type arguments up a class hierarchy: the supertypes of
//! `ArrayList<E>` are declared over `E`, so viewing `ArrayList<String>` as a
//! `List` means substituting `E := String` into `List<E>`.

use lodestar_api::models::TypeRef;
use std::collections::HashMap;

/// A map from type variables to concrete types.
#[derive(Debug, Default, Clone)]
pub struct Substitution {
    map: HashMap<String, TypeRef>,
}

impl Substitution {
    /// Create a new empty substitution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind declared parameters to actual arguments, pairwise.
    ///
    /// Extra parameters or arguments are ignored.
    pub fn zip(params: &[String], args: &[TypeRef]) -> Self {
        let mut subst = Self::new();
        for (param, arg) in params.iter().zip(args.iter()) {
            subst.insert(param.clone(), arg.clone());
        }
        subst
    }

    /// Add a mapping.
    pub fn insert(&mut self, var: String, ty: TypeRef) {
        self.map.insert(var, ty);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Apply this substitution to a type.
    pub fn apply(&self, ty: &TypeRef) -> TypeRef {
        match ty {
            TypeRef::Variable(name) => self.map.get(name).cloned().unwrap_or_else(|| ty.clone()),
            TypeRef::Array {
                element,
                dimensions,
            } => TypeRef::Array {
                element: Box::new(self.apply(element)),
                dimensions: *dimensions,
            },
            TypeRef::Generic { base, args } => TypeRef::Generic {
                base: base.clone(),
                args: args.iter().map(|arg| self.apply(arg)).collect(),
            },
            TypeRef::Wildcard {
                bound,
                is_upper_bound,
            } => TypeRef::Wildcard {
                bound: bound.as_ref().map(|b| Box::new(self.apply(b))),
                is_upper_bound: *is_upper_bound,
            },
            TypeRef::Id(_) => ty.clone(),
        }
    }
}
