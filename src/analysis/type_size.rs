//! Recursive bit-width footprint of parameter types
//!
//! The resolver walks a type and returns how many bits of data it describes,
//! building a textual trace of the walk as it goes:
//!
//! | Kind    | Width                                  | Trace                          |
//! |---------|----------------------------------------|--------------------------------|
//! | Pointer | the pointee's width, none of its own   | `*` then the pointee           |
//! | Struct  | sum of fields; 0 for denylisted names  | `S[name;field;field;]`         |
//! | Scalar  | its width                              | `i32`                          |
//! | Vector  | its own aggregate primitive width      | `v128`                         |
//! | Array   | count product times first primitive    | `A[type:..;n_bit:..;size:..;]` |
//!
//! Arrays emit one `A[...]` trace per nesting level.
//!
//! A struct met again on its own resolution path, or a walk deeper than
//! `max_type_depth`, resolves to [`TypeSize::Unknown`] and traces `?`.

use super::options::AnalysisOptions;
use crate::ir::{Type, TypeId, TypeTable};
use serde::{Serialize, Serializer};
use std::fmt::{self, Write};

/// Resolved width, or the sentinel for cyclic/too-deep types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSize {
    /// Width in bits
    Bits(u64),
    /// Resolution gave up (recursive type or depth cap)
    Unknown,
}

impl TypeSize {
    /// Width in bits, if known
    pub fn bits(self) -> Option<u64> {
        match self {
            TypeSize::Bits(bits) => Some(bits),
            TypeSize::Unknown => None,
        }
    }

    /// Width in bits, counting unknown as zero
    pub fn bits_or_zero(self) -> u64 {
        self.bits().unwrap_or(0)
    }

    fn add(self, other: TypeSize) -> TypeSize {
        match (self, other) {
            (TypeSize::Bits(a), TypeSize::Bits(b)) => TypeSize::Bits(a.saturating_add(b)),
            _ => TypeSize::Unknown,
        }
    }
}

impl fmt::Display for TypeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSize::Bits(bits) => write!(f, "{}", bits),
            TypeSize::Unknown => f.write_str("unknown"),
        }
    }
}

impl Serialize for TypeSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            TypeSize::Bits(bits) => serializer.serialize_u64(*bits),
            TypeSize::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

/// Width plus the trace produced while computing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved width
    pub bits: TypeSize,
    /// Rendered walk, e.g. `*S[struct.pair;i32;i32;]`
    pub trace: String,
}

/// Type-size resolver bound to one type table
pub struct TypeSizeResolver<'a> {
    types: &'a TypeTable,
    options: &'a AnalysisOptions,
}

impl<'a> TypeSizeResolver<'a> {
    /// Create a resolver over `types`
    pub fn new(types: &'a TypeTable, options: &'a AnalysisOptions) -> Self {
        Self { types, options }
    }

    /// Resolve the footprint of `ty`
    pub fn resolve(&self, ty: TypeId) -> Resolution {
        let mut trace = String::new();
        let mut path = Vec::new();
        let bits = self.resolve_into(ty, 0, &mut path, &mut trace);
        Resolution { bits, trace }
    }

    /// Width only, discarding the trace
    pub fn bits(&self, ty: TypeId) -> TypeSize {
        self.resolve(ty).bits
    }

    fn resolve_into(
        &self,
        ty: TypeId,
        depth: usize,
        path: &mut Vec<TypeId>,
        trace: &mut String,
    ) -> TypeSize {
        if depth > self.options.max_type_depth {
            tracing::warn!(
                "type nesting exceeds {} levels, reporting unknown size",
                self.options.max_type_depth
            );
            trace.push('?');
            return TypeSize::Unknown;
        }

        let Some(kind) = self.types.get(ty) else {
            tracing::warn!("type id {} is not in the type table", ty.0);
            trace.push('?');
            return TypeSize::Unknown;
        };

        match kind {
            Type::Pointer(pointee) => {
                trace.push('*');
                self.resolve_into(*pointee, depth + 1, path, trace)
            }
            Type::Struct { name, fields } => {
                if path.contains(&ty) {
                    tracing::warn!(
                        "recursive struct {} on its own resolution path, reporting unknown size",
                        name.as_deref().unwrap_or("<literal>")
                    );
                    trace.push('?');
                    return TypeSize::Unknown;
                }
                let name = name.as_deref().unwrap_or("");
                let _ = write!(trace, "S[{};", name);
                if self.options.is_denylisted(name) {
                    trace.push(']');
                    return TypeSize::Bits(0);
                }

                path.push(ty);
                let mut total = TypeSize::Bits(0);
                for field in fields {
                    let size = self.resolve_into(*field, depth + 1, path, trace);
                    trace.push(';');
                    total = total.add(size);
                }
                path.pop();
                trace.push(']');
                total
            }
            Type::Scalar { bits } => {
                let _ = write!(trace, "i{}", bits);
                TypeSize::Bits(u64::from(*bits))
            }
            Type::Vector { .. } => {
                let bits = self.types.primitive_bits(ty);
                let _ = write!(trace, "v{}", bits);
                TypeSize::Bits(bits)
            }
            Type::Array { .. } => self.resolve_array(ty, depth, trace),
            Type::Void => {
                trace.push_str("void");
                TypeSize::Bits(0)
            }
        }
    }

    /// Peel nested arrays until an element with a primitive width shows up.
    /// Arrays of records never reach one and count as zero.
    fn resolve_array(&self, ty: TypeId, depth: usize, trace: &mut String) -> TypeSize {
        let mut product: u64 = 1;
        let mut current = ty;
        let mut level = depth;

        while let Some(Type::Array { elem, count }) = self.types.get(current) {
            if level > self.options.max_type_depth {
                tracing::warn!(
                    "array nesting exceeds {} levels, reporting unknown size",
                    self.options.max_type_depth
                );
                trace.push('?');
                return TypeSize::Unknown;
            }
            let elem_bits = self.types.primitive_bits(*elem);
            let _ = write!(
                trace,
                "A[type:{};n_bit:{};size:{};]",
                self.types.display(*elem),
                elem_bits,
                count
            );
            product = product.saturating_mul(*count);
            if elem_bits != 0 {
                return TypeSize::Bits(product.saturating_mul(elem_bits));
            }
            current = *elem;
            level += 1;
        }
        TypeSize::Bits(0)
    }
}
