//! Type arena for the IR model
//!
//! Types live in a [`TypeTable`] and refer to each other through [`TypeId`],
//! which lets named record types point back at themselves.

use serde::Serialize;
use std::fmt::Write;

/// Index of a type inside a [`TypeTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Returns the arena index of this type
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural kind of an IR type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// No value (function returns, stores)
    Void,
    /// Integer or floating point scalar of the given width
    Scalar {
        /// Width in bits
        bits: u32,
    },
    /// Pointer to a pointee type
    Pointer(TypeId),
    /// Fixed-size array: [count x elem]
    Array {
        /// Element type
        elem: TypeId,
        /// Number of elements
        count: u64,
    },
    /// SIMD vector: <count x elem>
    Vector {
        /// Element type
        elem: TypeId,
        /// Number of lanes
        count: u64,
    },
    /// Record type with fields in declaration order
    Struct {
        /// Record name (`struct.foo`), `None` for literal structs
        name: Option<String>,
        /// Field types in declaration order
        fields: Vec<TypeId>,
    },
}

/// Arena owning every type of a module
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: Vec<Type>,
}

impl TypeTable {
    /// Create an empty type table
    pub fn new() -> Self {
        Self { types: Vec::new() }
    }

    /// Add a type and return its id. Structural types are not uniqued.
    pub fn add(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        id
    }

    /// Look up a type by id
    pub fn get(&self, id: TypeId) -> Option<&Type> {
        self.types.get(id.index())
    }

    /// Number of types in the table
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// True when no type has been added
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Shorthand for `void`
    pub fn void(&mut self) -> TypeId {
        self.add(Type::Void)
    }

    /// Shorthand for an integer/float scalar of `bits` width
    pub fn scalar(&mut self, bits: u32) -> TypeId {
        self.add(Type::Scalar { bits })
    }

    /// Shorthand for a pointer to `pointee`
    pub fn pointer(&mut self, pointee: TypeId) -> TypeId {
        self.add(Type::Pointer(pointee))
    }

    /// Shorthand for `[count x elem]`
    pub fn array(&mut self, elem: TypeId, count: u64) -> TypeId {
        self.add(Type::Array { elem, count })
    }

    /// Shorthand for `<count x elem>`
    pub fn vector(&mut self, elem: TypeId, count: u64) -> TypeId {
        self.add(Type::Vector { elem, count })
    }

    /// Add a struct with a known body
    pub fn structure(&mut self, name: Option<&str>, fields: Vec<TypeId>) -> TypeId {
        self.add(Type::Struct {
            name: name.map(str::to_string),
            fields,
        })
    }

    /// Declare a named struct whose body is filled in later with
    /// [`TypeTable::set_struct_body`]. Needed for self-referential records.
    pub fn declare_struct(&mut self, name: &str) -> TypeId {
        self.structure(Some(name), Vec::new())
    }

    /// Replace the field list of a struct. Returns false if `id` is not a struct.
    pub fn set_struct_body(&mut self, id: TypeId, body: Vec<TypeId>) -> bool {
        match self.types.get_mut(id.index()) {
            Some(Type::Struct { fields, .. }) => {
                *fields = body;
                true
            }
            _ => false,
        }
    }

    /// Width of a type when it is a primitive. Vectors report their own
    /// aggregate width, which is zero when the lanes are not primitive.
    pub fn primitive_bits(&self, id: TypeId) -> u64 {
        match self.get(id) {
            Some(Type::Scalar { bits }) => u64::from(*bits),
            Some(Type::Vector { elem, count }) => match self.get(*elem) {
                Some(Type::Scalar { bits }) => u64::from(*bits).saturating_mul(*count),
                _ => 0,
            },
            _ => 0,
        }
    }

    /// Render a type the way LLVM assembly spells it
    pub fn display(&self, id: TypeId) -> String {
        let mut out = String::new();
        self.write_type(&mut out, id, 0);
        out
    }

    fn write_type(&self, out: &mut String, id: TypeId, depth: usize) {
        // Literal structs can nest arbitrarily; named ones stop at the name.
        if depth > 32 {
            out.push_str("...");
            return;
        }
        match self.get(id) {
            None => out.push_str("<invalid>"),
            Some(Type::Void) => out.push_str("void"),
            Some(Type::Scalar { bits }) => {
                let _ = write!(out, "i{}", bits);
            }
            Some(Type::Pointer(pointee)) => {
                self.write_type(out, *pointee, depth + 1);
                out.push('*');
            }
            Some(Type::Array { elem, count }) => {
                let _ = write!(out, "[{} x ", count);
                self.write_type(out, *elem, depth + 1);
                out.push(']');
            }
            Some(Type::Vector { elem, count }) => {
                let _ = write!(out, "<{} x ", count);
                self.write_type(out, *elem, depth + 1);
                out.push('>');
            }
            Some(Type::Struct {
                name: Some(name), ..
            }) => {
                let _ = write!(out, "%{}", name);
            }
            Some(Type::Struct { name: None, fields }) => {
                out.push('{');
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, *field, depth + 1);
                }
                out.push('}');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut types = TypeTable::new();
        let i8t = types.scalar(8);
        let i32t = types.scalar(32);
        let arr = types.array(i8t, 4);
        let ptr = types.pointer(i32t);
        let vec = types.vector(i32t, 4);
        let lit = types.structure(None, vec![i32t, i8t]);
        let named = types.structure(Some("struct.point"), vec![i32t, i32t]);

        assert_eq!(types.display(arr), "[4 x i8]");
        assert_eq!(types.display(ptr), "i32*");
        assert_eq!(types.display(vec), "<4 x i32>");
        assert_eq!(types.display(lit), "{i32, i8}");
        assert_eq!(types.display(named), "%struct.point");
    }

    #[test]
    fn test_primitive_bits() {
        let mut types = TypeTable::new();
        let i16t = types.scalar(16);
        let ptr = types.pointer(i16t);
        let vec = types.vector(i16t, 8);
        let ptr_vec = types.vector(ptr, 2);
        let arr = types.array(i16t, 3);

        assert_eq!(types.primitive_bits(i16t), 16);
        assert_eq!(types.primitive_bits(vec), 128);
        assert_eq!(types.primitive_bits(ptr_vec), 0);
        assert_eq!(types.primitive_bits(ptr), 0);
        assert_eq!(types.primitive_bits(arr), 0);
    }

    #[test]
    fn test_self_referential_struct() {
        let mut types = TypeTable::new();
        let node = types.declare_struct("struct.node");
        let next = types.pointer(node);
        let i64t = types.scalar(64);
        assert!(types.set_struct_body(node, vec![i64t, next]));
        assert!(!types.set_struct_body(i64t, vec![]));
        assert_eq!(types.display(next), "%struct.node*");
    }
}
