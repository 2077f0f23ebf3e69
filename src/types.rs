//! `TypeInfo`: the semantic-analysis-time view of a textual type
//! spelling, per `spec.md` §3.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeInfo {
    Void,
    /// 32-bit signed.
    Int,
    /// 8-bit.
    Char,
    Pointer(Box<TypeInfo>),
    Array(Box<TypeInfo>, usize),
    /// Dormant: no parser production ever constructs this variant
    /// (`spec.md` §9, "Struct types registry"). Kept so the analyzer's
    /// struct-type registry has somewhere to put an entry if one is
    /// ever looked up.
    Struct(String, Vec<(String, TypeInfo)>),
}

impl TypeInfo {
    /// Resolve a textual type spelling as accepted by the parser
    /// (`int`, `char`, `void`) into a `TypeInfo`. Returns `None` for any
    /// other spelling, which the analyzer reports as an unknown type
    /// name.
    pub fn from_spelling(spelling: &str) -> Option<TypeInfo> {
        match spelling {
            "int" => Some(TypeInfo::Int),
            "char" => Some(TypeInfo::Char),
            "void" => Some(TypeInfo::Void),
            _ => None,
        }
    }

    /// The LLVM IR spelling of this type, per `spec.md` §4.4's
    /// type-to-IR mapping.
    pub fn to_ir(&self) -> String {
        match self {
            TypeInfo::Void => "void".to_string(),
            TypeInfo::Int => "i32".to_string(),
            TypeInfo::Char => "i8".to_string(),
            TypeInfo::Pointer(base) => format!("{}*", base.to_ir()),
            TypeInfo::Array(base, len) => format!("[{} x {}]", len, base.to_ir()),
            TypeInfo::Struct(name, _) => format!("%struct.{}", name),
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeInfo::Void => write!(f, "void"),
            TypeInfo::Int => write!(f, "int"),
            TypeInfo::Char => write!(f, "char"),
            TypeInfo::Pointer(base) => write!(f, "{}*", base),
            TypeInfo::Array(base, len) => write!(f, "{}[{}]", base, len),
            TypeInfo::Struct(name, _) => write!(f, "struct {}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_the_three_scalar_spellings() {
        assert_eq!(TypeInfo::from_spelling("int"), Some(TypeInfo::Int));
        assert_eq!(TypeInfo::from_spelling("char"), Some(TypeInfo::Char));
        assert_eq!(TypeInfo::from_spelling("void"), Some(TypeInfo::Void));
        assert_eq!(TypeInfo::from_spelling("float"), None);
    }

    #[test]
    fn ir_mapping_matches_spec_table() {
        assert_eq!(TypeInfo::Void.to_ir(), "void");
        assert_eq!(TypeInfo::Int.to_ir(), "i32");
        assert_eq!(TypeInfo::Char.to_ir(), "i8");
        assert_eq!(
            TypeInfo::Pointer(Box::new(TypeInfo::Int)).to_ir(),
            "i32*"
        );
        assert_eq!(
            TypeInfo::Array(Box::new(TypeInfo::Char), 4).to_ir(),
            "[4 x i8]"
        );
    }
}
