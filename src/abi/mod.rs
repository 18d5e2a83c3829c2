//! ABI: Scalar Marshaling
//!
//! Converts between wasmtime's tagged component values and native scalars.
//!
//! - Decoding checks the value's discriminant first and falls back to the
//!   zero value of the target type on a mismatch
//! - Encoding is total: every supported scalar maps to exactly one tag

mod value;

pub use value::{encode_any, ReturnValue, Scalar};

use serde::{Deserialize, Serialize};
use std::fmt;
use wasmtime::component::Val;

/// The scalar kinds that cross the host boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    S32,
    U32,
    S64,
    U64,
    F32,
    F64,
}

impl ScalarKind {
    /// The WIT spelling of this kind.
    pub fn wit_name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::S32 => "s32",
            ScalarKind::U32 => "u32",
            ScalarKind::S64 => "s64",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        }
    }

    /// The kind carried by a value, if it is one of the supported scalars.
    pub fn of(val: &Val) -> Option<ScalarKind> {
        match val {
            Val::Bool(_) => Some(ScalarKind::Bool),
            Val::S32(_) => Some(ScalarKind::S32),
            Val::U32(_) => Some(ScalarKind::U32),
            Val::S64(_) => Some(ScalarKind::S64),
            Val::U64(_) => Some(ScalarKind::U64),
            Val::Float32(_) => Some(ScalarKind::F32),
            Val::Float64(_) => Some(ScalarKind::F64),
            _ => None,
        }
    }

    /// The value a mismatched decode falls back to, tagged as this kind.
    pub fn zero(&self) -> Val {
        match self {
            ScalarKind::Bool => encode(false),
            ScalarKind::S32 => encode(0i32),
            ScalarKind::U32 => encode(0u32),
            ScalarKind::S64 => encode(0i64),
            ScalarKind::U64 => encode(0u64),
            ScalarKind::F32 => encode(0.0f32),
            ScalarKind::F64 => encode(0.0f64),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wit_name())
    }
}

/// Decode `val` as `T`, yielding `T::default()` when the tag does not match.
pub fn decode<T: Scalar>(val: &Val) -> T {
    T::decode(val)
}

/// Encode a native scalar as a tagged value.
pub fn encode<T: Scalar>(value: T) -> Val {
    value.encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_scalars() {
        assert_eq!(ScalarKind::of(&Val::S32(1)), Some(ScalarKind::S32));
        assert_eq!(ScalarKind::of(&Val::U64(1)), Some(ScalarKind::U64));
        assert_eq!(ScalarKind::of(&Val::Float64(1.0)), Some(ScalarKind::F64));
        assert_eq!(ScalarKind::of(&Val::String("x".into())), None);
    }

    #[test]
    fn test_zero_matches_kind() {
        let kinds = [
            ScalarKind::Bool,
            ScalarKind::S32,
            ScalarKind::U32,
            ScalarKind::S64,
            ScalarKind::U64,
            ScalarKind::F32,
            ScalarKind::F64,
        ];
        for kind in kinds {
            assert_eq!(ScalarKind::of(&kind.zero()), Some(kind));
        }
        assert!(matches!(ScalarKind::S32.zero(), Val::S32(0)));
        assert!(matches!(ScalarKind::Bool.zero(), Val::Bool(false)));
        assert!(matches!(ScalarKind::F64.zero(), Val::Float64(x) if x == 0.0));
    }

    #[test]
    fn test_free_functions() {
        assert_eq!(decode::<i32>(&encode(-3i32)), -3);
        assert_eq!(decode::<u32>(&encode(u32::MAX)), u32::MAX);
        assert!(decode::<bool>(&encode(true)));
        assert_eq!(decode::<u64>(&Val::S32(1)), 0);
        assert!(matches!(encode(9u64), Val::U64(9)));
    }

    #[test]
    fn test_kind_serializes_as_wit_name() {
        let json = serde_json::to_string(&ScalarKind::S64).unwrap();
        assert_eq!(json, "\"s64\"");
        assert_eq!(ScalarKind::F32.to_string(), "f32");
    }
}
