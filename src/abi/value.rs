//! Scalar conversions

use super::ScalarKind;
use std::any::Any;
use std::fmt;
use wasmtime::component::Val;

/// A native scalar that can be read from and written to a [`Val`].
pub trait Scalar: Copy + Default + fmt::Debug + Send + Sync + 'static {
    /// The tag this type encodes to.
    const KIND: ScalarKind;

    /// Extract `Self` from `val`, or `Self::default()` if the tag is incompatible.
    fn decode(val: &Val) -> Self;

    /// Wrap `self` in the matching tag.
    fn encode(self) -> Val;
}

// ============================================================================
// Scalar implementations
// ============================================================================

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn decode(val: &Val) -> Self {
        match val {
            Val::Bool(x) => *x,
            _ => false,
        }
    }

    fn encode(self) -> Val {
        Val::Bool(self)
    }
}

impl Scalar for i32 {
    const KIND: ScalarKind = ScalarKind::S32;

    fn decode(val: &Val) -> Self {
        match val {
            Val::S32(x) => *x,
            _ => 0,
        }
    }

    fn encode(self) -> Val {
        Val::S32(self)
    }
}

impl Scalar for u32 {
    const KIND: ScalarKind = ScalarKind::U32;

    fn decode(val: &Val) -> Self {
        match val {
            Val::U32(x) => *x,
            _ => 0,
        }
    }

    fn encode(self) -> Val {
        Val::U32(self)
    }
}

impl Scalar for i64 {
    const KIND: ScalarKind = ScalarKind::S64;

    fn decode(val: &Val) -> Self {
        match val {
            Val::S64(x) => *x,
            // Handles and pointer-sized words arrive as u64
            Val::U64(x) => *x as i64,
            _ => 0,
        }
    }

    fn encode(self) -> Val {
        Val::S64(self)
    }
}

impl Scalar for u64 {
    const KIND: ScalarKind = ScalarKind::U64;

    fn decode(val: &Val) -> Self {
        match val {
            Val::U64(x) => *x,
            _ => 0,
        }
    }

    fn encode(self) -> Val {
        Val::U64(self)
    }
}

impl Scalar for f32 {
    const KIND: ScalarKind = ScalarKind::F32;

    fn decode(val: &Val) -> Self {
        match val {
            Val::Float32(x) => *x,
            _ => 0.0,
        }
    }

    fn encode(self) -> Val {
        Val::Float32(self)
    }
}

impl Scalar for f64 {
    const KIND: ScalarKind = ScalarKind::F64;

    fn decode(val: &Val) -> Self {
        match val {
            Val::Float64(x) => *x,
            _ => 0.0,
        }
    }

    fn encode(self) -> Val {
        Val::Float64(self)
    }
}

// ============================================================================
// Return values
// ============================================================================

/// A method return type: either `()` or a [`Scalar`].
pub trait ReturnValue: 'static {
    /// The result kind, `None` for `()`.
    const KIND: Option<ScalarKind>;

    /// Encode the result, `None` when there is nothing to write.
    fn into_val(self) -> Option<Val>;
}

impl ReturnValue for () {
    const KIND: Option<ScalarKind> = None;

    fn into_val(self) -> Option<Val> {
        None
    }
}

macro_rules! scalar_return {
    ($($ty:ty),*) => {
        $(
            impl ReturnValue for $ty {
                const KIND: Option<ScalarKind> = Some(<$ty as Scalar>::KIND);

                fn into_val(self) -> Option<Val> {
                    Some(Scalar::encode(self))
                }
            }
        )*
    };
}

scalar_return!(bool, i32, u32, i64, u64, f32, f64);

/// Encode a result whose type is only known at runtime.
///
/// Unrecognized types encode as `Val::S32(0)`.
pub fn encode_any(value: &dyn Any) -> Val {
    if let Some(x) = value.downcast_ref::<i32>() {
        x.encode()
    } else if let Some(x) = value.downcast_ref::<i64>() {
        x.encode()
    } else if let Some(x) = value.downcast_ref::<u64>() {
        x.encode()
    } else if let Some(x) = value.downcast_ref::<u32>() {
        x.encode()
    } else if let Some(x) = value.downcast_ref::<f32>() {
        x.encode()
    } else if let Some(x) = value.downcast_ref::<f64>() {
        x.encode()
    } else if let Some(x) = value.downcast_ref::<bool>() {
        x.encode()
    } else {
        Val::S32(0)
    }
}
