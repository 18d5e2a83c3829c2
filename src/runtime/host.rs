//! Host Callback Synthesis
//!
//! Turns a statically typed native method into a [`HostCallback`], the one
//! shape the component runtime calls regardless of the method's signature.
//!
//! # Example
//!
//! ```ignore
//! struct Counter { value: i32 }
//!
//! impl Counter {
//!     fn increment(&mut self, amount: i32) -> i32 {
//!         self.value += amount;
//!         self.value
//!     }
//! }
//!
//! let callback = synthesize(Counter::increment);
//!
//! let mut ctx = HostContext::new();
//! let handle = ctx.instances_mut().insert(Counter { value: 10 }).unwrap();
//!
//! let mut results = [Val::S32(0)];
//! callback(&mut ctx, &signature, &[handle.into(), Val::S32(5)], &mut results)?;
//! // results == [Val::S32(15)]
//! ```

use crate::abi::{decode, ReturnValue, Scalar, ScalarKind};
use crate::runtime::handle::{HandleError, InstanceHandle, InstanceTable};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use wasmtime::component::Val;

// ============================================================================
// Diagnostics
// ============================================================================

/// A malformed call that a callback absorbed instead of failing.
///
/// Callbacks report these and still return `Ok(())`: callers upstream rely on
/// the no-op behavior.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallDiagnostic {
    #[error("insufficient arguments: expected {expected}, got {got}")]
    ArgumentShortfall { expected: usize, got: usize },

    #[error("invalid instance handle: 0")]
    NullHandle,

    #[error("malformed instance handle 0x{bits:x}: no slot index")]
    MalformedHandle { bits: u64 },

    #[error("unresolved instance handle 0x{bits:x}: {error}")]
    UnresolvedHandle { bits: u64, error: HandleError },
}

/// Handler invoked for every [`CallDiagnostic`].
pub type ErrorHandler = Arc<dyn Fn(&CallDiagnostic) + Send + Sync>;

fn default_error_handler(diagnostic: &CallDiagnostic) {
    tracing::error!(%diagnostic, "host callback skipped");
}

#[derive(Clone, Default)]
struct Diagnostics {
    handler: Option<ErrorHandler>,
}

impl Diagnostics {
    fn report(&self, diagnostic: CallDiagnostic) {
        match &self.handler {
            Some(handler) => handler(&diagnostic),
            None => default_error_handler(&diagnostic),
        }
    }
}

// ============================================================================
// Host Context
// ============================================================================

/// Per-store host state every callback receives.
#[derive(Default)]
pub struct HostContext {
    instances: InstanceTable,
    diagnostics: Diagnostics,
}

impl HostContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route callback diagnostics to `handler` instead of the log.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let ctx = HostContext::new().with_error_handler(|d| {
    ///     metrics::increment("host_call_skipped");
    ///     tracing::warn!("{d}");
    /// });
    /// ```
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&CallDiagnostic) + Send + Sync + 'static,
    {
        self.diagnostics.handler = Some(Arc::new(handler));
        self
    }

    pub fn instances(&self) -> &InstanceTable {
        &self.instances
    }

    pub fn instances_mut(&mut self) -> &mut InstanceTable {
        &mut self.instances
    }
}

impl fmt::Debug for HostContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostContext")
            .field("instances", &self.instances)
            .field("error_handler", &self.diagnostics.handler.is_some())
            .finish()
    }
}

/// Store data that carries a [`HostContext`].
///
/// Implement this for your wasmtime store data type to link exported
/// interfaces against it.
pub trait HostView {
    fn host_context(&mut self) -> &mut HostContext;
}

impl HostView for HostContext {
    fn host_context(&mut self) -> &mut HostContext {
        self
    }
}

// ============================================================================
// Signatures and Methods
// ============================================================================

/// Parameter and result kinds of a bound method, excluding the instance handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FuncSignature {
    pub params: Vec<ScalarKind>,
    pub result: Option<ScalarKind>,
}

impl fmt::Display for FuncSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func(handle")?;
        for param in &self.params {
            write!(f, ", {}", param)?;
        }
        write!(f, ")")?;
        if let Some(result) = &self.result {
            write!(f, " -> {}", result)?;
        }
        Ok(())
    }
}

/// The uniform callback shape: `(context, function type, params, results)`.
pub type HostCallback = Arc<
    dyn Fn(&mut HostContext, &FuncSignature, &[Val], &mut [Val]) -> anyhow::Result<()>
        + Send
        + Sync,
>;

/// A native method bound to instances of `T`.
///
/// Implemented for every `Fn(&mut T, A0, .., An) -> R` where each `Ai` is a
/// [`Scalar`] and `R` a [`ReturnValue`], up to eight parameters. `Args` and
/// `Ret` only select the implementation.
pub trait HostMethod<T, Args, Ret>: Send + Sync + 'static {
    /// Number of parameters after the instance.
    const PARAM_COUNT: usize;

    fn signature() -> FuncSignature;

    /// Decode `args[0..PARAM_COUNT]` in declaration order and call the method.
    ///
    /// `args` must hold at least `PARAM_COUNT` values.
    fn call(&self, instance: &mut T, args: &[Val]) -> Ret;
}

macro_rules! impl_host_method {
    ($count:expr; $($arg:ident $idx:tt),*) => {
        impl<F, T, R, $($arg,)*> HostMethod<T, ($($arg,)*), R> for F
        where
            F: Fn(&mut T, $($arg),*) -> R + Send + Sync + 'static,
            R: ReturnValue,
            $($arg: Scalar,)*
        {
            const PARAM_COUNT: usize = $count;

            fn signature() -> FuncSignature {
                FuncSignature {
                    params: vec![$(<$arg as Scalar>::KIND),*],
                    result: R::KIND,
                }
            }

            #[allow(unused_variables)]
            fn call(&self, instance: &mut T, args: &[Val]) -> R {
                $(
                    tracing::trace!(
                        param = $idx,
                        kind = %<$arg as Scalar>::KIND,
                        value = ?args[$idx],
                        "decoding parameter"
                    );
                )*
                (self)(instance, $(decode::<$arg>(&args[$idx])),*)
            }
        }
    };
}

impl_host_method!(0;);
impl_host_method!(1; A0 0);
impl_host_method!(2; A0 0, A1 1);
impl_host_method!(3; A0 0, A1 1, A2 2);
impl_host_method!(4; A0 0, A1 1, A2 2, A3 3);
impl_host_method!(5; A0 0, A1 1, A2 2, A3 3, A4 4);
impl_host_method!(6; A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
impl_host_method!(7; A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
impl_host_method!(8; A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);

// ============================================================================
// Synthesis
// ============================================================================

/// Wrap `method` into a [`HostCallback`].
///
/// The callback expects `params[0]` to be an instance handle (`u64` or `s64`)
/// followed by one value per method parameter. Too few values, a zero handle,
/// or a handle that does not resolve to a live `T` are reported through the
/// context's diagnostics and leave `results` untouched; the callback still
/// returns `Ok(())`. For non-void methods the encoded result goes to
/// `results[0]` when `results` is non-empty.
pub fn synthesize<T, Args, Ret, M>(method: M) -> HostCallback
where
    T: Any,
    Args: 'static,
    Ret: ReturnValue,
    M: HostMethod<T, Args, Ret>,
{
    Arc::new(
        move |ctx: &mut HostContext,
              _ty: &FuncSignature,
              params: &[Val],
              results: &mut [Val]|
              -> anyhow::Result<()> {
            tracing::debug!(args = params.len(), "host callback invoked");

            let expected = 1 + M::PARAM_COUNT;
            if params.len() < expected {
                ctx.diagnostics.report(CallDiagnostic::ArgumentShortfall {
                    expected,
                    got: params.len(),
                });
                return Ok(());
            }

            let bits = i64::decode(&params[0]) as u64;
            let Some(handle) = InstanceHandle::from_bits(bits) else {
                ctx.diagnostics.report(if bits == 0 {
                    CallDiagnostic::NullHandle
                } else {
                    CallDiagnostic::MalformedHandle { bits }
                });
                return Ok(());
            };

            let instance = match ctx.instances.get_mut::<T>(handle) {
                Ok(instance) => instance,
                Err(error) => {
                    ctx.diagnostics
                        .report(CallDiagnostic::UnresolvedHandle { bits, error });
                    return Ok(());
                }
            };
            tracing::trace!(%handle, "instance resolved");

            let ret = method.call(instance, &params[1..]);
            if let Some(val) = ret.into_val() {
                tracing::trace!(result = ?val, "method returned");
                if let Some(slot) = results.first_mut() {
                    *slot = val;
                }
            }
            Ok(())
        },
    )
}
