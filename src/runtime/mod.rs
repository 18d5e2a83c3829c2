//! Host Runtime
//!
//! Instance handles, callback synthesis, and linking into wasmtime.

mod handle;
mod host;
mod linker;

pub use handle::{HandleError, InstanceHandle, InstanceTable, MAX_SLOTS};
pub use host::{
    synthesize, CallDiagnostic, ErrorHandler, FuncSignature, HostCallback, HostContext,
    HostMethod, HostView,
};
pub use linker::{define_exports, LinkerError};
