//! hostlink: native host functions for component-model interfaces
//!
//! Exposes statically typed native methods to a wasmtime component as
//! dynamically typed host callbacks, and publishes them in a versioned export
//! table that a module loader can discover.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  registry   - once-per-process export table  │
//! │  provider   - per-interface descriptor trait │
//! │  descriptor - function/interface/table model │
//! │  runtime    - handles, callbacks, linking    │
//! │  abi        - Val <-> native scalars         │
//! ├──────────────────────────────────────────────┤
//! │        wasmtime component model (Val)        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Calling convention
//!
//! Every exported function receives the instance handle first, followed by
//! its declared parameters:
//!
//! ```wit
//! interface counter {
//!     increment: func(handle: u64, amount: s32) -> s32;
//! }
//! ```

pub mod abi;
pub mod descriptor;
pub mod metadata;
pub mod provider;
pub mod registry;
pub mod runtime;

#[cfg(test)]
mod testing;

pub use abi::{decode, encode, ReturnValue, Scalar, ScalarKind};
pub use descriptor::{ExportTable, ExportedFunction, ExportedInterface};
pub use metadata::ExportManifest;
pub use provider::{InterfaceInfo, MemberInfo, MemberVisitor};
pub use registry::{
    export_table, module_exports, InterfaceSet, ModuleExportsFn, RegistryError, VersionPolicy,
    LINKER_ABI_VERSION, MODULE_EXPORTS_SYMBOL,
};
pub use runtime::{
    define_exports, CallDiagnostic, FuncSignature, HostCallback, HostContext, HostView,
    InstanceHandle, InstanceTable,
};
