//! Export Descriptors
//!
//! The immutable description of what a module exports: functions grouped into
//! interfaces, interfaces grouped into one table. Descriptors are only created
//! by the registry, and a function descriptor's callback is bound before the
//! descriptor becomes part of an interface.

use crate::runtime::{FuncSignature, HostCallback, HostContext};
use std::fmt;
use wasmtime::component::Val;

// ============================================================================
// Functions
// ============================================================================

/// One exported member function.
#[derive(Clone)]
pub struct ExportedFunction {
    pub(crate) name: String,
    pub(crate) native_name: String,
    pub(crate) id: u64,
    pub(crate) checksum: u64,
    pub(crate) signature: FuncSignature,
    pub(crate) callback: HostCallback,
}

impl ExportedFunction {
    /// ABI-visible name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the native method, for diagnostics.
    pub fn native_name(&self) -> &str {
        &self.native_name
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Opaque compatibility token from the descriptor generator.
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    pub fn signature(&self) -> &FuncSignature {
        &self.signature
    }

    pub fn callback(&self) -> &HostCallback {
        &self.callback
    }

    /// Run the callback with this function's own signature.
    pub fn invoke(
        &self,
        ctx: &mut HostContext,
        params: &[Val],
        results: &mut [Val],
    ) -> anyhow::Result<()> {
        (self.callback)(ctx, &self.signature, params, results)
    }
}

impl fmt::Debug for ExportedFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedFunction")
            .field("name", &self.name)
            .field("native_name", &self.native_name)
            .field("id", &self.id)
            .field("checksum", &format_args!("0x{:016x}", self.checksum))
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Interfaces
// ============================================================================

/// One exported interface and its member functions, in declaration order.
#[derive(Debug, Clone)]
pub struct ExportedInterface {
    pub(crate) name: String,
    pub(crate) id: u64,
    pub(crate) checksum: u64,
    pub(crate) native_type_fingerprint: u64,
    pub(crate) functions: Vec<ExportedFunction>,
}

impl ExportedInterface {
    /// Fully qualified ABI name, e.g. `counter:demo/counter`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    /// Distinguishes interfaces that share a name but differ in native type.
    pub fn native_type_fingerprint(&self) -> u64 {
        self.native_type_fingerprint
    }

    pub fn functions(&self) -> &[ExportedFunction] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&ExportedFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn function_by_id(&self, id: u64) -> Option<&ExportedFunction> {
        self.functions.iter().find(|f| f.id == id)
    }
}

// ============================================================================
// Table
// ============================================================================

/// Every interface a module exports, in the order they were listed.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    pub(crate) interfaces: Vec<ExportedInterface>,
}

impl ExportTable {
    pub fn interfaces(&self) -> &[ExportedInterface] {
        &self.interfaces
    }

    pub fn interface(&self, name: &str) -> Option<&ExportedInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn interface_by_id(&self, id: u64) -> Option<&ExportedInterface> {
        self.interfaces.iter().find(|i| i.id == id)
    }

    /// Total number of exported functions across all interfaces.
    pub fn function_count(&self) -> usize {
        self.interfaces.iter().map(|i| i.functions.len()).sum()
    }
}
