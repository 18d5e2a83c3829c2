//! Export registry
//!
//! Builds the export table for a compile-time list of interface types and
//! publishes it through one versioned entry point.
//!
//! The list is a tuple of [`InterfaceInfo`] types. Each distinct tuple gets one
//! table per process: the first request builds it under a run-once gate,
//! concurrent requests block until that build finishes, and every later request
//! returns the same `&'static` table.
//!
//! # Example
//!
//! ```ignore
//! // In the module crate
//! hostlink::export_interfaces!(Counter, Greeter);
//!
//! // In the loader
//! let entry: Symbol<ModuleExportsFn> = library.get(MODULE_EXPORTS_SYMBOL.as_bytes())?;
//! let table = unsafe { entry(LINKER_ABI_VERSION).as_ref() };
//! ```

use crate::descriptor::{ExportTable, ExportedInterface};
use crate::metadata::native_type_fingerprint;
use crate::provider::{InterfaceInfo, MemberVisitor};
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, PoisonError};
use thiserror::Error;

/// Layout version of [`ExportTable`] as seen by loaders.
pub const LINKER_ABI_VERSION: u64 = 1;

/// Symbol emitted by [`export_interfaces!`](crate::export_interfaces).
pub const MODULE_EXPORTS_SYMBOL: &str = "hostlink_module_exports";

/// Signature of the module entry point a loader resolves.
pub type ModuleExportsFn = unsafe extern "C" fn(version_checksum: u64) -> *const ExportTable;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("interface '{interface}' declares {declared} member functions but enumerated {enumerated}")]
    FunctionCountMismatch {
        interface: String,
        declared: usize,
        enumerated: usize,
    },
}

// ============================================================================
// Version Policy
// ============================================================================

/// Which version checksums the entry point answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionPolicy {
    Exact(u64),
    AnyOf(Vec<u64>),
    Any,
}

impl VersionPolicy {
    pub fn accepts(&self, version_checksum: u64) -> bool {
        match self {
            VersionPolicy::Exact(v) => *v == version_checksum,
            VersionPolicy::AnyOf(vs) => vs.contains(&version_checksum),
            VersionPolicy::Any => true,
        }
    }
}

impl Default for VersionPolicy {
    fn default() -> Self {
        VersionPolicy::Exact(LINKER_ABI_VERSION)
    }
}

// ============================================================================
// Building
// ============================================================================

impl ExportedInterface {
    /// Build the descriptor for interface type `I`.
    pub fn build<I: InterfaceInfo>() -> Result<Self, RegistryError> {
        let name = I::interface_name();
        let declared = I::MEMBER_FUNCTION_COUNT;

        let mut functions = Vec::with_capacity(declared);
        I::visit_member_functions(&mut MemberVisitor::new(&mut functions));

        if functions.len() != declared {
            return Err(RegistryError::FunctionCountMismatch {
                interface: name,
                declared,
                enumerated: functions.len(),
            });
        }

        Ok(Self {
            name,
            id: I::interface_id(),
            checksum: I::interface_checksum(),
            native_type_fingerprint: native_type_fingerprint::<I>(),
            functions,
        })
    }
}

/// An ordered, compile-time list of interface types.
///
/// Implemented for tuples of up to twelve [`InterfaceInfo`] types.
pub trait InterfaceSet: 'static {
    const LEN: usize;

    fn build_interfaces(out: &mut Vec<ExportedInterface>) -> Result<(), RegistryError>;
}

macro_rules! impl_interface_set {
    ($len:expr; $($iface:ident),+) => {
        impl<$($iface: InterfaceInfo),+> InterfaceSet for ($($iface,)+) {
            const LEN: usize = $len;

            fn build_interfaces(out: &mut Vec<ExportedInterface>) -> Result<(), RegistryError> {
                $(out.push(ExportedInterface::build::<$iface>()?);)+
                Ok(())
            }
        }
    };
}

impl_interface_set!(1; I0);
impl_interface_set!(2; I0, I1);
impl_interface_set!(3; I0, I1, I2);
impl_interface_set!(4; I0, I1, I2, I3);
impl_interface_set!(5; I0, I1, I2, I3, I4);
impl_interface_set!(6; I0, I1, I2, I3, I4, I5);
impl_interface_set!(7; I0, I1, I2, I3, I4, I5, I6);
impl_interface_set!(8; I0, I1, I2, I3, I4, I5, I6, I7);
impl_interface_set!(9; I0, I1, I2, I3, I4, I5, I6, I7, I8);
impl_interface_set!(10; I0, I1, I2, I3, I4, I5, I6, I7, I8, I9);
impl_interface_set!(11; I0, I1, I2, I3, I4, I5, I6, I7, I8, I9, I10);
impl_interface_set!(12; I0, I1, I2, I3, I4, I5, I6, I7, I8, I9, I10, I11);

impl ExportTable {
    /// Build a fresh table for `S`, one interface per element in order.
    ///
    /// Most callers want [`export_table`], which builds once per process.
    pub fn build<S: InterfaceSet>() -> Result<Self, RegistryError> {
        let mut interfaces = Vec::with_capacity(S::LEN);
        S::build_interfaces(&mut interfaces)?;
        Ok(Self { interfaces })
    }
}

// ============================================================================
// Process-wide tables
// ============================================================================

type TableCell = OnceLock<Result<ExportTable, RegistryError>>;

static TABLES: OnceLock<Mutex<HashMap<TypeId, &'static TableCell>>> = OnceLock::new();

fn table_cell<S: InterfaceSet>() -> &'static TableCell {
    let mut tables = TABLES
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    *tables
        .entry(TypeId::of::<S>())
        .or_insert_with(|| &*Box::leak(Box::new(OnceLock::new())))
}

/// The process-wide table for `S`, built on first use.
pub fn export_table<S: InterfaceSet>() -> Result<&'static ExportTable, RegistryError> {
    table_cell::<S>()
        .get_or_init(|| {
            let table = ExportTable::build::<S>();
            match &table {
                Ok(table) => tracing::info!(
                    interfaces = table.interfaces().len(),
                    functions = table.function_count(),
                    "export table built"
                ),
                Err(e) => tracing::error!(error = %e, "export table build failed"),
            }
            table
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Entry point behind [`export_interfaces!`](crate::export_interfaces).
///
/// Returns `None` when `policy` rejects `version_checksum` or the table could
/// not be built.
pub fn module_exports<S: InterfaceSet>(
    policy: &VersionPolicy,
    version_checksum: u64,
) -> Option<&'static ExportTable> {
    if !policy.accepts(version_checksum) {
        tracing::warn!(
            version_checksum,
            ?policy,
            "module exports requested with unsupported version"
        );
        return None;
    }
    export_table::<S>().ok()
}

/// Emit the module entry point for a list of interface types.
///
/// The generated `hostlink_module_exports(version_checksum: u64)` returns the
/// process-wide table, or null when the version is rejected. The default
/// policy accepts [`LINKER_ABI_VERSION`] only.
///
/// ```ignore
/// hostlink::export_interfaces!(Counter, Greeter);
/// hostlink::export_interfaces!(policy = VersionPolicy::AnyOf(vec![1, 2]); Counter);
/// ```
#[macro_export]
macro_rules! export_interfaces {
    (policy = $policy:expr; $($iface:ty),+ $(,)?) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn hostlink_module_exports(
            version_checksum: u64,
        ) -> *const $crate::ExportTable {
            let policy: $crate::VersionPolicy = $policy;
            match $crate::registry::module_exports::<($($iface,)+)>(&policy, version_checksum) {
                Some(table) => table as *const $crate::ExportTable,
                None => ::std::ptr::null(),
            }
        }
    };
    ($($iface:ty),+ $(,)?) => {
        $crate::export_interfaces!(policy = $crate::VersionPolicy::default(); $($iface),+);
    };
}
