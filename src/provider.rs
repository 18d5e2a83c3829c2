//! Interface descriptor providers
//!
//! Every exportable interface type implements [`InterfaceInfo`]. The
//! implementation is normally generated from the interface's WIT definition;
//! it supplies the interface metadata and hands each member method, with its
//! own metadata, to a [`MemberVisitor`].
//!
//! # Example
//!
//! ```ignore
//! impl InterfaceInfo for Counter {
//!     const MEMBER_FUNCTION_COUNT: usize = 1;
//!
//!     fn interface_name() -> String {
//!         "counter:demo/counter".to_string()
//!     }
//!     fn interface_id() -> u64 { 0x11 }
//!     fn interface_checksum() -> u64 { 0xc0ffee }
//!
//!     fn visit_member_functions(visitor: &mut MemberVisitor<'_, Self>) {
//!         visitor.member(
//!             Counter::increment,
//!             MemberInfo::new("Counter::increment", "increment", 0x1101, 0xbeef),
//!         );
//!     }
//! }
//! ```

use crate::abi::ReturnValue;
use crate::descriptor::ExportedFunction;
use crate::runtime::{synthesize, HostMethod};
use std::any::Any;
use std::marker::PhantomData;

/// Metadata the descriptor generator records for one member function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberInfo {
    pub native_name: &'static str,
    pub abi_name: &'static str,
    pub id: u64,
    pub checksum: u64,
}

impl MemberInfo {
    pub const fn new(
        native_name: &'static str,
        abi_name: &'static str,
        id: u64,
        checksum: u64,
    ) -> Self {
        Self {
            native_name,
            abi_name,
            id,
            checksum,
        }
    }
}

/// Descriptor provider for an exportable interface type.
pub trait InterfaceInfo: Any + Send + Sized {
    /// Exact number of members `visit_member_functions` yields.
    const MEMBER_FUNCTION_COUNT: usize;

    /// Fully qualified ABI name, e.g. `counter:demo/counter`.
    fn interface_name() -> String;

    fn interface_id() -> u64;

    fn interface_checksum() -> u64;

    /// Pass every member method to `visitor`, in declaration order.
    fn visit_member_functions(visitor: &mut MemberVisitor<'_, Self>);
}

/// Collects member methods of `T` as fully bound function descriptors.
pub struct MemberVisitor<'a, T> {
    functions: &'a mut Vec<ExportedFunction>,
    _marker: PhantomData<fn(&mut T)>,
}

impl<'a, T: Any> MemberVisitor<'a, T> {
    pub(crate) fn new(functions: &'a mut Vec<ExportedFunction>) -> Self {
        Self {
            functions,
            _marker: PhantomData,
        }
    }

    /// Bind `method` and record it under `info`.
    pub fn member<Args, Ret, M>(&mut self, method: M, info: MemberInfo) -> &mut Self
    where
        Args: 'static,
        Ret: ReturnValue,
        M: HostMethod<T, Args, Ret>,
    {
        let signature = M::signature();
        let callback = synthesize(method);
        self.functions.push(ExportedFunction {
            name: info.abi_name.to_string(),
            native_name: info.native_name.to_string(),
            id: info.id,
            checksum: info.checksum,
            signature,
            callback,
        });
        self
    }
}
