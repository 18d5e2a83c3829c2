//! Wiring an export table into a wasmtime component linker

use crate::descriptor::ExportTable;
use crate::runtime::host::HostView;
use thiserror::Error;
use wasmtime::component::{Linker, Val};
use wasmtime::StoreContextMut;

/// Errors from linker operations
#[derive(Error, Debug)]
pub enum LinkerError {
    #[error("Interface registration failed for '{interface}': {message}")]
    InterfaceRegistration { interface: String, message: String },

    #[error("Function registration failed for '{interface}#{function}': {message}")]
    FunctionRegistration {
        interface: String,
        function: String,
        message: String,
    },
}

/// Define every function of every interface in `table` on `linker`.
///
/// Each interface becomes a linker instance named after its ABI name and each
/// function a dynamically typed host function under its ABI name. Calls run
/// inside a `host_call` tracing span carrying both names.
///
/// # Example
///
/// ```ignore
/// let table = hostlink::export_table::<(Counter,)>()?;
/// let mut linker = Linker::<HostContext>::new(&engine);
/// define_exports(&mut linker, table)?;
/// let instance = linker.instantiate(&mut store, &component)?;
/// ```
pub fn define_exports<T: HostView + 'static>(
    linker: &mut Linker<T>,
    table: &ExportTable,
) -> Result<(), LinkerError> {
    for interface in table.interfaces() {
        let mut instance =
            linker
                .instance(interface.name())
                .map_err(|e| LinkerError::InterfaceRegistration {
                    interface: interface.name().to_string(),
                    message: e.to_string(),
                })?;

        for function in interface.functions() {
            let interface_name = interface.name().to_string();
            let function_name = function.name().to_string();
            let signature = function.signature().clone();
            let callback = function.callback().clone();

            tracing::debug!(
                interface = %interface_name,
                function = %function_name,
                %signature,
                "defining host function"
            );

            instance
                .func_new(
                    function.name(),
                    move |mut store: StoreContextMut<'_, T>,
                          params: &[Val],
                          results: &mut [Val]| {
                        let _span = tracing::debug_span!(
                            "host_call",
                            interface = %interface_name,
                            function = %function_name
                        )
                        .entered();
                        // Absorbed calls leave `results` alone; the guest
                        // still needs a well-typed value to lower.
                        if let (Some(kind), Some(slot)) = (signature.result, results.first_mut())
                        {
                            *slot = kind.zero();
                        }
                        callback(store.data_mut().host_context(), &signature, params, results)
                    },
                )
                .map_err(|e| LinkerError::FunctionRegistration {
                    interface: interface.name().to_string(),
                    function: function.name().to_string(),
                    message: e.to_string(),
                })?;
        }
    }
    Ok(())
}
