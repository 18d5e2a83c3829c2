//! Export metadata
//!
//! ## Native type fingerprints
//!
//! Two interfaces can share an ABI name while being backed by different native
//! types (two builds of one module, or a renamed type). The fingerprint is the
//! first 8 bytes (little endian) of the SHA-256 of the Rust type name.
//!
//! ## Manifests
//!
//! An [`ExportManifest`] is the serializable view of an export table: every
//! name, id, checksum and signature, without the callbacks. Loaders use it to
//! log or diff the ABI surface a module offers. Checksums are carried through
//! unchanged; nothing here computes or validates them.

use crate::abi::ScalarKind;
use crate::descriptor::{ExportTable, ExportedFunction, ExportedInterface};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Fingerprint of the native type `T`.
pub fn native_type_fingerprint<T: ?Sized>() -> u64 {
    let digest = Sha256::digest(std::any::type_name::<T>().as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

// ============================================================================
// Manifest
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionManifest {
    pub name: String,
    pub native_name: String,
    pub id: u64,
    pub checksum: u64,
    pub params: Vec<ScalarKind>,
    pub result: Option<ScalarKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceManifest {
    pub name: String,
    pub id: u64,
    pub checksum: u64,
    pub native_type_fingerprint: u64,
    pub functions: Vec<FunctionManifest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub abi_version: u64,
    pub interfaces: Vec<InterfaceManifest>,
}

impl From<&ExportedFunction> for FunctionManifest {
    fn from(f: &ExportedFunction) -> Self {
        Self {
            name: f.name().to_string(),
            native_name: f.native_name().to_string(),
            id: f.id(),
            checksum: f.checksum(),
            params: f.signature().params.clone(),
            result: f.signature().result,
        }
    }
}

impl From<&ExportedInterface> for InterfaceManifest {
    fn from(i: &ExportedInterface) -> Self {
        Self {
            name: i.name().to_string(),
            id: i.id(),
            checksum: i.checksum(),
            native_type_fingerprint: i.native_type_fingerprint(),
            functions: i.functions().iter().map(FunctionManifest::from).collect(),
        }
    }
}

impl ExportTable {
    /// Serializable snapshot of this table.
    pub fn manifest(&self) -> ExportManifest {
        ExportManifest {
            abi_version: crate::registry::LINKER_ABI_VERSION,
            interfaces: self.interfaces().iter().map(InterfaceManifest::from).collect(),
        }
    }
}

impl ExportManifest {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Counter, Greeter};

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(
            native_type_fingerprint::<Counter>(),
            native_type_fingerprint::<Counter>()
        );
        assert_ne!(
            native_type_fingerprint::<Counter>(),
            native_type_fingerprint::<Greeter>()
        );
    }

    #[test]
    fn test_manifest_mirrors_table() {
        let table = ExportTable::build::<(Counter, Greeter)>().unwrap();
        let manifest = table.manifest();

        assert_eq!(manifest.interfaces.len(), 2);
        let counter = &manifest.interfaces[0];
        assert_eq!(counter.name, "counter:demo/counter");
        assert_eq!(counter.checksum, Counter::CHECKSUM);
        assert_eq!(
            counter.native_type_fingerprint,
            native_type_fingerprint::<Counter>()
        );
        assert_eq!(counter.functions[0].name, "increment");
        assert_eq!(counter.functions[0].params, vec![ScalarKind::S32]);
    }

    #[test]
    fn test_manifest_json() {
        let table = ExportTable::build::<(Counter,)>().unwrap();
        let manifest = table.manifest();
        let json = manifest.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["interfaces"][0]["functions"][0]["params"][0], "s32");
        assert_eq!(value["interfaces"][0]["functions"][2]["result"], serde_json::Value::Null);

        assert_eq!(ExportManifest::from_json(&json).unwrap(), manifest);
    }
}
