use parity_scale_codec::{Decode, Encode};

use crate::error::ScaleError;


pub const METADATA_MAGIC: u32 = 0x6174_656d;


/// Runtime metadata as returned by `state_getMetadata`, magic included.
#[derive(Debug, Clone, Encode, Decode)]
pub struct RuntimeMetadataPrefixed {
    pub magic: u32,
    pub metadata: RuntimeMetadata,
}


#[derive(Debug, Clone, Encode, Decode)]
pub enum RuntimeMetadata {
    #[codec(index = 11)]
    V11(MetadataV11),
    #[codec(index = 12)]
    V12(MetadataV12),
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct MetadataV11 {
    pub modules: Vec<ModuleMetadataV11>,
    pub extrinsic: ExtrinsicMetadata,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct MetadataV12 {
    pub modules: Vec<ModuleMetadataV12>,
    pub extrinsic: ExtrinsicMetadata,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct ModuleMetadataV11 {
    pub name: String,
    pub storage: Option<StorageMetadata>,
    pub calls: Option<Vec<FunctionMetadata>>,
    pub event: Option<Vec<EventMetadata>>,
    pub constants: Vec<ModuleConstantMetadata>,
    pub errors: Vec<ErrorMetadata>,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct ModuleMetadataV12 {
    pub name: String,
    pub storage: Option<StorageMetadata>,
    pub calls: Option<Vec<FunctionMetadata>>,
    pub event: Option<Vec<EventMetadata>>,
    pub constants: Vec<ModuleConstantMetadata>,
    pub errors: Vec<ErrorMetadata>,
    pub index: u8,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct ExtrinsicMetadata {
    pub version: u8,
    pub signed_extensions: Vec<String>,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct StorageMetadata {
    pub prefix: String,
    pub entries: Vec<StorageEntryMetadata>,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct StorageEntryMetadata {
    pub name: String,
    pub modifier: StorageEntryModifier,
    pub ty: StorageEntryType,
    pub default: Vec<u8>,
    pub documentation: Vec<String>,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum StorageEntryModifier {
    Optional,
    Default,
}


#[derive(Debug, Clone, Encode, Decode)]
pub enum StorageEntryType {
    Plain(String),
    Map {
        hasher: StorageHasher,
        key: String,
        value: String,
        unused: bool,
    },
    DoubleMap {
        hasher: StorageHasher,
        key1: String,
        key2: String,
        value: String,
        key2_hasher: StorageHasher,
    },
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum StorageHasher {
    Blake2_128,
    Blake2_256,
    Blake2_128Concat,
    Twox128,
    Twox256,
    Twox64Concat,
    Identity,
}


impl StorageHasher {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageHasher::Blake2_128 => "Blake2_128",
            StorageHasher::Blake2_256 => "Blake2_256",
            StorageHasher::Blake2_128Concat => "Blake2_128Concat",
            StorageHasher::Twox128 => "Twox128",
            StorageHasher::Twox256 => "Twox256",
            StorageHasher::Twox64Concat => "Twox64Concat",
            StorageHasher::Identity => "Identity",
        }
    }
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct FunctionMetadata {
    pub name: String,
    pub arguments: Vec<FunctionArgumentMetadata>,
    pub documentation: Vec<String>,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct FunctionArgumentMetadata {
    pub name: String,
    pub ty: String,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct EventMetadata {
    pub name: String,
    pub arguments: Vec<String>,
    pub documentation: Vec<String>,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct ModuleConstantMetadata {
    pub name: String,
    pub ty: String,
    pub value: Vec<u8>,
    pub documentation: Vec<String>,
}


#[derive(Debug, Clone, Encode, Decode)]
pub struct ErrorMetadata {
    pub name: String,
    pub documentation: Vec<String>,
}


impl RuntimeMetadataPrefixed {
    /// Decodes the raw response of `state_getMetadata`.
    ///
    /// The version byte is inspected up front so that an unsupported
    /// metadata format is reported as such rather than as a generic
    /// decode failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ScaleError> {
        if bytes.len() < 5 {
            return Err(ScaleError::UnexpectedEof(bytes.len()));
        }
        let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != METADATA_MAGIC {
            return Err(ScaleError::invalid(format!(
                "bad metadata magic 0x{magic:08x}"
            )));
        }
        let version = bytes[4];
        if !matches!(version, 11 | 12) {
            return Err(ScaleError::UnsupportedMetadata(version));
        }
        let mut input = &bytes[..];
        Self::decode(&mut input)
            .map_err(|e| ScaleError::invalid(format!("metadata v{version}: {e}")))
    }
}


impl RuntimeMetadata {
    pub fn version(&self) -> u8 {
        match self {
            RuntimeMetadata::V11(_) => 11,
            RuntimeMetadata::V12(_) => 12,
        }
    }
}


/// Version independent view of a runtime's dispatchable surface.
///
/// Call and event lookup indexes differ between formats: before v12 the
/// module position counts only modules that actually have calls (resp.
/// events), from v12 on every module carries an explicit index used for
/// both. Normalization resolves that here so decoding never has to care.
#[derive(Debug, Clone)]
pub struct SpecMetadata {
    pub version: u8,
    pub modules: Vec<ModuleInfo>,
}


#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub id: String,
    pub name: String,
    pub prefix: String,
    pub call_module_index: Option<u8>,
    pub event_module_index: Option<u8>,
    pub storage: Vec<StorageInfo>,
    pub calls: Vec<CallInfo>,
    pub events: Vec<EventInfo>,
    pub constants: Vec<ConstantInfo>,
    pub errors: Vec<String>,
}


#[derive(Debug, Clone)]
pub struct CallInfo {
    pub index: u8,
    pub lookup: String,
    pub name: String,
    pub args: Vec<CallArg>,
    pub docs: String,
}


#[derive(Debug, Clone)]
pub struct CallArg {
    pub name: String,
    pub ty: String,
}


#[derive(Debug, Clone)]
pub struct EventInfo {
    pub index: u8,
    pub lookup: String,
    pub name: String,
    pub args: Vec<String>,
    pub docs: String,
}


#[derive(Debug, Clone)]
pub struct StorageInfo {
    pub name: String,
    pub modifier: &'static str,
    pub ty: StorageEntryType,
    pub default: Vec<u8>,
    pub docs: String,
}


impl StorageInfo {
    /// Value type of the entry.
    pub fn value_type(&self) -> &str {
        match &self.ty {
            StorageEntryType::Plain(ty) => ty,
            StorageEntryType::Map { value, .. } => value,
            StorageEntryType::DoubleMap { value, .. } => value,
        }
    }

    /// Hasher for the first key, `None` for plain entries.
    pub fn key_hasher(&self) -> Option<&'static str> {
        match &self.ty {
            StorageEntryType::Plain(_) => None,
            StorageEntryType::Map { hasher, .. } => Some(hasher.as_str()),
            StorageEntryType::DoubleMap { hasher, .. } => Some(hasher.as_str()),
        }
    }

    pub fn key_types(&self) -> (Option<&str>, Option<&str>) {
        match &self.ty {
            StorageEntryType::Plain(_) => (None, None),
            StorageEntryType::Map { key, .. } => (Some(key), None),
            StorageEntryType::DoubleMap { key1, key2, .. } => (Some(key1), Some(key2)),
        }
    }

    /// Linked-map marker, carried by map entries on older runtimes.
    pub fn is_linked(&self) -> bool {
        matches!(&self.ty, StorageEntryType::Map { unused: true, .. })
    }
}


#[derive(Debug, Clone)]
pub struct ConstantInfo {
    pub name: String,
    pub ty: String,
    pub value: Vec<u8>,
    pub docs: String,
}


impl SpecMetadata {
    pub fn module(&self, id: &str) -> Option<&ModuleInfo> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn call_by_index(&self, module_index: u8, call_index: u8) -> Option<(&ModuleInfo, &CallInfo)> {
        let module = self
            .modules
            .iter()
            .find(|m| m.call_module_index == Some(module_index))?;
        let call = module.calls.iter().find(|c| c.index == call_index)?;
        Some((module, call))
    }

    pub fn event_by_index(
        &self,
        module_index: u8,
        event_index: u8,
    ) -> Option<(&ModuleInfo, &EventInfo)> {
        let module = self
            .modules
            .iter()
            .find(|m| m.event_module_index == Some(module_index))?;
        let event = module.events.iter().find(|e| e.index == event_index)?;
        Some((module, event))
    }

    pub fn storage_entry(&self, module_id: &str, name: &str) -> Option<(&ModuleInfo, &StorageInfo)> {
        let module = self.module(module_id)?;
        let entry = module.storage.iter().find(|s| s.name == name)?;
        Some((module, entry))
    }

    pub fn count_calls(&self) -> u32 {
        self.modules.iter().map(|m| m.calls.len() as u32).sum()
    }

    pub fn count_events(&self) -> u32 {
        self.modules.iter().map(|m| m.events.len() as u32).sum()
    }

    pub fn count_storage_entries(&self) -> u32 {
        self.modules.iter().map(|m| m.storage.len() as u32).sum()
    }

    pub fn count_constants(&self) -> u32 {
        self.modules.iter().map(|m| m.constants.len() as u32).sum()
    }
}


impl RuntimeMetadata {
    pub fn normalize(&self) -> SpecMetadata {
        match self {
            RuntimeMetadata::V11(meta) => {
                let mut call_position = 0u8;
                let mut event_position = 0u8;
                let modules = meta
                    .modules
                    .iter()
                    .map(|module| {
                        let call_module_index = module.calls.as_ref().map(|_| {
                            let idx = call_position;
                            call_position += 1;
                            idx
                        });
                        let event_module_index = module.event.as_ref().map(|_| {
                            let idx = event_position;
                            event_position += 1;
                            idx
                        });
                        normalize_module(
                            &module.name,
                            module.storage.as_ref(),
                            module.calls.as_deref(),
                            module.event.as_deref(),
                            &module.constants,
                            &module.errors,
                            call_module_index,
                            event_module_index,
                        )
                    })
                    .collect();
                SpecMetadata {
                    version: 11,
                    modules,
                }
            }
            RuntimeMetadata::V12(meta) => {
                let modules = meta
                    .modules
                    .iter()
                    .map(|module| {
                        normalize_module(
                            &module.name,
                            module.storage.as_ref(),
                            module.calls.as_deref(),
                            module.event.as_deref(),
                            &module.constants,
                            &module.errors,
                            module.calls.as_ref().map(|_| module.index),
                            module.event.as_ref().map(|_| module.index),
                        )
                    })
                    .collect();
                SpecMetadata {
                    version: 12,
                    modules,
                }
            }
        }
    }
}


#[allow(clippy::too_many_arguments)]
fn normalize_module(
    name: &str,
    storage: Option<&StorageMetadata>,
    calls: Option<&[FunctionMetadata]>,
    events: Option<&[EventMetadata]>,
    constants: &[ModuleConstantMetadata],
    errors: &[ErrorMetadata],
    call_module_index: Option<u8>,
    event_module_index: Option<u8>,
) -> ModuleInfo {
    let prefix = storage
        .map(|s| s.prefix.clone())
        .unwrap_or_else(|| name.to_string());
    let calls = calls
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .map(|(idx, call)| CallInfo {
            index: idx as u8,
            lookup: lookup_hex(call_module_index, idx as u8),
            name: call.name.clone(),
            args: call
                .arguments
                .iter()
                .map(|arg| CallArg {
                    name: arg.name.clone(),
                    ty: arg.ty.clone(),
                })
                .collect(),
            docs: call.documentation.join("\n"),
        })
        .collect();
    let events = events
        .unwrap_or(&[])
        .iter()
        .enumerate()
        .map(|(idx, event)| EventInfo {
            index: idx as u8,
            lookup: lookup_hex(event_module_index, idx as u8),
            name: event.name.clone(),
            args: event.arguments.clone(),
            docs: event.documentation.join("\n"),
        })
        .collect();
    let storage = storage
        .map(|s| {
            s.entries
                .iter()
                .map(|entry| StorageInfo {
                    name: entry.name.clone(),
                    modifier: match entry.modifier {
                        StorageEntryModifier::Optional => "Optional",
                        StorageEntryModifier::Default => "Default",
                    },
                    ty: entry.ty.clone(),
                    default: entry.default.clone(),
                    docs: entry.documentation.join("\n"),
                })
                .collect()
        })
        .unwrap_or_default();
    let constants = constants
        .iter()
        .map(|constant| ConstantInfo {
            name: constant.name.clone(),
            ty: constant.ty.clone(),
            value: constant.value.clone(),
            docs: constant.documentation.join("\n"),
        })
        .collect();
    ModuleInfo {
        id: module_id(name),
        name: name.to_string(),
        prefix,
        call_module_index,
        event_module_index,
        storage,
        calls,
        events,
        constants,
        errors: errors.iter().map(|e| e.name.clone()).collect(),
    }
}


/// Identifier used for persistence and processor lookup.
pub fn module_id(name: &str) -> String {
    name.to_lowercase()
}


fn lookup_hex(module_index: Option<u8>, item_index: u8) -> String {
    match module_index {
        Some(module_index) => format!("{module_index:02x}{item_index:02x}"),
        None => format!("..{item_index:02x}"),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, args: &[(&str, &str)]) -> FunctionMetadata {
        FunctionMetadata {
            name: name.to_string(),
            arguments: args
                .iter()
                .map(|(name, ty)| FunctionArgumentMetadata {
                    name: name.to_string(),
                    ty: ty.to_string(),
                })
                .collect(),
            documentation: vec![],
        }
    }

    fn event(name: &str, args: &[&str]) -> EventMetadata {
        EventMetadata {
            name: name.to_string(),
            arguments: args.iter().map(|a| a.to_string()).collect(),
            documentation: vec![],
        }
    }

    fn v11_module(
        name: &str,
        calls: Option<Vec<FunctionMetadata>>,
        events: Option<Vec<EventMetadata>>,
    ) -> ModuleMetadataV11 {
        ModuleMetadataV11 {
            name: name.to_string(),
            storage: None,
            calls,
            event: events,
            constants: vec![],
            errors: vec![],
        }
    }

    #[test]
    fn v11_dispatch_indexes_skip_inert_modules() {
        let meta = RuntimeMetadata::V11(MetadataV11 {
            modules: vec![
                v11_module("System", None, Some(vec![event("ExtrinsicSuccess", &[])])),
                v11_module("Babe", None, None),
                v11_module(
                    "Timestamp",
                    Some(vec![function("set", &[("now", "Compact<T::Moment>")])]),
                    None,
                ),
                v11_module(
                    "Balances",
                    Some(vec![
                        function("transfer", &[("dest", "T::Address"), ("value", "Compact<T::Balance>")]),
                    ]),
                    Some(vec![event("Transfer", &["AccountId", "AccountId", "Balance"])]),
                ),
            ],
            extrinsic: ExtrinsicMetadata {
                version: 4,
                signed_extensions: vec![],
            },
        });
        let spec = meta.normalize();
        assert_eq!(spec.version, 11);

        // timestamp.set is the first call-bearing module
        let (module, call) = spec.call_by_index(0, 0).unwrap();
        assert_eq!(module.id, "timestamp");
        assert_eq!(call.name, "set");
        assert_eq!(call.lookup, "0000");

        let (module, call) = spec.call_by_index(1, 0).unwrap();
        assert_eq!(module.id, "balances");
        assert_eq!(call.name, "transfer");

        // balances is the second event-bearing module even though babe sits between
        let (module, event) = spec.event_by_index(1, 0).unwrap();
        assert_eq!(module.id, "balances");
        assert_eq!(event.name, "Transfer");
        let (module, _) = spec.event_by_index(0, 0).unwrap();
        assert_eq!(module.id, "system");
    }

    #[test]
    fn v12_uses_explicit_module_indexes() {
        let meta = RuntimeMetadata::V12(MetadataV12 {
            modules: vec![ModuleMetadataV12 {
                name: "Balances".to_string(),
                storage: None,
                calls: Some(vec![function("transfer", &[("dest", "T::Address")])]),
                event: Some(vec![event("Transfer", &["AccountId", "AccountId", "Balance"])]),
                constants: vec![],
                errors: vec![],
                index: 5,
            }],
            extrinsic: ExtrinsicMetadata {
                version: 4,
                signed_extensions: vec![],
            },
        });
        let spec = meta.normalize();
        let (module, call) = spec.call_by_index(5, 0).unwrap();
        assert_eq!(module.name, "Balances");
        assert_eq!(call.lookup, "0500");
        assert!(spec.call_by_index(0, 0).is_none());
        assert!(spec.event_by_index(5, 0).is_some());
    }

    #[test]
    fn prefixed_roundtrip_through_scale() {
        let prefixed = RuntimeMetadataPrefixed {
            magic: METADATA_MAGIC,
            metadata: RuntimeMetadata::V12(MetadataV12 {
                modules: vec![],
                extrinsic: ExtrinsicMetadata {
                    version: 4,
                    signed_extensions: vec!["CheckEra".to_string()],
                },
            }),
        };
        let bytes = prefixed.encode();
        let decoded = RuntimeMetadataPrefixed::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.metadata.version(), 12);
    }

    #[test]
    fn unsupported_version_is_classified() {
        let mut bytes = METADATA_MAGIC.to_le_bytes().to_vec();
        bytes.push(14);
        let err = RuntimeMetadataPrefixed::from_bytes(&bytes).unwrap_err();
        assert_eq!(err, ScaleError::UnsupportedMetadata(14));
    }

    #[test]
    fn bad_magic_is_rejected() {
        let bytes = [0u8; 8];
        assert!(matches!(
            RuntimeMetadataPrefixed::from_bytes(&bytes),
            Err(ScaleError::Invalid(_))
        ));
    }
}
