//! Registry key enumeration: parse a `[\\Machine\]{HKLM|HKCU|HKCR|HKU|HKCC}[\Subkey]`
//! path, open the key (locally or on a remote machine) and list its
//! immediate child keys and value names.

pub mod path;
pub mod registry;
pub mod sink;
pub mod walker;

#[cfg(windows)]
pub mod native;

pub use path::{parse, ParseError, ParsedPath, RootKey};
pub use registry::{FileTime, KeyMetadata, NativeCode, RegistryAccess};
pub use sink::{ChildKey, RecordSink, TabSeparated};
pub use walker::{run, WalkError};
