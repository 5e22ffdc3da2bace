//! Capability interface over the registry subsystem.
//!
//! The walker only ever talks to this trait, so enumeration logic can be
//! exercised against a fake backend. The real backend lives in
//! [`crate::native`] and is Windows-only.

use chrono::NaiveDateTime;

use crate::path::RootKey;

/// Raw native status code (LSTATUS / GetLastError), rendered in hex in
/// diagnostics.
pub type NativeCode = u32;

/// A FILETIME as a single integer: 100 ns intervals since
/// 1601-01-01 00:00:00 UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileTime(pub u64);

/// One-shot sizing information for an opened key, queried before
/// enumeration so name buffers can be allocated once up front.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyMetadata {
    pub subkey_count: u32,
    /// Longest subkey name, in characters, excluding the terminator.
    pub max_subkey_len: u32,
    pub value_count: u32,
    /// Longest value name, in characters, excluding the terminator.
    pub max_value_name_len: u32,
    pub max_value_data_len: u32,
}

/// Read-only registry access. Value data, security descriptors and key
/// classes are never touched.
pub trait RegistryAccess {
    type Handle;

    /// Handle for a predefined local root. Infallible; predefined roots
    /// need no open call.
    fn root_handle(&self, root: RootKey) -> Self::Handle;

    /// Establish a remote registry session to `machine`, scoped to `root`.
    fn connect_remote(&self, machine: &str, root: RootKey) -> Result<Self::Handle, NativeCode>;

    /// Open `path` read-only under `base`. The empty path is passed
    /// through verbatim.
    fn open_subkey(&self, base: &Self::Handle, path: &str) -> Result<Self::Handle, NativeCode>;

    fn query_key_metadata(&self, key: &Self::Handle) -> Result<KeyMetadata, NativeCode>;

    /// Child key at `index`, or `None` past the end. `name_buf` is the
    /// caller-owned wide-char scratch buffer, sized from
    /// [`KeyMetadata::max_subkey_len`]; a buffer-too-small status is an
    /// error here, not a retry signal.
    fn enum_subkey(
        &self,
        key: &Self::Handle,
        index: u32,
        name_buf: &mut [u16],
    ) -> Result<Option<(String, FileTime)>, NativeCode>;

    /// Value name at `index`, or `None` past the end. Data and type are
    /// not read.
    fn enum_value(
        &self,
        key: &Self::Handle,
        index: u32,
        name_buf: &mut [u16],
    ) -> Result<Option<String>, NativeCode>;

    /// Convert a UTC last-write time to the caller's local wall time.
    fn utc_to_local(&self, time: FileTime) -> Result<NaiveDateTime, NativeCode>;

    fn close(&self, key: Self::Handle);
}
