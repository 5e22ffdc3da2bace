//! Opens the parsed key and streams its child keys and value names to a
//! sink. One invocation = open, one metadata query, two forward passes,
//! close. The handle is released on every exit path via [`OpenedKey`].

use std::fmt;
use std::io;

use thiserror::Error;
use tracing::warn;

use crate::path::ParsedPath;
use crate::registry::{KeyMetadata, NativeCode, RegistryAccess};
use crate::sink::{ChildKey, RecordSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenStage {
    Connect,
    OpenSubkey,
}

impl fmt::Display for OpenStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OpenStage::Connect => "remote registry connect",
            OpenStage::OpenSubkey => "subkey open",
        })
    }
}

#[derive(Debug, Error)]
pub enum EnumFailure {
    #[error("native status {0:#010x}")]
    Native(NativeCode),
    #[error("output write failed: {0}")]
    Output(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("{stage} failed: status {code:#010x}")]
    Open { stage: OpenStage, code: NativeCode },
    #[error("key metadata query failed: status {0:#010x}")]
    Metadata(NativeCode),
    #[error("child key enumeration failed: {0}")]
    ChildKeys(EnumFailure),
    #[error("value enumeration failed: {0}")]
    Values(EnumFailure),
}

impl WalkError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            WalkError::Open { .. } => 12,
            WalkError::Metadata(_) => 14,
            WalkError::ChildKeys(_) => 16,
            WalkError::Values(_) => 18,
        }
    }
}

/// An opened key, closed exactly once when the guard drops.
pub struct OpenedKey<'a, R: RegistryAccess> {
    api: &'a R,
    handle: Option<R::Handle>,
}

impl<'a, R: RegistryAccess> OpenedKey<'a, R> {
    fn new(api: &'a R, handle: R::Handle) -> Self {
        Self {
            api,
            handle: Some(handle),
        }
    }

    pub fn handle(&self) -> &R::Handle {
        // Only `drop` takes the handle out.
        self.handle.as_ref().expect("open key handle present")
    }
}

impl<R: RegistryAccess> Drop for OpenedKey<'_, R> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.api.close(handle);
        }
    }
}

/// Resolve a parsed path to an open read-only key.
///
/// With a machine, the remote session handle is an intermediate step: it
/// is closed as soon as the subkey handle exists (or by its own guard if
/// the subkey open fails). Without a subkey, the base handle itself is
/// the result.
pub fn open<'a, R: RegistryAccess>(
    api: &'a R,
    parsed: &ParsedPath,
) -> Result<OpenedKey<'a, R>, WalkError> {
    let base = match &parsed.machine {
        Some(machine) => {
            let handle = api
                .connect_remote(machine, parsed.root)
                .map_err(|code| WalkError::Open {
                    stage: OpenStage::Connect,
                    code,
                })?;
            OpenedKey::new(api, handle)
        }
        None => OpenedKey::new(api, api.root_handle(parsed.root)),
    };

    match &parsed.subkey {
        Some(path) => {
            let sub = api
                .open_subkey(base.handle(), path)
                .map_err(|code| WalkError::Open {
                    stage: OpenStage::OpenSubkey,
                    code,
                })?;
            Ok(OpenedKey::new(api, sub))
        }
        None => Ok(base),
    }
}

/// Lazy child-key pass. Single forward pass, no snapshot isolation:
/// concurrent mutation of the key may drop or duplicate entries per the
/// platform's enumeration contract. Fused after the first error.
pub struct ChildKeys<'a, R: RegistryAccess> {
    api: &'a R,
    key: &'a OpenedKey<'a, R>,
    index: u32,
    count: u32,
    name_buf: Vec<u16>,
    done: bool,
}

impl<R: RegistryAccess> Iterator for ChildKeys<'_, R> {
    type Item = Result<ChildKey, NativeCode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index >= self.count {
            return None;
        }
        match self
            .api
            .enum_subkey(self.key.handle(), self.index, &mut self.name_buf)
        {
            Ok(Some((name, written))) => {
                self.index += 1;
                let last_written = match self.api.utc_to_local(written) {
                    Ok(local) => Some(local),
                    Err(code) => {
                        warn!("timestamp conversion for {name:?} failed with status {code:#010x}, omitting timestamp");
                        None
                    }
                };
                Some(Ok(ChildKey { name, last_written }))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(code) => {
                self.done = true;
                Some(Err(code))
            }
        }
    }
}

pub fn child_keys<'a, R: RegistryAccess>(
    api: &'a R,
    key: &'a OpenedKey<'a, R>,
    meta: &KeyMetadata,
) -> ChildKeys<'a, R> {
    ChildKeys {
        api,
        key,
        index: 0,
        count: meta.subkey_count,
        name_buf: vec![0u16; meta.max_subkey_len as usize + 1],
        done: false,
    }
}

/// Lazy value-name pass; same single-pass caveats as [`ChildKeys`].
pub struct ValueNames<'a, R: RegistryAccess> {
    api: &'a R,
    key: &'a OpenedKey<'a, R>,
    index: u32,
    count: u32,
    name_buf: Vec<u16>,
    done: bool,
}

impl<R: RegistryAccess> Iterator for ValueNames<'_, R> {
    type Item = Result<String, NativeCode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.index >= self.count {
            return None;
        }
        match self
            .api
            .enum_value(self.key.handle(), self.index, &mut self.name_buf)
        {
            Ok(Some(name)) => {
                self.index += 1;
                Some(Ok(name))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(code) => {
                self.done = true;
                Some(Err(code))
            }
        }
    }
}

pub fn value_names<'a, R: RegistryAccess>(
    api: &'a R,
    key: &'a OpenedKey<'a, R>,
    meta: &KeyMetadata,
) -> ValueNames<'a, R> {
    ValueNames {
        api,
        key,
        index: 0,
        count: meta.value_count,
        name_buf: vec![0u16; meta.max_value_name_len as usize + 1],
        done: false,
    }
}

/// One full invocation: open, query sizing once, stream child keys then
/// value names into `sink`, close.
pub fn run<R: RegistryAccess, S: RecordSink>(
    api: &R,
    parsed: &ParsedPath,
    sink: &mut S,
) -> Result<(), WalkError> {
    let key = open(api, parsed)?;
    let meta = api
        .query_key_metadata(key.handle())
        .map_err(WalkError::Metadata)?;

    for rec in child_keys(api, &key, &meta) {
        let rec = rec.map_err(|code| WalkError::ChildKeys(EnumFailure::Native(code)))?;
        sink.child_key(&rec)
            .map_err(|e| WalkError::ChildKeys(EnumFailure::Output(e)))?;
    }
    for name in value_names(api, &key, &meta) {
        let name = name.map_err(|code| WalkError::Values(EnumFailure::Native(code)))?;
        sink.value_name(&name)
            .map_err(|e| WalkError::Values(EnumFailure::Output(e)))?;
    }
    Ok(())
}
