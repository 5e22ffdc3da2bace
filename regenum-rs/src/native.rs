//! Windows backend: [`RegistryAccess`] over the raw registry API.
//!
//! Thin and mechanical by design; every status code passes through
//! untranslated so the caller can report it in hex.

use std::mem;
use std::ptr;

use chrono::{NaiveDate, NaiveDateTime};
use windows_sys::Win32::Foundation::{
    GetLastError, ERROR_INVALID_PARAMETER, ERROR_NO_MORE_ITEMS, ERROR_SUCCESS, FILETIME,
    SYSTEMTIME,
};
use windows_sys::Win32::System::Registry::{
    RegCloseKey, RegConnectRegistryW, RegEnumKeyExW, RegEnumValueW, RegOpenKeyExW,
    RegQueryInfoKeyW, HKEY, HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER,
    HKEY_LOCAL_MACHINE, HKEY_USERS, KEY_READ,
};
use windows_sys::Win32::System::Time::{FileTimeToSystemTime, SystemTimeToTzSpecificLocalTime};

use crate::path::RootKey;
use crate::registry::{FileTime, KeyMetadata, NativeCode, RegistryAccess};

/// An `HKEY` plus whether it is a predefined root. Predefined roots are
/// process-global pseudo-handles and are never passed to `RegCloseKey`.
pub struct NativeKey {
    hkey: HKEY,
    predefined: bool,
}

fn predefined(root: RootKey) -> HKEY {
    match root {
        RootKey::LocalMachine => HKEY_LOCAL_MACHINE,
        RootKey::CurrentUser => HKEY_CURRENT_USER,
        RootKey::ClassesRoot => HKEY_CLASSES_ROOT,
        RootKey::Users => HKEY_USERS,
        RootKey::CurrentConfig => HKEY_CURRENT_CONFIG,
    }
}

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn filetime_u64(ft: &FILETIME) -> u64 {
    ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64
}

pub struct WindowsRegistry;

impl RegistryAccess for WindowsRegistry {
    type Handle = NativeKey;

    fn root_handle(&self, root: RootKey) -> NativeKey {
        NativeKey {
            hkey: predefined(root),
            predefined: true,
        }
    }

    fn connect_remote(&self, machine: &str, root: RootKey) -> Result<NativeKey, NativeCode> {
        // RegConnectRegistryW wants the UNC form.
        let name = wide(&format!(r"\\{machine}"));
        let mut hkey: HKEY = ptr::null_mut();
        let status =
            unsafe { RegConnectRegistryW(name.as_ptr(), predefined(root), &mut hkey) };
        if status == ERROR_SUCCESS {
            Ok(NativeKey {
                hkey,
                predefined: false,
            })
        } else {
            Err(status)
        }
    }

    fn open_subkey(&self, base: &NativeKey, path: &str) -> Result<NativeKey, NativeCode> {
        let path = wide(path);
        let mut hkey: HKEY = ptr::null_mut();
        let status =
            unsafe { RegOpenKeyExW(base.hkey, path.as_ptr(), 0, KEY_READ, &mut hkey) };
        if status == ERROR_SUCCESS {
            Ok(NativeKey {
                hkey,
                predefined: false,
            })
        } else {
            Err(status)
        }
    }

    fn query_key_metadata(&self, key: &NativeKey) -> Result<KeyMetadata, NativeCode> {
        let mut meta = KeyMetadata::default();
        let status = unsafe {
            RegQueryInfoKeyW(
                key.hkey,
                ptr::null_mut(), // class
                ptr::null_mut(),
                ptr::null_mut(), // reserved
                &mut meta.subkey_count,
                &mut meta.max_subkey_len,
                ptr::null_mut(), // max class len
                &mut meta.value_count,
                &mut meta.max_value_name_len,
                &mut meta.max_value_data_len,
                ptr::null_mut(), // security descriptor
                ptr::null_mut(), // last write time
            )
        };
        if status == ERROR_SUCCESS {
            Ok(meta)
        } else {
            Err(status)
        }
    }

    fn enum_subkey(
        &self,
        key: &NativeKey,
        index: u32,
        name_buf: &mut [u16],
    ) -> Result<Option<(String, FileTime)>, NativeCode> {
        let mut cch = name_buf.len() as u32;
        let mut written = FILETIME {
            dwLowDateTime: 0,
            dwHighDateTime: 0,
        };
        let status = unsafe {
            RegEnumKeyExW(
                key.hkey,
                index,
                name_buf.as_mut_ptr(),
                &mut cch,
                ptr::null_mut(),
                ptr::null_mut(), // class
                ptr::null_mut(),
                &mut written,
            )
        };
        match status {
            ERROR_SUCCESS => Ok(Some((
                String::from_utf16_lossy(&name_buf[..cch as usize]),
                FileTime(filetime_u64(&written)),
            ))),
            ERROR_NO_MORE_ITEMS => Ok(None),
            // ERROR_MORE_DATA included: the buffer was sized from the
            // metadata query, so an overrun is an anomaly to report.
            other => Err(other),
        }
    }

    fn enum_value(
        &self,
        key: &NativeKey,
        index: u32,
        name_buf: &mut [u16],
    ) -> Result<Option<String>, NativeCode> {
        let mut cch = name_buf.len() as u32;
        let status = unsafe {
            RegEnumValueW(
                key.hkey,
                index,
                name_buf.as_mut_ptr(),
                &mut cch,
                ptr::null_mut(),
                ptr::null_mut(), // type, not read
                ptr::null_mut(), // data, not read
                ptr::null_mut(),
            )
        };
        match status {
            ERROR_SUCCESS => Ok(Some(String::from_utf16_lossy(&name_buf[..cch as usize]))),
            ERROR_NO_MORE_ITEMS => Ok(None),
            other => Err(other),
        }
    }

    fn utc_to_local(&self, time: FileTime) -> Result<NaiveDateTime, NativeCode> {
        let ft = FILETIME {
            dwLowDateTime: time.0 as u32,
            dwHighDateTime: (time.0 >> 32) as u32,
        };
        let mut utc: SYSTEMTIME = unsafe { mem::zeroed() };
        if unsafe { FileTimeToSystemTime(&ft, &mut utc) } == 0 {
            return Err(unsafe { GetLastError() });
        }
        let mut local: SYSTEMTIME = unsafe { mem::zeroed() };
        if unsafe { SystemTimeToTzSpecificLocalTime(ptr::null(), &utc, &mut local) } == 0 {
            return Err(unsafe { GetLastError() });
        }
        NaiveDate::from_ymd_opt(local.wYear as i32, local.wMonth as u32, local.wDay as u32)
            .and_then(|d| {
                d.and_hms_opt(local.wHour as u32, local.wMinute as u32, local.wSecond as u32)
            })
            .ok_or(ERROR_INVALID_PARAMETER)
    }

    fn close(&self, key: NativeKey) {
        if !key.predefined {
            unsafe {
                RegCloseKey(key.hkey);
            }
        }
    }
}
