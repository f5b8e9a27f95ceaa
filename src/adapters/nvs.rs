//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`StoragePort`] on the ESP-IDF NVS partition. Every
//! setter is one open / operate / commit / close cycle, so each record
//! write is atomic with respect to power loss — the property the
//! configuration engine's persist-first discipline relies on.
//!
//! The host backend is an in-memory typed map with the same namespace
//! semantics, used by simulation builds.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::StoragePort;
use crate::error::StorageError;

#[cfg(not(target_os = "espidf"))]
use std::cell::RefCell;
#[cfg(not(target_os = "espidf"))]
use std::collections::BTreeMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Typed entry for the simulation backend (NVS itself is typed: a key
/// written as one type reads back only as that type).
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Clone, PartialEq)]
enum Value {
    I32(i32),
    Str(String),
}

pub struct NvsStore {
    #[cfg(not(target_os = "espidf"))]
    store: RefCell<BTreeMap<String, Value>>,
}

impl NvsStore {
    /// Initialise NVS flash. On first boot or after a partition-format
    /// version bump the partition is erased and re-initialised, like
    /// the stock ESP-IDF bring-up sequence.
    #[cfg(target_os = "espidf")]
    pub fn new() -> Result<Self, StorageError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase run from the single
        // main-task context before any concurrent NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK {
                return Err(StorageError::Io);
            }
            if unsafe { nvs_flash_init() } != ESP_OK {
                return Err(StorageError::Io);
            }
        } else if ret != ESP_OK {
            return Err(StorageError::Io);
        }
        info!("NvsStore: flash initialised");
        Ok(Self {})
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Result<Self, StorageError> {
        info!("NvsStore: simulation backend");
        Ok(Self {
            store: RefCell::new(BTreeMap::new()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(ns: &str, key: &str) -> String {
        format!("{ns}::{key}")
    }

    /// NVS limits names to 15 bytes + NUL; clip and terminate.
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open a namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_handle<F, T>(ns: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(ns);
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let mut handle: nvs_handle_t = 0;
        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    #[cfg(target_os = "espidf")]
    fn commit_and_close_ok(handle: nvs_handle_t) -> Result<(), i32> {
        let ret = unsafe { nvs_commit(handle) };
        if ret == ESP_OK { Ok(()) } else { Err(ret) }
    }
}

impl StoragePort for NvsStore {
    fn get_i32(&self, ns: &str, key: &str) -> Option<i32> {
        #[cfg(not(target_os = "espidf"))]
        {
            match self.store.borrow().get(&Self::composite_key(ns, key)) {
                Some(Value::I32(v)) => Some(*v),
                _ => None,
            }
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_handle(ns, false, |handle| {
                let key_buf = Self::c_name(key);
                let mut value: i32 = 0;
                let ret = unsafe { nvs_get_i32(handle, key_buf.as_ptr() as *const _, &mut value) };
                if ret == ESP_OK { Ok(value) } else { Err(ret) }
            })
            .ok()
        }
    }

    fn set_i32(&mut self, ns: &str, key: &str, value: i32) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(ns, key), Value::I32(value));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_handle(ns, true, |handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe { nvs_set_i32(handle, key_buf.as_ptr() as *const _, value) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Self::commit_and_close_ok(handle)
            })
            .map_err(|e| {
                warn!("NVS: set_i32 {ns}/{key} failed ({e})");
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::Io
                }
            })
        }
    }

    fn get_str(&self, ns: &str, key: &str) -> Option<String> {
        #[cfg(not(target_os = "espidf"))]
        {
            match self.store.borrow().get(&Self::composite_key(ns, key)) {
                Some(Value::Str(v)) => Some(v.clone()),
                _ => None,
            }
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_handle(ns, false, |handle| {
                let key_buf = Self::c_name(key);

                // First call reports the length (incl. terminating NUL).
                let mut len: usize = 0;
                let ret = unsafe {
                    nvs_get_str(
                        handle,
                        key_buf.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut len,
                    )
                };
                if ret != ESP_OK || len == 0 {
                    return Err(ret);
                }

                let mut buf = vec![0u8; len];
                let ret = unsafe {
                    nvs_get_str(
                        handle,
                        key_buf.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut len,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                buf.truncate(len.saturating_sub(1)); // drop the NUL
                String::from_utf8(buf).map_err(|_| ESP_FAIL)
            })
            .ok()
        }
    }

    fn set_str(&mut self, ns: &str, key: &str, value: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store
                .borrow_mut()
                .insert(Self::composite_key(ns, key), Value::Str(value.to_owned()));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let mut c_value = Vec::with_capacity(value.len() + 1);
            c_value.extend_from_slice(value.as_bytes());
            c_value.push(0);

            Self::with_handle(ns, true, |handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe {
                    nvs_set_str(
                        handle,
                        key_buf.as_ptr() as *const _,
                        c_value.as_ptr() as *const _,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Self::commit_and_close_ok(handle)
            })
            .map_err(|e| {
                warn!("NVS: set_str {ns}/{key} failed ({e})");
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::Io
                }
            })
        }
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            self.store.borrow_mut().remove(&Self::composite_key(ns, key));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_handle(ns, true, |handle| {
                let key_buf = Self::c_name(key);
                let ret = unsafe { nvs_erase_key(handle, key_buf.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                Self::commit_and_close_ok(handle)
            })
            .map_err(|_| StorageError::Io)
        }
    }

    fn clear(&mut self, ns: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let prefix = format!("{ns}::");
            self.store
                .borrow_mut()
                .retain(|k, _| !k.starts_with(&prefix));
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            Self::with_handle(ns, true, |handle| {
                let ret = unsafe { nvs_erase_all(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Self::commit_and_close_ok(handle)
            })
            .map_err(|_| StorageError::Io)
        }
    }

    fn keys(&self, ns: &str) -> Vec<String> {
        #[cfg(not(target_os = "espidf"))]
        {
            let prefix = format!("{ns}::");
            self.store
                .borrow()
                .keys()
                .filter_map(|k| k.strip_prefix(&prefix))
                .map(str::to_owned)
                .collect()
        }

        #[cfg(target_os = "espidf")]
        {
            let ns_buf = Self::c_name(ns);
            let mut keys = Vec::new();

            // SAFETY: iterator is released on every exit path; entry
            // info structs are plain data copied out immediately.
            unsafe {
                let mut it: nvs_iterator_t = core::ptr::null_mut();
                let mut ret = nvs_entry_find(
                    c"nvs".as_ptr(),
                    ns_buf.as_ptr() as *const _,
                    nvs_type_t_NVS_TYPE_ANY,
                    &mut it,
                );
                while ret == ESP_OK {
                    let mut entry = nvs_entry_info_t::default();
                    nvs_entry_info(it, &mut entry);
                    let key = core::ffi::CStr::from_ptr(entry.key.as_ptr());
                    if let Ok(key) = key.to_str() {
                        keys.push(key.to_owned());
                    }
                    ret = nvs_entry_next(&mut it);
                }
                nvs_release_iterator(it);
            }
            keys
        }
    }
}
