use core::ptr;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, trace};
use widestring::U16CString;
use windows_sys::Win32::{
    Foundation::{ERROR_INSUFFICIENT_BUFFER, GetLastError},
    Security::{
        DACL_SECURITY_INFORMATION, GROUP_SECURITY_INFORMATION, GetFileSecurityW,
        OBJECT_SECURITY_INFORMATION, OWNER_SECURITY_INFORMATION, SACL_SECURITY_INFORMATION,
    },
};

use crate::{SecurityDescriptor, SecurityDescriptorError};

/// Errors that can occur when fetching a file's security descriptor.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FileSecurityError {
    /// The path contains an interior NUL and cannot be handed to Win32.
    #[error("path contains an interior NUL character")]
    InvalidPath,

    /// `GetFileSecurityW` did not fail as expected when called with a zero-size buffer,
    /// so the required size could not be determined.
    ///
    /// Contains the Win32 error code returned by `GetLastError`.
    #[error("failed to determine security descriptor size (error {0})")]
    SizeQueryFailed(u32),

    /// `GetFileSecurityW` failed when retrieving the descriptor.
    ///
    /// Contains the Win32 error code returned by `GetLastError`.
    #[error("GetFileSecurityW failed (error {0})")]
    GetFileSecurityFailed(u32),

    /// The OS returned bytes that are not a valid self-relative descriptor.
    #[error(transparent)]
    Decode(#[from] SecurityDescriptorError),
}

const WITHOUT_SACL: OBJECT_SECURITY_INFORMATION =
    OWNER_SECURITY_INFORMATION | GROUP_SECURITY_INFORMATION | DACL_SECURITY_INFORMATION;

/// Reads the self-relative security descriptor of `path`.
///
/// The SACL is requested first; reading it needs `SeSecurityPrivilege`, so
/// on failure the call is retried for owner, group and DACL only.
///
/// # Errors
/// [`FileSecurityError`] naming the failing Win32 step.
pub fn read_file_security(path: impl AsRef<Path>) -> Result<Vec<u8>, FileSecurityError> {
    let path = path.as_ref();
    let wide = U16CString::from_os_str(path.as_os_str()).map_err(|_| FileSecurityError::InvalidPath)?;
    trace!(path = %path.display(), "reading file security descriptor");
    query(&wide, WITHOUT_SACL | SACL_SECURITY_INFORMATION).or_else(|err| {
        debug!(%err, "SACL not readable, retrying without it");
        query(&wide, WITHOUT_SACL)
    })
}

fn query(path: &U16CString, info: OBJECT_SECURITY_INFORMATION) -> Result<Vec<u8>, FileSecurityError> {
    // --- First call to obtain required size ------------------------------------
    let mut size: u32 = 0;
    // SAFETY: Standard size-query pattern with null buffer and 0 length; `path` is NUL terminated.
    let first_ok =
        unsafe { GetFileSecurityW(path.as_ptr(), info, ptr::null_mut(), 0, &raw mut size) };
    if first_ok == 0 {
        // SAFETY: GetLastError can be called immediately after a failing FFI call.
        let err = unsafe { GetLastError() };
        if err != ERROR_INSUFFICIENT_BUFFER {
            return Err(FileSecurityError::SizeQueryFailed(err));
        }
    }

    // --- Allocate buffer with reported size ------------------------------------
    let mut buffer = vec![0u8; size as usize];

    // SAFETY: Buffer pointer/length are consistent with allocation; size was set by the API.
    let second_ok = unsafe {
        GetFileSecurityW(
            path.as_ptr(),
            info,
            buffer.as_mut_ptr().cast(),
            size,
            &raw mut size,
        )
    };
    if second_ok == 0 {
        // SAFETY: GetLastError can be called immediately after a failing FFI call.
        let err = unsafe { GetLastError() };
        return Err(FileSecurityError::GetFileSecurityFailed(err));
    }
    buffer.truncate(size as usize);
    Ok(buffer)
}

impl SecurityDescriptor {
    /// Fetches and decodes the security descriptor of a file (Windows only).
    ///
    /// # Errors
    /// Any [`FileSecurityError`].
    ///
    /// # Examples
    /// ```no_run
    /// # #[cfg(windows)]
    /// # {
    /// use win_sddl::SecurityDescriptor;
    /// let sd = SecurityDescriptor::from_file(r"C:\Windows").unwrap();
    /// println!("{}", sd.to_sddl().unwrap());
    /// # }
    /// ```
    #[inline]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FileSecurityError> {
        Ok(Self::from_bytes(&read_file_security(path)?)?)
    }
}
