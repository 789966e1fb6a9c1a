//! Win32 font services behind the install strategies (made by FontLab https://www.fontlab.com/)

use std::ffi::OsStr;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr;

use windows_sys::Win32::Graphics::Gdi::AddFontResourceW;
use windows_sys::Win32::UI::Shell::{
    IsUserAnAdmin, SHFileOperationW, FOF_NOCONFIRMATION, FOF_SILENT, FO_COPY, SHFILEOPSTRUCTW,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{SendMessageW, HWND_BROADCAST, WM_FONTCHANGE};

use crate::error::PlatformError;
use crate::platform::{default_fonts_dir, FontApi, ShellCopy};

/// Copies through the shell's file operation engine, which raises the UAC
/// prompt when the Fonts folder needs it.
#[derive(Debug, Clone, Copy)]
pub struct ShellFontsFolder;

impl ShellCopy for ShellFontsFolder {
    fn copy_into_fonts(&self, source: &Path) -> Result<(), PlatformError> {
        let fonts_dir = default_fonts_dir()?;
        // Both lists are double-NUL terminated.
        let from = double_nul(source.as_os_str());
        let to = double_nul(fonts_dir.as_os_str());

        let mut op = SHFILEOPSTRUCTW {
            hwnd: ptr::null_mut(),
            wFunc: FO_COPY as _,
            pFrom: from.as_ptr(),
            pTo: to.as_ptr(),
            fFlags: (FOF_SILENT | FOF_NOCONFIRMATION) as _,
            fAnyOperationsAborted: 0,
            hNameMappings: ptr::null_mut(),
            lpszProgressTitle: ptr::null(),
        };

        // SAFETY: `op` points at buffers that outlive the call.
        let code = unsafe { SHFileOperationW(&mut op) };
        if code != 0 {
            return Err(PlatformError::Os {
                operation: "SHFileOperationW",
                code,
            });
        }
        if op.fAnyOperationsAborted != 0 {
            return Err(PlatformError::Os {
                operation: "SHFileOperationW (aborted)",
                code: 0,
            });
        }
        Ok(())
    }
}

/// GDI font table.
#[derive(Debug, Clone, Copy)]
pub struct GdiFontApi;

impl FontApi for GdiFontApi {
    fn add_font_resource(&self, path: &Path) -> Result<u32, PlatformError> {
        let wide = nul_terminated(path.as_os_str());
        // SAFETY: `wide` is a NUL-terminated UTF-16 path.
        let added = unsafe { AddFontResourceW(wide.as_ptr()) };
        Ok(u32::try_from(added).unwrap_or(0))
    }

    fn broadcast_font_change(&self) -> Result<(), PlatformError> {
        // SAFETY: WM_FONTCHANGE carries no pointers.
        unsafe {
            SendMessageW(HWND_BROADCAST, WM_FONTCHANGE, 0, 0);
        }
        Ok(())
    }
}

pub fn is_user_admin() -> bool {
    // SAFETY: no arguments, no side effects.
    unsafe { IsUserAnAdmin() != 0 }
}

fn nul_terminated(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain([0]).collect()
}

fn double_nul(s: &OsStr) -> Vec<u16> {
    s.encode_wide().chain([0, 0]).collect()
}
