//! System tray icon with a "Show/Hide" and "Quit" context menu, driven
//! through `Shell_NotifyIconW` on a hidden message window.

use std::sync::atomic::{AtomicU16, Ordering};

#[cfg(windows)]
use windows::core::PCWSTR;
#[cfg(windows)]
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, POINT, WPARAM};
#[cfg(windows)]
use windows::Win32::UI::Shell::{
    Shell_NotifyIconW, NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW,
};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{
    AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu, DestroyWindow,
    DispatchMessageW, GetCursorPos, LoadIconW, PeekMessageW, RegisterClassW, SetForegroundWindow,
    TrackPopupMenu, TranslateMessage, HMENU, IDI_APPLICATION, MF_STRING, MSG, PM_REMOVE,
    TPM_BOTTOMALIGN, TPM_LEFTALIGN, TPM_NONOTIFY, TPM_RETURNCMD, WM_RBUTTONUP, WM_USER,
    WNDCLASSW, WS_EX_TOOLWINDOW,
};

#[cfg(windows)]
use crate::error::{PetError, Result};

/// Commands returned from tray menu interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    None,
    ToggleVisibility,
    Quit,
}

/// Menu layout: (command id, label, command).
#[cfg_attr(not(windows), allow(dead_code))]
const MENU_ITEMS: [(u16, &str, TrayCommand); 2] = [
    (1001, "Show/Hide", TrayCommand::ToggleVisibility),
    (1000, "Quit", TrayCommand::Quit),
];

#[cfg_attr(not(windows), allow(dead_code))]
fn command_for(id: u16) -> TrayCommand {
    MENU_ITEMS
        .iter()
        .find(|(item, _, _)| *item == id)
        .map(|(_, _, cmd)| *cmd)
        .unwrap_or(TrayCommand::None)
}

/// Menu id picked since the last `take_picked`, 0 for none. The menu runs
/// inside the window procedure, which may be reached from winit's own
/// message pump as well as from `poll`.
#[cfg_attr(not(windows), allow(dead_code))]
static PICKED: AtomicU16 = AtomicU16::new(0);

#[cfg_attr(not(windows), allow(dead_code))]
fn record_pick(id: u16) {
    if id != 0 {
        PICKED.store(id, Ordering::Relaxed);
    }
}

#[cfg_attr(not(windows), allow(dead_code))]
fn take_picked() -> TrayCommand {
    command_for(PICKED.swap(0, Ordering::Relaxed))
}

/// Custom message ID for tray icon callbacks.
#[cfg(windows)]
const WM_TRAYICON: u32 = WM_USER + 1;

#[cfg(windows)]
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

#[cfg(windows)]
pub struct TrayIcon {
    hwnd: HWND,
    nid: NOTIFYICONDATAW,
}

#[cfg(windows)]
impl TrayIcon {
    pub fn new(tooltip: &str) -> Result<Self> {
        unsafe {
            let class_name = wide("DeskPetTrayClass");
            let wc = WNDCLASSW {
                lpfnWndProc: Some(tray_wnd_proc),
                lpszClassName: PCWSTR(class_name.as_ptr()),
                ..Default::default()
            };
            RegisterClassW(&wc);

            let hwnd = CreateWindowExW(
                WS_EX_TOOLWINDOW,
                PCWSTR(class_name.as_ptr()),
                PCWSTR::null(),
                Default::default(),
                0,
                0,
                0,
                0,
                HWND::default(),
                HMENU::default(),
                HINSTANCE::default(),
                None,
            )
            .map_err(|e| PetError::Tray(e.to_string()))?;

            let mut nid = NOTIFYICONDATAW {
                cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
                hWnd: hwnd,
                uID: 1,
                uFlags: NIF_ICON | NIF_MESSAGE | NIF_TIP,
                uCallbackMessage: WM_TRAYICON,
                hIcon: LoadIconW(None, IDI_APPLICATION).unwrap_or_default(),
                ..Default::default()
            };
            let max = nid.szTip.len() - 1;
            for (slot, ch) in nid.szTip.iter_mut().zip(tooltip.encode_utf16().take(max)) {
                *slot = ch;
            }

            let _ = Shell_NotifyIconW(NIM_ADD, &nid);
            log::info!("System tray icon created");

            Ok(Self { hwnd, nid })
        }
    }

    /// Drain tray messages. Returns the last menu command picked, if any.
    pub fn poll(&mut self) -> TrayCommand {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, self.hwnd, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        take_picked()
    }
}

#[cfg(windows)]
impl Drop for TrayIcon {
    fn drop(&mut self) {
        unsafe {
            let _ = Shell_NotifyIconW(NIM_DELETE, &self.nid);
            let _ = DestroyWindow(self.hwnd);
        }
    }
}

#[cfg(windows)]
unsafe extern "system" fn tray_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    match msg {
        WM_TRAYICON if (lparam.0 & 0xFFFF) as u32 == WM_RBUTTONUP => {
            record_pick(show_context_menu(hwnd));
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Show the menu at the cursor and return the picked id, 0 if dismissed.
/// No WM_COMMAND is sent.
#[cfg(windows)]
unsafe fn show_context_menu(hwnd: HWND) -> u16 {
    let Ok(hmenu) = CreatePopupMenu() else {
        log::warn!("Could not create tray menu");
        return 0;
    };

    for (id, label, _) in MENU_ITEMS {
        let text = wide(label);
        let _ = AppendMenuW(hmenu, MF_STRING, id as usize, PCWSTR(text.as_ptr()));
    }

    let mut pt = POINT::default();
    let _ = GetCursorPos(&mut pt);

    // Lets the menu close when clicking elsewhere.
    let _ = SetForegroundWindow(hwnd);
    let picked = TrackPopupMenu(
        hmenu,
        TPM_LEFTALIGN | TPM_BOTTOMALIGN | TPM_RETURNCMD | TPM_NONOTIFY,
        pt.x,
        pt.y,
        0,
        hwnd,
        None,
    );
    let _ = DestroyMenu(hmenu);
    picked.0 as u16
}

/// No tray on other platforms; the pet is closed with its window.
#[cfg(not(windows))]
pub struct TrayIcon;

#[cfg(not(windows))]
impl TrayIcon {
    pub fn new(_tooltip: &str) -> crate::error::Result<Self> {
        log::info!("System tray not supported on this platform");
        Ok(Self)
    }

    pub fn poll(&mut self) -> TrayCommand {
        TrayCommand::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picked_command_is_taken_once() {
        record_pick(1000);
        assert_eq!(take_picked(), TrayCommand::Quit);
        assert_eq!(take_picked(), TrayCommand::None);

        // A dismissed menu leaves an earlier pick alone.
        record_pick(1001);
        record_pick(0);
        assert_eq!(take_picked(), TrayCommand::ToggleVisibility);
        assert_eq!(take_picked(), TrayCommand::None);
    }

    #[test]
    fn menu_ids_map_to_commands() {
        assert_eq!(command_for(1001), TrayCommand::ToggleVisibility);
        assert_eq!(command_for(1000), TrayCommand::Quit);
        assert_eq!(command_for(42), TrayCommand::None);
    }
}
