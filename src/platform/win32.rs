use glam::Vec2;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Dwm::DwmSetWindowAttribute;
use windows::Win32::Graphics::Gdi::{
    GetMonitorInfoW, MonitorFromPoint, MONITORINFO, MONITOR_DEFAULTTOPRIMARY,
};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetCursorPos, GetWindowLongPtrW, GetWindowRect, GetWindowTextW, IsWindowVisible,
    SetWindowLongPtrW, SetWindowPos, GWL_EXSTYLE, SWP_FRAMECHANGED, SWP_NOACTIVATE, SWP_NOMOVE,
    SWP_NOSIZE, SWP_NOZORDER, WS_EX_NOACTIVATE, WS_EX_TOOLWINDOW,
};

use crate::error::{PetError, Result};
use crate::geometry::Rect;
use crate::sensor::{DesktopWindow, Environment, WindowId};

/// Extract the Win32 HWND from a winit window.
pub fn get_hwnd(window: &winit::window::Window) -> Option<HWND> {
    let handle = window.window_handle().ok()?;
    match handle.as_raw() {
        RawWindowHandle::Win32(h) => Some(HWND(h.hwnd.get() as *mut core::ffi::c_void)),
        _ => None,
    }
}

pub fn window_id(hwnd: HWND) -> WindowId {
    WindowId(hwnd.0 as usize as u64)
}

/// Apply pet window styles: hidden from the taskbar, never steals focus,
/// no DWM border or rounded corners.
pub unsafe fn make_overlay(hwnd: HWND) {
    let style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);

    // No GDI redirection surface; wgpu presents through DirectComposition.
    const WS_EX_LAYERED: isize = 0x00080000;
    const WS_EX_NOREDIRECTIONBITMAP: isize = 0x00200000;

    let new_style = (style & !WS_EX_LAYERED)
        | WS_EX_NOACTIVATE.0 as isize
        | WS_EX_TOOLWINDOW.0 as isize
        | WS_EX_NOREDIRECTIONBITMAP;
    SetWindowLongPtrW(hwnd, GWL_EXSTYLE, new_style);

    log::debug!("Pet window ex-style 0x{:08X} -> 0x{:08X}", style, new_style);

    let _ = SetWindowPos(
        hwnd,
        HWND::default(),
        0,
        0,
        0,
        0,
        SWP_FRAMECHANGED | SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
    );

    // (attribute, value): NCRENDERING_POLICY=DISABLED, CORNER_PREFERENCE=
    // DONOTROUND, BORDER_COLOR=NONE, SYSTEMBACKDROP_TYPE=NONE.
    let attributes: [(i32, u32); 4] = [(2, 2), (33, 1), (34, 0xFFFFFFFE), (38, 1)];
    for (attribute, value) in attributes {
        let _ = DwmSetWindowAttribute(
            hwnd,
            windows::Win32::Graphics::Dwm::DWMWINDOWATTRIBUTE(attribute),
            &value as *const u32 as *const core::ffi::c_void,
            4,
        );
    }
}

/// Style the pet window. Unlike a click-through overlay it keeps hit
/// testing so it can be grabbed.
pub fn setup_overlay(window: &winit::window::Window) {
    match get_hwnd(window) {
        Some(hwnd) => {
            unsafe {
                make_overlay(hwnd);
            }
            log::info!("Win32 pet window setup complete (toolwindow + no DWM frame)");
        }
        None => log::warn!("No Win32 handle for pet window; skipping overlay styles"),
    }
}

/// Get the current global mouse cursor position in screen pixels.
pub fn get_mouse_pos() -> Vec2 {
    let mut point = POINT::default();
    unsafe {
        let _ = GetCursorPos(&mut point);
    }
    Vec2::new(point.x as f32, point.y as f32)
}

/// Work area (monitor minus taskbar) of the monitor containing `(x, y)`.
pub fn work_area(x: i32, y: i32) -> Option<Rect> {
    unsafe {
        let monitor = MonitorFromPoint(POINT { x, y }, MONITOR_DEFAULTTOPRIMARY);
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        if !GetMonitorInfoW(monitor, &mut info).as_bool() {
            return None;
        }
        let r = info.rcWork;
        Some(Rect::new(
            r.left as f32,
            r.top as f32,
            r.right as f32,
            r.bottom as f32,
        ))
    }
}

/// Enumerate all visible, non-tool windows on the desktop in z-order.
/// Excludes `own_hwnd` and windows with zero area.
pub fn enumerate_windows(own_hwnd: HWND) -> Result<Vec<DesktopWindow>> {
    struct EnumState {
        own_hwnd: HWND,
        results: Vec<DesktopWindow>,
    }

    unsafe extern "system" fn enum_callback(hwnd: HWND, lparam: LPARAM) -> BOOL {
        let state = &mut *(lparam.0 as *mut EnumState);

        if hwnd == state.own_hwnd {
            return TRUE;
        }

        if !IsWindowVisible(hwnd).as_bool() {
            return TRUE;
        }

        // Tooltips, floating toolbars, other desktop pets
        let ex_style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
        if (ex_style as u32) & WS_EX_TOOLWINDOW.0 != 0 {
            return TRUE;
        }

        let mut rect = RECT::default();
        if GetWindowRect(hwnd, &mut rect).is_err() {
            return TRUE;
        }

        if rect.right - rect.left <= 0 || rect.bottom - rect.top <= 0 {
            return TRUE;
        }

        let mut buf = [0u16; 256];
        let len = GetWindowTextW(hwnd, &mut buf);
        let title = if len > 0 {
            String::from_utf16_lossy(&buf[..len as usize])
        } else {
            String::new()
        };

        state.results.push(DesktopWindow {
            id: window_id(hwnd),
            title,
            rect: Rect::new(
                rect.left as f32,
                rect.top as f32,
                rect.right as f32,
                rect.bottom as f32,
            ),
            visible: true,
        });

        TRUE
    }

    let mut state = EnumState {
        own_hwnd,
        results: Vec::with_capacity(64),
    };

    unsafe {
        EnumWindows(
            Some(enum_callback),
            LPARAM(&mut state as *mut EnumState as isize),
        )
        .map_err(|e| PetError::WindowQuery(e.to_string()))?;
    }

    Ok(state.results)
}

/// Live Win32 desktop: global cursor and top-level windows.
pub struct DesktopEnvironment {
    own_hwnd: HWND,
}

impl DesktopEnvironment {
    pub fn new(window: &winit::window::Window) -> Self {
        Self {
            own_hwnd: get_hwnd(window).unwrap_or_default(),
        }
    }

    /// Global cursor is queried directly; window events add nothing.
    pub fn observe_cursor(&mut self, _global: Vec2) {}

    pub fn own_window_id(&self) -> Option<WindowId> {
        if self.own_hwnd.is_invalid() {
            None
        } else {
            Some(window_id(self.own_hwnd))
        }
    }
}

impl Environment for DesktopEnvironment {
    fn cursor_position(&self) -> Vec2 {
        get_mouse_pos()
    }

    fn windows(&self) -> Result<Vec<DesktopWindow>> {
        enumerate_windows(self.own_hwnd)
    }
}
