//! Splash overlay shown while the main window is being built.
//!
//! The artwork is blitted centered onto a transparent canvas the size of the
//! primary display, so the artwork resolution is independent of the display.

use std::path::Path;

use app::LOG_SPLASH;
use image::RgbaImage;

use crate::error::ToolkitError;
use crate::toolkit::{DisplayInfo, MessageStyle, Overlay, OverlayFlags, OverlaySpec, Rect, Toolkit};

/// Inputs for [`show`].
#[derive(Debug, Clone, Copy)]
pub struct SplashOptions<'a> {
    pub enabled: bool,
    pub image: Option<&'a Path>,
    pub title: &'a str,
}

/// Owns the overlay between "splash shown" and "main window shown".
///
/// Closing happens at most once, explicitly through [`SplashHandle::finish`]
/// or when the handle is dropped.
pub struct SplashHandle<O: Overlay> {
    overlay: O,
    finished: bool,
}

impl<O: Overlay> SplashHandle<O> {
    fn new(overlay: O) -> Self {
        Self {
            overlay,
            finished: false,
        }
    }

    pub fn set_message(&mut self, text: &str) {
        if !self.finished {
            self.overlay.set_message(text, MessageStyle::SPLASH);
        }
    }

    pub fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            self.overlay.close();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<O: Overlay> Drop for SplashHandle<O> {
    fn drop(&mut self) {
        self.finish();
    }
}

/// The display the splash goes on. Toolkits list the primary display first.
pub fn primary_display(displays: &[DisplayInfo]) -> Option<&DisplayInfo> {
    displays.first()
}

/// Top-left position of `image` centered in `canvas`, floor-divided.
///
/// Negative when the image is larger than the canvas.
pub fn centering_offset(canvas: (u32, u32), image: (u32, u32)) -> (i64, i64) {
    let dx = i64::from(canvas.0) - i64::from(image.0);
    let dy = i64::from(canvas.1) - i64::from(image.1);
    (dx.div_euclid(2), dy.div_euclid(2))
}

/// Transparent canvas of `size` with `artwork` centered on it.
pub fn compose_canvas(size: (u32, u32), artwork: &RgbaImage) -> RgbaImage {
    let mut canvas = RgbaImage::new(size.0, size.1);
    let (x, y) = centering_offset(size, artwork.dimensions());
    image::imageops::overlay(&mut canvas, artwork, x, y);
    canvas
}

/// Overlay window geometry: full display width, display height minus the
/// artwork height.
pub fn overlay_geometry(display: Rect, artwork_height: u32) -> Rect {
    Rect {
        x: display.x,
        y: display.y,
        width: display.width,
        height: display.height.saturating_sub(artwork_height),
    }
}

/// Decode the splash artwork. A missing or unreadable file yields an empty
/// image so the overlay still carries the status line.
pub fn load_artwork(path: Option<&Path>) -> RgbaImage {
    let Some(path) = path else {
        return RgbaImage::new(0, 0);
    };

    match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(err) => {
            tracing::warn!(
                target: LOG_SPLASH,
                path = %path.display(),
                "failed to load splash artwork: {err}"
            );
            RgbaImage::new(0, 0)
        }
    }
}

/// Create, show and flush the splash overlay.
///
/// Returns `Ok(None)` when the splash is disabled. When this returns the
/// overlay has been painted.
pub fn show<T: Toolkit>(
    toolkit: &mut T,
    options: &SplashOptions<'_>,
) -> Result<Option<SplashHandle<T::Overlay>>, ToolkitError> {
    if !options.enabled {
        return Ok(None);
    }

    let displays = toolkit.displays();
    let display = primary_display(&displays).ok_or(ToolkitError::NoDisplay)?;
    let screen = display.geometry;

    let artwork = load_artwork(options.image);
    let canvas = compose_canvas((screen.width, screen.height), &artwork);

    let spec = OverlaySpec {
        display: display.name.clone(),
        geometry: overlay_geometry(screen, artwork.height()),
        canvas,
        flags: OverlayFlags::SPLASH,
    };
    tracing::debug!(target: LOG_SPLASH, ?spec, "creating splash overlay");

    let mut handle = SplashHandle::new(toolkit.create_overlay(spec)?);
    handle.overlay.show();
    handle.set_message(options.title);
    toolkit.process_events();

    Ok(Some(handle))
}

/// Set the status line; no-op without a handle.
pub fn update_message<O: Overlay>(handle: Option<&mut SplashHandle<O>>, text: &str) {
    if let Some(handle) = handle {
        handle.set_message(text);
    }
}

/// Close and release the overlay. Calling it again is a no-op.
pub fn dismiss<O: Overlay>(handle: &mut Option<SplashHandle<O>>) {
    if let Some(mut handle) = handle.take() {
        handle.finish();
        tracing::debug!(target: LOG_SPLASH, "splash dismissed");
    }
}
