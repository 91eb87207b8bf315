//! Runtime capabilities probed once at call entry.

use std::sync::Arc;

use usvg::fontdb;

use crate::config::RidgeRequest;
use crate::error::{Result, RidgeError};

/// What the current environment can do for the pipeline.
#[derive(Clone)]
pub struct Capabilities {
    /// A window or native dialog can be shown.
    pub graphical_display: bool,
    /// Fonts handed to the SVG rasteriser and PDF converter.
    pub fonts: Arc<fontdb::Database>,
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("graphical_display", &self.graphical_display)
            .field("font_faces", &self.font_faces())
            .finish()
    }
}

impl Capabilities {
    /// Look for a display server and load the system fonts.
    pub fn probe() -> Self {
        let mut fonts = fontdb::Database::new();
        fonts.load_system_fonts();

        // Plotters asks for "sans-serif"; point it at a face that exists.
        let has_arial = fonts
            .faces()
            .any(|face| face.families.iter().any(|(name, _)| name == "Arial"));
        if !has_arial {
            let fallback = fonts
                .faces()
                .find_map(|face| face.families.first().map(|(name, _)| name.clone()));
            if let Some(family) = fallback {
                fonts.set_sans_serif_family(family);
            }
        }

        let caps = Self {
            graphical_display: display_available(),
            fonts: Arc::new(fonts),
        };
        log::debug!("{caps:?}");
        caps
    }

    /// No display and no fonts, as on a bare CI runner.
    pub fn headless() -> Self {
        Self {
            graphical_display: false,
            fonts: Arc::new(fontdb::Database::new()),
        }
    }

    pub fn font_faces(&self) -> usize {
        self.fonts.len()
    }

    /// Fail fast when the request cannot be served here.
    ///
    /// `needs_display` is whether the chosen confirmation or preview opens
    /// a window. Missing fonts only degrade the figure (titles are dropped),
    /// so they are reported but not fatal.
    pub fn require(&self, request: &RidgeRequest, needs_display: bool) -> Result<()> {
        if request.interactive && needs_display && !self.graphical_display {
            return Err(RidgeError::MissingDependency(
                "no graphical display for the preview window or confirmation dialog \
                 (set DISPLAY/WAYLAND_DISPLAY, or run non-interactively)"
                    .into(),
            ));
        }
        if self.font_faces() == 0 {
            log::warn!("No system fonts found; the saved figure will have no title text");
        }
        Ok(())
    }
}

fn display_available() -> bool {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        return true;
    }
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_rejects_interactive_display() {
        let caps = Capabilities::headless();
        let request = RidgeRequest::new("A01");
        assert!(matches!(
            caps.require(&request, true),
            Err(RidgeError::MissingDependency(_))
        ));
        // A terminal prompt works without a display.
        assert!(caps.require(&request, false).is_ok());
    }

    #[test]
    fn test_headless_accepts_non_interactive() {
        let caps = Capabilities::headless();
        let mut request = RidgeRequest::new("A01");
        request.interactive = false;
        assert!(caps.require(&request, true).is_ok());
        assert_eq!(caps.font_faces(), 0);
    }
}
