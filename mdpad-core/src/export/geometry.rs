//! Page geometry: physical page size, margins and the mm → CSS px conversion.

/// CSS reference resolution.
pub const CSS_DPI: f64 = 96.0;
const MM_PER_INCH: f64 = 25.4;

pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;
pub const DEFAULT_MARGIN_MM: f64 = 10.0;

pub fn mm_to_px(mm: f64) -> f64 {
    mm / MM_PER_INCH * CSS_DPI
}

/// A portrait page with uniform margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f64,
    pub height_mm: f64,
    pub margin_mm: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4(DEFAULT_MARGIN_MM)
    }
}

impl PageGeometry {
    pub fn a4(margin_mm: f64) -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
            margin_mm: margin_mm.clamp(0.0, A4_WIDTH_MM / 2.0 - 1.0),
        }
    }

    pub fn printable_width_mm(&self) -> f64 {
        self.width_mm - 2.0 * self.margin_mm
    }

    pub fn printable_height_mm(&self) -> f64 {
        self.height_mm - 2.0 * self.margin_mm
    }

    pub fn printable_width_px(&self) -> f64 {
        mm_to_px(self.printable_width_mm())
    }

    pub fn printable_height_px(&self) -> f64 {
        mm_to_px(self.printable_height_mm())
    }

    /// Page size in whole CSS pixels, used as the browser viewport.
    pub fn viewport_px(&self) -> (u32, u32) {
        (
            mm_to_px(self.width_mm).round() as u32,
            mm_to_px(self.height_mm).round() as u32,
        )
    }

    /// Scale a raster of `width` × `height` to the printable width, keeping its
    /// aspect ratio. Returns the placed size in millimetres.
    pub fn fit_to_width(&self, width: u32, height: u32) -> (f64, f64) {
        let placed_width = self.printable_width_mm();
        if width == 0 {
            return (placed_width, 0.0);
        }
        let ratio = f64::from(height) / f64::from(width);
        (placed_width, placed_width * ratio)
    }

    /// CSS `@page` rule for this geometry.
    pub fn page_rule(&self) -> String {
        format!(
            "@page {{ size: {}mm {}mm; margin: {}mm; }}",
            self.width_mm, self.height_mm, self.margin_mm
        )
    }
}
