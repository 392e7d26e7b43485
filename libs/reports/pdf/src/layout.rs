//! Page geometry, in PDF points (1/72 inch)

/// Paper size of every page in a document.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom {
        width: f32,
        height: f32,
    },
}

impl PageSize {
    /// `(width, height)` in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match *self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (width, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Margins {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }
}

impl Default for Margins {
    fn default() -> Self {
        Self::new(50.0, 50.0, 70.0, 70.0)
    }
}

/// Page size plus margins.
///
/// Defaults to A4 with 50pt left/right and 70pt top/bottom margins.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageLayout {
    pub size: PageSize,
    pub margins: Margins,
}

impl PageLayout {
    pub fn new(size: PageSize, margins: Margins) -> Self {
        Self { size, margins }
    }

    pub fn width(&self) -> f32 {
        self.size.dimensions().0
    }

    pub fn height(&self) -> f32 {
        self.size.dimensions().1
    }

    /// Width available to text between the left and right margins, never negative.
    pub fn content_width(&self) -> f32 {
        (self.width() - self.margins.left - self.margins.right).max(0.0)
    }

    /// Baseline of the first line on a page.
    pub fn top(&self) -> f32 {
        self.height() - self.margins.top
    }
}
