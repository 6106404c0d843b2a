/// Output aspect ratios offered for the crop

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AspectRatio {
    /// 1:1
    #[default]
    Square,
    /// 16:9
    Horizontal,
    /// 9:16
    Vertical,
}

impl AspectRatio {
    /// All ratios in the order the buttons are shown
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Square,
        AspectRatio::Horizontal,
        AspectRatio::Vertical,
    ];

    /// Width divided by height
    pub fn value(&self) -> f64 {
        match self {
            AspectRatio::Square => 1.0,
            AspectRatio::Horizontal => 16.0 / 9.0,
            AspectRatio::Vertical => 9.0 / 16.0,
        }
    }

    /// Button label
    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Square => "Square",
            AspectRatio::Horizontal => "Landscape",
            AspectRatio::Vertical => "Portrait",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ratio = match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Horizontal => "16:9",
            AspectRatio::Vertical => "9:16",
        };
        write!(f, "{} ({})", self.label(), ratio)
    }
}
