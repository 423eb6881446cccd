//! Elder impulse system: trend slope combined with momentum slope

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Slope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImpulseColor {
    /// Trend and momentum both rising
    Green,
    /// Mixed signals
    Blue,
    /// Trend and momentum both falling
    Red,
}

impl ImpulseColor {
    /// A flat slope counts as falling.
    pub fn from_slopes(trend: Slope, momentum: Slope) -> Self {
        match (trend.is_rising(), momentum.is_rising()) {
            (true, true) => ImpulseColor::Green,
            (false, false) => ImpulseColor::Red,
            _ => ImpulseColor::Blue,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImpulseColor::Green => "GREEN",
            ImpulseColor::Blue => "BLUE",
            ImpulseColor::Red => "RED",
        }
    }
}

impl fmt::Display for ImpulseColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_are_exhaustive() {
        use Slope::*;
        assert_eq!(ImpulseColor::from_slopes(Rising, Rising), ImpulseColor::Green);
        assert_eq!(ImpulseColor::from_slopes(Falling, Falling), ImpulseColor::Red);
        assert_eq!(ImpulseColor::from_slopes(Flat, Falling), ImpulseColor::Red);
        assert_eq!(ImpulseColor::from_slopes(Rising, Flat), ImpulseColor::Blue);
        assert_eq!(ImpulseColor::from_slopes(Falling, Rising), ImpulseColor::Blue);
    }

    #[test]
    fn test_serde_uppercase() {
        assert_eq!(serde_json::to_string(&ImpulseColor::Red).unwrap(), "\"RED\"");
    }
}
