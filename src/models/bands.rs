use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualitative zone a daily total falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    MuchTooLow,
    ALittleLow,
    Perfect,
    ALittleHigh,
    MuchTooHigh,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Label::MuchTooLow => "Much too low",
            Label::ALittleLow => "A little low",
            Label::Perfect => "Perfect",
            Label::ALittleHigh => "A little high",
            Label::MuchTooHigh => "Much too high",
        };
        f.write_str(s)
    }
}

/// Per-nutrient thresholds partitioning the real line into five zones.
/// Invariant: yellow_base <= green_base <= green_ceil <= yellow_ceil.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeBand {
    pub yellow_base: f64,
    pub green_base: f64,
    pub green_ceil: f64,
    pub yellow_ceil: f64,
}

impl RangeBand {
    /// Classify a total. Boundary behavior matters: green_base and green_ceil
    /// are Perfect, yellow_base is ALittleLow, yellow_ceil is ALittleHigh.
    pub fn classify(&self, total: f64) -> Label {
        if total < self.yellow_base {
            Label::MuchTooLow
        } else if total < self.green_base {
            Label::ALittleLow
        } else if total <= self.green_ceil {
            Label::Perfect
        } else if total <= self.yellow_ceil {
            Label::ALittleHigh
        } else {
            Label::MuchTooHigh
        }
    }
}

/// One band per tracked nutrient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Bands {
    pub carbs: RangeBand,
    pub fats: RangeBand,
    pub proteins: RangeBand,
    pub calories: RangeBand,
}

impl Default for Bands {
    fn default() -> Self {
        Self {
            carbs: RangeBand {
                yellow_base: 0.0,
                green_base: 10.0,
                green_ceil: 20.0,
                yellow_ceil: 50.0,
            },
            fats: RangeBand {
                yellow_base: 100.0,
                green_base: 130.0,
                green_ceil: 170.0,
                yellow_ceil: 200.0,
            },
            proteins: RangeBand {
                yellow_base: 80.0,
                green_base: 100.0,
                green_ceil: 120.0,
                yellow_ceil: 140.0,
            },
            calories: RangeBand {
                yellow_base: 1500.0,
                green_base: 1800.0,
                green_ceil: 2000.0,
                yellow_ceil: 2500.0,
            },
        }
    }
}
