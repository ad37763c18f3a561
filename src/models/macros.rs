use serde::{Deserialize, Serialize};

/// The four resolved macro values tracked per entry, in grams except calories.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MacroSet {
    pub carbs: f64,
    pub fats: f64,
    pub proteins: f64,
    pub calories: f64,
}

impl MacroSet {
    pub const ZERO: MacroSet = MacroSet {
        carbs: 0.0,
        fats: 0.0,
        proteins: 0.0,
        calories: 0.0,
    };

    pub fn add(self, other: MacroSet) -> MacroSet {
        MacroSet {
            carbs: self.carbs + other.carbs,
            fats: self.fats + other.fats,
            proteins: self.proteins + other.proteins,
            calories: self.calories + other.calories,
        }
    }

    pub fn scale(self, factor: f64) -> MacroSet {
        MacroSet {
            carbs: self.carbs * factor,
            fats: self.fats * factor,
            proteins: self.proteins * factor,
            calories: self.calories * factor,
        }
    }

    /// Macros for a single unit, given the quantity they were recorded at.
    pub fn per_unit(self, quantity: f64) -> MacroSet {
        MacroSet {
            carbs: self.carbs / quantity,
            fats: self.fats / quantity,
            proteins: self.proteins / quantity,
            calories: self.calories / quantity,
        }
    }
}
