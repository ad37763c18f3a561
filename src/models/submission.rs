use serde::Deserialize;

use super::MacroSet;

/// One form submission, as received from the logging form.
///
/// Absent numeric fields mean "use the default"; an explicit zero is kept as
/// a value. Manual macros only count when all four are supplied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Submission {
    pub item: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub brand_info: Option<String>,
    pub carbs: Option<f64>,
    pub fats: Option<f64>,
    pub proteins: Option<f64>,
    pub calories: Option<f64>,
    /// Store this entry as a reusable saved item.
    pub save_item: bool,
    /// Reference to a previously saved item by name.
    pub saved_item: Option<String>,
}

impl Submission {
    /// The manually entered macro set, if the submission is complete enough
    /// to skip estimation.
    pub fn manual_macros(&self) -> Option<MacroSet> {
        match (self.carbs, self.fats, self.proteins, self.calories) {
            (Some(carbs), Some(fats), Some(proteins), Some(calories)) => Some(MacroSet {
                carbs,
                fats,
                proteins,
                calories,
            }),
            _ => None,
        }
    }

    pub fn set_macros(&mut self, macros: MacroSet) {
        self.carbs = Some(macros.carbs);
        self.fats = Some(macros.fats);
        self.proteins = Some(macros.proteins);
        self.calories = Some(macros.calories);
    }
}
