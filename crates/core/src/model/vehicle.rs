use serde::{Deserialize, Serialize};

use crate::model::ids::{CategoryLevelId, VehicleId};
use crate::model::option::{SelectOption, ToOption};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub brand: String,
    pub model: String,
    pub manufacture_year: i32,
    pub license_plate: String,
    pub fuel_type: String,
    pub category_level_id: CategoryLevelId,
}

impl ToOption for Vehicle {
    fn to_option(&self) -> SelectOption {
        SelectOption::new(
            self.id.value(),
            format!("{} {} ({})", self.brand, self.model, self.license_plate),
        )
    }
}
