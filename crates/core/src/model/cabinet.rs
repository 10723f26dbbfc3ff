use serde::{Deserialize, Serialize};

use crate::model::ids::CabinetId;
use crate::model::option::{SelectOption, ToOption};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cabinet {
    pub id: CabinetId,
    pub name: String,
}

impl ToOption for Cabinet {
    fn to_option(&self) -> SelectOption {
        SelectOption::new(self.id.value(), self.name.clone())
    }
}
