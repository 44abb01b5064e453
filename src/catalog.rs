use crate::error::PetError;
use crate::model::{InventoryItem, ItemCategory, StatDelta};

pub static FOOD_ITEMS: [InventoryItem; 4] = [
    InventoryItem {
        id: "apple",
        display_name: "Space Apple",
        cost: 5,
        category: ItemCategory::Food,
        effect: StatDelta::food(15.0, 5.0),
    },
    InventoryItem {
        id: "pizza",
        display_name: "Nebula Pizza",
        cost: 15,
        category: ItemCategory::Food,
        effect: StatDelta::food(40.0, 10.0),
    },
    InventoryItem {
        id: "burger",
        display_name: "Comet Burger",
        cost: 25,
        category: ItemCategory::Food,
        effect: StatDelta::food(60.0, 15.0),
    },
    InventoryItem {
        id: "cake",
        display_name: "Star Cake",
        cost: 40,
        category: ItemCategory::Food,
        effect: StatDelta::food(20.0, 40.0),
    },
];

pub static HATS: [InventoryItem; 3] = [
    InventoryItem {
        id: "crown",
        display_name: "King Crown",
        cost: 500,
        category: ItemCategory::Hat,
        effect: StatDelta::NONE,
    },
    InventoryItem {
        id: "propeller",
        display_name: "Propeller Cap",
        cost: 250,
        category: ItemCategory::Hat,
        effect: StatDelta::NONE,
    },
    InventoryItem {
        id: "wizard",
        display_name: "Wizard Hat",
        cost: 750,
        category: ItemCategory::Hat,
        effect: StatDelta::NONE,
    },
];

pub fn find(id: &str) -> Result<&'static InventoryItem, PetError> {
    FOOD_ITEMS
        .iter()
        .chain(HATS.iter())
        .find(|item| item.id == id)
        .ok_or_else(|| PetError::UnknownItem(id.to_string()))
}
