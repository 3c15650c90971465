//! Foods offered when logging: a fixed built-in list plus the user's custom foods.

use serde::Serialize;

use crate::models::{CustomFood, ServingUnit};

pub const CUSTOM_ID_PREFIX: &str = "custom_";
pub const CUSTOM_CATEGORY: &str = "Custom Foods";

/// A food that can be logged or added to a preset. Nutrition is per serving.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodOption {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub calories_per_serving: f64,
    pub serving_size: String,
    pub serving_unit: ServingUnit,
    pub category: String,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub is_custom: bool,
}

impl From<&CustomFood> for FoodOption {
    fn from(food: &CustomFood) -> Self {
        Self {
            id: format!("{CUSTOM_ID_PREFIX}{}", food.id),
            name: food.name.clone(),
            image: None,
            emoji: Some(food.emoji.clone()),
            calories_per_serving: food.calories,
            serving_size: food.serving_size.clone(),
            serving_unit: food.serving_unit,
            category: CUSTOM_CATEGORY.to_string(),
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
            is_custom: true,
        }
    }
}

struct Builtin {
    id: &'static str,
    name: &'static str,
    image: &'static str,
    calories: f64,
    serving_size: &'static str,
    unit: ServingUnit,
    category: &'static str,
    protein: f64,
    carbs: f64,
    fat: f64,
}

const BUILTIN: &[Builtin] = &[
    Builtin {
        id: "1",
        name: "Banana",
        image: "https://images.pexels.com/photos/61127/pexels-photo-61127.jpeg?auto=compress&cs=tinysrgb&w=400",
        calories: 105.0,
        serving_size: "1 medium",
        unit: ServingUnit::Units,
        category: "Fruits",
        protein: 1.3,
        carbs: 27.0,
        fat: 0.3,
    },
    Builtin {
        id: "2",
        name: "Greek Yogurt",
        image: "https://images.pexels.com/photos/1099680/pexels-photo-1099680.jpeg?auto=compress&cs=tinysrgb&w=400",
        calories: 130.0,
        serving_size: "100g",
        unit: ServingUnit::Grams,
        category: "Dairy",
        protein: 20.0,
        carbs: 9.0,
        fat: 0.0,
    },
    Builtin {
        id: "3",
        name: "Grilled Chicken Breast",
        image: "https://images.pexels.com/photos/106343/pexels-photo-106343.jpeg?auto=compress&cs=tinysrgb&w=400",
        calories: 231.0,
        serving_size: "100g",
        unit: ServingUnit::Grams,
        category: "Protein",
        protein: 43.5,
        carbs: 0.0,
        fat: 5.0,
    },
    Builtin {
        id: "4",
        name: "Brown Rice",
        image: "https://images.pexels.com/photos/723198/pexels-photo-723198.jpeg?auto=compress&cs=tinysrgb&w=400",
        calories: 216.0,
        serving_size: "1 cup cooked",
        unit: ServingUnit::Units,
        category: "Grains",
        protein: 5.0,
        carbs: 45.0,
        fat: 1.8,
    },
    Builtin {
        id: "5",
        name: "Avocado",
        image: "https://images.pexels.com/photos/557659/pexels-photo-557659.jpeg?auto=compress&cs=tinysrgb&w=400",
        calories: 234.0,
        serving_size: "1 medium",
        unit: ServingUnit::Units,
        category: "Fruits",
        protein: 2.9,
        carbs: 12.0,
        fat: 21.0,
    },
    Builtin {
        id: "6",
        name: "Almonds",
        image: "https://images.pexels.com/photos/1295572/pexels-photo-1295572.jpeg?auto=compress&cs=tinysrgb&w=400",
        calories: 164.0,
        serving_size: "28g",
        unit: ServingUnit::Grams,
        category: "Nuts",
        protein: 6.0,
        carbs: 6.0,
        fat: 14.0,
    },
    Builtin {
        id: "7",
        name: "Salmon Fillet",
        image: "https://images.pexels.com/photos/1516415/pexels-photo-1516415.jpeg?auto=compress&cs=tinysrgb&w=400",
        calories: 206.0,
        serving_size: "100g",
        unit: ServingUnit::Grams,
        category: "Protein",
        protein: 22.0,
        carbs: 0.0,
        fat: 12.0,
    },
    Builtin {
        id: "8",
        name: "Orange Juice",
        image: "https://images.pexels.com/photos/96974/pexels-photo-96974.jpeg?auto=compress&cs=tinysrgb&w=400",
        calories: 112.0,
        serving_size: "250ml",
        unit: ServingUnit::Ml,
        category: "Beverages",
        protein: 1.7,
        carbs: 26.0,
        fat: 0.5,
    },
];

#[must_use]
pub fn builtin_foods() -> Vec<FoodOption> {
    BUILTIN
        .iter()
        .map(|b| FoodOption {
            id: b.id.to_string(),
            name: b.name.to_string(),
            image: Some(b.image.to_string()),
            emoji: None,
            calories_per_serving: b.calories,
            serving_size: b.serving_size.to_string(),
            serving_unit: b.unit,
            category: b.category.to_string(),
            protein: b.protein,
            carbs: b.carbs,
            fat: b.fat,
            is_custom: false,
        })
        .collect()
}

/// Built-in foods followed by custom foods, filtered by a case-insensitive
/// name substring. An empty query matches everything.
#[must_use]
pub fn search(custom: &[CustomFood], query: &str) -> Vec<FoodOption> {
    let needle = query.trim().to_lowercase();
    builtin_foods()
        .into_iter()
        .chain(custom.iter().map(FoodOption::from))
        .filter(|f| f.name.to_lowercase().contains(&needle))
        .collect()
}

/// Resolve an option id: a built-in id, `custom_<id>`, or a bare custom food id.
#[must_use]
pub fn find(custom: &[CustomFood], id: &str) -> Option<FoodOption> {
    if let Some(found) = builtin_foods().into_iter().find(|f| f.id == id) {
        return Some(found);
    }
    let bare = id.strip_prefix(CUSTOM_ID_PREFIX).unwrap_or(id);
    custom.iter().find(|f| f.id == bare).map(FoodOption::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie() -> CustomFood {
        CustomFood {
            id: "abc".to_string(),
            name: "Oat Cookie".to_string(),
            emoji: "🍪".to_string(),
            serving_size: "30".to_string(),
            serving_unit: ServingUnit::Grams,
            calories: 140.0,
            protein: 2.0,
            carbs: 20.0,
            fat: 6.0,
            created_at: "2024-06-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn test_builtin_list() {
        let foods = builtin_foods();
        assert_eq!(foods.len(), 8);
        assert!(foods.iter().all(|f| !f.is_custom && f.image.is_some()));
        let oj = foods.iter().find(|f| f.name == "Orange Juice").unwrap();
        assert_eq!(oj.serving_unit, ServingUnit::Ml);
    }

    #[test]
    fn test_custom_option_prefix() {
        let option = FoodOption::from(&cookie());
        assert_eq!(option.id, "custom_abc");
        assert_eq!(option.category, CUSTOM_CATEGORY);
        assert_eq!(option.emoji.as_deref(), Some("🍪"));
        assert!(option.is_custom);
    }

    #[test]
    fn test_search() {
        let custom = vec![cookie()];
        assert_eq!(search(&custom, "").len(), 9);

        let hits = search(&custom, "OAT");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "custom_abc");

        let hits = search(&custom, "an");
        let names: Vec<&str> = hits.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Banana", "Orange Juice"]);
    }

    #[test]
    fn test_find() {
        let custom = vec![cookie()];
        assert_eq!(find(&custom, "3").unwrap().name, "Grilled Chicken Breast");
        assert_eq!(find(&custom, "custom_abc").unwrap().name, "Oat Cookie");
        assert_eq!(find(&custom, "abc").unwrap().name, "Oat Cookie");
        assert!(find(&custom, "custom_zzz").is_none());
    }
}
