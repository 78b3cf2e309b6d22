//! Static interest catalog.
//!
//! The selection flow treats this as external data; it only constrains what
//! the terminal flow offers, not what the backend accepts.

use serde::Serialize;

/// Broad grouping used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InterestCategory {
    Creative,
    Outdoors,
    Sports,
    FoodAndDrink,
    Entertainment,
    Learning,
    Wellness,
    Social,
}

impl std::fmt::Display for InterestCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterestCategory::Creative => write!(f, "Creative"),
            InterestCategory::Outdoors => write!(f, "Outdoors"),
            InterestCategory::Sports => write!(f, "Sports"),
            InterestCategory::FoodAndDrink => write!(f, "Food & Drink"),
            InterestCategory::Entertainment => write!(f, "Entertainment"),
            InterestCategory::Learning => write!(f, "Learning"),
            InterestCategory::Wellness => write!(f, "Wellness"),
            InterestCategory::Social => write!(f, "Social"),
        }
    }
}

/// One selectable interest label.
#[derive(Debug, Clone, Serialize)]
pub struct InterestInfo {
    /// Label as stored on the profile record (canonical form).
    pub name: &'static str,
    pub category: InterestCategory,
}

/// Catalog of selectable interests, grouped by category.
pub static INTEREST_CATALOG: &[InterestInfo] = &[
    // ============ Creative ============
    InterestInfo {
        name: "Photography",
        category: InterestCategory::Creative,
    },
    InterestInfo {
        name: "Painting",
        category: InterestCategory::Creative,
    },
    InterestInfo {
        name: "Writing",
        category: InterestCategory::Creative,
    },
    InterestInfo {
        name: "Music",
        category: InterestCategory::Creative,
    },
    InterestInfo {
        name: "Design",
        category: InterestCategory::Creative,
    },
    // ============ Outdoors ============
    InterestInfo {
        name: "Hiking",
        category: InterestCategory::Outdoors,
    },
    InterestInfo {
        name: "Camping",
        category: InterestCategory::Outdoors,
    },
    InterestInfo {
        name: "Gardening",
        category: InterestCategory::Outdoors,
    },
    InterestInfo {
        name: "Travel",
        category: InterestCategory::Outdoors,
    },
    // ============ Sports ============
    InterestInfo {
        name: "Running",
        category: InterestCategory::Sports,
    },
    InterestInfo {
        name: "Cycling",
        category: InterestCategory::Sports,
    },
    InterestInfo {
        name: "Climbing",
        category: InterestCategory::Sports,
    },
    InterestInfo {
        name: "Swimming",
        category: InterestCategory::Sports,
    },
    InterestInfo {
        name: "Football",
        category: InterestCategory::Sports,
    },
    // ============ Food & Drink ============
    InterestInfo {
        name: "Cooking",
        category: InterestCategory::FoodAndDrink,
    },
    InterestInfo {
        name: "Baking",
        category: InterestCategory::FoodAndDrink,
    },
    InterestInfo {
        name: "Coffee",
        category: InterestCategory::FoodAndDrink,
    },
    InterestInfo {
        name: "Wine tasting",
        category: InterestCategory::FoodAndDrink,
    },
    // ============ Entertainment ============
    InterestInfo {
        name: "Movies",
        category: InterestCategory::Entertainment,
    },
    InterestInfo {
        name: "Gaming",
        category: InterestCategory::Entertainment,
    },
    InterestInfo {
        name: "Live music",
        category: InterestCategory::Entertainment,
    },
    InterestInfo {
        name: "Theater",
        category: InterestCategory::Entertainment,
    },
    // ============ Learning ============
    InterestInfo {
        name: "Reading",
        category: InterestCategory::Learning,
    },
    InterestInfo {
        name: "Languages",
        category: InterestCategory::Learning,
    },
    InterestInfo {
        name: "History",
        category: InterestCategory::Learning,
    },
    InterestInfo {
        name: "Science",
        category: InterestCategory::Learning,
    },
    // ============ Wellness ============
    InterestInfo {
        name: "Yoga",
        category: InterestCategory::Wellness,
    },
    InterestInfo {
        name: "Meditation",
        category: InterestCategory::Wellness,
    },
    InterestInfo {
        name: "Fitness",
        category: InterestCategory::Wellness,
    },
    // ============ Social ============
    InterestInfo {
        name: "Volunteering",
        category: InterestCategory::Social,
    },
    InterestInfo {
        name: "Board games",
        category: InterestCategory::Social,
    },
    InterestInfo {
        name: "Dancing",
        category: InterestCategory::Social,
    },
];

/// Look up a catalog entry by its canonical name, case-insensitively.
pub fn find_interest(name: &str) -> Option<&'static InterestInfo> {
    let needle = name.trim();
    INTEREST_CATALOG
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(needle))
}
