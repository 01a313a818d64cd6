use crate::core::candidates::offline_restaurants;
use crate::models::{CurationList, RestaurantRecord};

/// Read-only catalog of curated lists
///
/// List entries are references; they are resolved against the offline records
/// plus whatever the caller is currently displaying.
#[derive(Debug, Clone)]
pub struct CurationCatalog {
    lists: Vec<CurationList>,
    known: Vec<RestaurantRecord>,
}

impl CurationCatalog {
    pub fn new(lists: Vec<CurationList>, known: Vec<RestaurantRecord>) -> Self {
        Self { lists, known }
    }

    /// The seed lists over the offline restaurant set
    pub fn seeded() -> Self {
        Self::new(seed_lists(), offline_restaurants())
    }

    pub fn lists(&self) -> &[CurationList] {
        &self.lists
    }

    pub fn get_list(&self, id: &str) -> Option<&CurationList> {
        self.lists.iter().find(|list| list.id == id)
    }

    /// Resolve a list's references in list order.
    ///
    /// Displayed records win over catalog records with the same id; ids that
    /// resolve to nothing are skipped.
    pub fn select_list(
        &self,
        id: &str,
        displayed: &[RestaurantRecord],
    ) -> Option<(&CurationList, Vec<RestaurantRecord>)> {
        let list = self.get_list(id)?;

        let restaurants = list
            .restaurants
            .iter()
            .filter_map(|rid| {
                displayed
                    .iter()
                    .chain(self.known.iter())
                    .find(|r| &r.id == rid)
                    .cloned()
            })
            .collect();

        Some((list, restaurants))
    }
}

fn list(id: &str, name: &str, description: &str, restaurants: &[&str], image_url: &str) -> CurationList {
    CurationList {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        restaurants: restaurants.iter().map(|r| r.to_string()).collect(),
        image_url: Some(image_url.to_string()),
    }
}

fn seed_lists() -> Vec<CurationList> {
    vec![
        list(
            "hidden-gems",
            "Hidden Gems",
            "Unique local spots you won't find on the main apps",
            &["mock-3", "mock-1"],
            "https://images.unsplash.com/photo-1428515613728-6b4607e44363?w=400&h=300&fit=crop",
        ),
        list(
            "date-night",
            "Perfect Date Spots",
            "Romantic restaurants for special evenings",
            &["mock-5", "mock-1"],
            "https://images.unsplash.com/photo-1515669097368-22e68427d265?w=400&h=300&fit=crop",
        ),
        list(
            "quick-bites",
            "Quick & Delicious",
            "Fast, affordable options that don't compromise on taste",
            &["mock-2", "mock-6"],
            "https://images.unsplash.com/photo-1546833999-b9f581a1996d?w=400&h=300&fit=crop",
        ),
    ]
}
