//! Catalog taxonomy the pipeline crawls.

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub subcategories: &'static [&'static str],
}

static CATEGORIES: &[Category] = &[
    Category {
        name: "Electronics",
        subcategories: &["Mobile Phones", "Laptops", "Gaming", "Audio", "Cameras"],
    },
    Category {
        name: "Home & Garden",
        subcategories: &["Kitchen Appliances", "Home Decor", "Garden Tools", "Furniture"],
    },
    Category {
        name: "Fashion",
        subcategories: &["Clothing", "Shoes", "Accessories", "Watches"],
    },
    Category {
        name: "Health & Beauty",
        subcategories: &["Skincare", "Makeup", "Health Supplements", "Fitness Equipment"],
    },
    Category {
        name: "Sports & Outdoors",
        subcategories: &["Fitness", "Outdoor Gear", "Sports Equipment"],
    },
    Category {
        name: "Automotive",
        subcategories: &["Car Accessories", "Tools", "Parts"],
    },
];

/// Fixed category -> ordered subcategory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryTaxonomy {
    categories: &'static [Category],
}

/// The taxonomy. Every call returns the same table.
pub fn taxonomy() -> CategoryTaxonomy {
    CategoryTaxonomy {
        categories: CATEGORIES,
    }
}

impl CategoryTaxonomy {
    pub fn categories(&self) -> &'static [Category] {
        self.categories
    }

    pub fn subcategories(&self, category: &str) -> Option<&'static [&'static str]> {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .map(|c| c.subcategories)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

// Serialized as an object in definition order, e.g. {"Electronics": ["Mobile Phones", ...], ...}.
impl Serialize for CategoryTaxonomy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for c in self.categories {
            map.serialize_entry(c.name, c.subcategories)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_table_every_call() {
        assert_eq!(taxonomy(), taxonomy());
        assert_eq!(taxonomy().len(), 6);
    }

    #[test]
    fn category_names_are_unique() {
        let names: HashSet<&str> = taxonomy().categories().iter().map(|c| c.name).collect();
        assert_eq!(names.len(), taxonomy().len());
    }

    #[test]
    fn subcategory_order_is_preserved() {
        assert_eq!(
            taxonomy().subcategories("Electronics"),
            Some(&["Mobile Phones", "Laptops", "Gaming", "Audio", "Cameras"][..])
        );
        assert_eq!(taxonomy().subcategories("Toys"), None);
    }

    #[test]
    fn serializes_keys_in_definition_order() {
        let json = serde_json::to_string(&taxonomy()).unwrap();
        let positions: Vec<usize> = taxonomy()
            .categories()
            .iter()
            .map(|c| json.find(&format!("\"{}\":", c.name)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{json}");
        assert!(json.starts_with(r#"{"Electronics":["Mobile Phones","Laptops","Gaming","Audio","Cameras"]"#));
    }
}
