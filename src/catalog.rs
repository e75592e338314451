use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{Class, ClassLevel};

pub type SharedCatalog = Arc<RwLock<Catalog>>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Duplicate class id '{0}' in catalog")]
    DuplicateId(String),
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog file is not a valid class list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Authoritative class list for the session.
#[derive(Debug, Clone)]
pub struct Catalog {
    classes: Vec<Class>,
    instructors: Vec<String>,
}

impl Catalog {
    pub fn new(classes: Vec<Class>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(classes.len());
        for class in &classes {
            if !seen.insert(class.id.as_str()) {
                return Err(CatalogError::DuplicateId(class.id.clone()));
            }
        }

        let instructors = classes
            .iter()
            .map(|c| c.instructor.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            classes,
            instructors,
        })
    }

    pub fn seed() -> Self {
        let classes = SEED_CLASSES
            .iter()
            .map(|(id, name, level, instructor, center)| Class {
                id: id.to_string(),
                name: name.to_string(),
                level: *level,
                instructor: instructor.to_string(),
                center: center.to_string(),
                is_booked: false,
            })
            .collect();
        Self::new(classes).expect("seed ids are unique")
    }

    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let classes: Vec<Class> = serde_json::from_str(&raw)?;
        Self::new(classes)
    }

    pub fn into_shared(self) -> SharedCatalog {
        Arc::new(RwLock::new(self))
    }

    pub fn classes(&self) -> &[Class] {
        &self.classes
    }

    pub fn get(&self, id: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn instructors(&self) -> &[String] {
        &self.instructors
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns `false` when no class has the given id.
    pub fn set_booked(&mut self, id: &str, booked: bool) -> bool {
        match self.classes.iter_mut().find(|c| c.id == id) {
            Some(class) => {
                class.is_booked = booked;
                true
            }
            None => false,
        }
    }
}

const SEED_CLASSES: &[(&str, &str, ClassLevel, &str, &str)] = &[
    ("1", "Hatha Yoga for Beginners", ClassLevel::Beginner, "Priya Sharma", "Ananda Yoga Studio"),
    ("2", "Kalari Payattu Training", ClassLevel::Advanced, "Arjun Nair", "Kerala Martial Arts Center"),
    ("3", "Bollywood Dance Fitness", ClassLevel::Intermediate, "Neha Kapoor", "Mumbai Dance Academy"),
    ("4", "Pranayama & Breathing", ClassLevel::Beginner, "Guru Ramesh", "Rishikesh Wellness Center"),
    ("5", "Ashtanga Vinyasa Flow", ClassLevel::Advanced, "Kavitha Menon", "Mysore Yoga Institute"),
    ("6", "Traditional Bharatanatyam", ClassLevel::Intermediate, "Lakshmi Devi", "Chennai Classical Arts"),
    ("7", "Surya Namaskara Flow", ClassLevel::Beginner, "Vikram Singh", "Delhi Yoga Center"),
    ("8", "Power Yoga & Strength", ClassLevel::Advanced, "Ravi Kumar", "Bangalore Fitness Hub"),
    ("9", "Bhangra Cardio Workout", ClassLevel::Intermediate, "Simran Kaur", "Punjab Cultural Center"),
    ("10", "Ayurvedic Stretching", ClassLevel::Beginner, "Dr. Anjali Rao", "Kochi Wellness Studio"),
    ("11", "Kuchipudi Dance Therapy", ClassLevel::Intermediate, "Meera Reddy", "Hyderabad Arts Academy"),
    ("12", "Kundalini Awakening", ClassLevel::Advanced, "Swami Ananda", "Haridwar Spiritual Center"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn class(id: &str, instructor: &str) -> Class {
        Class {
            id: id.to_string(),
            name: format!("Class {id}"),
            level: ClassLevel::Beginner,
            instructor: instructor.to_string(),
            center: "Center".to_string(),
            is_booked: false,
        }
    }

    #[test]
    fn test_seed_catalog() {
        let catalog = Catalog::seed();
        assert_eq!(catalog.len(), 12);
        assert_eq!(catalog.classes()[0].name, "Hatha Yoga for Beginners");
        assert!(catalog.classes().iter().all(|c| !c.is_booked));
    }

    #[test]
    fn test_instructors_sorted_and_unique() {
        let catalog = Catalog::new(vec![
            class("1", "Zara"),
            class("2", "Arjun"),
            class("3", "Zara"),
        ])
        .unwrap();
        assert_eq!(catalog.instructors(), ["Arjun", "Zara"]);
    }

    #[test]
    fn test_seed_instructors_sorted() {
        let catalog = Catalog::seed();
        let instructors = catalog.instructors();
        assert_eq!(instructors.len(), 12);
        assert!(instructors.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(instructors[0], "Arjun Nair");
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = Catalog::new(vec![class("1", "A"), class("1", "B")]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId(id) if id == "1"));
    }

    #[test]
    fn test_set_booked() {
        let mut catalog = Catalog::seed();
        assert!(catalog.set_booked("3", true));
        assert!(catalog.get("3").unwrap().is_booked);
        assert!(!catalog.get("4").unwrap().is_booked);
        assert!(!catalog.set_booked("missing", true));
    }

    #[tokio::test]
    async fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.json");
        std::fs::write(
            &path,
            r#"[{"id":"a","name":"Spin","level":"Intermediate","instructor":"Kim","center":"Loft"}]"#,
        )
        .unwrap();

        let catalog = Catalog::load_json(&path).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("a").unwrap().level, ClassLevel::Intermediate);
    }

    #[tokio::test]
    async fn test_load_json_missing_file() {
        let err = Catalog::load_json("/nonexistent/classes.json").await.unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
