use crate::models::{Class, ClassLevel, FilterState};

/// Narrows `classes` by level (any selected) and instructor (exact match).
///
/// Empty level selection and an absent or empty instructor let everything
/// through. Output keeps the input order.
pub fn apply(classes: &[Class], filter: &FilterState) -> Vec<Class> {
    let instructor = filter
        .selected_instructor
        .as_deref()
        .filter(|name| !name.is_empty());

    classes
        .iter()
        .filter(|c| filter.selected_levels.is_empty() || filter.selected_levels.contains(&c.level))
        .filter(|c| instructor.is_none_or(|name| c.instructor == name))
        .cloned()
        .collect()
}

impl FilterState {
    pub fn with_levels(levels: impl IntoIterator<Item = ClassLevel>) -> Self {
        let mut state = Self::default();
        for level in levels {
            if !state.selected_levels.contains(&level) {
                state.selected_levels.push(level);
            }
        }
        state
    }

    pub fn instructor(mut self, instructor: impl Into<String>) -> Self {
        self.selected_instructor = Some(instructor.into());
        self
    }

    pub fn toggle_level(&mut self, level: ClassLevel) {
        if let Some(pos) = self.selected_levels.iter().position(|l| *l == level) {
            self.selected_levels.remove(pos);
        } else {
            self.selected_levels.push(level);
        }
    }

    /// Selecting the already selected instructor clears the filter.
    pub fn toggle_instructor(&mut self, instructor: &str) {
        if self.selected_instructor.as_deref() == Some(instructor) {
            self.selected_instructor = None;
        } else {
            self.selected_instructor = Some(instructor.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.selected_levels.clear();
        self.selected_instructor = None;
    }

    pub fn is_active(&self) -> bool {
        !self.selected_levels.is_empty()
            || self
                .selected_instructor
                .as_deref()
                .is_some_and(|name| !name.is_empty())
    }
}
