use serde::{Deserialize, Serialize};

/// Declaration of a form field inside a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            required: false,
        }
    }
}

/// Tagged field entry tracked by a [`FieldRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub label: String,
    pub value: String,
    pub required: bool,
}

impl FieldEntry {
    pub fn is_filled(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

/// Fixed, ordered set of named fields for one step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRegistry {
    entries: Vec<FieldEntry>,
}

impl FieldRegistry {
    /// Build a registry from specs. Later duplicates of a name are dropped.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a FieldSpec>) -> Self {
        let mut entries: Vec<FieldEntry> = Vec::new();
        for spec in specs {
            if entries.iter().any(|entry| entry.name == spec.name) {
                continue;
            }
            entries.push(FieldEntry {
                name: spec.name.clone(),
                label: spec.label.clone(),
                value: String::new(),
                required: spec.required,
            });
        }
        Self { entries }
    }

    /// Update a field value. Unknown names are ignored and report `false`.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => {
                entry.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn entries(&self) -> &[FieldEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filled_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_filled()).count()
    }

    /// Share of fields holding a non-blank value. An empty registry counts as 0.
    pub fn completion_ratio(&self) -> f32 {
        if self.entries.is_empty() {
            return 0.0;
        }
        self.filled_count() as f32 / self.entries.len() as f32
    }

    /// Names of required fields still blank, in declaration order.
    pub fn missing_required(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.required && !entry.is_filled())
            .map(|entry| entry.name.as_str())
            .collect()
    }

    pub fn clear_values(&mut self) {
        for entry in &mut self.entries {
            entry.value.clear();
        }
    }
}
