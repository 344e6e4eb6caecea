use serde::{Deserialize, Serialize};

/// Named scalar statistics computed for one combination, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<(String, f64)>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a value; an existing name keeps its position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, f64)> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = (N, f64)>>(iter: I) -> Self {
        let mut diagnostics = Self::new();
        for (name, value) in iter {
            diagnostics.insert(name, value);
        }
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_order_and_replaces() {
        let mut d = Diagnostics::new().with("rmse", 1.5).with("mae", 1.0);
        d.insert("rmse", 1.2);
        let names: Vec<&str> = d.names().collect();
        assert_eq!(names, vec!["rmse", "mae"]);
        assert_eq!(d.get("rmse"), Some(1.2));
        assert_eq!(d.get("bias"), None);
    }

    #[test]
    fn collect_from_pairs() {
        let d: Diagnostics = vec![("a", 1.0), ("b", 2.0)].into_iter().collect();
        assert_eq!(d.len(), 2);
        assert_eq!(d.get("b"), Some(2.0));
    }
}
