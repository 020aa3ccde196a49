// Single-row model input keyed by feature name
/// Feature values aligned with a model schema. The key set and order never
/// change after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// All features of `schema`, set to zero.
    pub fn zeros(schema: &[String]) -> Self {
        Self {
            names: schema.to_vec(),
            values: vec![0.0; schema.len()],
        }
    }

    /// Sets `name` if the schema has it. Returns whether it did.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.names.iter().position(|n| n == name) {
            Some(idx) => {
                self.values[idx] = value;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.values[idx])
    }

    #[cfg(test)]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Values in schema order, ready for inference.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }
}
