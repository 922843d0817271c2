/* Multi-valued form parameters as handed over by the request layer */

use std::collections::{BTreeMap, HashMap};

/* Key -> ordered raw values; iteration is in ascending key order */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    values: BTreeMap<String, Vec<String>>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    /* Replace all values of a key */
    pub fn insert<K, I, V>(&mut self, key: K, values: I)
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.values
            .insert(key.into(), values.into_iter().map(Into::into).collect());
    }

    /* Append one value to a key, keeping earlier values */
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.entry(key.into()).or_default().push(value.into());
    }

    /* Values of a key; keys without values read as absent */
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.values
            .get(key)
            .filter(|values| !values.is_empty())
            .map(Vec::as_slice)
    }

    /* Keys that carry at least one value, ascending */
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ParamMap {
    /* Repeated keys accumulate values in order */
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = ParamMap::new();
        for (key, value) in iter {
            params.append(key, value);
        }
        params
    }
}

impl From<BTreeMap<String, Vec<String>>> for ParamMap {
    fn from(values: BTreeMap<String, Vec<String>>) -> Self {
        Self { values }
    }
}

impl From<HashMap<String, Vec<String>>> for ParamMap {
    fn from(values: HashMap<String, Vec<String>>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}
