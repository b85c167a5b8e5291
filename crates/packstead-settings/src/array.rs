//! Named array values and their merge.
//!
//! An array is either a plain list of strings or an override block: a
//! map from build-target name (a builder kind such as `virtualbox-iso`) to
//! that target's own arrays. Lists replace wholesale on merge. Override
//! blocks merge per target, recursively, and carry one-sided targets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One named array value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayValue {
    List(Vec<String>),
    Overrides(BTreeMap<String, Arrays>),
}

impl ArrayValue {
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ArrayValue::List(items) => Some(items),
            ArrayValue::Overrides(_) => None,
        }
    }

    pub fn as_overrides(&self) -> Option<&BTreeMap<String, Arrays>> {
        match self {
            ArrayValue::Overrides(targets) => Some(targets),
            ArrayValue::List(_) => None,
        }
    }
}

impl From<Vec<String>> for ArrayValue {
    fn from(items: Vec<String>) -> Self {
        ArrayValue::List(items)
    }
}

/// The arrays of one template section, keyed by array name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arrays(BTreeMap<String, ArrayValue>);

impl Arrays {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, name: &str) -> Option<&ArrayValue> {
        self.0.get(name)
    }

    /// The string list stored under `name`, if it is a list.
    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(ArrayValue::as_list)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ArrayValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<ArrayValue> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArrayValue)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl FromIterator<(String, ArrayValue)> for Arrays {
    fn from_iter<T: IntoIterator<Item = (String, ArrayValue)>>(iter: T) -> Self {
        Arrays(iter.into_iter().collect())
    }
}

/// Merge `new` on top of `old`.
///
/// Names only in `old` survive, names in `new` win, except that two
/// override blocks under the same name are merged target by target.
pub fn merge_arrays(old: &Arrays, new: &Arrays) -> Arrays {
    if old.is_empty() {
        return new.clone();
    }
    if new.is_empty() {
        return old.clone();
    }
    let mut merged = old.clone();
    for (name, value) in &new.0 {
        let next = match (merged.0.get(name), value) {
            (Some(ArrayValue::Overrides(o)), ArrayValue::Overrides(n)) => {
                ArrayValue::Overrides(merge_overrides(o, n))
            }
            _ => value.clone(),
        };
        merged.0.insert(name.clone(), next);
    }
    merged
}

fn merge_overrides(
    old: &BTreeMap<String, Arrays>,
    new: &BTreeMap<String, Arrays>,
) -> BTreeMap<String, Arrays> {
    let mut merged = old.clone();
    for (target, arrays) in new {
        let next = match old.get(target) {
            Some(existing) => merge_arrays(existing, arrays),
            None => arrays.clone(),
        };
        merged.insert(target.clone(), next);
    }
    merged
}
