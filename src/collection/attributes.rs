//! Instance attributes of a collection handle.

use crate::connection::Params;
use crate::description::IdentifierSchema;
use serde_json::Value;

/// Attribute bag carried by every collection instance.
///
/// Names declared as identifiers in the collection schema get a dedicated,
/// ordered slot; anything else lands in an open extension map. Both are read
/// and written through the same [`get`](Self::get)/[`set`](Self::set) calls,
/// so hooks never need to know which kind of attribute they are touching.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    identifiers: Vec<(String, Option<Value>)>,
    extra: Params,
}

impl Attributes {
    /// Empty bag with one unset slot per declared identifier
    pub fn new(declared: &[IdentifierSchema]) -> Self {
        Self {
            identifiers: declared
                .iter()
                .map(|id| (id.var_name.clone(), None))
                .collect(),
            extra: Params::new(),
        }
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.identifiers.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.identifiers.iter().find(|(n, _)| n == name) {
            Some((_, value)) => value.as_ref(),
            None => self.extra.get(name),
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.identifiers.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = Some(value),
            None => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    /// Clear an attribute, returning its previous value. Declared identifier
    /// slots stay declared.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        match self.identifiers.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => slot.take(),
            None => self.extra.remove(name),
        }
    }

    /// Declared identifiers in schema order with their current values
    pub fn identifiers(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.identifiers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }

    /// Attributes that are not declared identifiers
    pub fn extra(&self) -> &Params {
        &self.extra
    }
}
