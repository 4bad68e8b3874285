//! Index from element ids to the places that refer to them.
//!
//! Reference fields hold a plain string id. The index is keyed by that
//! string, not by the target element, so it also records references whose
//! target does not exist (yet). Those are the dangling references that
//! [`PathwayModel::fix_references`](crate::PathwayModel::fix_references)
//! clears.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{
    element::{Element, ElementKey},
    property::StaticProperty,
};

/// A property that holds another element's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefField {
    /// The element an interaction starts at.
    StartElementRef,
    /// The element an interaction ends at.
    EndElementRef,
    /// The group an element belongs to.
    GroupRef,
    /// The data node a state is attached to.
    ParentRef,
}

impl RefField {
    /// Every reference field.
    pub const ALL: &'static [Self] = &[
        Self::StartElementRef,
        Self::EndElementRef,
        Self::GroupRef,
        Self::ParentRef,
    ];

    /// The static property backing this field.
    #[must_use]
    pub const fn property(self) -> StaticProperty {
        match self {
            Self::StartElementRef => StaticProperty::StartElementRef,
            Self::EndElementRef => StaticProperty::EndElementRef,
            Self::GroupRef => StaticProperty::GroupRef,
            Self::ParentRef => StaticProperty::ParentRef,
        }
    }

    /// The reference field backed by `property`, if it is one.
    #[must_use]
    pub const fn from_property(property: StaticProperty) -> Option<Self> {
        match property {
            StaticProperty::StartElementRef => Some(Self::StartElementRef),
            StaticProperty::EndElementRef => Some(Self::EndElementRef),
            StaticProperty::GroupRef => Some(Self::GroupRef),
            StaticProperty::ParentRef => Some(Self::ParentRef),
            _ => None,
        }
    }
}

/// One referring location: which element, and which of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefSite {
    /// The element holding the reference.
    pub element: ElementKey,
    /// The field holding the reference.
    pub field: RefField,
}

/// Reverse index of reference fields.
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    by_target: HashMap<String, BTreeSet<RefSite>>,
}

impl ReferenceIndex {
    /// Record that `site` refers to `target`.
    pub fn insert(&mut self, target: &str, site: RefSite) {
        self.by_target
            .entry(target.to_string())
            .or_default()
            .insert(site);
    }

    /// Forget that `site` refers to `target`.
    pub fn remove(&mut self, target: &str, site: RefSite) {
        if let Some(sites) = self.by_target.get_mut(target) {
            sites.remove(&site);
            if sites.is_empty() {
                self.by_target.remove(target);
            }
        }
    }

    /// Index every reference currently set on `element`.
    pub fn index_element(&mut self, element: &Element) {
        for (field, target) in element.references() {
            self.insert(
                target,
                RefSite {
                    element: element.key(),
                    field,
                },
            );
        }
    }

    /// Remove every reference currently set on `element` from the index.
    pub fn unindex_element(&mut self, element: &Element) {
        for (field, target) in element.references() {
            self.remove(
                target,
                RefSite {
                    element: element.key(),
                    field,
                },
            );
        }
    }

    /// The sites referring to `target`. Empty for unknown ids.
    #[must_use]
    pub fn referring(&self, target: &str) -> BTreeSet<RefSite> {
        self.by_target.get(target).cloned().unwrap_or_default()
    }

    /// Every id that something refers to.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.by_target.keys().map(String::as_str)
    }

    /// Whether nothing refers to anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::element::Properties;

    #[test]
    fn fields_map_to_properties_and_back() {
        for field in RefField::ALL {
            assert_eq!(RefField::from_property(field.property()), Some(*field));
        }
        assert_eq!(RefField::from_property(StaticProperty::CenterX), None);
    }

    #[test]
    fn indexes_and_unindexes_an_element() {
        let mut line = Element::interaction();
        line.set_start_element_ref(Some("a")).unwrap();
        line.set_end_element_ref(Some("b")).unwrap();

        let mut index = ReferenceIndex::default();
        index.index_element(&line);

        let sites = index.referring("a");
        assert_eq!(sites.len(), 1);
        assert!(sites.contains(&RefSite {
            element: line.key(),
            field: RefField::StartElementRef
        }));
        assert_eq!(index.targets().count(), 2);

        index.unindex_element(&line);
        assert!(index.is_empty());
        assert!(index.referring("a").is_empty());
    }

    #[test]
    fn same_target_from_two_fields() {
        let mut line = Element::interaction();
        line.set_start_element_ref(Some("a")).unwrap();
        line.set_end_element_ref(Some("a")).unwrap();

        let mut index = ReferenceIndex::default();
        index.index_element(&line);
        assert_eq!(index.referring("a").len(), 2);

        index.remove(
            "a",
            RefSite {
                element: line.key(),
                field: RefField::EndElementRef,
            },
        );
        assert_eq!(index.referring("a").len(), 1);
    }
}
