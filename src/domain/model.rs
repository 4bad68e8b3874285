//! The in-memory pathway document.
//!
//! A [`PathwayModel`] owns its elements and keeps three derived structures
//! current as they change: the element id lookup, the reverse
//! [`ReferenceIndex`], and the listener registry. Attached elements are only
//! reachable mutably through [`ElementMut`], which routes every write past
//! those structures.

use std::{
    collections::{BTreeSet, HashMap, HashSet},
    fmt,
    ops::Deref,
    sync::atomic::{AtomicU64, Ordering},
};

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::domain::{
    element::{
        Anchor, Comment, Element, ElementKey, ElementKind, ElementType, LineError, Properties,
        Waypoint, dynamic_text,
    },
    event::{Change, ElementEvent, ListenerId, Listeners, ModelEvent},
    property::{PropertyError, PropertyKey, PropertyValue, StaticProperty},
    reference::{RefField, RefSite, ReferenceIndex},
    validate::{self, ValidationError},
};

static NEXT_MODEL_ID: AtomicU64 = AtomicU64::new(1);

/// Non-owning handle identifying a model, held by attached elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(u64);

impl ModelId {
    fn next() -> Self {
        Self(NEXT_MODEL_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model-{}", self.0)
    }
}

/// Coarse lifecycle state of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Nothing but the metadata element has ever been added.
    Empty,
    /// At least one other element has been added.
    Populated,
}

/// An element id that is already in use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("element id '{id}' is already in use")]
pub struct DuplicateIdError {
    /// The conflicting id.
    pub id: String,
}

/// Failure to add an element. The rejected element is handed back,
/// still detached.
#[derive(Debug, Error)]
#[error("could not add element: {source}")]
pub struct AddError {
    /// Why the element was rejected.
    pub source: DuplicateIdError,
    /// The element that was not added.
    pub element: Box<Element>,
}

impl AddError {
    /// Take back the rejected element.
    #[must_use]
    pub fn into_element(self) -> Element {
        *self.element
    }
}

/// Failure to remove an element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoveError {
    /// The metadata element can only be replaced, never removed.
    #[error("the pathway element cannot be removed")]
    IsPathway,

    /// No such element in this model.
    #[error("element {0} is not part of this model")]
    NotFound(ElementKey),
}

/// The result of a successful [`PathwayModel::add`].
#[derive(Debug)]
pub struct AddOutcome {
    /// Key of the added element.
    pub key: ElementKey,
    /// The previous metadata element, detached, when a new one replaced it.
    pub replaced: Option<Element>,
}

/// A pathway document.
#[derive(Debug)]
pub struct PathwayModel {
    id: ModelId,

    /// Element storage, keyed by internal key.
    elements: HashMap<ElementKey, Element>,

    /// Insertion order, which is also serialization order within a type.
    order: Vec<ElementKey>,

    /// Forward lookup from element id to key.
    ids: HashMap<String, ElementKey>,

    /// Reverse lookup from referenced id to referring fields.
    refs: ReferenceIndex,

    listeners: Listeners<ModelEvent>,

    /// The current metadata element.
    pathway: ElementKey,

    state: ModelState,
}

impl Default for PathwayModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PathwayModel {
    /// Create a model holding only a default metadata element.
    #[must_use]
    pub fn new() -> Self {
        let id = ModelId::next();
        let mut pathway = Element::new(ElementType::Pathway);
        pathway.set_owner(Some(id));
        let key = pathway.key();
        Self {
            id,
            elements: HashMap::from([(key, pathway)]),
            order: vec![key],
            ids: HashMap::new(),
            refs: ReferenceIndex::default(),
            listeners: Listeners::default(),
            pathway: key,
            state: ModelState::Empty,
        }
    }

    /// This model's handle.
    #[must_use]
    pub const fn id(&self) -> ModelId {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ModelState {
        self.state
    }

    /// Number of elements, including the metadata element.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the model holds nothing but its metadata element.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.len() <= 1
    }

    /// Add a detached element.
    ///
    /// Adding a metadata element replaces the current one, which is
    /// detached and handed back in the outcome.
    ///
    /// # Errors
    ///
    /// Fails if the element's id, or the id of one of its anchors, is
    /// already used in this model. The model is unchanged and the element is
    /// returned inside the error.
    pub fn add(&mut self, mut element: Element) -> Result<AddOutcome, AddError> {
        if let Some(id) = self.conflicting_id(&element) {
            return Err(AddError {
                source: DuplicateIdError { id },
                element: Box::new(element),
            });
        }

        let replaced = if element.is_pathway() {
            let old = self.pathway;
            let replaced = self.detach(old);
            self.listeners.dispatch(&ModelEvent::Deleted(old));
            replaced
        } else {
            self.state = ModelState::Populated;
            None
        };

        let key = element.key();
        element.set_owner(Some(self.id));
        for id in element.registered_ids() {
            self.ids.insert(id.to_string(), key);
        }
        self.refs.index_element(&element);
        if element.is_pathway() {
            self.pathway = key;
            self.order.insert(0, key);
        } else {
            self.order.push(key);
        }
        self.elements.insert(key, element);

        self.listeners.dispatch(&ModelEvent::Added(key));
        Ok(AddOutcome { key, replaced })
    }

    /// Remove an element, returning it detached.
    ///
    /// # Errors
    ///
    /// Fails for the current metadata element and for keys not in this
    /// model.
    pub fn remove(&mut self, key: ElementKey) -> Result<Element, RemoveError> {
        if key == self.pathway {
            return Err(RemoveError::IsPathway);
        }
        let element = self.detach(key).ok_or(RemoveError::NotFound(key))?;
        self.listeners.dispatch(&ModelEvent::Deleted(key));
        Ok(element)
    }

    /// The first id of `element` that is taken, either in this model or by
    /// another of the element's own ids. A metadata element may reuse the id
    /// of the one it replaces.
    fn conflicting_id(&self, element: &Element) -> Option<String> {
        let mut seen = HashSet::new();
        element
            .registered_ids()
            .find(|id| {
                !seen.insert(*id)
                    || self
                        .ids
                        .get(*id)
                        .is_some_and(|existing| !(element.is_pathway() && *existing == self.pathway))
            })
            .map(str::to_string)
    }

    fn detach(&mut self, key: ElementKey) -> Option<Element> {
        let mut element = self.elements.remove(&key)?;
        self.order.retain(|k| *k != key);
        for id in element.registered_ids() {
            if self.ids.get(id) == Some(&key) {
                self.ids.remove(id);
            }
        }
        self.refs.unindex_element(&element);
        element.set_owner(None);
        Some(element)
    }

    /// Look up an element by key.
    #[must_use]
    pub fn get(&self, key: ElementKey) -> Option<&Element> {
        self.elements.get(&key)
    }

    /// Look up an element by its element id. An anchor id finds the line
    /// carrying the anchor.
    #[must_use]
    pub fn by_element_id(&self, id: &str) -> Option<&Element> {
        self.ids.get(id).and_then(|key| self.elements.get(key))
    }

    /// Whether `id` is registered to some element.
    #[must_use]
    pub fn contains_element_id(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    /// Edit an attached element.
    pub fn element_mut(&mut self, key: ElementKey) -> Option<ElementMut<'_>> {
        let element = self.elements.get_mut(&key)?;
        Some(ElementMut {
            element,
            ids: &mut self.ids,
            refs: &mut self.refs,
            listeners: &self.listeners,
        })
    }

    /// Edit an attached element found by its element id.
    pub fn by_element_id_mut(&mut self, id: &str) -> Option<ElementMut<'_>> {
        let key = *self.ids.get(id)?;
        self.element_mut(key)
    }

    /// All elements in insertion order, metadata element first.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.order.iter().filter_map(|key| self.elements.get(key))
    }

    /// All elements in document order, each type in insertion order:
    /// metadata, data nodes, states, interactions, graphical lines, labels,
    /// shapes, then groups.
    #[must_use]
    pub fn document_order(&self) -> Vec<&Element> {
        let mut elements: Vec<_> = self.elements().collect();
        elements.sort_by_key(|e| type_rank(e.element_type()));
        elements
    }

    /// The metadata element.
    #[must_use]
    pub fn pathway(&self) -> &Element {
        &self.elements[&self.pathway]
    }

    /// Edit the metadata element.
    pub fn pathway_mut(&mut self) -> ElementMut<'_> {
        let key = self.pathway;
        let element = self
            .elements
            .get_mut(&key)
            .unwrap_or_else(|| unreachable!("the pathway element is always present"));
        ElementMut {
            element,
            ids: &mut self.ids,
            refs: &mut self.refs,
            listeners: &self.listeners,
        }
    }

    /// Set or clear an attached element's id.
    ///
    /// References holding the old id are left as they are.
    ///
    /// # Errors
    ///
    /// Fails if another element already uses `id`; nothing changes.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not part of this model.
    pub fn set_element_id(
        &mut self,
        key: ElementKey,
        id: Option<String>,
    ) -> Result<(), DuplicateIdError> {
        self.element_mut(key)
            .unwrap_or_else(|| panic!("element {key} is not part of this model"))
            .set_element_id(id)
    }

    /// Generate an element id not used by, or referred to from, any element
    /// of this model.
    #[must_use]
    pub fn unique_element_id(&self) -> String {
        generate_id(|candidate| {
            self.ids.contains_key(candidate) || !self.refs.referring(candidate).is_empty()
        })
    }

    /// The reference fields currently holding `id`.
    #[must_use]
    pub fn referring_objects(&self, id: &str) -> BTreeSet<RefSite> {
        self.refs.referring(id)
    }

    /// Clear every reference field whose target id is not registered in
    /// this model. Returns the number of fields cleared.
    #[instrument(skip(self), fields(model = %self.id))]
    pub fn fix_references(&mut self) -> usize {
        let dangling: Vec<(String, RefSite)> = self
            .refs
            .targets()
            .filter(|target| !self.ids.contains_key(*target))
            .flat_map(|target| {
                self.refs
                    .referring(target)
                    .into_iter()
                    .map(move |site| (target.to_string(), site))
            })
            .collect();

        let mut cleared = 0;
        for (target, site) in dangling {
            let Some(mut element) = self.element_mut(site.element) else {
                continue;
            };
            if element
                .set_property(site.field.property(), PropertyValue::Null)
                .is_ok()
            {
                debug!(element = %site.element, field = ?site.field, %target, "cleared dangling reference");
                cleared += 1;
            }
        }
        cleared
    }

    /// Register a document-level listener.
    pub fn add_listener(&mut self, listener: impl Fn(&ModelEvent) + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Remove a document-level listener.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Run the static-property validity checks over the whole model.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate::validate(self)
    }

    /// A SHA-256 fingerprint of the document content.
    ///
    /// Covers element ids, static and dynamic properties, and comments, in
    /// document order. Internal keys and listeners are not part of it, so a
    /// model and its reloaded copy share a fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        #[derive(BorshSerialize)]
        struct Canonical<'a> {
            element_id: Option<&'a str>,
            kind: &'a ElementKind,
            comments: &'a [Comment],
            dynamic: Vec<(&'a str, &'a str)>,
        }

        let canonical: Vec<_> = self
            .document_order()
            .into_iter()
            .map(|element| Canonical {
                element_id: element.element_id(),
                kind: element.kind(),
                comments: element.comments(),
                dynamic: element.dynamic_properties().collect(),
            })
            .collect();

        // encode using [borsh](https://github.com/near/borsh-rs)
        let encoded = borsh::to_vec(&canonical).expect("this should never fail");

        let hash = Sha256::digest(encoded);
        format!("{hash:x}")
    }
}

/// A random element id for which `is_taken` returns `false`.
pub(crate) fn generate_id(is_taken: impl Fn(&str) -> bool) -> String {
    loop {
        let token = Uuid::new_v4().simple().to_string();
        let candidate = format!("id{}", &token[..8]);
        if !is_taken(&candidate) {
            return candidate;
        }
    }
}

const fn type_rank(element_type: ElementType) -> u8 {
    match element_type {
        ElementType::Pathway => 0,
        ElementType::DataNode => 1,
        ElementType::State => 2,
        ElementType::Interaction => 3,
        ElementType::GraphicalLine => 4,
        ElementType::Label => 5,
        ElementType::Shape => 6,
        ElementType::Group => 7,
    }
}

/// Mutable access to an attached element.
///
/// Reads go straight to the [`Element`] (through `Deref`). Writes update the
/// model's id and reference indexes, then notify the element's listeners
/// followed by the model's.
#[derive(Debug)]
pub struct ElementMut<'a> {
    element: &'a mut Element,
    ids: &'a mut HashMap<String, ElementKey>,
    refs: &'a mut ReferenceIndex,
    listeners: &'a Listeners<ModelEvent>,
}

impl ElementMut<'_> {
    /// Write a static property.
    ///
    /// # Errors
    ///
    /// See [`Element::set_property`].
    pub fn set_property(
        &mut self,
        property: StaticProperty,
        value: impl Into<PropertyValue>,
    ) -> Result<(), PropertyError> {
        let field = RefField::from_property(property);
        let previous = field.and_then(|f| self.element.reference(f).map(str::to_string));

        self.element.write_property(property, value.into())?;

        if let Some(field) = field {
            let site = RefSite {
                element: self.element.key(),
                field,
            };
            if let Some(previous) = previous {
                self.refs.remove(&previous, site);
            }
            if let Some(current) = self.element.reference(field) {
                self.refs.insert(current, site);
            }
        }

        self.notify(Change::Property(PropertyKey::Static(property)));
        Ok(())
    }

    /// Write or remove a dynamic property.
    pub fn set_dynamic_property(&mut self, key: &str, value: Option<&str>) {
        self.element.write_dynamic(key, value);
        self.notify(Change::Property(PropertyKey::Dynamic(key.to_string())));
    }

    /// Write a property by combined key.
    ///
    /// # Errors
    ///
    /// See [`Element::set_property_ex`].
    pub fn set_property_ex(
        &mut self,
        key: PropertyKey,
        value: impl Into<PropertyValue>,
    ) -> Result<(), PropertyError> {
        match key {
            PropertyKey::Static(property) => self.set_property(property, value),
            PropertyKey::Dynamic(key) => {
                let text = dynamic_text(&key, value.into())?;
                self.set_dynamic_property(&key, text.as_deref());
                Ok(())
            }
        }
    }

    /// Set or clear the element id.
    ///
    /// References holding the old id are left as they are.
    ///
    /// # Errors
    ///
    /// Fails if another element, or one of this element's anchors, already
    /// uses `id`; nothing changes.
    pub fn set_element_id(&mut self, id: Option<String>) -> Result<(), DuplicateIdError> {
        let key = self.element.key();
        if let Some(id) = &id {
            let taken = self.ids.get(id).is_some_and(|owner| *owner != key)
                || self
                    .element
                    .anchors()
                    .iter()
                    .any(|anchor| anchor.element_id() == Some(id));
            if taken {
                return Err(DuplicateIdError { id: id.clone() });
            }
            self.ids.insert(id.clone(), key);
        }
        if let Some(old) = self.element.replace_element_id(id) {
            if Some(old.as_str()) != self.element.element_id() {
                self.ids.remove(&old);
            }
        }

        self.notify(Change::ElementId);
        Ok(())
    }

    /// Attach an anchor to the line, registering its id.
    ///
    /// # Errors
    ///
    /// Fails if the element is not a line or the anchor's id is already used
    /// in the model; nothing changes.
    pub fn add_anchor(&mut self, anchor: Anchor) -> Result<(), LineError> {
        let id = anchor.element_id().map(str::to_string);
        if let Some(id) = &id {
            if self.ids.contains_key(id) {
                return Err(DuplicateIdError { id: id.clone() }.into());
            }
        }
        self.element.insert_anchor(anchor)?;
        if let Some(id) = id {
            self.ids.insert(id, self.element.key());
        }
        self.notify(Change::Anchors);
        Ok(())
    }

    /// Remove the anchor with the given id and release the id.
    ///
    /// References to the anchor are left dangling.
    pub fn remove_anchor(&mut self, id: &str) -> Option<Anchor> {
        let anchor = self.element.take_anchor(id)?;
        if self.ids.get(id) == Some(&self.element.key()) {
            self.ids.remove(id);
        }
        self.notify(Change::Anchors);
        Some(anchor)
    }

    /// Replace the line's intermediate points.
    ///
    /// # Errors
    ///
    /// Fails if the element is not a line.
    pub fn set_waypoints(&mut self, waypoints: Vec<Waypoint>) -> Result<(), LineError> {
        self.element.replace_waypoints(waypoints)?;
        self.notify(Change::Waypoints);
        Ok(())
    }

    /// Attach a comment.
    pub fn add_comment(&mut self, comment: Comment) {
        self.element.add_comment(comment);
    }

    /// Register a listener on the element.
    pub fn add_listener(&mut self, listener: impl Fn(&ElementEvent) + 'static) -> ListenerId {
        self.element.add_listener(listener)
    }

    /// Remove a listener from the element.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.element.remove_listener(id)
    }

    fn notify(&self, change: Change) {
        let event = self.element.emit(change);
        self.listeners.dispatch(&ModelEvent::Modified(event));
    }
}

impl Deref for ElementMut<'_> {
    type Target = Element;

    fn deref(&self) -> &Self::Target {
        self.element
    }
}

impl Properties for ElementMut<'_> {
    fn set_property(
        &mut self,
        property: StaticProperty,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        Self::set_property(self, property, value)
    }

    fn set_dynamic_property(&mut self, key: &str, value: Option<&str>) {
        Self::set_dynamic_property(self, key, value);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::domain::values::{AnchorShape, DataNodeType};

    fn node(id: &str) -> Element {
        let mut node = Element::data_node(id, DataNodeType::GeneProduct);
        node.set_element_id(Some(id.to_string()));
        node
    }

    fn recorded(model: &mut PathwayModel) -> Rc<RefCell<Vec<ModelEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        model.add_listener(move |e| sink.borrow_mut().push(e.clone()));
        events
    }

    #[test]
    fn new_model_has_a_pathway() {
        let model = PathwayModel::new();
        assert_eq!(model.len(), 1);
        assert!(model.pathway().is_pathway());
        assert_eq!(model.pathway().model(), Some(model.id()));
        assert_eq!(model.state(), ModelState::Empty);
    }

    #[test]
    fn duplicate_id_is_rejected_and_element_returned() {
        let mut model = PathwayModel::new();
        model.add(node("a")).unwrap();

        let err = model.add(node("a")).unwrap_err();
        assert_eq!(err.source.id, "a");

        let rejected = err.into_element();
        assert_eq!(rejected.model(), None);
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn second_pathway_replaces_the_first() {
        let mut model = PathwayModel::new();
        let first = model.pathway().key();
        let events = recorded(&mut model);

        let outcome = model.add(Element::pathway("second")).unwrap();

        let replaced = outcome.replaced.unwrap();
        assert_eq!(replaced.key(), first);
        assert_eq!(replaced.model(), None);
        assert_eq!(model.pathway().key(), outcome.key);
        assert_eq!(model.len(), 1);
        assert_eq!(
            *events.borrow(),
            vec![ModelEvent::Deleted(first), ModelEvent::Added(outcome.key)]
        );
        assert_eq!(
            model.remove(outcome.key).unwrap_err(),
            RemoveError::IsPathway
        );
    }

    #[test]
    fn remove_and_re_add() {
        let mut model = PathwayModel::new();
        let key = model.add(node("a")).unwrap().key;
        let events = recorded(&mut model);

        let element = model.remove(key).unwrap();
        assert_eq!(element.model(), None);
        assert!(!model.contains_element_id("a"));
        assert_eq!(model.remove(key).unwrap_err(), RemoveError::NotFound(key));

        model.add(element).unwrap();
        assert_eq!(
            *events.borrow(),
            vec![ModelEvent::Deleted(key), ModelEvent::Added(key)]
        );
        assert_eq!(model.state(), ModelState::Populated);
    }

    #[test]
    fn referring_objects_follow_reference_changes() {
        let mut model = PathwayModel::new();
        model.add(node("X")).unwrap();
        let mut line = Element::interaction();
        line.set_start_element_ref(Some("X")).unwrap();
        let line = model.add(line).unwrap().key;

        let expected = RefSite {
            element: line,
            field: RefField::StartElementRef,
        };
        assert!(model.referring_objects("X").contains(&expected));

        model
            .element_mut(line)
            .unwrap()
            .set_start_element_ref(Some("Y"))
            .unwrap();
        assert!(model.referring_objects("X").is_empty());
        assert!(model.referring_objects("Y").contains(&expected));
        assert!(model.referring_objects("unknown").is_empty());
    }

    #[test]
    fn fix_references_clears_dangling_fields() {
        let mut model = PathwayModel::new();
        model.add(node("a")).unwrap();
        let mut line = Element::interaction();
        line.set_start_element_ref(Some("a")).unwrap();
        let line = model.add(line).unwrap().key;

        assert_eq!(model.fix_references(), 0);

        model
            .element_mut(line)
            .unwrap()
            .set_end_element_ref(Some("dangle"))
            .unwrap();
        assert_eq!(model.fix_references(), 1);
        assert_eq!(model.fix_references(), 0);

        let line = model.get(line).unwrap();
        assert_eq!(line.reference(RefField::StartElementRef), Some("a"));
        assert_eq!(line.reference(RefField::EndElementRef), None);
    }

    #[test]
    fn rename_does_not_cascade() {
        let mut model = PathwayModel::new();
        let target = model.add(node("a")).unwrap().key;
        let mut line = Element::interaction();
        line.set_start_element_ref(Some("a")).unwrap();
        model.add(line).unwrap();

        model.set_element_id(target, Some("b".into())).unwrap();

        assert!(model.by_element_id("a").is_none());
        assert_eq!(model.by_element_id("b").map(Element::key), Some(target));
        assert_eq!(model.referring_objects("a").len(), 1);
        assert_eq!(model.fix_references(), 1);
    }

    #[test]
    fn rename_to_taken_id_fails() {
        let mut model = PathwayModel::new();
        model.add(node("a")).unwrap();
        let b = model.add(node("b")).unwrap().key;

        let err = model.set_element_id(b, Some("a".into())).unwrap_err();
        assert_eq!(err.id, "a");
        assert_eq!(model.get(b).unwrap().element_id(), Some("b"));

        // renaming to its own id is a no-op
        model.set_element_id(b, Some("b".into())).unwrap();
        assert!(model.contains_element_id("b"));
    }

    #[test]
    fn unique_ids_do_not_collide() {
        let mut model = PathwayModel::new();
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let id = model.unique_element_id();
            assert!(seen.insert(id.clone()));
            model.add(node(&id)).unwrap();
        }
    }

    #[test]
    fn element_changes_reach_both_channels() {
        let mut model = PathwayModel::new();
        let key = model.add(node("a")).unwrap().key;
        let model_events = recorded(&mut model);

        let element_events = Rc::new(RefCell::new(0));
        let mut element = model.element_mut(key).unwrap();
        let sink = Rc::clone(&element_events);
        element.add_listener(move |_| *sink.borrow_mut() += 1);
        element.set_center_x(4.0).unwrap();

        assert_eq!(*element_events.borrow(), 1);
        assert_eq!(
            *model_events.borrow(),
            vec![ModelEvent::Modified(ElementEvent {
                element: key,
                change: Change::Property(PropertyKey::Static(StaticProperty::CenterX)),
            })]
        );
    }

    #[test]
    fn fingerprint_ignores_internal_keys() {
        let build = || {
            let mut model = PathwayModel::new();
            model.add(node("a")).unwrap();
            model.add(Element::label("hello")).unwrap();
            model
        };
        let a = build();
        let b = build();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = build();
        c.by_element_id_mut("a")
            .unwrap()
            .set_dynamic_property("k", Some("v"));
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn document_order_groups_by_type() {
        let mut model = PathwayModel::new();
        model.add(Element::label("l")).unwrap();
        model.add(Element::graphical_line()).unwrap();
        model.add(node("a")).unwrap();
        model.add(Element::interaction()).unwrap();
        model.add(Element::state("P")).unwrap();

        let types: Vec<_> = model
            .document_order()
            .into_iter()
            .map(Element::element_type)
            .collect();
        assert_eq!(
            types,
            vec![
                ElementType::Pathway,
                ElementType::DataNode,
                ElementType::State,
                ElementType::Interaction,
                ElementType::GraphicalLine,
                ElementType::Label
            ]
        );
    }

    fn anchored_line(id: &str, anchor: &str) -> Element {
        let mut line = Element::interaction();
        line.set_element_id(Some(id.to_string()));
        line.add_anchor(Anchor::new(Some(anchor), 0.5, AnchorShape::None))
            .unwrap();
        line
    }

    #[test]
    fn anchor_ids_are_registered_with_their_line() {
        let mut model = PathwayModel::new();
        let key = model.add(anchored_line("l1", "an1")).unwrap().key;

        assert_eq!(model.by_element_id("an1").map(Element::key), Some(key));

        let mut target = Element::interaction();
        target.set_end_element_ref(Some("an1")).unwrap();
        model.add(target).unwrap();
        assert_eq!(model.fix_references(), 0);

        let err = model.add(node("an1")).unwrap_err();
        assert_eq!(err.source.id, "an1");

        model.remove(key).unwrap();
        assert!(!model.contains_element_id("an1"));
        assert_eq!(model.fix_references(), 1);
    }

    #[test]
    fn anchor_id_clashing_with_an_element_is_rejected() {
        let mut model = PathwayModel::new();
        model.add(node("an1")).unwrap();

        let err = model.add(anchored_line("l1", "an1")).unwrap_err();
        assert_eq!(err.source.id, "an1");
        assert!(!model.contains_element_id("l1"));

        let line = model.add(anchored_line("l2", "an2")).unwrap().key;
        let mut line = model.element_mut(line).unwrap();
        assert_eq!(
            line.add_anchor(Anchor::new(Some("an1"), 0.1, AnchorShape::Circle)),
            Err(LineError::DuplicateId(DuplicateIdError { id: "an1".into() }))
        );
        assert_eq!(
            line.set_element_id(Some("an2".into())),
            Err(DuplicateIdError { id: "an2".into() })
        );
        assert_eq!(line.anchors().len(), 1);
    }

    #[test]
    fn anchor_edits_through_the_model_notify_and_reindex() {
        let mut model = PathwayModel::new();
        let key = model.add(anchored_line("l1", "an1")).unwrap().key;
        let events = recorded(&mut model);

        let mut line = model.element_mut(key).unwrap();
        line.add_anchor(Anchor::new(Some("an2"), 0.8, AnchorShape::LigandRound))
            .unwrap();
        assert!(line.remove_anchor("an1").is_some());
        assert!(line.remove_anchor("an1").is_none());
        line.set_waypoints(vec![Waypoint { x: 3.0, y: 4.0 }])
            .unwrap();

        assert!(!model.contains_element_id("an1"));
        assert!(model.contains_element_id("an2"));
        let changes: Vec<_> = events
            .borrow()
            .iter()
            .map(|event| match event {
                ModelEvent::Modified(event) => event.change.clone(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            changes,
            vec![Change::Anchors, Change::Anchors, Change::Waypoints]
        );
    }
}
