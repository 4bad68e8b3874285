//! The in-memory pathway model.
//!
//! This module contains the element and document types, the property
//! schema, change notification, validation, and configuration.

pub mod element;
pub use element::{
    Anchor, Comment, Element, ElementKey, ElementKind, ElementType, Line, LineError, Properties,
    Waypoint,
};

pub mod property;
pub use property::{PropertyError, PropertyKey, PropertyType, PropertyValue, StaticProperty};

pub mod values;
pub use values::{AnchorShape, ArrowHead, Color, DataNodeType, GroupStyle, LineStyle, ShapeType};

pub mod xref;
pub use xref::{DataSource, Organism, Xref, XrefResolver, XrefWithSymbol};

pub mod event;
pub use event::{Change, ElementEvent, ListenerId, ModelEvent};

pub mod reference;
pub use reference::{RefField, RefSite};

pub mod model;
pub use model::{
    AddError, AddOutcome, DuplicateIdError, ElementMut, ModelId, ModelState, PathwayModel,
    RemoveError,
};

pub mod validate;
pub use validate::{ValidationError, ValidationIssue};

pub mod compat;

mod config;
pub use config::{Config, EnsemblUpgrade};
