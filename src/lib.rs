//! Pathway diagram documents.
//!
//! A pathway is a set of typed [`Element`]s (data nodes, interactions,
//! labels, shapes and groups) plus one metadata element, held by a
//! [`PathwayModel`]. Elements refer to each other by element id; the model
//! indexes those references, reports changes to listeners, and can repair
//! references whose target has gone. Models are persisted as GPML.
//!
//! ```
//! use pathway::{DataNodeType, Element, PathwayModel, Properties};
//!
//! let mut model = PathwayModel::new();
//!
//! let mut insulin = Element::data_node("INS", DataNodeType::GeneProduct);
//! insulin.set_element_id(Some("ins".to_string()));
//! model.add(insulin).unwrap();
//!
//! let mut binding = Element::interaction();
//! binding.set_start_element_ref(Some("ins")).unwrap();
//! binding.set_end_element_ref(Some("insr")).unwrap();
//! model.add(binding).unwrap();
//!
//! // "insr" is not in the model
//! assert_eq!(model.fix_references(), 1);
//!
//! let xml = pathway::storage::gpml::write(&model, true).unwrap();
//! let reread = pathway::storage::gpml::read(&xml, true).unwrap();
//! assert_eq!(reread.fingerprint(), model.fingerprint());
//! ```

pub mod domain;
pub use domain::{
    Color, Config, DataNodeType, Element, ElementKey, ElementType, PathwayModel, Properties,
    PropertyError, PropertyValue, StaticProperty, ValidationError, Xref,
};

/// Persistence of pathway models.
pub mod storage;
pub use storage::{GpmlVersion, GpmlWriter, ReadError, WriteError};
