//! Whole-model validity checks.
//!
//! Property writes are checked one at a time as they happen; this module
//! checks the model as a whole before it is persisted, and reports every
//! problem it finds rather than stopping at the first.

use std::{fmt, sync::LazyLock};

use nonempty::NonEmpty;
use petgraph::{algo::tarjan_scc, graphmap::DiGraphMap};
use regex::Regex;

use crate::domain::{
    element::{Element, ElementKey, ElementType},
    model::PathwayModel,
    property::StaticProperty,
    reference::RefField,
};

static ELEMENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.:-]*$").expect("element id pattern is valid")
});

/// A single problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// A static property holds a value its schema rejects.
    InvalidProperty {
        /// The offending element.
        element: String,
        /// The property.
        property: StaticProperty,
        /// Why the value is rejected.
        reason: &'static str,
    },

    /// An element id that cannot be written as an XML id.
    MalformedId(String),

    /// A reference field whose target id is not in the model.
    DanglingReference {
        /// The referring element.
        element: String,
        /// The field holding the reference.
        field: RefField,
        /// The missing id.
        target: String,
    },

    /// A group reference pointing at an element that is not a group.
    NotAGroup {
        /// The referring element.
        element: String,
        /// The id of the non-group target.
        target: String,
    },

    /// A state attached to an element that is not a data node.
    NotADataNode {
        /// The referring state.
        element: String,
        /// The id of the target.
        target: String,
    },

    /// An anchor that cannot be placed on its line.
    InvalidAnchor {
        /// The line carrying the anchor.
        element: String,
        /// Why the anchor is rejected.
        reason: &'static str,
    },

    /// The metadata element carries an id, which GPML cannot store.
    PathwayId(String),

    /// Groups that (transitively) contain themselves.
    GroupCycle(Vec<String>),
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProperty {
                element,
                property,
                reason,
            } => write!(f, "{element}: {property} {reason}"),
            Self::MalformedId(id) => write!(f, "'{id}' is not a valid element id"),
            Self::DanglingReference {
                element,
                field,
                target,
            } => write!(f, "{element}: {field:?} refers to missing element '{target}'"),
            Self::NotAGroup { element, target } => {
                write!(f, "{element}: group reference '{target}' is not a group")
            }
            Self::NotADataNode { element, target } => {
                write!(f, "{element}: parent '{target}' is not a data node")
            }
            Self::InvalidAnchor { element, reason } => write!(f, "{element}: anchor {reason}"),
            Self::PathwayId(id) => write!(f, "the pathway element cannot have an id ('{id}')"),
            Self::GroupCycle(members) => write!(f, "groups nest cyclically: {}", members.join(" -> ")),
        }
    }
}

/// Every problem found in a model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    issues: NonEmpty<ValidationIssue>,
}

impl ValidationError {
    /// The problems found.
    #[must_use]
    pub const fn issues(&self) -> &NonEmpty<ValidationIssue> {
        &self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        let total = self.issues.len();
        write!(f, "validation failed with {total} issue(s): ")?;

        let displayed: Vec<String> = self
            .issues
            .iter()
            .take(MAX_DISPLAY)
            .map(ToString::to_string)
            .collect();
        let msg = displayed.join("; ");

        if total <= MAX_DISPLAY {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg}... (and {} more)", total - MAX_DISPLAY)
        }
    }
}

/// A human readable name for an element in messages.
pub(crate) fn describe(element: &Element) -> String {
    element.element_id().map_or_else(
        || format!("unnamed {}", element.element_type()),
        |id| format!("{} '{id}'", element.element_type()),
    )
}

/// Check every element of `model`.
///
/// # Errors
///
/// Returns all issues found, if any.
pub fn validate(model: &PathwayModel) -> Result<(), ValidationError> {
    let mut issues = Vec::new();

    for element in model.elements() {
        check_properties(element, &mut issues);

        for id in element.registered_ids() {
            if !ELEMENT_ID.is_match(id) {
                issues.push(ValidationIssue::MalformedId(id.to_string()));
            }
        }
        if element.is_pathway() {
            if let Some(id) = element.element_id() {
                issues.push(ValidationIssue::PathwayId(id.to_string()));
            }
        }
        check_anchors(element, &mut issues);

        for (field, target) in element.references() {
            match model.by_element_id(target) {
                None => issues.push(ValidationIssue::DanglingReference {
                    element: describe(element),
                    field,
                    target: target.to_string(),
                }),
                Some(referent)
                    if field == RefField::GroupRef
                        && referent.element_type() != ElementType::Group =>
                {
                    issues.push(ValidationIssue::NotAGroup {
                        element: describe(element),
                        target: target.to_string(),
                    });
                }
                Some(referent)
                    if field == RefField::ParentRef
                        && referent.element_type() != ElementType::DataNode =>
                {
                    issues.push(ValidationIssue::NotADataNode {
                        element: describe(element),
                        target: target.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    check_group_nesting(model, &mut issues);

    NonEmpty::from_vec(issues).map_or(Ok(()), |issues| Err(ValidationError { issues }))
}

fn check_properties(element: &Element, issues: &mut Vec<ValidationIssue>) {
    for property in element.element_type().properties() {
        let Ok(value) = element.property(*property) else {
            continue;
        };
        if let Err(reason) = property.property_type().check(&value) {
            issues.push(ValidationIssue::InvalidProperty {
                element: describe(element),
                property: *property,
                reason,
            });
        }
    }
}

fn check_anchors(element: &Element, issues: &mut Vec<ValidationIssue>) {
    for anchor in element.anchors() {
        if !(0.0..=1.0).contains(&anchor.position()) {
            issues.push(ValidationIssue::InvalidAnchor {
                element: describe(element),
                reason: "position must be between 0 and 1",
            });
        }
    }
}

/// Groups form a forest: a group may not be its own (transitive) member.
fn check_group_nesting(model: &PathwayModel, issues: &mut Vec<ValidationIssue>) {
    let mut graph: DiGraphMap<ElementKey, ()> = DiGraphMap::new();

    for group in model
        .elements()
        .filter(|e| e.element_type() == ElementType::Group)
    {
        graph.add_node(group.key());
        let parent = group
            .reference(RefField::GroupRef)
            .and_then(|id| model.by_element_id(id))
            .filter(|parent| parent.element_type() == ElementType::Group);
        if let Some(parent) = parent {
            graph.add_edge(group.key(), parent.key(), ());
        }
    }

    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|key| graph.contains_edge(*key, *key));
        if cyclic {
            let mut members: Vec<String> = component
                .iter()
                .filter_map(|key| model.get(*key))
                .map(describe)
                .collect();
            members.sort();
            issues.push(ValidationIssue::GroupCycle(members));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        element::{Anchor, Properties},
        values::{AnchorShape, DataNodeType, GroupStyle},
    };

    fn with_id(mut element: Element, id: &str) -> Element {
        element.set_element_id(Some(id.to_string()));
        element
    }

    #[test]
    fn default_model_is_valid() {
        assert_eq!(PathwayModel::new().validate(), Ok(()));
    }

    #[test]
    fn reports_dangling_references() {
        let mut model = PathwayModel::new();
        let mut line = Element::interaction();
        line.set_end_element_ref(Some("missing")).unwrap();
        model.add(line).unwrap();

        let err = model.validate().unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert!(matches!(
            err.issues().head,
            ValidationIssue::DanglingReference {
                field: RefField::EndElementRef,
                ..
            }
        ));

        model.fix_references();
        assert_eq!(model.validate(), Ok(()));
    }

    #[test]
    fn reports_malformed_ids() {
        let mut model = PathwayModel::new();
        model
            .add(with_id(Element::label("x"), "1 bad id"))
            .unwrap();

        let err = model.validate().unwrap_err();
        assert_eq!(
            err.issues().head,
            ValidationIssue::MalformedId("1 bad id".into())
        );
    }

    #[test]
    fn group_ref_must_point_at_a_group() {
        let mut model = PathwayModel::new();
        model
            .add(with_id(Element::data_node("a", DataNodeType::Protein), "a"))
            .unwrap();
        let mut b = with_id(Element::data_node("b", DataNodeType::Protein), "b");
        b.set_group_ref(Some("a")).unwrap();
        model.add(b).unwrap();

        let err = model.validate().unwrap_err();
        assert!(matches!(err.issues().head, ValidationIssue::NotAGroup { .. }));
    }

    #[test]
    fn detects_group_cycles() {
        let mut model = PathwayModel::new();
        let mut g1 = with_id(Element::group(GroupStyle::Group), "g1");
        g1.set_group_ref(Some("g2")).unwrap();
        let mut g2 = with_id(Element::group(GroupStyle::Group), "g2");
        g2.set_group_ref(Some("g1")).unwrap();
        model.add(g1).unwrap();
        model.add(g2).unwrap();

        let err = model.validate().unwrap_err();
        assert!(err
            .issues()
            .iter()
            .any(|issue| matches!(issue, ValidationIssue::GroupCycle(members) if members.len() == 2)));
    }

    #[test]
    fn pathway_id_is_reported() {
        let mut model = PathwayModel::new();
        model
            .pathway_mut()
            .set_element_id(Some("p".into()))
            .unwrap();
        let mut line = Element::interaction();
        line.set_start_element_ref(Some("p")).unwrap();
        model.add(line).unwrap();

        let err = model.validate().unwrap_err();
        assert_eq!(err.issues().len(), 1);
        assert_eq!(err.issues().head, ValidationIssue::PathwayId("p".into()));
    }

    #[test]
    fn anchors_are_checked() {
        let mut model = PathwayModel::new();
        let mut line = with_id(Element::interaction(), "l1");
        line.add_anchor(Anchor::new(Some("9an"), 0.5, AnchorShape::None))
            .unwrap();
        line.add_anchor(Anchor::new(None, 1.5, AnchorShape::Circle))
            .unwrap();
        model.add(line).unwrap();

        let err = model.validate().unwrap_err();
        assert_eq!(
            err.issues().iter().cloned().collect::<Vec<_>>(),
            vec![
                ValidationIssue::MalformedId("9an".into()),
                ValidationIssue::InvalidAnchor {
                    element: "Interaction 'l1'".into(),
                    reason: "position must be between 0 and 1",
                },
            ]
        );
    }

    #[test]
    fn state_parent_must_be_a_data_node() {
        let mut model = PathwayModel::new();
        model.add(with_id(Element::label("x"), "x")).unwrap();
        model
            .add(with_id(Element::data_node("a", DataNodeType::Protein), "a"))
            .unwrap();
        let mut good = Element::state("P");
        good.set_parent_ref(Some("a")).unwrap();
        model.add(good).unwrap();
        assert_eq!(model.validate(), Ok(()));

        let mut bad = Element::state("P");
        bad.set_parent_ref(Some("x")).unwrap();
        model.add(bad).unwrap();
        let err = model.validate().unwrap_err();
        assert_eq!(
            err.issues().head,
            ValidationIssue::NotADataNode {
                element: "unnamed State".into(),
                target: "x".into(),
            }
        );
    }

    #[test]
    fn display_truncates_long_lists() {
        let mut model = PathwayModel::new();
        for i in 0..7 {
            let mut line = Element::interaction();
            line.set_start_element_ref(Some(format!("missing{i}").as_str())).unwrap();
            model.add(line).unwrap();
        }

        let message = model.validate().unwrap_err().to_string();
        assert!(message.starts_with("validation failed with 7 issue(s)"));
        assert!(message.ends_with("(and 2 more)"));
    }
}
