//! Pathway elements.
//!
//! An [`Element`] is one node of the pathway graph. Its schema-defined
//! state lives in an [`ElementKind`] payload (one struct per element type),
//! and free-form string properties live in a separate dynamic store.
//!
//! Static properties are read and written by [`StaticProperty`] key. Each
//! payload declares which keys it carries; asking a payload for a key it
//! does not carry is an [`PropertyError::UnknownKey`].

use std::{collections::BTreeMap, fmt};

use borsh::BorshSerialize;
use uuid::Uuid;

use crate::domain::{
    event::{Change, ElementEvent, ListenerId, Listeners},
    model::{DuplicateIdError, ModelId},
    property::{PropertyError, PropertyKey, PropertyValue, StaticProperty},
    reference::RefField,
    values::{AnchorShape, ArrowHead, Color, DataNodeType, GroupStyle, LineStyle, ShapeType},
    xref::Xref,
};

/// Internal, stable identity of an element.
///
/// Unlike the optional, user-visible element id, every element has a key
/// from the moment it is constructed, and the key never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementKey(Uuid);

impl ElementKey {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed set of element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// A biological entity: gene product, metabolite, ...
    DataNode,
    /// A biological interaction drawn as a line between two elements.
    Interaction,
    /// A purely graphical line with no biological meaning.
    GraphicalLine,
    /// A state marker attached to a data node.
    State,
    /// Free text.
    Label,
    /// A graphical shape.
    Shape,
    /// A grouping of other elements.
    Group,
    /// The document metadata element.
    Pathway,
}

impl ElementType {
    /// The static properties an element of this type carries.
    #[must_use]
    pub const fn properties(self) -> &'static [StaticProperty] {
        match self {
            Self::DataNode => DataNode::PROPERTIES,
            Self::Interaction => Line::PROPERTIES,
            Self::GraphicalLine => Line::GRAPHICAL_PROPERTIES,
            Self::State => State::PROPERTIES,
            Self::Label => Label::PROPERTIES,
            Self::Shape => Shape::PROPERTIES,
            Self::Group => Group::PROPERTIES,
            Self::Pathway => PathwayInfo::PROPERTIES,
        }
    }

    /// Whether an element of this type carries `property`.
    #[must_use]
    pub fn supports(self, property: StaticProperty) -> bool {
        self.properties().contains(&property)
    }

    /// The element name used in the persisted format.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DataNode => "DataNode",
            Self::Interaction => "Interaction",
            Self::GraphicalLine => "GraphicalLine",
            Self::State => "State",
            Self::Label => "Label",
            Self::Shape => "Shape",
            Self::Group => "Group",
            Self::Pathway => "Pathway",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversion between a payload field and a [`PropertyValue`].
trait Field: Sized {
    fn to_value(&self) -> PropertyValue;
    fn from_value(value: PropertyValue) -> Option<Self>;
}

macro_rules! simple_field {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl Field for $ty {
                fn to_value(&self) -> PropertyValue {
                    PropertyValue::$variant(self.clone())
                }

                fn from_value(value: PropertyValue) -> Option<Self> {
                    match value {
                        PropertyValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )+
    };
}

simple_field! {
    f64 => Double,
    i32 => Integer,
    bool => Bool,
    String => Text,
    Color => Color,
    DataNodeType => DataNodeType,
    ShapeType => ShapeType,
    ArrowHead => ArrowHead,
    LineStyle => LineStyle,
    GroupStyle => GroupStyle,
    Xref => Xref,
}

impl Field for Option<String> {
    fn to_value(&self) -> PropertyValue {
        self.clone().map_or(PropertyValue::Null, PropertyValue::Text)
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Null => Some(None),
            PropertyValue::Text(text) => Some(Some(text)),
            _ => None,
        }
    }
}

impl Field for Option<Color> {
    fn to_value(&self) -> PropertyValue {
        self.map_or(PropertyValue::Null, PropertyValue::Color)
    }

    fn from_value(value: PropertyValue) -> Option<Self> {
        match value {
            PropertyValue::Null => Some(None),
            PropertyValue::Color(color) => Some(Some(color)),
            _ => None,
        }
    }
}

fn assign<T: Field>(slot: &mut T, value: PropertyValue) -> bool {
    T::from_value(value).map(|v| *slot = v).is_some()
}

/// Maps static property keys onto payload fields.
///
/// `set` returns `None` for keys the payload does not carry, and
/// `Some(false)` when the value has the wrong shape for the field.
macro_rules! property_fields {
    ($ty:ident { $($prop:ident => $($field:ident).+),+ $(,)? }) => {
        impl $ty {
            /// The static properties this payload carries.
            pub const PROPERTIES: &'static [StaticProperty] = &[$(StaticProperty::$prop),+];

            fn get(&self, property: StaticProperty) -> Option<PropertyValue> {
                match property {
                    $(StaticProperty::$prop => Some(Field::to_value(&self.$($field).+)),)+
                    _ => None,
                }
            }

            fn set(&mut self, property: StaticProperty, value: PropertyValue) -> Option<bool> {
                match property {
                    $(
                        StaticProperty::$prop => Some(assign(&mut self.$($field).+, value)),
                    )+
                    _ => None,
                }
            }
        }
    };
}

/// Position and size of a box-shaped element.
#[derive(Debug, Clone, Copy, PartialEq, Default, BorshSerialize)]
pub struct Rect {
    pub(crate) center_x: f64,
    pub(crate) center_y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
}

/// Font and color of an element's text.
#[derive(Debug, Clone, PartialEq, BorshSerialize)]
pub struct TextStyle {
    pub(crate) color: Color,
    pub(crate) font_name: String,
    pub(crate) font_size: f64,
    pub(crate) bold: bool,
    pub(crate) italic: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_name: "Arial".to_string(),
            font_size: 12.0,
            bold: false,
            italic: false,
        }
    }
}

/// One end of a line.
#[derive(Debug, Clone, PartialEq, Default, BorshSerialize)]
pub struct LinePoint {
    pub(crate) x: f64,
    pub(crate) y: f64,
    pub(crate) element_ref: Option<String>,
    pub(crate) arrow_head: ArrowHead,
}

/// An intermediate bend point of a line.
#[derive(Debug, Clone, Copy, PartialEq, Default, BorshSerialize)]
pub struct Waypoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// A point part way along a line that other lines can connect to.
///
/// An anchor's id lives in the same namespace as element ids, so lines may
/// refer to it with their start or end reference.
#[derive(Debug, Clone, PartialEq, BorshSerialize)]
pub struct Anchor {
    pub(crate) element_id: Option<String>,
    pub(crate) position: f64,
    pub(crate) shape: AnchorShape,
}

impl Anchor {
    /// An anchor at `position`, the fraction of the line's length from its
    /// start.
    #[must_use]
    pub fn new(element_id: Option<&str>, position: f64, shape: AnchorShape) -> Self {
        Self {
            element_id: element_id.map(str::to_string),
            position,
            shape,
        }
    }

    /// The anchor's id, if it has one.
    #[must_use]
    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// Fraction of the line's length from its start, between 0 and 1.
    #[must_use]
    pub const fn position(&self) -> f64 {
        self.position
    }

    /// The marker drawn at the anchor.
    #[must_use]
    pub const fn shape(&self) -> AnchorShape {
        self.shape
    }
}

/// Failure to change the anchors or points of a line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    /// Only interactions and graphical lines have anchors and points.
    #[error("{0} is not a line")]
    NotALine(ElementType),

    /// The anchor's id is already in use.
    #[error(transparent)]
    DuplicateId(#[from] DuplicateIdError),
}

/// Payload of a data node.
#[derive(Debug, Clone, PartialEq, Default, BorshSerialize)]
pub struct DataNode {
    pub(crate) rect: Rect,
    pub(crate) text: TextStyle,
    pub(crate) label: String,
    pub(crate) fill_color: Option<Color>,
    pub(crate) z_order: i32,
    pub(crate) node_type: DataNodeType,
    pub(crate) xref: Xref,
    pub(crate) group_ref: Option<String>,
}

property_fields!(DataNode {
    CenterX => rect.center_x,
    CenterY => rect.center_y,
    Width => rect.width,
    Height => rect.height,
    TextLabel => label,
    TextColor => text.color,
    FontName => text.font_name,
    FontSize => text.font_size,
    Bold => text.bold,
    Italic => text.italic,
    FillColor => fill_color,
    ZOrder => z_order,
    DataNodeType => node_type,
    Xref => xref,
    GroupRef => group_ref,
});

/// Payload shared by interactions and graphical lines.
#[derive(Debug, Clone, PartialEq, BorshSerialize)]
pub struct Line {
    pub(crate) start: LinePoint,
    pub(crate) end: LinePoint,
    pub(crate) waypoints: Vec<Waypoint>,
    pub(crate) anchors: Vec<Anchor>,
    pub(crate) line_color: Color,
    pub(crate) line_thickness: f64,
    pub(crate) line_style: LineStyle,
    pub(crate) z_order: i32,
    pub(crate) xref: Xref,
    pub(crate) group_ref: Option<String>,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            start: LinePoint::default(),
            end: LinePoint::default(),
            waypoints: Vec::new(),
            anchors: Vec::new(),
            line_color: Color::BLACK,
            line_thickness: 1.0,
            line_style: LineStyle::default(),
            z_order: 0,
            xref: Xref::default(),
            group_ref: None,
        }
    }
}

property_fields!(Line {
    StartX => start.x,
    StartY => start.y,
    EndX => end.x,
    EndY => end.y,
    StartElementRef => start.element_ref,
    EndElementRef => end.element_ref,
    StartArrowHead => start.arrow_head,
    EndArrowHead => end.arrow_head,
    LineColor => line_color,
    LineThickness => line_thickness,
    LineStyle => line_style,
    ZOrder => z_order,
    Xref => xref,
    GroupRef => group_ref,
});

impl Line {
    /// The static properties of a graphical line, which carries no
    /// cross-reference.
    pub const GRAPHICAL_PROPERTIES: &'static [StaticProperty] = &[
        StaticProperty::StartX,
        StaticProperty::StartY,
        StaticProperty::EndX,
        StaticProperty::EndY,
        StaticProperty::StartElementRef,
        StaticProperty::EndElementRef,
        StaticProperty::StartArrowHead,
        StaticProperty::EndArrowHead,
        StaticProperty::LineColor,
        StaticProperty::LineThickness,
        StaticProperty::LineStyle,
        StaticProperty::ZOrder,
        StaticProperty::GroupRef,
    ];
}

/// Payload of a state.
///
/// A state sits on the outline of its parent data node; its position is
/// relative to the parent's center, with -1 and 1 at the parent's edges.
#[derive(Debug, Clone, PartialEq, BorshSerialize)]
pub struct State {
    pub(crate) rel_x: f64,
    pub(crate) rel_y: f64,
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) text: TextStyle,
    pub(crate) label: String,
    pub(crate) fill_color: Option<Color>,
    pub(crate) z_order: i32,
    pub(crate) shape_type: ShapeType,
    pub(crate) state_type: Option<String>,
    pub(crate) xref: Xref,
    pub(crate) parent_ref: Option<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            rel_x: 0.0,
            rel_y: 0.0,
            width: 15.0,
            height: 15.0,
            text: TextStyle::default(),
            label: String::new(),
            fill_color: None,
            z_order: 0,
            shape_type: ShapeType::Rectangle,
            state_type: None,
            xref: Xref::default(),
            parent_ref: None,
        }
    }
}

property_fields!(State {
    RelX => rel_x,
    RelY => rel_y,
    Width => width,
    Height => height,
    TextLabel => label,
    TextColor => text.color,
    FontName => text.font_name,
    FontSize => text.font_size,
    Bold => text.bold,
    Italic => text.italic,
    FillColor => fill_color,
    ZOrder => z_order,
    ShapeType => shape_type,
    StateType => state_type,
    Xref => xref,
    ParentRef => parent_ref,
});

/// Payload of a label.
#[derive(Debug, Clone, PartialEq, Default, BorshSerialize)]
pub struct Label {
    pub(crate) rect: Rect,
    pub(crate) text: TextStyle,
    pub(crate) label: String,
    pub(crate) fill_color: Option<Color>,
    pub(crate) z_order: i32,
    pub(crate) href: Option<String>,
    pub(crate) group_ref: Option<String>,
}

property_fields!(Label {
    CenterX => rect.center_x,
    CenterY => rect.center_y,
    Width => rect.width,
    Height => rect.height,
    TextLabel => label,
    TextColor => text.color,
    FontName => text.font_name,
    FontSize => text.font_size,
    Bold => text.bold,
    Italic => text.italic,
    FillColor => fill_color,
    ZOrder => z_order,
    Href => href,
    GroupRef => group_ref,
});

/// Payload of a shape.
#[derive(Debug, Clone, PartialEq, Default, BorshSerialize)]
pub struct Shape {
    pub(crate) rect: Rect,
    pub(crate) text: TextStyle,
    pub(crate) label: String,
    pub(crate) fill_color: Option<Color>,
    pub(crate) z_order: i32,
    pub(crate) shape_type: ShapeType,
    pub(crate) rotation: f64,
    pub(crate) group_ref: Option<String>,
}

property_fields!(Shape {
    CenterX => rect.center_x,
    CenterY => rect.center_y,
    Width => rect.width,
    Height => rect.height,
    TextLabel => label,
    TextColor => text.color,
    FontName => text.font_name,
    FontSize => text.font_size,
    Bold => text.bold,
    Italic => text.italic,
    FillColor => fill_color,
    ZOrder => z_order,
    ShapeType => shape_type,
    Rotation => rotation,
    GroupRef => group_ref,
});

/// Payload of a group.
#[derive(Debug, Clone, PartialEq, Default, BorshSerialize)]
pub struct Group {
    pub(crate) label: String,
    pub(crate) style: GroupStyle,
    pub(crate) group_ref: Option<String>,
}

property_fields!(Group {
    TextLabel => label,
    GroupStyle => style,
    GroupRef => group_ref,
});

/// Payload of the document metadata element.
#[derive(Debug, Clone, PartialEq, BorshSerialize)]
pub struct PathwayInfo {
    pub(crate) title: String,
    pub(crate) organism: Option<String>,
    pub(crate) author: Option<String>,
    pub(crate) maintainer: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) source: Option<String>,
    pub(crate) last_modified: Option<String>,
    pub(crate) board_width: f64,
    pub(crate) board_height: f64,
}

impl Default for PathwayInfo {
    fn default() -> Self {
        Self {
            title: "untitled".to_string(),
            organism: None,
            author: None,
            maintainer: None,
            email: None,
            version: None,
            source: None,
            last_modified: None,
            board_width: 0.0,
            board_height: 0.0,
        }
    }
}

property_fields!(PathwayInfo {
    Title => title,
    Organism => organism,
    Author => author,
    Maintainer => maintainer,
    Email => email,
    Version => version,
    Source => source,
    LastModified => last_modified,
    BoardWidth => board_width,
    BoardHeight => board_height,
});

impl PathwayInfo {
    /// The pathway title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The Latin name of the organism, if set.
    #[must_use]
    pub fn organism(&self) -> Option<&str> {
        self.organism.as_deref()
    }

    /// Drawing board width and height.
    #[must_use]
    pub const fn board_size(&self) -> (f64, f64) {
        (self.board_width, self.board_height)
    }
}

/// The schema-defined state of an element, one variant per type.
#[derive(Debug, Clone, PartialEq, BorshSerialize)]
#[allow(missing_docs)]
pub enum ElementKind {
    DataNode(DataNode),
    Interaction(Line),
    GraphicalLine(Line),
    State(State),
    Label(Label),
    Shape(Shape),
    Group(Group),
    Pathway(PathwayInfo),
}

impl ElementKind {
    /// Default payload for an element type.
    #[must_use]
    pub fn new(element_type: ElementType) -> Self {
        match element_type {
            ElementType::DataNode => Self::DataNode(DataNode::default()),
            ElementType::Interaction => Self::Interaction(Line::default()),
            ElementType::GraphicalLine => Self::GraphicalLine(Line::default()),
            ElementType::State => Self::State(State::default()),
            ElementType::Label => Self::Label(Label::default()),
            ElementType::Shape => Self::Shape(Shape::default()),
            ElementType::Group => Self::Group(Group::default()),
            ElementType::Pathway => Self::Pathway(PathwayInfo::default()),
        }
    }

    /// The type of element this payload belongs to.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::DataNode(_) => ElementType::DataNode,
            Self::Interaction(_) => ElementType::Interaction,
            Self::GraphicalLine(_) => ElementType::GraphicalLine,
            Self::State(_) => ElementType::State,
            Self::Label(_) => ElementType::Label,
            Self::Shape(_) => ElementType::Shape,
            Self::Group(_) => ElementType::Group,
            Self::Pathway(_) => ElementType::Pathway,
        }
    }

    fn get(&self, property: StaticProperty) -> Option<PropertyValue> {
        match self {
            Self::DataNode(payload) => payload.get(property),
            Self::Interaction(payload) | Self::GraphicalLine(payload) => payload.get(property),
            Self::State(payload) => payload.get(property),
            Self::Label(payload) => payload.get(property),
            Self::Shape(payload) => payload.get(property),
            Self::Group(payload) => payload.get(property),
            Self::Pathway(payload) => payload.get(property),
        }
    }

    fn set(&mut self, property: StaticProperty, value: PropertyValue) -> Option<bool> {
        match self {
            Self::DataNode(payload) => payload.set(property, value),
            Self::Interaction(payload) | Self::GraphicalLine(payload) => {
                payload.set(property, value)
            }
            Self::State(payload) => payload.set(property, value),
            Self::Label(payload) => payload.set(property, value),
            Self::Shape(payload) => payload.set(property, value),
            Self::Group(payload) => payload.set(property, value),
            Self::Pathway(payload) => payload.set(property, value),
        }
    }
}

/// A free-text comment attached to an element.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize)]
pub struct Comment {
    /// Where the comment came from, if recorded.
    pub source: Option<String>,
    /// The comment text.
    pub text: String,
}

/// A single element of a pathway.
///
/// Elements are created detached, then moved into a
/// [`PathwayModel`](crate::PathwayModel). While attached they are edited
/// through [`ElementMut`](crate::domain::model::ElementMut) so that the
/// model can keep its identifier and reference indexes current.
#[derive(Debug)]
pub struct Element {
    key: ElementKey,
    element_id: Option<String>,
    kind: ElementKind,
    comments: Vec<Comment>,
    dynamic: BTreeMap<String, String>,
    listeners: Listeners<ElementEvent>,
    owner: Option<ModelId>,
}

impl Element {
    /// Create a detached element of the given type with default properties.
    #[must_use]
    pub fn new(element_type: ElementType) -> Self {
        Self::from_kind(ElementKind::new(element_type))
    }

    /// Create a detached element from an explicit payload.
    #[must_use]
    pub fn from_kind(kind: ElementKind) -> Self {
        Self {
            key: ElementKey::generate(),
            element_id: None,
            kind,
            comments: Vec::new(),
            dynamic: BTreeMap::new(),
            listeners: Listeners::default(),
            owner: None,
        }
    }

    /// Create a data node with a label and type.
    #[must_use]
    pub fn data_node(label: &str, node_type: DataNodeType) -> Self {
        Self::from_kind(ElementKind::DataNode(DataNode {
            label: label.to_string(),
            node_type,
            ..DataNode::default()
        }))
    }

    /// Create an unconnected interaction.
    #[must_use]
    pub fn interaction() -> Self {
        Self::new(ElementType::Interaction)
    }

    /// Create an unconnected graphical line.
    #[must_use]
    pub fn graphical_line() -> Self {
        Self::new(ElementType::GraphicalLine)
    }

    /// Create a state with the given label, not yet attached to a data
    /// node.
    #[must_use]
    pub fn state(label: &str) -> Self {
        Self::from_kind(ElementKind::State(State {
            label: label.to_string(),
            ..State::default()
        }))
    }

    /// Create a label with the given text.
    #[must_use]
    pub fn label(text: &str) -> Self {
        Self::from_kind(ElementKind::Label(Label {
            label: text.to_string(),
            ..Label::default()
        }))
    }

    /// Create a shape of the given type.
    #[must_use]
    pub fn shape(shape_type: ShapeType) -> Self {
        Self::from_kind(ElementKind::Shape(Shape {
            shape_type,
            ..Shape::default()
        }))
    }

    /// Create an empty group.
    #[must_use]
    pub fn group(style: GroupStyle) -> Self {
        Self::from_kind(ElementKind::Group(Group {
            style,
            ..Group::default()
        }))
    }

    /// Create a document metadata element.
    #[must_use]
    pub fn pathway(title: &str) -> Self {
        Self::from_kind(ElementKind::Pathway(PathwayInfo {
            title: title.to_string(),
            ..PathwayInfo::default()
        }))
    }

    /// The element's internal key.
    #[must_use]
    pub const fn key(&self) -> ElementKey {
        self.key
    }

    /// The element's type.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    /// The element's payload.
    #[must_use]
    pub const fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// Whether this is the document metadata element type.
    #[must_use]
    pub const fn is_pathway(&self) -> bool {
        matches!(self.kind, ElementKind::Pathway(_))
    }

    /// The element id, if one has been assigned.
    #[must_use]
    pub fn element_id(&self) -> Option<&str> {
        self.element_id.as_deref()
    }

    /// Set or clear the element id of a detached element.
    ///
    /// Uniqueness is checked when the element is added to a model. Attached
    /// elements are renamed through the model instead.
    pub fn set_element_id(&mut self, id: Option<String>) {
        self.element_id = id;
        self.emit(Change::ElementId);
    }

    /// The model this element is attached to, if any.
    #[must_use]
    pub const fn model(&self) -> Option<ModelId> {
        self.owner
    }

    /// Read a static property.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::UnknownKey`] if this element type does not
    /// carry `property`.
    pub fn property(&self, property: StaticProperty) -> Result<PropertyValue, PropertyError> {
        if !self.element_type().supports(property) {
            return Err(self.unknown_key(property));
        }
        self.kind
            .get(property)
            .ok_or_else(|| self.unknown_key(property))
    }

    /// Write a static property.
    ///
    /// The value is checked against the property's schema type first; an
    /// invalid value leaves the element untouched. On success an element
    /// event is delivered before this returns.
    ///
    /// # Errors
    ///
    /// - [`PropertyError::UnknownKey`] if this element type does not carry
    ///   `property`
    /// - [`PropertyError::Invalid`] if the value has the wrong type, is null
    ///   where null is not allowed, or is out of range
    pub fn set_property(
        &mut self,
        property: StaticProperty,
        value: impl Into<PropertyValue>,
    ) -> Result<(), PropertyError> {
        self.write_property(property, value.into())?;
        self.emit(Change::Property(PropertyKey::Static(property)));
        Ok(())
    }

    /// Read a dynamic property. Unknown keys read as `None`.
    #[must_use]
    pub fn dynamic_property(&self, key: &str) -> Option<&str> {
        self.dynamic.get(key).map(String::as_str)
    }

    /// Write (`Some`) or remove (`None`) a dynamic property.
    pub fn set_dynamic_property(&mut self, key: &str, value: Option<&str>) {
        self.write_dynamic(key, value);
        self.emit(Change::Property(PropertyKey::Dynamic(key.to_string())));
    }

    /// The dynamic property keys, in sorted order.
    pub fn dynamic_property_keys(&self) -> impl Iterator<Item = &str> {
        self.dynamic.keys().map(String::as_str)
    }

    /// All dynamic properties, sorted by key.
    pub fn dynamic_properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.dynamic.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Read a property by combined key: static keys go to the schema,
    /// string keys to the dynamic store.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::UnknownKey`] for a static key this element
    /// type does not carry.
    pub fn property_ex(&self, key: &PropertyKey) -> Result<PropertyValue, PropertyError> {
        match key {
            PropertyKey::Static(property) => self.property(*property),
            PropertyKey::Dynamic(key) => Ok(self
                .dynamic_property(key)
                .map_or(PropertyValue::Null, |v| PropertyValue::Text(v.to_string()))),
        }
    }

    /// Write a property by combined key.
    ///
    /// Dynamic values must be text (or null, which removes the key).
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Element::set_property`] for static keys,
    /// and [`PropertyError::Invalid`] for a non-text dynamic value.
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

    /// The value of a reference field, if this element type has that field
    /// and it is set.
    #[must_use]
    pub fn reference(&self, field: RefField) -> Option<&str> {
        let slot = match (&self.kind, field) {
            (
                ElementKind::Interaction(line) | ElementKind::GraphicalLine(line),
                RefField::StartElementRef,
            ) => &line.start.element_ref,
            (
                ElementKind::Interaction(line) | ElementKind::GraphicalLine(line),
                RefField::EndElementRef,
            ) => &line.end.element_ref,
            (ElementKind::State(state), RefField::ParentRef) => &state.parent_ref,
            (ElementKind::DataNode(p), RefField::GroupRef) => &p.group_ref,
            (
                ElementKind::Interaction(p) | ElementKind::GraphicalLine(p),
                RefField::GroupRef,
            ) => &p.group_ref,
            (ElementKind::Label(p), RefField::GroupRef) => &p.group_ref,
            (ElementKind::Shape(p), RefField::GroupRef) => &p.group_ref,
            (ElementKind::Group(p), RefField::GroupRef) => &p.group_ref,
            _ => return None,
        };
        slot.as_deref()
    }

    /// All reference fields that are currently set.
    pub fn references(&self) -> impl Iterator<Item = (RefField, &str)> {
        RefField::ALL
            .iter()
            .filter_map(|field| self.reference(*field).map(|id| (*field, id)))
    }

    /// The element's comments.
    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Attach a comment.
    pub fn add_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Register a listener for changes to this element.
    pub fn add_listener(&mut self, listener: impl Fn(&ElementEvent) + 'static) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Remove a listener. Returns `true` if it was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Produce a detached copy with the same static and dynamic properties.
    ///
    /// The copy gets a fresh key, no element id, no owner and no listeners.
    /// Anchors are copied without their ids.
    #[must_use]
    pub fn copy(&self) -> Self {
        let mut copy = Self::from_kind(self.kind.clone());
        copy.comments.clone_from(&self.comments);
        copy.dynamic.clone_from(&self.dynamic);
        if let Ok(line) = copy.line_mut() {
            for anchor in &mut line.anchors {
                anchor.element_id = None;
            }
        }
        copy
    }

    /// The label text of elements that have one.
    #[must_use]
    pub fn text_label(&self) -> Option<&str> {
        match &self.kind {
            ElementKind::DataNode(p) => Some(&p.label),
            ElementKind::Label(p) => Some(&p.label),
            ElementKind::Shape(p) => Some(&p.label),
            ElementKind::Group(p) => Some(&p.label),
            ElementKind::State(p) => Some(&p.label),
            ElementKind::Interaction(_) | ElementKind::GraphicalLine(_) | ElementKind::Pathway(_) => {
                None
            }
        }
    }

    /// The cross-reference of data nodes, states and interactions.
    #[must_use]
    pub const fn xref(&self) -> Option<&Xref> {
        match &self.kind {
            ElementKind::DataNode(p) => Some(&p.xref),
            ElementKind::State(p) => Some(&p.xref),
            ElementKind::Interaction(p) => Some(&p.xref),
            _ => None,
        }
    }

    /// The line's anchors; empty for elements that are not lines.
    #[must_use]
    pub fn anchors(&self) -> &[Anchor] {
        self.line().map_or(&[][..], |line| line.anchors.as_slice())
    }

    /// The line's intermediate points; empty for elements that are not
    /// lines.
    #[must_use]
    pub fn waypoints(&self) -> &[Waypoint] {
        self.line().map_or(&[][..], |line| line.waypoints.as_slice())
    }

    /// Every id a model registers for this element: its own id, then the
    /// ids of its anchors.
    pub fn registered_ids(&self) -> impl Iterator<Item = &str> {
        self.element_id()
            .into_iter()
            .chain(self.anchors().iter().filter_map(Anchor::element_id))
    }

    /// Attach an anchor to a detached line.
    ///
    /// # Errors
    ///
    /// Fails if this element is not a line, or the anchor's id is already
    /// used by this element or one of its anchors.
    pub fn add_anchor(&mut self, anchor: Anchor) -> Result<(), LineError> {
        self.insert_anchor(anchor)?;
        self.emit(Change::Anchors);
        Ok(())
    }

    /// Remove the anchor with the given id from a detached line.
    pub fn remove_anchor(&mut self, id: &str) -> Option<Anchor> {
        let anchor = self.take_anchor(id)?;
        self.emit(Change::Anchors);
        Some(anchor)
    }

    /// Replace a line's intermediate points.
    ///
    /// # Errors
    ///
    /// Fails if this element is not a line.
    pub fn set_waypoints(&mut self, waypoints: Vec<Waypoint>) -> Result<(), LineError> {
        self.replace_waypoints(waypoints)?;
        self.emit(Change::Waypoints);
        Ok(())
    }

    const fn line(&self) -> Option<&Line> {
        match &self.kind {
            ElementKind::Interaction(line) | ElementKind::GraphicalLine(line) => Some(line),
            _ => None,
        }
    }

    fn line_mut(&mut self) -> Result<&mut Line, LineError> {
        let element_type = self.element_type();
        match &mut self.kind {
            ElementKind::Interaction(line) | ElementKind::GraphicalLine(line) => Ok(line),
            _ => Err(LineError::NotALine(element_type)),
        }
    }

    pub(crate) fn insert_anchor(&mut self, anchor: Anchor) -> Result<(), LineError> {
        if let Some(id) = anchor.element_id() {
            if self.registered_ids().any(|taken| taken == id) {
                return Err(DuplicateIdError { id: id.to_string() }.into());
            }
        }
        self.line_mut()?.anchors.push(anchor);
        Ok(())
    }

    pub(crate) fn take_anchor(&mut self, id: &str) -> Option<Anchor> {
        let anchors = &mut self.line_mut().ok()?.anchors;
        let index = anchors.iter().position(|a| a.element_id() == Some(id))?;
        Some(anchors.remove(index))
    }

    pub(crate) fn replace_waypoints(&mut self, waypoints: Vec<Waypoint>) -> Result<(), LineError> {
        self.line_mut()?.waypoints = waypoints;
        Ok(())
    }

    /// The metadata payload, if this is a pathway element.
    #[must_use]
    pub const fn as_pathway(&self) -> Option<&PathwayInfo> {
        match &self.kind {
            ElementKind::Pathway(info) => Some(info),
            _ => None,
        }
    }

    pub(crate) fn write_property(
        &mut self,
        property: StaticProperty,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        if !self.element_type().supports(property) {
            return Err(self.unknown_key(property));
        }
        let invalid = |reason, value| PropertyError::Invalid {
            property: PropertyKey::Static(property),
            reason,
            value,
        };
        if let Err(reason) = property.property_type().check(&value) {
            return Err(invalid(reason, value));
        }
        match self.kind.set(property, value.clone()) {
            Some(true) => Ok(()),
            Some(false) => Err(invalid("has the wrong type", value)),
            None => Err(self.unknown_key(property)),
        }
    }

    pub(crate) fn write_dynamic(&mut self, key: &str, value: Option<&str>) {
        match value {
            Some(value) => {
                self.dynamic.insert(key.to_string(), value.to_string());
            }
            None => {
                self.dynamic.remove(key);
            }
        }
    }

    pub(crate) fn replace_element_id(&mut self, id: Option<String>) -> Option<String> {
        std::mem::replace(&mut self.element_id, id)
    }

    pub(crate) const fn set_owner(&mut self, owner: Option<ModelId>) {
        self.owner = owner;
    }

    pub(crate) fn comments_mut(&mut self) -> &mut Vec<Comment> {
        &mut self.comments
    }

    pub(crate) fn emit(&self, change: Change) -> ElementEvent {
        let event = ElementEvent {
            element: self.key,
            change,
        };
        self.listeners.dispatch(&event);
        event
    }

    fn unknown_key(&self, property: StaticProperty) -> PropertyError {
        PropertyError::UnknownKey {
            property,
            element_type: self.element_type(),
        }
    }
}

/// The text a dynamic property write stores; `None` removes the key.
pub(crate) fn dynamic_text(key: &str, value: PropertyValue) -> Result<Option<String>, PropertyError> {
    match value {
        PropertyValue::Text(text) => Ok(Some(text)),
        PropertyValue::Null => Ok(None),
        other => Err(PropertyError::Invalid {
            property: PropertyKey::Dynamic(key.to_string()),
            reason: "dynamic properties only hold text",
            value: other,
        }),
    }
}

/// Typed convenience accessors layered over
/// [`set_property`](Properties::set_property).
///
/// Implemented by detached [`Element`]s and by the
/// [`ElementMut`](crate::domain::model::ElementMut) handle used for attached
/// ones, so the same calls work in both states.
pub trait Properties {
    /// Write a static property.
    ///
    /// # Errors
    ///
    /// See [`Element::set_property`].
    fn set_property(
        &mut self,
        property: StaticProperty,
        value: PropertyValue,
    ) -> Result<(), PropertyError>;

    /// Write or remove a dynamic property.
    fn set_dynamic_property(&mut self, key: &str, value: Option<&str>);

    /// Set the horizontal center.
    ///
    /// # Errors
    ///
    /// Fails if the element has no center or `x` is not finite.
    fn set_center_x(&mut self, x: f64) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::CenterX, x.into())
    }

    /// Set the vertical center.
    ///
    /// # Errors
    ///
    /// Fails if the element has no center or `y` is not finite.
    fn set_center_y(&mut self, y: f64) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::CenterY, y.into())
    }

    /// Set width and height.
    ///
    /// # Errors
    ///
    /// Fails if the element has no size, or either extent is negative or
    /// not finite.
    fn set_size(&mut self, width: f64, height: f64) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::Width, width.into())?;
        self.set_property(StaticProperty::Height, height.into())
    }

    /// Set the label text.
    ///
    /// # Errors
    ///
    /// Fails if the element has no label.
    fn set_text_label(&mut self, text: &str) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::TextLabel, text.into())
    }

    /// Set the text color.
    ///
    /// # Errors
    ///
    /// Fails if the element has no text color.
    fn set_text_color(&mut self, color: Color) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::TextColor, color.into())
    }

    /// Set the fill color; `None` is transparent.
    ///
    /// # Errors
    ///
    /// Fails if the element has no fill.
    fn set_fill_color(&mut self, color: Option<Color>) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::FillColor, color.into())
    }

    /// Set the cross-reference.
    ///
    /// # Errors
    ///
    /// Fails if the element has no cross-reference.
    fn set_xref(&mut self, xref: Xref) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::Xref, xref.into())
    }

    /// Set the interaction's start coordinates.
    ///
    /// # Errors
    ///
    /// Fails if the element is not an interaction or a coordinate is not
    /// finite.
    fn set_start_point(&mut self, x: f64, y: f64) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::StartX, x.into())?;
        self.set_property(StaticProperty::StartY, y.into())
    }

    /// Set the interaction's end coordinates.
    ///
    /// # Errors
    ///
    /// Fails if the element is not an interaction or a coordinate is not
    /// finite.
    fn set_end_point(&mut self, x: f64, y: f64) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::EndX, x.into())?;
        self.set_property(StaticProperty::EndY, y.into())
    }

    /// Anchor (or detach, with `None`) the interaction's start.
    ///
    /// # Errors
    ///
    /// Fails if the element is not an interaction or the id is empty.
    fn set_start_element_ref(&mut self, id: Option<&str>) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::StartElementRef, id.into())
    }

    /// Anchor (or detach, with `None`) the interaction's end.
    ///
    /// # Errors
    ///
    /// Fails if the element is not an interaction or the id is empty.
    fn set_end_element_ref(&mut self, id: Option<&str>) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::EndElementRef, id.into())
    }

    /// Put the element into (or take it out of) a group.
    ///
    /// # Errors
    ///
    /// Fails for the metadata element, or if the id is empty.
    fn set_group_ref(&mut self, id: Option<&str>) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::GroupRef, id.into())
    }

    /// Attach (or detach, with `None`) a state to a data node.
    ///
    /// # Errors
    ///
    /// Fails if the element is not a state, or if the id is empty.
    fn set_parent_ref(&mut self, id: Option<&str>) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::ParentRef, id.into())
    }

    /// Set the organism of the metadata element.
    ///
    /// # Errors
    ///
    /// Fails if this is not the metadata element.
    fn set_organism(&mut self, organism: Option<&str>) -> Result<(), PropertyError> {
        self.set_property(StaticProperty::Organism, organism.into())
    }
}

impl Properties for Element {
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
