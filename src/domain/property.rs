//! Static property keys, their schema, and the values they hold.
//!
//! Every element type supports a fixed subset of [`StaticProperty`] keys.
//! Values move in and out of elements as [`PropertyValue`]s, which are
//! checked against the key's [`PropertyType`] before any write happens.

use std::fmt;

use crate::domain::{
    element::ElementType,
    values::{ArrowHead, Color, DataNodeType, GroupStyle, LineStyle, ShapeType},
    xref::Xref,
};

/// A schema-defined property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum StaticProperty {
    CenterX,
    CenterY,
    Width,
    Height,
    TextLabel,
    TextColor,
    FillColor,
    FontName,
    FontSize,
    Bold,
    Italic,
    ZOrder,
    DataNodeType,
    Xref,
    GroupRef,
    Href,
    ShapeType,
    Rotation,
    LineColor,
    LineThickness,
    LineStyle,
    StartX,
    StartY,
    EndX,
    EndY,
    StartElementRef,
    EndElementRef,
    StartArrowHead,
    EndArrowHead,
    GroupStyle,
    RelX,
    RelY,
    ParentRef,
    StateType,
    Title,
    Organism,
    Author,
    Maintainer,
    Email,
    Version,
    Source,
    LastModified,
    BoardWidth,
    BoardHeight,
}

impl StaticProperty {
    /// The schema type of this property.
    #[must_use]
    pub const fn property_type(self) -> PropertyType {
        match self {
            Self::CenterX
            | Self::CenterY
            | Self::StartX
            | Self::StartY
            | Self::EndX
            | Self::EndY
            | Self::RelX
            | Self::RelY
            | Self::Rotation => PropertyType::Coordinate,
            Self::Width
            | Self::Height
            | Self::FontSize
            | Self::LineThickness
            | Self::BoardWidth
            | Self::BoardHeight => PropertyType::Size,
            Self::TextLabel | Self::FontName | Self::Title => PropertyType::Text,
            Self::Href
            | Self::StateType
            | Self::Organism
            | Self::Author
            | Self::Maintainer
            | Self::Email
            | Self::Version
            | Self::Source
            | Self::LastModified => PropertyType::OptionalText,
            Self::TextColor | Self::LineColor => PropertyType::Color,
            Self::FillColor => PropertyType::OptionalColor,
            Self::Bold | Self::Italic => PropertyType::Bool,
            Self::ZOrder => PropertyType::Integer,
            Self::DataNodeType => PropertyType::DataNodeType,
            Self::Xref => PropertyType::Xref,
            Self::GroupRef | Self::StartElementRef | Self::EndElementRef | Self::ParentRef => {
                PropertyType::Reference
            }
            Self::ShapeType => PropertyType::ShapeType,
            Self::LineStyle => PropertyType::LineStyle,
            Self::StartArrowHead | Self::EndArrowHead => PropertyType::ArrowHead,
            Self::GroupStyle => PropertyType::GroupStyle,
        }
    }

    /// Whether changing this property moves, resizes, or reconnects the
    /// element.
    #[must_use]
    pub const fn affects_geometry(self) -> bool {
        matches!(
            self,
            Self::CenterX
                | Self::CenterY
                | Self::Width
                | Self::Height
                | Self::Rotation
                | Self::StartX
                | Self::StartY
                | Self::EndX
                | Self::EndY
                | Self::RelX
                | Self::RelY
                | Self::StartElementRef
                | Self::EndElementRef
                | Self::GroupRef
                | Self::ParentRef
        )
    }
}

impl fmt::Display for StaticProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The type and nullability of a static property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    /// A finite floating point position or angle.
    Coordinate,
    /// A finite, non-negative floating point extent.
    Size,
    /// A string; never null.
    Text,
    /// A string or null.
    OptionalText,
    /// A color; never null.
    Color,
    /// A color, or null for "transparent".
    OptionalColor,
    /// A boolean flag.
    Bool,
    /// An integer.
    Integer,
    /// A [`DataNodeType`].
    DataNodeType,
    /// A [`ShapeType`].
    ShapeType,
    /// An [`ArrowHead`].
    ArrowHead,
    /// A [`LineStyle`].
    LineStyle,
    /// A [`GroupStyle`].
    GroupStyle,
    /// A cross-reference.
    Xref,
    /// Another element's id, or null for "no reference".
    Reference,
}

impl PropertyType {
    /// Check that `value` is acceptable for a property of this type.
    ///
    /// # Errors
    ///
    /// Returns a human readable reason when the value is rejected.
    pub fn check(self, value: &PropertyValue) -> Result<(), &'static str> {
        match (self, value) {
            (Self::Coordinate, PropertyValue::Double(v)) if v.is_finite() => Ok(()),
            (Self::Coordinate, PropertyValue::Double(_)) => Err("must be a finite number"),
            (Self::Size, PropertyValue::Double(v)) if v.is_finite() && *v >= 0.0 => Ok(()),
            (Self::Size, PropertyValue::Double(_)) => {
                Err("must be a finite, non-negative number")
            }
            (Self::OptionalText | Self::OptionalColor | Self::Reference, PropertyValue::Null)
            | (Self::Text | Self::OptionalText, PropertyValue::Text(_))
            | (Self::Color | Self::OptionalColor, PropertyValue::Color(_))
            | (Self::Bool, PropertyValue::Bool(_))
            | (Self::Integer, PropertyValue::Integer(_))
            | (Self::DataNodeType, PropertyValue::DataNodeType(_))
            | (Self::ShapeType, PropertyValue::ShapeType(_))
            | (Self::ArrowHead, PropertyValue::ArrowHead(_))
            | (Self::LineStyle, PropertyValue::LineStyle(_))
            | (Self::GroupStyle, PropertyValue::GroupStyle(_))
            | (Self::Xref, PropertyValue::Xref(_)) => Ok(()),
            (Self::Reference, PropertyValue::Text(id)) if !id.is_empty() => Ok(()),
            (Self::Reference, PropertyValue::Text(_)) => Err("must be null or a non-empty id"),
            (_, PropertyValue::Null) => Err("must not be null"),
            _ => Err("has the wrong type"),
        }
    }
}

/// A value read from or written to a property.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// No value.
    Null,
    /// A floating point number.
    Double(f64),
    /// An integer.
    Integer(i32),
    /// A boolean.
    Bool(bool),
    /// A string.
    Text(String),
    /// A color.
    Color(Color),
    /// A data node type.
    DataNodeType(DataNodeType),
    /// A shape type.
    ShapeType(ShapeType),
    /// An arrow head.
    ArrowHead(ArrowHead),
    /// A line style.
    LineStyle(LineStyle),
    /// A group style.
    GroupStyle(GroupStyle),
    /// A cross-reference.
    Xref(Xref),
}

impl PropertyValue {
    /// Whether this is [`PropertyValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The contained string, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The contained number, if this is a double.
    #[must_use]
    pub const fn as_double(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<Xref> for PropertyValue {
    fn from(value: Xref) -> Self {
        Self::Xref(value)
    }
}

macro_rules! from_enum {
    ($($ty:ident),+) => {
        $(
            impl From<$ty> for PropertyValue {
                fn from(value: $ty) -> Self {
                    Self::$ty(value)
                }
            }
        )+
    };
}

from_enum!(DataNodeType, ShapeType, ArrowHead, LineStyle, GroupStyle);

impl<T> From<Option<T>> for PropertyValue
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// A key for the combined static-then-dynamic accessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    /// A schema-defined property.
    Static(StaticProperty),
    /// A free-form dynamic property.
    Dynamic(String),
}

impl From<StaticProperty> for PropertyKey {
    fn from(value: StaticProperty) -> Self {
        Self::Static(value)
    }
}

impl From<&str> for PropertyKey {
    fn from(value: &str) -> Self {
        Self::Dynamic(value.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(value: String) -> Self {
        Self::Dynamic(value)
    }
}

impl TryFrom<PropertyValue> for PropertyKey {
    type Error = PropertyError;

    /// Only text values name a (dynamic) property; any other kind of value
    /// is not a usable key.
    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        match value {
            PropertyValue::Text(key) => Ok(Self::Dynamic(key)),
            other => Err(PropertyError::InvalidKeyType(format!("{other:?}"))),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(property) => write!(f, "{property}"),
            Self::Dynamic(key) => write!(f, "{key:?}"),
        }
    }
}

/// Errors raised by the property accessors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    /// The value violates the property's type or nullability.
    #[error("invalid value for {property}: {reason} (got {value:?})")]
    Invalid {
        /// The property being written.
        property: PropertyKey,
        /// Why the value was rejected.
        reason: &'static str,
        /// The rejected value.
        value: PropertyValue,
    },

    /// The element type does not have this static property.
    #[error("{element_type} has no property {property}")]
    UnknownKey {
        /// The property requested.
        property: StaticProperty,
        /// The type of element it was requested on.
        element_type: ElementType,
    },

    /// A key that is neither a static property nor a string.
    #[error("property keys must be static properties or strings, got {0}")]
    InvalidKeyType(String),
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(StaticProperty::CenterX, PropertyValue::Double(-4.5); "negative coordinate")]
    #[test_case(StaticProperty::Width, PropertyValue::Double(0.0); "zero size")]
    #[test_case(StaticProperty::FillColor, PropertyValue::Null; "transparent fill")]
    #[test_case(StaticProperty::StartElementRef, PropertyValue::Null; "cleared reference")]
    #[test_case(StaticProperty::GroupRef, PropertyValue::Text("g1".into()); "reference")]
    #[test_case(StaticProperty::Organism, PropertyValue::Null; "optional text")]
    fn accepts(property: StaticProperty, value: PropertyValue) {
        assert_eq!(property.property_type().check(&value), Ok(()));
    }

    #[test_case(StaticProperty::CenterX, PropertyValue::Null; "null coordinate")]
    #[test_case(StaticProperty::CenterX, PropertyValue::Double(f64::NAN); "nan coordinate")]
    #[test_case(StaticProperty::Height, PropertyValue::Double(-1.0); "negative size")]
    #[test_case(StaticProperty::TextColor, PropertyValue::Null; "null color")]
    #[test_case(StaticProperty::TextLabel, PropertyValue::Integer(3); "wrong type")]
    #[test_case(StaticProperty::EndElementRef, PropertyValue::Text(String::new()); "empty reference")]
    fn rejects(property: StaticProperty, value: PropertyValue) {
        assert!(property.property_type().check(&value).is_err());
    }

    #[test]
    fn only_text_values_convert_to_keys() {
        assert_eq!(
            PropertyKey::try_from(PropertyValue::from("Hello")),
            Ok(PropertyKey::Dynamic("Hello".into()))
        );
        assert!(matches!(
            PropertyKey::try_from(PropertyValue::Double(1.0)),
            Err(PropertyError::InvalidKeyType(_))
        ));
    }

    #[test]
    fn options_convert_to_null() {
        assert_eq!(PropertyValue::from(None::<&str>), PropertyValue::Null);
        assert_eq!(PropertyValue::from(Some(2.0)), PropertyValue::Double(2.0));
    }
}
