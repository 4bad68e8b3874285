//! Raw GPML document structure, as deserialized by `quick-xml`.
//!
//! Attribute values are kept as strings here. Conversion into typed values
//! happens in the reader so that errors can name the element and attribute
//! they came from.

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Pathway {
    #[serde(rename = "@Name", default)]
    pub name: Option<String>,
    #[serde(rename = "@Organism", default)]
    pub organism: Option<String>,
    #[serde(rename = "@Author", default)]
    pub author: Option<String>,
    #[serde(rename = "@Maintainer", default)]
    pub maintainer: Option<String>,
    #[serde(rename = "@Email", default)]
    pub email: Option<String>,
    #[serde(rename = "@Version", default)]
    pub version: Option<String>,
    #[serde(rename = "@Data-Source", default)]
    pub data_source: Option<String>,
    #[serde(rename = "@Last-Modified", default)]
    pub last_modified: Option<String>,
    #[serde(rename = "$value", default)]
    pub children: Vec<PathwayChild>,
}

#[derive(Debug, Deserialize)]
pub enum PathwayChild {
    Comment(Comment),
    Attribute(Attribute),
    Graphics(Graphics),
    DataNode(DataNode),
    State(State),
    #[serde(alias = "Line")]
    Interaction(Interaction),
    GraphicalLine(Interaction),
    Label(Label),
    Shape(Shape),
    Group(Group),
    // Biopax, InfoBox, Legend, ...
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Default, Deserialize)]
pub struct Comment {
    #[serde(rename = "@Source", default)]
    pub source: Option<String>,
    #[serde(rename = "$text", default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Attribute {
    #[serde(rename = "@Key")]
    pub key: String,
    #[serde(rename = "@Value", default)]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Xref {
    #[serde(rename = "@Database", default)]
    pub database: Option<String>,
    #[serde(rename = "@ID", default)]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Point {
    #[serde(rename = "@X", default)]
    pub x: Option<String>,
    #[serde(rename = "@Y", default)]
    pub y: Option<String>,
    #[serde(rename = "@GraphRef", default)]
    pub graph_ref: Option<String>,
    #[serde(rename = "@ArrowHead", default)]
    pub arrow_head: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Anchor {
    #[serde(rename = "@GraphId", default)]
    pub graph_id: Option<String>,
    #[serde(rename = "@Position", default)]
    pub position: Option<String>,
    #[serde(rename = "@Shape", default)]
    pub shape: Option<String>,
}

/// Every attribute any element's `Graphics` block may carry.
#[derive(Debug, Default, Deserialize)]
pub struct Graphics {
    #[serde(rename = "@CenterX", default)]
    pub center_x: Option<String>,
    #[serde(rename = "@CenterY", default)]
    pub center_y: Option<String>,
    #[serde(rename = "@RelX", default)]
    pub rel_x: Option<String>,
    #[serde(rename = "@RelY", default)]
    pub rel_y: Option<String>,
    #[serde(rename = "@Width", default)]
    pub width: Option<String>,
    #[serde(rename = "@Height", default)]
    pub height: Option<String>,
    #[serde(rename = "@Color", default)]
    pub color: Option<String>,
    #[serde(rename = "@FillColor", default)]
    pub fill_color: Option<String>,
    #[serde(rename = "@FontName", default)]
    pub font_name: Option<String>,
    #[serde(rename = "@FontSize", default)]
    pub font_size: Option<String>,
    #[serde(rename = "@FontWeight", default)]
    pub font_weight: Option<String>,
    #[serde(rename = "@FontStyle", default)]
    pub font_style: Option<String>,
    #[serde(rename = "@ZOrder", default)]
    pub z_order: Option<String>,
    #[serde(rename = "@LineThickness", default)]
    pub line_thickness: Option<String>,
    #[serde(rename = "@LineStyle", default)]
    pub line_style: Option<String>,
    #[serde(rename = "@ShapeType", default)]
    pub shape_type: Option<String>,
    #[serde(rename = "@Rotation", default)]
    pub rotation: Option<String>,
    #[serde(rename = "@BoardWidth", default)]
    pub board_width: Option<String>,
    #[serde(rename = "@BoardHeight", default)]
    pub board_height: Option<String>,
    #[serde(rename = "Point", default)]
    pub points: Vec<Point>,
    #[serde(rename = "Anchor", default)]
    pub anchors: Vec<Anchor>,
}

/// The parts every element type shares.
#[derive(Debug, Default)]
pub struct Common {
    pub graph_id: Option<String>,
    pub group_ref: Option<String>,
    pub comments: Vec<Comment>,
    pub attributes: Vec<Attribute>,
    pub graphics: Option<Graphics>,
}

/// Declares an element struct carrying the shared attributes and children
/// next to its own.
macro_rules! gpml_element {
    ($name:ident { $($(#[$meta:meta])* $field:ident: $ty:ty,)* }) => {
        #[derive(Debug, Default, Deserialize)]
        pub struct $name {
            #[serde(rename = "@GraphId", default)]
            pub graph_id: Option<String>,
            #[serde(rename = "@GroupRef", default)]
            pub group_ref: Option<String>,
            #[serde(rename = "Comment", default)]
            pub comments: Vec<Comment>,
            #[serde(rename = "Attribute", default)]
            pub attributes: Vec<Attribute>,
            #[serde(rename = "Graphics", default)]
            pub graphics: Option<Graphics>,
            $($(#[$meta])* pub $field: $ty,)*
        }

        impl $name {
            /// Move the shared parts out.
            pub fn take_common(&mut self) -> Common {
                Common {
                    graph_id: self.graph_id.take(),
                    group_ref: self.group_ref.take(),
                    comments: std::mem::take(&mut self.comments),
                    attributes: std::mem::take(&mut self.attributes),
                    graphics: self.graphics.take(),
                }
            }
        }
    };
}

gpml_element!(DataNode {
    #[serde(rename = "@TextLabel", default)]
    text_label: Option<String>,
    #[serde(rename = "@Type", default)]
    node_type: Option<String>,
    #[serde(rename = "Xref", default)]
    xref: Option<Xref>,
});

gpml_element!(State {
    #[serde(rename = "@GraphRef", default)]
    graph_ref: Option<String>,
    #[serde(rename = "@TextLabel", default)]
    text_label: Option<String>,
    #[serde(rename = "@StateType", default)]
    state_type: Option<String>,
    #[serde(rename = "Xref", default)]
    xref: Option<Xref>,
});

gpml_element!(Interaction {
    #[serde(rename = "Xref", default)]
    xref: Option<Xref>,
});

gpml_element!(Label {
    #[serde(rename = "@TextLabel", default)]
    text_label: Option<String>,
    #[serde(rename = "@Href", default)]
    href: Option<String>,
});

gpml_element!(Shape {
    #[serde(rename = "@TextLabel", default)]
    text_label: Option<String>,
});

gpml_element!(Group {
    #[serde(rename = "@GroupId", default)]
    group_id: Option<String>,
    #[serde(rename = "@Style", default)]
    style: Option<String>,
    #[serde(rename = "@TextLabel", default)]
    text_label: Option<String>,
});
