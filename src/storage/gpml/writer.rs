//! Encoding of a [`PathwayModel`] as canonical GPML.

use std::io::{self, Cursor};

use quick_xml::{
    Writer,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
};

use super::GpmlVersion;
use crate::domain::{
    element::{Element, ElementKind, Line, LinePoint, PathwayInfo, Rect, TextStyle},
    model::PathwayModel,
    values::{ArrowHead, Color},
    xref::Xref,
};

type XmlWriter = Cursor<Vec<u8>>;
type Result<T> = io::Result<T>;

/// Encode `model`, including the XML declaration.
pub(super) fn write_model(model: &PathwayModel, indent: usize) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', indent);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let pathway = model.pathway();
    let info = pathway.as_pathway().cloned().unwrap_or_default();

    write_tag_start(&mut writer, "Pathway", &root_attributes(&info))?;
    write_annotations(&mut writer, pathway)?;
    let (width, height) = info.board_size();
    write_empty(
        &mut writer,
        "Graphics",
        &Attributes::default()
            .with("BoardWidth", width)
            .with("BoardHeight", height),
    )?;

    for element in model.document_order() {
        write_element(&mut writer, element)?;
    }

    write_tag_end(&mut writer, "Pathway")?;
    Ok(writer.into_inner().into_inner())
}

/// Attribute list of a tag, in output order.
#[derive(Debug, Default)]
struct Attributes(Vec<(&'static str, String)>);

impl Attributes {
    fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.0.push((key, value.to_string()));
        self
    }

    fn with_opt(self, key: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    fn start<'a>(&'a self, tag: &'a str) -> BytesStart<'a> {
        let mut start = BytesStart::new(tag);
        for (key, value) in &self.0 {
            start.push_attribute((*key, value.as_str()));
        }
        start
    }
}

fn write_tag_start(writer: &mut Writer<XmlWriter>, tag: &str, attrs: &Attributes) -> Result<()> {
    writer.write_event(Event::Start(attrs.start(tag)))
}

fn write_tag_end(writer: &mut Writer<XmlWriter>, tag: &str) -> Result<()> {
    writer.write_event(Event::End(BytesEnd::new(tag)))
}

fn write_empty(writer: &mut Writer<XmlWriter>, tag: &str, attrs: &Attributes) -> Result<()> {
    writer.write_event(Event::Empty(attrs.start(tag)))
}

fn write_tag_with_attrs(
    writer: &mut Writer<XmlWriter>,
    tag: &str,
    content: &str,
    attrs: &Attributes,
) -> Result<()> {
    write_tag_start(writer, tag, attrs)?;
    writer.write_event(Event::Text(BytesText::new(content)))?;
    write_tag_end(writer, tag)
}

fn root_attributes(info: &PathwayInfo) -> Attributes {
    Attributes::default()
        .with("xmlns", GpmlVersion::CANONICAL.namespace())
        .with("Name", &info.title)
        .with_opt("Organism", info.organism.as_ref())
        .with_opt("Author", info.author.as_ref())
        .with_opt("Maintainer", info.maintainer.as_ref())
        .with_opt("Email", info.email.as_ref())
        .with_opt("Version", info.version.as_ref())
        .with_opt("Data-Source", info.source.as_ref())
        .with_opt("Last-Modified", info.last_modified.as_ref())
}

/// Comments, then dynamic properties as `Attribute` children.
fn write_annotations(writer: &mut Writer<XmlWriter>, element: &Element) -> Result<()> {
    for comment in element.comments() {
        let attrs = Attributes::default().with_opt("Source", comment.source.as_ref());
        write_tag_with_attrs(writer, "Comment", &comment.text, &attrs)?;
    }
    for (key, value) in element.dynamic_properties() {
        write_empty(
            writer,
            "Attribute",
            &Attributes::default().with("Key", key).with("Value", value),
        )?;
    }
    Ok(())
}

fn has_annotations(element: &Element) -> bool {
    !element.comments().is_empty() || element.dynamic_properties().next().is_some()
}

fn write_xref(writer: &mut Writer<XmlWriter>, xref: &Xref) -> Result<()> {
    let database = xref.data_source().map_or("", |source| source.full_name());
    write_empty(
        writer,
        "Xref",
        &Attributes::default()
            .with("Database", database)
            .with("ID", xref.id()),
    )
}

fn fill(color: Option<Color>) -> String {
    color.map_or_else(|| "Transparent".to_string(), Color::to_hex)
}

fn box_graphics(rect: &Rect, text: &TextStyle, fill_color: Option<Color>) -> Attributes {
    Attributes::default()
        .with("CenterX", rect.center_x)
        .with("CenterY", rect.center_y)
        .with("Width", rect.width)
        .with("Height", rect.height)
        .with("Color", text.color)
        .with("FillColor", fill(fill_color))
        .with("FontName", &text.font_name)
        .with("FontSize", text.font_size)
        .with_opt("FontWeight", text.bold.then_some("Bold"))
        .with_opt("FontStyle", text.italic.then_some("Italic"))
}

fn point_attributes(point: &LinePoint) -> Attributes {
    Attributes::default()
        .with("X", point.x)
        .with("Y", point.y)
        .with_opt("GraphRef", point.element_ref.as_ref())
        .with_opt(
            "ArrowHead",
            (point.arrow_head != ArrowHead::Line).then_some(point.arrow_head),
        )
}

fn write_element(writer: &mut Writer<XmlWriter>, element: &Element) -> Result<()> {
    let id = element.element_id();

    match element.kind() {
        ElementKind::DataNode(node) => {
            let attrs = Attributes::default()
                .with_opt("GraphId", id)
                .with_opt("GroupRef", node.group_ref.as_ref())
                .with("TextLabel", &node.label)
                .with("Type", node.node_type);
            write_tag_start(writer, "DataNode", &attrs)?;
            write_annotations(writer, element)?;
            let graphics =
                box_graphics(&node.rect, &node.text, node.fill_color).with("ZOrder", node.z_order);
            write_empty(writer, "Graphics", &graphics)?;
            write_xref(writer, &node.xref)?;
            write_tag_end(writer, "DataNode")
        }
        ElementKind::Interaction(line) => write_line(writer, element, "Interaction", line),
        ElementKind::GraphicalLine(line) => write_line(writer, element, "GraphicalLine", line),
        ElementKind::State(state) => {
            let attrs = Attributes::default()
                .with_opt("GraphId", id)
                .with_opt("GraphRef", state.parent_ref.as_ref())
                .with("TextLabel", &state.label)
                .with_opt("StateType", state.state_type.as_ref());
            write_tag_start(writer, "State", &attrs)?;
            write_annotations(writer, element)?;
            let graphics = Attributes::default()
                .with("RelX", state.rel_x)
                .with("RelY", state.rel_y)
                .with("Width", state.width)
                .with("Height", state.height)
                .with("Color", state.text.color)
                .with("FillColor", fill(state.fill_color))
                .with("FontName", &state.text.font_name)
                .with("FontSize", state.text.font_size)
                .with_opt("FontWeight", state.text.bold.then_some("Bold"))
                .with_opt("FontStyle", state.text.italic.then_some("Italic"))
                .with("ShapeType", state.shape_type)
                .with("ZOrder", state.z_order);
            write_empty(writer, "Graphics", &graphics)?;
            write_xref(writer, &state.xref)?;
            write_tag_end(writer, "State")
        }
        ElementKind::Label(label) => {
            let attrs = Attributes::default()
                .with_opt("GraphId", id)
                .with_opt("GroupRef", label.group_ref.as_ref())
                .with("TextLabel", &label.label)
                .with_opt("Href", label.href.as_ref());
            write_tag_start(writer, "Label", &attrs)?;
            write_annotations(writer, element)?;
            let graphics = box_graphics(&label.rect, &label.text, label.fill_color)
                .with("ZOrder", label.z_order);
            write_empty(writer, "Graphics", &graphics)?;
            write_tag_end(writer, "Label")
        }
        ElementKind::Shape(shape) => {
            let attrs = Attributes::default()
                .with_opt("GraphId", id)
                .with_opt("GroupRef", shape.group_ref.as_ref())
                .with("TextLabel", &shape.label);
            write_tag_start(writer, "Shape", &attrs)?;
            write_annotations(writer, element)?;
            let graphics = box_graphics(&shape.rect, &shape.text, shape.fill_color)
                .with("ShapeType", shape.shape_type)
                .with("Rotation", shape.rotation)
                .with("ZOrder", shape.z_order);
            write_empty(writer, "Graphics", &graphics)?;
            write_tag_end(writer, "Shape")
        }
        ElementKind::Group(group) => {
            let attrs = Attributes::default()
                .with_opt("GroupId", id)
                .with_opt("GraphId", id)
                .with_opt("GroupRef", group.group_ref.as_ref())
                .with("Style", group.style)
                .with("TextLabel", &group.label);
            if has_annotations(element) {
                write_tag_start(writer, "Group", &attrs)?;
                write_annotations(writer, element)?;
                write_tag_end(writer, "Group")
            } else {
                write_empty(writer, "Group", &attrs)
            }
        }
        // Written as the document root.
        ElementKind::Pathway(_) => Ok(()),
    }
}

/// Start point, waypoints, end point, then anchors. Only interactions
/// carry an `Xref`.
fn write_line(
    writer: &mut Writer<XmlWriter>,
    element: &Element,
    tag: &str,
    line: &Line,
) -> Result<()> {
    let attrs = Attributes::default()
        .with_opt("GraphId", element.element_id())
        .with_opt("GroupRef", line.group_ref.as_ref());
    write_tag_start(writer, tag, &attrs)?;
    write_annotations(writer, element)?;

    let graphics = Attributes::default()
        .with("Color", line.line_color)
        .with("LineThickness", line.line_thickness)
        .with("LineStyle", line.line_style)
        .with("ZOrder", line.z_order);
    write_tag_start(writer, "Graphics", &graphics)?;
    write_empty(writer, "Point", &point_attributes(&line.start))?;
    for waypoint in &line.waypoints {
        write_empty(
            writer,
            "Point",
            &Attributes::default().with("X", waypoint.x).with("Y", waypoint.y),
        )?;
    }
    write_empty(writer, "Point", &point_attributes(&line.end))?;
    for anchor in &line.anchors {
        let attrs = Attributes::default()
            .with("Position", anchor.position())
            .with("Shape", anchor.shape())
            .with_opt("GraphId", anchor.element_id());
        write_empty(writer, "Anchor", &attrs)?;
    }
    write_tag_end(writer, "Graphics")?;

    if matches!(element.kind(), ElementKind::Interaction(_)) {
        write_xref(writer, &line.xref)?;
    }
    write_tag_end(writer, tag)
}
