//! Conversion of a deserialized document into a [`PathwayModel`].

use std::{
    collections::{HashMap, HashSet},
    str::FromStr,
};

use tracing::debug;

use super::{
    ConverterError, GpmlVersion,
    schema::{self, Common, PathwayChild},
};
use crate::domain::{
    element::{
        Anchor, Comment, DataNode, Element, ElementKind, Group, Label, Line, LinePoint,
        PathwayInfo, Rect, Shape, State, TextStyle, Waypoint,
    },
    model::{PathwayModel, generate_id},
    values::{Color, ParseValueError},
    xref::{DataSource, Xref},
};

/// Build a model from a deserialized document.
pub(super) fn convert(
    raw: schema::Pathway,
    version: GpmlVersion,
) -> Result<PathwayModel, ConverterError> {
    let scale = version.coordinate_scale();
    let group_ids = GroupIds::assign(&raw.children)?;

    let schema::Pathway {
        name,
        organism,
        author,
        maintainer,
        email,
        version: pathway_version,
        data_source,
        last_modified,
        children,
    } = raw;

    let mut info = PathwayInfo {
        organism,
        author,
        maintainer,
        email,
        version: pathway_version,
        source: data_source,
        last_modified,
        ..PathwayInfo::default()
    };
    if let Some(name) = name {
        info.title = name;
    }

    let mut pathway_comments = Vec::new();
    let mut pathway_attributes = Vec::new();
    let mut elements = Vec::new();
    let mut group_index = 0;

    for (index, child) in children.into_iter().enumerate() {
        match child {
            PathwayChild::Comment(comment) => pathway_comments.push(comment),
            PathwayChild::Attribute(attribute) => pathway_attributes.push(attribute),
            PathwayChild::Graphics(graphics) => {
                let attrs = Attrs::new("Pathway".to_string(), scale);
                let width = attrs.coordinate("BoardWidth", graphics.board_width.as_deref())?;
                let height = attrs.coordinate("BoardHeight", graphics.board_height.as_deref())?;
                info.board_width = width.unwrap_or(info.board_width);
                info.board_height = height.unwrap_or(info.board_height);
            }
            PathwayChild::DataNode(mut node) => {
                let common = node.take_common();
                let attrs = Attrs::for_element("DataNode", index, common.graph_id.as_deref(), scale);
                let graphics = common.graphics.as_ref();
                let payload = DataNode {
                    rect: attrs.rect(graphics)?,
                    text: attrs.text_style(graphics)?,
                    label: node.text_label.unwrap_or_default(),
                    fill_color: attrs.fill(graphics)?,
                    z_order: attrs.z_order(graphics)?,
                    node_type: attrs
                        .parsed("Type", node.node_type.as_deref())?
                        .unwrap_or_default(),
                    xref: xref(node.xref),
                    group_ref: group_ids.resolve(common.group_ref.clone()),
                };
                elements.push(finish(ElementKind::DataNode(payload), common));
            }
            PathwayChild::State(mut state) => {
                let common = state.take_common();
                let attrs = Attrs::for_element("State", index, common.graph_id.as_deref(), scale);
                let graphics = common.graphics.as_ref();
                let defaults = State::default();
                let payload = State {
                    rel_x: attrs
                        .number("RelX", graphics.and_then(|g| g.rel_x.as_deref()))?
                        .unwrap_or_default(),
                    rel_y: attrs
                        .number("RelY", graphics.and_then(|g| g.rel_y.as_deref()))?
                        .unwrap_or_default(),
                    width: attrs
                        .size("Width", graphics.and_then(|g| g.width.as_deref()))?
                        .map_or(defaults.width, |w| w / scale),
                    height: attrs
                        .size("Height", graphics.and_then(|g| g.height.as_deref()))?
                        .map_or(defaults.height, |h| h / scale),
                    text: attrs.text_style(graphics)?,
                    label: state.text_label.unwrap_or_default(),
                    fill_color: attrs.fill(graphics)?,
                    z_order: attrs.z_order(graphics)?,
                    shape_type: attrs
                        .parsed("ShapeType", graphics.and_then(|g| g.shape_type.as_deref()))?
                        .unwrap_or(defaults.shape_type),
                    state_type: state.state_type.filter(|t| !t.is_empty()),
                    xref: xref(state.xref),
                    parent_ref: non_empty(state.graph_ref),
                };
                elements.push(finish(ElementKind::State(payload), common));
            }
            PathwayChild::Interaction(mut line) => {
                let common = line.take_common();
                let (payload, common) =
                    convert_line("Interaction", index, scale, &group_ids, line.xref, common)?;
                elements.push(finish(ElementKind::Interaction(payload), common));
            }
            PathwayChild::GraphicalLine(mut line) => {
                let common = line.take_common();
                let (payload, common) =
                    convert_line("GraphicalLine", index, scale, &group_ids, None, common)?;
                elements.push(finish(ElementKind::GraphicalLine(payload), common));
            }
            PathwayChild::Label(mut label) => {
                let common = label.take_common();
                let attrs = Attrs::for_element("Label", index, common.graph_id.as_deref(), scale);
                let graphics = common.graphics.as_ref();
                let payload = Label {
                    rect: attrs.rect(graphics)?,
                    text: attrs.text_style(graphics)?,
                    label: label.text_label.unwrap_or_default(),
                    fill_color: attrs.fill(graphics)?,
                    z_order: attrs.z_order(graphics)?,
                    href: label.href,
                    group_ref: group_ids.resolve(common.group_ref.clone()),
                };
                elements.push(finish(ElementKind::Label(payload), common));
            }
            PathwayChild::Shape(mut shape) => {
                let common = shape.take_common();
                let attrs = Attrs::for_element("Shape", index, common.graph_id.as_deref(), scale);
                let graphics = common.graphics.as_ref();
                let payload = Shape {
                    rect: attrs.rect(graphics)?,
                    text: attrs.text_style(graphics)?,
                    label: shape.text_label.unwrap_or_default(),
                    fill_color: attrs.fill(graphics)?,
                    z_order: attrs.z_order(graphics)?,
                    shape_type: attrs
                        .parsed("ShapeType", graphics.and_then(|g| g.shape_type.as_deref()))?
                        .unwrap_or_default(),
                    rotation: attrs
                        .number("Rotation", graphics.and_then(|g| g.rotation.as_deref()))?
                        .unwrap_or_default(),
                    group_ref: group_ids.resolve(common.group_ref.clone()),
                };
                elements.push(finish(ElementKind::Shape(payload), common));
            }
            PathwayChild::Group(mut group) => {
                let mut common = group.take_common();
                let attrs = Attrs::for_element("Group", index, common.graph_id.as_deref(), scale);
                let payload = Group {
                    label: group.text_label.unwrap_or_default(),
                    style: attrs.parsed("Style", group.style.as_deref())?.unwrap_or_default(),
                    group_ref: group_ids.resolve(common.group_ref.clone()),
                };
                common.graph_id = group_ids.ids.get(group_index).cloned().flatten();
                group_index += 1;
                elements.push(finish(ElementKind::Group(payload), common));
            }
            PathwayChild::Unknown => debug!(index, "skipped unsupported element"),
        }
    }

    let mut pathway = Element::from_kind(ElementKind::Pathway(info));
    attach_annotations(&mut pathway, pathway_comments, pathway_attributes);

    let mut model = PathwayModel::new();
    for element in std::iter::once(pathway).chain(elements) {
        model
            .add(element)
            .map_err(|err| ConverterError::DuplicateId(err.source.id))?;
    }
    Ok(model)
}

/// Points, anchors and line style shared by interactions and graphical
/// lines. The first point is the start, the last the end, and any in
/// between are kept as waypoints.
fn convert_line(
    tag: &str,
    index: usize,
    scale: f64,
    group_ids: &GroupIds,
    raw_xref: Option<schema::Xref>,
    mut common: Common,
) -> Result<(Line, Common), ConverterError> {
    let attrs = Attrs::for_element(tag, index, common.graph_id.as_deref(), scale);
    let (points, anchors) = common
        .graphics
        .as_mut()
        .map(|g| (std::mem::take(&mut g.points), std::mem::take(&mut g.anchors)))
        .unwrap_or_default();
    let graphics = common.graphics.as_ref();

    let mut payload = Line {
        line_color: attrs
            .parsed("Color", graphics.and_then(|g| g.color.as_deref()))?
            .unwrap_or(Color::BLACK),
        line_thickness: attrs
            .size("LineThickness", graphics.and_then(|g| g.line_thickness.as_deref()))?
            .unwrap_or(1.0),
        line_style: attrs
            .parsed("LineStyle", graphics.and_then(|g| g.line_style.as_deref()))?
            .unwrap_or_default(),
        z_order: attrs.z_order(graphics)?,
        xref: xref(raw_xref),
        group_ref: group_ids.resolve(common.group_ref.clone()),
        ..Line::default()
    };

    if let Some((first, rest)) = points.split_first() {
        payload.start = attrs.point(first)?;
        if let Some((last, middle)) = rest.split_last() {
            payload.end = attrs.point(last)?;
            payload.waypoints = middle
                .iter()
                .map(|point| attrs.waypoint(point))
                .collect::<Result<_, _>>()?;
        }
    }
    payload.anchors = anchors
        .iter()
        .map(|anchor| attrs.anchor(anchor))
        .collect::<Result<_, _>>()?;

    Ok((payload, common))
}

/// Ids for groups, decided before any element is converted.
///
/// Older documents name groups by a `GroupId` that lives in its own
/// namespace. Groups become ordinary elements here, so a group id that
/// collides with another element's id is replaced, and every `GroupRef`
/// is rewritten to match.
#[derive(Debug, Default)]
struct GroupIds {
    /// The final id of each group, in document order.
    ids: Vec<Option<String>>,
    remap: HashMap<String, String>,
}

impl GroupIds {
    /// Fails if two groups claim the same `GroupId` or `GraphId`.
    fn assign(children: &[PathwayChild]) -> Result<Self, ConverterError> {
        let mut taken: HashSet<String> = children
            .iter()
            .flat_map(|child| {
                let (graph_id, graphics) = match child {
                    PathwayChild::DataNode(e) => (&e.graph_id, &e.graphics),
                    PathwayChild::State(e) => (&e.graph_id, &e.graphics),
                    PathwayChild::Interaction(e) | PathwayChild::GraphicalLine(e) => {
                        (&e.graph_id, &e.graphics)
                    }
                    PathwayChild::Label(e) => (&e.graph_id, &e.graphics),
                    PathwayChild::Shape(e) => (&e.graph_id, &e.graphics),
                    _ => (&None, &None),
                };
                let anchors = graphics
                    .iter()
                    .flat_map(|g| g.anchors.iter().map(|anchor| &anchor.graph_id));
                std::iter::once(graph_id).chain(anchors)
            })
            .filter_map(|id| id.clone().filter(|id| !id.is_empty()))
            .collect();

        let mut claimed: HashSet<String> = HashSet::new();
        let mut assigned = Self::default();
        for group in children.iter().filter_map(|child| match child {
            PathwayChild::Group(group) => Some(group),
            _ => None,
        }) {
            let graph_id = group.graph_id.as_ref().filter(|id| !id.is_empty());
            let group_id = group.group_id.as_ref().filter(|id| !id.is_empty());
            let aliases: HashSet<&String> = [group_id, graph_id].into_iter().flatten().collect();
            if let Some(alias) = aliases.iter().find(|alias| claimed.contains(**alias)) {
                return Err(ConverterError::DuplicateId((*alias).clone()));
            }
            claimed.extend(aliases.iter().map(|alias| (*alias).clone()));

            let Some(wanted) = graph_id.or(group_id) else {
                assigned.ids.push(None);
                continue;
            };
            let id = if taken.contains(wanted) {
                let fresh = generate_id(|candidate| taken.contains(candidate));
                debug!(from = %wanted, to = %fresh, "renamed colliding group id");
                fresh
            } else {
                wanted.clone()
            };
            for alias in aliases {
                if *alias != id {
                    assigned.remap.insert(alias.clone(), id.clone());
                }
            }
            taken.insert(id.clone());
            assigned.ids.push(Some(id));
        }
        Ok(assigned)
    }

    /// The final id a `GroupRef` points at. An empty reference is none.
    fn resolve(&self, group_ref: Option<String>) -> Option<String> {
        non_empty(group_ref).map(|id| self.remap.get(&id).cloned().unwrap_or(id))
    }
}

fn non_empty(id: Option<String>) -> Option<String> {
    id.filter(|id| !id.is_empty())
}

fn xref(raw: Option<schema::Xref>) -> Xref {
    raw.map_or_else(Xref::default, |raw| {
        Xref::new(
            raw.id.unwrap_or_default(),
            raw.database
                .as_deref()
                .and_then(DataSource::from_database_name),
        )
    })
}

fn finish(kind: ElementKind, common: Common) -> Element {
    let mut element = Element::from_kind(kind);
    element.replace_element_id(non_empty(common.graph_id));
    attach_annotations(&mut element, common.comments, common.attributes);
    element
}

fn attach_annotations(
    element: &mut Element,
    comments: Vec<schema::Comment>,
    attributes: Vec<schema::Attribute>,
) {
    element
        .comments_mut()
        .extend(comments.into_iter().map(|comment| Comment {
            source: comment.source,
            text: comment.text,
        }));
    for attribute in attributes {
        element.write_dynamic(&attribute.key, Some(&attribute.value));
    }
}

/// Parses the attributes of one element, naming it in errors.
struct Attrs {
    element: String,
    scale: f64,
}

impl Attrs {
    fn new(element: String, scale: f64) -> Self {
        Self { element, scale }
    }

    fn for_element(tag: &str, index: usize, graph_id: Option<&str>, scale: f64) -> Self {
        let element = graph_id.map_or_else(
            || format!("{tag} #{}", index + 1),
            |id| format!("{tag} '{id}'"),
        );
        Self::new(element, scale)
    }

    fn invalid(&self, attribute: &'static str, value: &str, reason: impl ToString) -> ConverterError {
        ConverterError::InvalidAttribute {
            element: self.element.clone(),
            attribute,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn number(&self, attribute: &'static str, value: Option<&str>) -> Result<Option<f64>, ConverterError> {
        let Some(value) = value else {
            return Ok(None);
        };
        match value.trim().parse::<f64>() {
            Ok(number) if number.is_finite() => Ok(Some(number)),
            Ok(_) => Err(self.invalid(attribute, value, "not a finite number")),
            Err(err) => Err(self.invalid(attribute, value, err)),
        }
    }

    /// A position or extent, converted to pixels.
    fn coordinate(&self, attribute: &'static str, value: Option<&str>) -> Result<Option<f64>, ConverterError> {
        Ok(self.number(attribute, value)?.map(|v| v / self.scale))
    }

    fn size(&self, attribute: &'static str, value: Option<&str>) -> Result<Option<f64>, ConverterError> {
        match self.number(attribute, value)? {
            Some(size) if size < 0.0 => Err(self.invalid(attribute, value.unwrap_or_default(), "negative")),
            size => Ok(size),
        }
    }

    fn parsed<T>(&self, attribute: &'static str, value: Option<&str>) -> Result<Option<T>, ConverterError>
    where
        T: FromStr<Err = ParseValueError>,
    {
        value
            .map(|v| v.parse().map_err(|err| self.invalid(attribute, v, err)))
            .transpose()
    }

    fn flag(
        &self,
        attribute: &'static str,
        value: Option<&str>,
        on: &str,
    ) -> Result<bool, ConverterError> {
        match value.map(str::trim) {
            None => Ok(false),
            Some(v) if v.eq_ignore_ascii_case(on) => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("Normal") => Ok(false),
            Some(v) => Err(self.invalid(attribute, v, format!("expected '{on}' or 'Normal'"))),
        }
    }

    fn rect(&self, graphics: Option<&schema::Graphics>) -> Result<Rect, ConverterError> {
        let Some(g) = graphics else {
            return Ok(Rect::default());
        };
        Ok(Rect {
            center_x: self.coordinate("CenterX", g.center_x.as_deref())?.unwrap_or_default(),
            center_y: self.coordinate("CenterY", g.center_y.as_deref())?.unwrap_or_default(),
            width: self
                .size("Width", g.width.as_deref())?
                .map(|w| w / self.scale)
                .unwrap_or_default(),
            height: self
                .size("Height", g.height.as_deref())?
                .map(|h| h / self.scale)
                .unwrap_or_default(),
        })
    }

    fn text_style(&self, graphics: Option<&schema::Graphics>) -> Result<TextStyle, ConverterError> {
        let mut style = TextStyle::default();
        let Some(g) = graphics else {
            return Ok(style);
        };
        if let Some(color) = self.parsed("Color", g.color.as_deref())? {
            style.color = color;
        }
        if let Some(name) = &g.font_name {
            style.font_name.clone_from(name);
        }
        if let Some(size) = self.size("FontSize", g.font_size.as_deref())? {
            style.font_size = size;
        }
        style.bold = self.flag("FontWeight", g.font_weight.as_deref(), "Bold")?;
        style.italic = self.flag("FontStyle", g.font_style.as_deref(), "Italic")?;
        Ok(style)
    }

    /// `Transparent`, or no fill at all, reads as `None`.
    fn fill(&self, graphics: Option<&schema::Graphics>) -> Result<Option<Color>, ConverterError> {
        match graphics.and_then(|g| g.fill_color.as_deref()) {
            None => Ok(None),
            Some(v) if v.trim().eq_ignore_ascii_case("Transparent") => Ok(None),
            Some(v) => self.parsed("FillColor", Some(v)),
        }
    }

    fn z_order(&self, graphics: Option<&schema::Graphics>) -> Result<i32, ConverterError> {
        let Some(value) = graphics.and_then(|g| g.z_order.as_deref()) else {
            return Ok(0);
        };
        value
            .trim()
            .parse()
            .map_err(|err| self.invalid("ZOrder", value, err))
    }

    fn point(&self, point: &schema::Point) -> Result<LinePoint, ConverterError> {
        Ok(LinePoint {
            x: self.coordinate("X", point.x.as_deref())?.unwrap_or_default(),
            y: self.coordinate("Y", point.y.as_deref())?.unwrap_or_default(),
            element_ref: non_empty(point.graph_ref.clone()),
            arrow_head: self
                .parsed("ArrowHead", point.arrow_head.as_deref())?
                .unwrap_or_default(),
        })
    }

    fn waypoint(&self, point: &schema::Point) -> Result<Waypoint, ConverterError> {
        Ok(Waypoint {
            x: self.coordinate("X", point.x.as_deref())?.unwrap_or_default(),
            y: self.coordinate("Y", point.y.as_deref())?.unwrap_or_default(),
        })
    }

    fn anchor(&self, anchor: &schema::Anchor) -> Result<Anchor, ConverterError> {
        let position = self
            .number("Position", anchor.position.as_deref())?
            .ok_or_else(|| self.invalid("Position", "", "missing"))?;
        let shape = self
            .parsed("Shape", anchor.shape.as_deref())?
            .unwrap_or_default();
        Ok(Anchor::new(
            anchor.graph_id.as_deref().filter(|id| !id.is_empty()),
            position,
            shape,
        ))
    }
}
