//! GPML, the XML persistence format for pathways.
//!
//! Four schema versions are recognised on read, by the namespace of the
//! root `Pathway` element. Documents are always written in the canonical
//! version, [`GpmlVersion::CANONICAL`].
//!
//! ```no_run
//! use pathway::storage::gpml;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = gpml::read_from_path("insulin.gpml".as_ref(), false)?;
//! let xml = gpml::write(&model, true)?;
//! # Ok(())
//! # }
//! ```

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use quick_xml::{Reader, events::Event};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{Config, PathwayModel, ValidationError};

mod reader;
mod schema;
mod writer;

/// The GPML schema versions this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GpmlVersion {
    /// The original GenMAPP-derived format. Coordinates are stored in
    /// fifteenths of a pixel and elements carry no attribute blocks.
    V2007,
    /// The first PathVisio format with pixel coordinates.
    V2008a,
    /// Adds interactions and anchors.
    V2010a,
    /// The current format.
    V2013a,
}

impl GpmlVersion {
    /// Every known version, oldest first.
    pub const ALL: &'static [Self] = &[Self::V2007, Self::V2008a, Self::V2010a, Self::V2013a];

    /// The version documents are written in.
    pub const CANONICAL: Self = Self::V2013a;

    /// The XML namespace of the root element.
    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::V2007 => "http://genmapp.org/GPML/2007",
            Self::V2008a => "http://genmapp.org/GPML/2008a",
            Self::V2010a => "http://pathvisio.org/GPML/2010a",
            Self::V2013a => "http://pathvisio.org/GPML/2013a",
        }
    }

    /// Look a version up by its root namespace.
    #[must_use]
    pub fn from_namespace(namespace: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|version| version.namespace() == namespace.trim())
    }

    /// Factor by which stored coordinates exceed pixels.
    #[must_use]
    pub const fn coordinate_scale(self) -> f64 {
        match self {
            Self::V2007 => 15.0,
            Self::V2008a | Self::V2010a | Self::V2013a => 1.0,
        }
    }

    /// The short version name, e.g. `2013a`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V2007 => "2007",
            Self::V2008a => "2008a",
            Self::V2010a => "2010a",
            Self::V2013a => "2013a",
        }
    }
}

impl fmt::Display for GpmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for GpmlVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A recognised document whose content could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConverterError {
    /// The document is not well-formed, or its structure does not match the
    /// schema.
    #[error("malformed document: {0}")]
    Xml(String),

    /// An attribute value could not be parsed.
    #[error("{element}: invalid {attribute} '{value}': {reason}")]
    InvalidAttribute {
        /// The element carrying the attribute.
        element: String,
        /// The attribute name.
        attribute: &'static str,
        /// The raw value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Two elements declare the same id.
    #[error("duplicate element id '{0}'")]
    DuplicateId(String),
}

/// Errors that can occur while reading a document.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The input is not a GPML document of any known version.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The input is GPML, but its content is broken.
    #[error(transparent)]
    Converter(#[from] ConverterError),

    /// The document loaded, but failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// Errors that can occur while writing a document.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Validation was requested and the model failed it. Nothing was
    /// written.
    #[error("refusing to write an invalid pathway: {0}")]
    Invalid(#[from] ValidationError),

    /// The XML encoder failed.
    #[error("failed to encode XML: {0}")]
    Xml(#[source] io::Error),

    /// The file could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        /// The file being written.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// Determine the schema version from the root element.
///
/// # Errors
///
/// Returns [`ReadError::UnsupportedFormat`] if the input is not XML, its
/// root is not `Pathway`, or the root namespace is unknown.
pub fn detect_version(text: &str) -> Result<GpmlVersion, ReadError> {
    let unsupported = ReadError::UnsupportedFormat;
    let mut reader = Reader::from_str(text);

    loop {
        match reader.read_event() {
            Ok(Event::Start(root) | Event::Empty(root)) => {
                if root.local_name().as_ref() != b"Pathway" {
                    let name = String::from_utf8_lossy(root.name().as_ref()).into_owned();
                    return Err(unsupported(format!("unexpected root element <{name}>")));
                }
                let namespace = root
                    .attributes()
                    .filter_map(Result::ok)
                    .find(|attr| attr.key.as_ref() == b"xmlns")
                    .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
                    .ok_or_else(|| unsupported("root element has no namespace".to_string()))?;
                return GpmlVersion::from_namespace(&namespace)
                    .ok_or_else(|| unsupported(format!("unknown namespace '{namespace}'")));
            }
            Ok(Event::Text(text)) if !text.iter().all(u8::is_ascii_whitespace) => {
                return Err(unsupported("text before the root element".to_string()));
            }
            Ok(Event::Eof) => return Err(unsupported("no root element".to_string())),
            Ok(_) => {}
            Err(err) => return Err(unsupported(format!("not XML: {err}"))),
        }
    }
}

/// Read a document, returning the model and the version it was stored in.
///
/// With `validate`, the loaded model must also pass
/// [`PathwayModel::validate`]. Dangling references are otherwise kept as
/// they are.
///
/// # Errors
///
/// See [`ReadError`].
#[instrument(skip(text), fields(len = text.len()))]
pub fn read_versioned(
    text: &str,
    validate: bool,
) -> Result<(PathwayModel, GpmlVersion), ReadError> {
    let version = detect_version(text)?;

    let raw: schema::Pathway =
        quick_xml::de::from_str(text).map_err(|err| ConverterError::Xml(err.to_string()))?;
    let model = reader::convert(raw, version)?;
    debug!(%version, elements = model.len(), "read pathway");

    if validate {
        model.validate()?;
    }
    Ok((model, version))
}

/// Read a document from a string.
///
/// # Errors
///
/// See [`ReadError`].
pub fn read(text: &str, validate: bool) -> Result<PathwayModel, ReadError> {
    read_versioned(text, validate).map(|(model, _)| model)
}

/// Read a document from a file.
///
/// # Errors
///
/// See [`ReadError`]. Files that are not UTF-8 text are reported as
/// [`ReadError::UnsupportedFormat`].
pub fn read_from_path(path: &Path, validate: bool) -> Result<PathwayModel, ReadError> {
    read_versioned_from_path(path, validate).map(|(model, _)| model)
}

/// Read a document from a file, returning the model and its version.
///
/// # Errors
///
/// See [`read_from_path`].
pub fn read_versioned_from_path(
    path: &Path,
    validate: bool,
) -> Result<(PathwayModel, GpmlVersion), ReadError> {
    let bytes = fs::read(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ReadError::UnsupportedFormat(format!("{} is not text", path.display())))?;
    read_versioned(&text, validate)
}

/// Writes models as canonical GPML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpmlWriter {
    indent: usize,
    validate: bool,
}

impl Default for GpmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl GpmlWriter {
    /// A writer that validates and indents by four spaces.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            indent: 4,
            validate: true,
        }
    }

    /// A writer using the indentation and validation settings of `config`.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            indent: config.indent(),
            validate: config.validate_on_write,
        }
    }

    /// Set the number of spaces per indentation level.
    #[must_use]
    pub const fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Enable or disable validation before writing.
    #[must_use]
    pub const fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Encode `model` to a GPML string.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Invalid`], listing every problem, if validation
    /// is enabled and the model fails it.
    #[instrument(skip_all, fields(model = %model.id(), validate = self.validate))]
    pub fn write_string(&self, model: &PathwayModel) -> Result<String, WriteError> {
        if self.validate {
            model.validate()?;
        }
        let bytes = writer::write_model(model, self.indent).map_err(WriteError::Xml)?;
        String::from_utf8(bytes).map_err(|err| {
            WriteError::Xml(io::Error::new(io::ErrorKind::InvalidData, err))
        })
    }

    /// Encode `model` and write it to `path`.
    ///
    /// The file is only touched once encoding has succeeded.
    ///
    /// # Errors
    ///
    /// See [`GpmlWriter::write_string`]; also fails if the file cannot be
    /// written.
    pub fn write_to_path(&self, model: &PathwayModel, path: &Path) -> Result<(), WriteError> {
        let xml = self.write_string(model)?;
        fs::write(path, xml).map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Encode `model` to a GPML string with default settings.
///
/// # Errors
///
/// See [`GpmlWriter::write_string`].
pub fn write(model: &PathwayModel, validate: bool) -> Result<String, WriteError> {
    GpmlWriter::new()
        .with_validation(validate)
        .write_string(model)
}

/// Encode `model` and write it to `path` with default settings.
///
/// # Errors
///
/// See [`GpmlWriter::write_to_path`].
pub fn write_to_path(model: &PathwayModel, path: &Path, validate: bool) -> Result<(), WriteError> {
    GpmlWriter::new()
        .with_validation(validate)
        .write_to_path(model, path)
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, path::PathBuf, rc::Rc};

    use test_case::test_case;

    use super::*;
    use crate::domain::{
        element::{Anchor, Comment, Element, ElementType, Properties, Waypoint},
        property::{PropertyValue, StaticProperty},
        reference::RefField,
        validate::ValidationIssue,
        values::{AnchorShape, ArrowHead, Color, DataNodeType, GroupStyle, LineStyle, ShapeType},
        xref::{DataSource, Xref},
    };

    fn testdata(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join(name)
    }

    fn count(model: &PathwayModel, element_type: ElementType) -> usize {
        model
            .elements()
            .filter(|e| e.element_type() == element_type)
            .count()
    }

    #[test_case(GpmlVersion::V2007)]
    #[test_case(GpmlVersion::V2008a)]
    #[test_case(GpmlVersion::V2010a)]
    #[test_case(GpmlVersion::V2013a)]
    fn detects_version_from_namespace(version: GpmlVersion) {
        let xml = format!(
            "<?xml version=\"1.0\"?>\n<!-- generated -->\n<Pathway xmlns=\"{}\" Name=\"x\"/>",
            version.namespace()
        );
        assert_eq!(detect_version(&xml).unwrap(), version);
    }

    #[test_case("Standard Jet DB"; "plain text")]
    #[test_case(""; "empty")]
    #[test_case("<Model xmlns=\"http://pathvisio.org/GPML/2013a\"/>"; "wrong root")]
    #[test_case("<Pathway xmlns=\"http://example.com/other\"/>"; "unknown namespace")]
    #[test_case("<Pathway Name=\"x\"/>"; "no namespace")]
    fn rejects_unrecognised_documents(input: &str) {
        assert!(matches!(
            read(input, false),
            Err(ReadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn mapp_file_is_unsupported() {
        let err = read_from_path(&testdata("test.mapp"), false).unwrap_err();
        assert!(matches!(err, ReadError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = read_from_path(&testdata("does-not-exist.gpml"), false).unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
    }

    #[test]
    fn reads_2008a_document() {
        let (mut model, version) =
            read_versioned_from_path(&testdata("insulin-2008a.gpml"), false).unwrap();

        assert_eq!(version, GpmlVersion::V2008a);
        assert!(model.len() > 20);
        assert_eq!(count(&model, ElementType::DataNode), 12);
        assert_eq!(count(&model, ElementType::Interaction), 6);
        assert_eq!(count(&model, ElementType::Group), 1);

        let pathway = model.pathway().as_pathway().unwrap();
        assert_eq!(pathway.title(), "Insulin Signaling");
        assert_eq!(pathway.organism(), Some("Homo sapiens"));

        let insr = model.by_element_id("a1").unwrap();
        assert_eq!(insr.text_label(), Some("INSR"));
        assert_eq!(
            insr.xref().and_then(Xref::data_source).map(DataSource::full_name),
            Some("Entrez Gene")
        );
        assert_eq!(insr.dynamic_property("org.example.note"), Some("receptor"));
        assert_eq!(model.fix_references(), 0);
    }

    #[test]
    fn reads_2007_document_with_scaled_coordinates() {
        let (model, version) =
            read_versioned_from_path(&testdata("glycolysis-2007.gpml"), false).unwrap();

        assert_eq!(version, GpmlVersion::V2007);
        let hk = model.by_element_id("d1").unwrap();
        assert_eq!(
            hk.property(StaticProperty::CenterX),
            Ok(PropertyValue::Double(100.0))
        );
        assert_eq!(
            hk.property(StaticProperty::Width),
            Ok(PropertyValue::Double(80.0))
        );
        assert!(model.len() > 5);
    }

    #[test]
    fn missing_graphics_yields_defaults() {
        let model = read_from_path(&testdata("nographics.gpml"), false).unwrap();

        let node = model.by_element_id("n1").unwrap();
        assert_eq!(node.property(StaticProperty::CenterX), Ok(PropertyValue::Double(0.0)));
        assert_eq!(node.property(StaticProperty::Width), Ok(PropertyValue::Double(0.0)));
        assert_eq!(
            node.property(StaticProperty::TextColor),
            Ok(PropertyValue::Color(Color::BLACK))
        );
        assert_eq!(node.property(StaticProperty::FillColor), Ok(PropertyValue::Null));
        assert_eq!(node.property(StaticProperty::FontSize), Ok(PropertyValue::Double(12.0)));
        assert_eq!(
            node.property(StaticProperty::FontName),
            Ok(PropertyValue::Text("Arial".into()))
        );
    }

    #[test_case("CenterX=\"wide\""; "not a number")]
    #[test_case("CenterX=\"NaN\""; "not finite")]
    #[test_case("Color=\"purpleish\""; "bad color")]
    #[test_case("ZOrder=\"1.5\""; "fractional z order")]
    #[test_case("FontWeight=\"Heavy\""; "unknown font weight")]
    fn malformed_values_are_converter_errors(graphics: &str) {
        let xml = format!(
            r#"<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="x">
                <DataNode GraphId="a" TextLabel="A" Type="Protein">
                    <Graphics {graphics}/>
                </DataNode>
            </Pathway>"#
        );
        let err = read(&xml, false).unwrap_err();
        assert!(
            matches!(err, ReadError::Converter(ConverterError::InvalidAttribute { .. })),
            "{err}"
        );
    }

    #[test]
    fn unknown_enum_value_is_a_converter_error() {
        let xml = r#"<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="x">
            <DataNode GraphId="a" TextLabel="A" Type="Spaceship"/>
        </Pathway>"#;
        let err = read(xml, false).unwrap_err();
        assert!(matches!(err, ReadError::Converter(_)));
    }

    #[test]
    fn broken_xml_after_root_is_a_converter_error() {
        let xml = r#"<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="x">
            <DataNode GraphId="a"></Label>
        </Pathway>"#;
        let err = read(xml, false).unwrap_err();
        assert!(matches!(err, ReadError::Converter(ConverterError::Xml(_))));
    }

    #[test]
    fn duplicate_graph_ids_are_rejected() {
        let xml = r#"<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="x">
            <DataNode GraphId="a" TextLabel="A"/>
            <Label GraphId="a" TextLabel="B"/>
        </Pathway>"#;
        let err = read(xml, false).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Converter(ConverterError::DuplicateId(id)) if id == "a"
        ));
    }

    #[test]
    fn group_ids_are_remapped_when_taken() {
        let xml = r#"<Pathway xmlns="http://genmapp.org/GPML/2008a" Name="x">
            <DataNode GraphId="g1" TextLabel="clash"/>
            <DataNode GraphId="m1" TextLabel="member" GroupRef="g1"/>
            <Group GroupId="g1" Style="Complex"/>
        </Pathway>"#;
        let model = read(xml, false).unwrap();

        let group = model
            .elements()
            .find(|e| e.element_type() == ElementType::Group)
            .unwrap();
        let group_id = group.element_id().unwrap();
        assert_ne!(group_id, "g1");

        let member = model.by_element_id("m1").unwrap();
        assert_eq!(member.reference(RefField::GroupRef), Some(group_id));
        assert_eq!(model.validate(), Ok(()));
    }

    #[test]
    fn legacy_group_id_becomes_element_id() {
        let xml = r#"<Pathway xmlns="http://genmapp.org/GPML/2008a" Name="x">
            <DataNode GraphId="m1" TextLabel="member" GroupRef="grp"/>
            <Group GroupId="grp" Style="Group"/>
        </Pathway>"#;
        let model = read(xml, false).unwrap();

        assert_eq!(
            model.by_element_id("grp").map(Element::element_type),
            Some(ElementType::Group)
        );
    }

    #[test]
    fn duplicate_group_ids_are_rejected() {
        let xml = r#"<Pathway xmlns="http://genmapp.org/GPML/2008a" Name="x">
            <DataNode GraphId="m1" TextLabel="member" GroupRef="grp"/>
            <Group GroupId="grp" Style="Group"/>
            <Group GroupId="grp" Style="Complex"/>
        </Pathway>"#;
        let err = read(xml, false).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Converter(ConverterError::DuplicateId(id)) if id == "grp"
        ));
    }

    #[test]
    fn empty_references_read_as_none() {
        let xml = r#"<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="x">
            <DataNode GraphId="" TextLabel="A" GroupRef=""/>
            <Group GroupId="" Style="Group"/>
        </Pathway>"#;
        let model = read(xml, true).unwrap();

        let node = model
            .elements()
            .find(|e| e.element_type() == ElementType::DataNode)
            .unwrap();
        assert_eq!(node.element_id(), None);
        assert_eq!(node.reference(RefField::GroupRef), None);
    }

    #[test]
    fn reads_anchors_states_and_graphical_lines() {
        let mut model = read_from_path(&testdata("anchors-2013a.gpml"), true).unwrap();

        assert_eq!(count(&model, ElementType::Interaction), 2);
        assert_eq!(count(&model, ElementType::GraphicalLine), 1);
        assert_eq!(count(&model, ElementType::State), 1);

        let l1 = model.by_element_id("l1").unwrap();
        assert_eq!(
            l1.anchors(),
            &[Anchor::new(Some("an1"), 0.5, AnchorShape::Circle)]
        );
        assert_eq!(l1.waypoints(), &[Waypoint { x: 200.0, y: 60.0 }]);
        assert_eq!(
            l1.property(StaticProperty::EndX),
            Ok(PropertyValue::Double(255.0))
        );
        assert_eq!(model.by_element_id("an1").map(Element::key), Some(l1.key()));

        let l2 = model.by_element_id("l2").unwrap();
        assert_eq!(l2.reference(RefField::EndElementRef), Some("an1"));
        assert_eq!(model.fix_references(), 0);

        let graphical = model.by_element_id("gl1").unwrap();
        assert_eq!(graphical.xref(), None);
        assert_eq!(graphical.waypoints().len(), 2);
        assert_eq!(graphical.anchors()[0].element_id(), None);

        let state = model.by_element_id("s1").unwrap();
        assert_eq!(state.reference(RefField::ParentRef), Some("n1"));
        assert_eq!(state.text_label(), Some("P"));
        assert_eq!(
            state.property(StaticProperty::StateType),
            Ok(PropertyValue::Text("phosphorylated".into()))
        );
        assert_eq!(
            state.property(StaticProperty::RelY),
            Ok(PropertyValue::Double(-1.0))
        );
        assert_eq!(state.dynamic_property("org.example.site"), Some("Y1068"));

        let label = model.by_element_id("lb1").unwrap();
        assert_eq!(label.reference(RefField::GroupRef), None);
    }

    #[test]
    fn anchored_document_round_trips() {
        let model = read_from_path(&testdata("anchors-2013a.gpml"), true).unwrap();

        let xml = write(&model, true).unwrap();
        assert!(xml.contains("<Anchor Position=\"0.5\" Shape=\"Circle\" GraphId=\"an1\"/>"));
        assert!(xml.contains("<GraphicalLine GraphId=\"gl1\">"));
        assert!(xml.contains("<State GraphId=\"s1\" GraphRef=\"n1\""));

        let mut reread = read(&xml, true).unwrap();
        assert_eq!(reread.len(), model.len());
        assert_eq!(reread.fingerprint(), model.fingerprint());
        assert_eq!(reread.fix_references(), 0);
    }

    #[test]
    fn lines_to_anchors_survive_validated_round_trip() {
        let xml = r#"<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="x">
            <Interaction GraphId="l1">
                <Graphics>
                    <Point X="0" Y="0"/>
                    <Point X="10" Y="0"/>
                    <Anchor GraphId="an1" Position="0.5"/>
                </Graphics>
            </Interaction>
            <Interaction GraphId="l2">
                <Graphics>
                    <Point X="5" Y="10"/>
                    <Point X="5" Y="0" GraphRef="an1"/>
                </Graphics>
            </Interaction>
        </Pathway>"#;

        let mut model = read(xml, true).unwrap();
        assert_eq!(model.fix_references(), 0);

        let written = write(&model, true).unwrap();
        assert!(written.contains("<Anchor"));
        assert_eq!(read(&written, true).unwrap().fingerprint(), model.fingerprint());
    }

    #[test]
    fn anchor_ids_clash_with_element_ids() {
        let xml = r#"<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="x">
            <DataNode GraphId="an1" TextLabel="A"/>
            <Interaction GraphId="l1">
                <Graphics>
                    <Point X="0" Y="0"/>
                    <Point X="10" Y="0"/>
                    <Anchor GraphId="an1" Position="0.5"/>
                </Graphics>
            </Interaction>
        </Pathway>"#;
        let err = read(xml, false).unwrap_err();
        assert!(matches!(
            err,
            ReadError::Converter(ConverterError::DuplicateId(id)) if id == "an1"
        ));
    }

    #[test]
    fn pathway_id_blocks_validated_writes() {
        let mut model = PathwayModel::new();
        model
            .pathway_mut()
            .set_element_id(Some("p".into()))
            .unwrap();
        let mut line = Element::interaction();
        line.set_start_element_ref(Some("p")).unwrap();
        model.add(line).unwrap();

        let Err(WriteError::Invalid(err)) = write(&model, true) else {
            panic!("a pathway id cannot be stored");
        };
        assert_eq!(err.issues().head, ValidationIssue::PathwayId("p".into()));
    }

    fn populated_model() -> PathwayModel {
        let mut model = PathwayModel::new();
        {
            let mut pathway = model.pathway_mut();
            pathway.set_property(StaticProperty::Title, "Round trip").unwrap();
            pathway.set_organism(Some("Mus musculus")).unwrap();
            pathway.set_dynamic_property("curator", Some("someone"));
        }

        let mut a = Element::data_node("Insr", DataNodeType::GeneProduct);
        a.set_element_id(Some("a".into()));
        a.set_center_x(10.5).unwrap();
        a.set_center_y(20.25).unwrap();
        a.set_size(80.0, 20.0).unwrap();
        a.set_text_color(Color::rgb(0x12, 0x34, 0x56)).unwrap();
        a.set_fill_color(Some(Color::WHITE)).unwrap();
        a.set_property(StaticProperty::Bold, true).unwrap();
        a.set_xref(Xref::new("16337", DataSource::well_known("Entrez Gene")))
            .unwrap();
        a.set_dynamic_property("quote", Some("say \"hi\" & <bye>"));
        a.set_group_ref(Some("grp")).unwrap();
        a.add_comment(Comment {
            source: Some("curator".into()),
            text: "first & foremost".into(),
        });
        model.add(a).unwrap();

        let mut b = Element::data_node("glucose", DataNodeType::Metabolite);
        b.set_element_id(Some("b".into()));
        b.set_xref(Xref::new("HMDB00122", DataSource::from_database_name("Some Custom DB")))
            .unwrap();
        model.add(b).unwrap();

        let mut line = Element::interaction();
        line.set_element_id(Some("l1".into()));
        line.set_start_point(1.0, 2.0).unwrap();
        line.set_end_point(3.0, 4.0).unwrap();
        line.set_start_element_ref(Some("a")).unwrap();
        line.set_end_element_ref(Some("b")).unwrap();
        line.set_property(StaticProperty::EndArrowHead, ArrowHead::Conversion)
            .unwrap();
        line.add_anchor(Anchor::new(Some("an1"), 0.4, AnchorShape::Circle))
            .unwrap();
        model.add(line).unwrap();

        let mut bend = Element::interaction();
        bend.set_element_id(Some("l2".into()));
        bend.set_start_element_ref(Some("b")).unwrap();
        bend.set_end_element_ref(Some("an1")).unwrap();
        bend.set_waypoints(vec![Waypoint { x: 2.5, y: 7.0 }, Waypoint { x: 3.0, y: 9.5 }])
            .unwrap();
        model.add(bend).unwrap();

        let mut border = Element::graphical_line();
        border.set_property(StaticProperty::LineStyle, LineStyle::Dashed)
            .unwrap();
        border.add_anchor(Anchor::new(None, 0.75, AnchorShape::ReceptorSquare))
            .unwrap();
        model.add(border).unwrap();

        let mut state = Element::state("P");
        state.set_parent_ref(Some("a")).unwrap();
        state.set_property(StaticProperty::RelX, 1.0).unwrap();
        state.set_property(StaticProperty::StateType, "phosphorylated")
            .unwrap();
        model.add(state).unwrap();

        let mut label = Element::label("note");
        label.set_property(StaticProperty::Href, "https://example.org")
            .unwrap();
        model.add(label).unwrap();

        let mut shape = Element::shape(ShapeType::Nucleus);
        shape.set_property(StaticProperty::Rotation, 1.5).unwrap();
        model.add(shape).unwrap();

        let mut group = Element::group(GroupStyle::Complex);
        group.set_element_id(Some("grp".into()));
        model.add(group).unwrap();

        model
    }

    #[test]
    fn round_trip_preserves_content() {
        let model = populated_model();

        let xml = write(&model, true).unwrap();
        let reread = read(&xml, true).unwrap();

        assert_eq!(reread.len(), model.len());
        assert_eq!(reread.fingerprint(), model.fingerprint());

        let a = reread.by_element_id("a").unwrap();
        assert_eq!(a.dynamic_property("quote"), Some("say \"hi\" & <bye>"));
        assert_eq!(a.comments()[0].text, "first & foremost");
        assert_eq!(
            reread.pathway().dynamic_property("curator"),
            Some("someone")
        );
        let line = reread.by_element_id("l1").unwrap();
        assert_eq!(line.reference(RefField::EndElementRef), Some("b"));
        assert_eq!(line.anchors().len(), 1);
        assert_eq!(reread.by_element_id("l2").unwrap().waypoints().len(), 2);
    }

    #[test]
    fn writes_canonical_namespace() {
        let xml = write(&PathwayModel::new(), true).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(GpmlVersion::CANONICAL.namespace()));
        assert_eq!(detect_version(&xml).unwrap(), GpmlVersion::CANONICAL);
    }

    #[test]
    fn older_versions_upgrade_to_canonical() {
        let old = read_from_path(&testdata("glycolysis-2007.gpml"), false).unwrap();

        let xml = write(&old, false).unwrap();
        let (upgraded, version) = read_versioned(&xml, false).unwrap();

        assert_eq!(version, GpmlVersion::CANONICAL);
        assert_eq!(upgraded.fingerprint(), old.fingerprint());
    }

    #[test]
    fn dangling_references_block_validated_writes_until_fixed() {
        let mut model = populated_model();
        assert_eq!(model.fix_references(), 0);

        let mut dangling = Element::interaction();
        dangling.set_start_element_ref(Some("dangle")).unwrap();
        model.add(dangling).unwrap();

        assert!(matches!(write(&model, true), Err(WriteError::Invalid(_))));
        assert!(write(&model, false).is_ok());

        assert_eq!(model.fix_references(), 1);
        assert_eq!(model.fix_references(), 0);
        assert!(write(&model, true).is_ok());
    }

    #[test]
    fn validated_read_rejects_dangling_references() {
        let xml = r#"<Pathway xmlns="http://pathvisio.org/GPML/2013a" Name="x">
            <Interaction GraphId="l">
                <Graphics>
                    <Point X="0" Y="0" GraphRef="nowhere"/>
                    <Point X="1" Y="1"/>
                </Graphics>
            </Interaction>
        </Pathway>"#;

        assert!(matches!(read(xml, true), Err(ReadError::Invalid(_))));
        let mut model = read(xml, false).unwrap();
        assert_eq!(model.fix_references(), 1);
    }

    #[test]
    fn write_to_path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gpml");
        let model = populated_model();

        GpmlWriter::new()
            .with_indent(2)
            .write_to_path(&model, &path)
            .unwrap();

        let reread = read_from_path(&path, true).unwrap();
        assert_eq!(reread.fingerprint(), model.fingerprint());
    }

    #[test]
    fn failed_validation_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gpml");
        let mut model = PathwayModel::new();
        let mut line = Element::interaction();
        line.set_end_element_ref(Some("dangle")).unwrap();
        model.add(line).unwrap();

        assert!(write_to_path(&model, &path, true).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn edit_one_property_end_to_end() {
        let mut model = read_from_path(&testdata("insulin-2008a.gpml"), false).unwrap();
        assert!(model.len() > 20);

        let events = Rc::new(RefCell::new(Vec::new()));
        {
            let mut node = model.by_element_id_mut("a3").unwrap();
            let sink = Rc::clone(&events);
            node.add_listener(move |event| sink.borrow_mut().push(event.clone()));
            node.set_center_x(321.5).unwrap();
        }
        assert_eq!(events.borrow().len(), 1);

        let xml = write(&model, false).unwrap();
        let reread = read(&xml, false).unwrap();

        assert_eq!(
            reread
                .by_element_id("a3")
                .unwrap()
                .property(StaticProperty::CenterX),
            Ok(PropertyValue::Double(321.5))
        );
    }
}
