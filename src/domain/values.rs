//! Typed values used by static properties.
//!
//! Every enum here parses from, and prints to, the name used in the
//! persisted format, so the codec can round-trip them through a string.

use std::{fmt, str::FromStr};

use borsh::BorshSerialize;

/// Error returned when a string does not name a known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}")]
pub struct ParseValueError {
    kind: &'static str,
    value: String,
}

impl ParseValueError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BorshSerialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Black, the default text and border color.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// White.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Construct a color from its channels.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lower-case hex representation without a leading `#`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ParseValueError;

    /// Accepts `RRGGBB`, `#RRGGBB` and a handful of named colors found in
    /// older documents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let named = match trimmed.to_ascii_lowercase().as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::rgb(255, 0, 0)),
            "green" => Some(Self::rgb(0, 255, 0)),
            "blue" => Some(Self::rgb(0, 0, 255)),
            "gray" | "grey" => Some(Self::rgb(128, 128, 128)),
            _ => None,
        };
        if let Some(color) = named {
            return Ok(color);
        }

        let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseValueError::new("color", s));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseValueError::new("color", s))
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Declares a closed enum with a stable persisted name per variant.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, BorshSerialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// All variants, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The name used in the persisted format.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| ParseValueError::new($kind, s))
            }
        }
    };
}

named_enum! {
    /// The biological type of a data node.
    DataNodeType, "data node type" {
        /// No type given.
        #[default]
        Unknown => "Unknown",
        /// A gene product.
        GeneProduct => "GeneProduct",
        /// A protein.
        Protein => "Protein",
        /// An RNA.
        Rna => "Rna",
        /// A small molecule or metabolite.
        Metabolite => "Metabolite",
        /// A reference to another pathway.
        Pathway => "Pathway",
        /// A protein complex.
        Complex => "Complex",
    }
}

named_enum! {
    /// The outline drawn for a shape element.
    ShapeType, "shape type" {
        /// A rectangle.
        #[default]
        Rectangle => "Rectangle",
        /// A rectangle with rounded corners.
        RoundedRectangle => "RoundedRectangle",
        /// An ellipse.
        Oval => "Oval",
        /// A triangle.
        Triangle => "Triangle",
        /// A pentagon.
        Pentagon => "Pentagon",
        /// A hexagon.
        Hexagon => "Hexagon",
        /// An octagon.
        Octagon => "Octagon",
        /// An open arc.
        Arc => "Arc",
        /// A brace.
        Brace => "Brace",
        /// A mitochondrion outline.
        Mitochondria => "Mitochondria",
        /// A cell outline.
        Cell => "Cell",
        /// A nucleus outline.
        Nucleus => "Nucleus",
        /// A generic organelle outline.
        Organelle => "Organelle",
        /// An endoplasmic reticulum outline.
        EndoplasmicReticulum => "Endoplasmic Reticulum",
        /// A Golgi apparatus outline.
        GolgiApparatus => "Golgi Apparatus",
    }
}

named_enum! {
    /// The marker drawn at an interaction end point.
    ArrowHead, "arrow head" {
        /// No marker.
        #[default]
        Line => "Line",
        /// A plain arrow.
        Arrow => "Arrow",
        /// An inhibition bar.
        TBar => "TBar",
        /// A receptor.
        Receptor => "Receptor",
        /// A ligand.
        LigandRound => "LigandRound",
        /// Mechanism-based inhibition.
        Inhibition => "mim-inhibition",
        /// Mechanism-based conversion.
        Conversion => "mim-conversion",
        /// Mechanism-based catalysis.
        Catalysis => "mim-catalysis",
        /// Mechanism-based stimulation.
        Stimulation => "mim-stimulation",
        /// Mechanism-based necessary stimulation.
        NecessaryStimulation => "mim-necessary-stimulation",
        /// Mechanism-based binding.
        Binding => "mim-binding",
        /// Mechanism-based modification.
        Modification => "mim-modification",
        /// Mechanism-based cleavage.
        Cleavage => "mim-cleavage",
        /// Mechanism-based transcription and translation.
        TranscriptionTranslation => "mim-transcription-translation",
    }
}

named_enum! {
    /// The stroke pattern of a line.
    LineStyle, "line style" {
        /// A continuous line.
        #[default]
        Solid => "Solid",
        /// A dashed line.
        Dashed => "Broken",
        /// A double line.
        Double => "Double",
    }
}

named_enum! {
    /// How a group is drawn and interpreted.
    GroupStyle, "group style" {
        /// No particular meaning.
        #[default]
        None => "None",
        /// A plain visual group.
        Group => "Group",
        /// A molecular complex.
        Complex => "Complex",
        /// A sub-pathway.
        Pathway => "Pathway",
    }
}

named_enum! {
    /// The marker drawn at an anchor on a line.
    AnchorShape, "anchor shape" {
        /// Nothing drawn.
        #[default]
        None => "None",
        /// A small filled circle.
        Circle => "Circle",
        /// A round receptor.
        ReceptorRound => "ReceptorRound",
        /// A square receptor.
        ReceptorSquare => "ReceptorSquare",
        /// A round ligand.
        LigandRound => "LigandRound",
        /// A square ligand.
        LigandSquare => "LigandSquare",
    }
}
