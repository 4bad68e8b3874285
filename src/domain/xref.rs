//! Cross-references to external biological databases.
//!
//! The core stores cross-references verbatim. Resolving an identifier
//! against a real database is the job of an [`XrefResolver`], which the
//! model never calls on its own.

use std::{
    fmt,
    hash::{Hash, Hasher},
};

use borsh::BorshSerialize;
use non_empty_string::NonEmptyString;

/// An external database that identifiers belong to.
///
/// Two data sources are the same source if their full names match; the
/// system code is an alternative short handle and does not take part in
/// equality.
#[derive(Debug, Clone)]
pub struct DataSource {
    full_name: NonEmptyString,
    system_code: Option<String>,
}

impl DataSource {
    /// Create a data source with the given full name.
    ///
    /// # Errors
    ///
    /// Returns an [`EmptyNameError`] if `full_name` is empty.
    pub fn new(full_name: &str, system_code: Option<&str>) -> Result<Self, EmptyNameError> {
        let full_name = NonEmptyString::new(full_name.to_string()).map_err(|_| EmptyNameError)?;
        Ok(Self {
            full_name,
            system_code: system_code.map(str::to_string),
        })
    }

    /// Look up one of the well-known data sources by full name or system
    /// code. Matching is case-insensitive.
    #[must_use]
    pub fn well_known(name: &str) -> Option<Self> {
        WELL_KNOWN
            .iter()
            .find(|(full, code)| full.eq_ignore_ascii_case(name) || code.eq_ignore_ascii_case(name))
            .and_then(|(full, code)| Self::new(full, Some(code)).ok())
    }

    /// Resolve the `Database` attribute of a persisted cross-reference.
    ///
    /// The attribute holds a full name, so only full names of well-known
    /// sources are matched, and those come back with their system code.
    /// Anything else is kept as an ad-hoc source so it survives a round
    /// trip.
    #[must_use]
    pub fn from_database_name(name: &str) -> Option<Self> {
        if name.trim().is_empty() {
            return None;
        }
        WELL_KNOWN
            .iter()
            .find(|(full, _)| full.eq_ignore_ascii_case(name))
            .map_or_else(
                || Self::new(name, None).ok(),
                |(full, code)| Self::new(full, Some(code)).ok(),
            )
    }

    /// The full, human-readable name (for example `Entrez Gene`).
    #[must_use]
    pub fn full_name(&self) -> &str {
        self.full_name.as_str()
    }

    /// The short system code (for example `L`), if known.
    #[must_use]
    pub fn system_code(&self) -> Option<&str> {
        self.system_code.as_deref()
    }
}

impl PartialEq for DataSource {
    fn eq(&self, other: &Self) -> bool {
        self.full_name() == other.full_name()
    }
}

impl Eq for DataSource {}

impl Hash for DataSource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name().hash(state);
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

impl BorshSerialize for DataSource {
    fn serialize<W: std::io::Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.full_name.as_str().serialize(writer)
    }
}

/// Error returned when constructing a [`DataSource`] without a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("data source name must not be empty")]
pub struct EmptyNameError;

/// Full names and system codes of the data sources the crate knows about.
const WELL_KNOWN: &[(&str, &str)] = &[
    ("Affy", "X"),
    ("Entrez Gene", "L"),
    ("Ensembl", "En"),
    ("Ensembl Human", "EnHs"),
    ("Ensembl Mouse", "EnMm"),
    ("Ensembl Rat", "EnRn"),
    ("Ensembl Zebrafish", "EnDr"),
    ("Ensembl Fruitfly", "EnDm"),
    ("Ensembl C. elegans", "EnCe"),
    ("Ensembl Yeast", "EnSc"),
    ("HMDB", "Ch"),
    ("ChEBI", "Ce"),
    ("KEGG Compound", "Ck"),
    ("UniProt/TrEMBL", "S"),
    ("HGNC", "H"),
    ("WikiPathways", "Wp"),
];

/// A cross-reference: an identifier within an external data source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, BorshSerialize)]
pub struct Xref {
    id: String,
    data_source: Option<DataSource>,
}

impl Xref {
    /// Create a cross-reference.
    #[must_use]
    pub fn new(id: impl Into<String>, data_source: Option<DataSource>) -> Self {
        Self {
            id: id.into(),
            data_source,
        }
    }

    /// The identifier within the data source.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The data source, if one was given.
    #[must_use]
    pub const fn data_source(&self) -> Option<&DataSource> {
        self.data_source.as_ref()
    }

    /// Whether neither an identifier nor a data source is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.data_source.is_none()
    }
}

impl fmt::Display for Xref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data_source {
            Some(source) => write!(f, "{source}:{}", self.id),
            None => write!(f, ":{}", self.id),
        }
    }
}

/// A cross-reference together with a display symbol, such as a gene
/// symbol.
///
/// The symbol is auxiliary: equality and hashing consider only the
/// underlying [`Xref`], so two values that differ only in their symbol are
/// equal.
#[derive(Debug, Clone)]
pub struct XrefWithSymbol {
    xref: Xref,
    symbol: String,
}

impl XrefWithSymbol {
    /// Attach a display symbol to a cross-reference.
    #[must_use]
    pub fn new(xref: Xref, symbol: impl Into<String>) -> Self {
        Self {
            xref,
            symbol: symbol.into(),
        }
    }

    /// The underlying cross-reference.
    #[must_use]
    pub const fn xref(&self) -> &Xref {
        &self.xref
    }

    /// The display symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl PartialEq for XrefWithSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.xref == other.xref
    }
}

impl Eq for XrefWithSymbol {}

impl Hash for XrefWithSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.xref.hash(state);
    }
}

impl PartialEq<Xref> for XrefWithSymbol {
    fn eq(&self, other: &Xref) -> bool {
        &self.xref == other
    }
}

impl PartialEq<XrefWithSymbol> for Xref {
    fn eq(&self, other: &XrefWithSymbol) -> bool {
        self == &other.xref
    }
}

impl fmt::Display for XrefWithSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.xref, self.symbol)
    }
}

/// Resolves cross-references against an identifier mapping service.
///
/// Implementations live outside the core (for example, a database-backed
/// service). Given a cross-reference, a resolver returns the canonical
/// data source for it, or `None` when the identifier is unknown.
pub trait XrefResolver {
    /// Resolve `xref` to its canonical data source.
    fn resolve(&self, xref: &Xref) -> Option<DataSource>;
}

/// Organisms the crate has species-specific knowledge about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Organism {
    /// Human.
    HomoSapiens,
    /// Nematode worm.
    CaenorhabditisElegans,
    /// Zebrafish.
    DanioRerio,
    /// Fruit fly.
    DrosophilaMelanogaster,
    /// Mouse.
    MusMusculus,
    /// Rat.
    RattusNorvegicus,
    /// Baker's yeast.
    SaccharomycesCerevisiae,
}

impl Organism {
    /// All known organisms.
    pub const ALL: &'static [Self] = &[
        Self::HomoSapiens,
        Self::CaenorhabditisElegans,
        Self::DanioRerio,
        Self::DrosophilaMelanogaster,
        Self::MusMusculus,
        Self::RattusNorvegicus,
        Self::SaccharomycesCerevisiae,
    ];

    /// The Latin (binomial) name, as stored in a pathway's organism field.
    #[must_use]
    pub const fn latin_name(self) -> &'static str {
        match self {
            Self::HomoSapiens => "Homo sapiens",
            Self::CaenorhabditisElegans => "Caenorhabditis elegans",
            Self::DanioRerio => "Danio rerio",
            Self::DrosophilaMelanogaster => "Drosophila melanogaster",
            Self::MusMusculus => "Mus musculus",
            Self::RattusNorvegicus => "Rattus norvegicus",
            Self::SaccharomycesCerevisiae => "Saccharomyces cerevisiae",
        }
    }

    /// Look an organism up by its Latin name.
    #[must_use]
    pub fn from_latin_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|organism| organism.latin_name().eq_ignore_ascii_case(name.trim()))
    }

    /// The full name of the species-specific Ensembl data source.
    #[must_use]
    pub const fn ensembl_source_name(self) -> &'static str {
        match self {
            Self::HomoSapiens => "Ensembl Human",
            Self::CaenorhabditisElegans => "Ensembl C. elegans",
            Self::DanioRerio => "Ensembl Zebrafish",
            Self::DrosophilaMelanogaster => "Ensembl Fruitfly",
            Self::MusMusculus => "Ensembl Mouse",
            Self::RattusNorvegicus => "Ensembl Rat",
            Self::SaccharomycesCerevisiae => "Ensembl Yeast",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn source(name: &str) -> Option<DataSource> {
        Some(DataSource::well_known(name).unwrap())
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[derive(Debug, Clone)]
    enum AnyXref {
        Plain(Xref),
        Symbol(XrefWithSymbol),
    }

    impl AnyXref {
        fn equals(&self, other: &Self) -> bool {
            match (self, other) {
                (Self::Plain(a), Self::Plain(b)) => a == b,
                (Self::Plain(a), Self::Symbol(b)) => a == b,
                (Self::Symbol(a), Self::Plain(b)) => a == b,
                (Self::Symbol(a), Self::Symbol(b)) => a == b,
            }
        }

        fn equals_option(&self, other: Option<&Self>) -> bool {
            other.is_some_and(|other| self.equals(other))
        }

        fn hash(&self) -> u64 {
            match self {
                Self::Plain(x) => hash_of(x),
                Self::Symbol(x) => hash_of(x),
            }
        }
    }

    fn samples() -> Vec<AnyXref> {
        vec![
            AnyXref::Plain(Xref::new("1007_at", source("Affy"))),
            AnyXref::Plain(Xref::new("3456", source("Affy"))),
            AnyXref::Plain(Xref::new("1007_at", source("Entrez Gene"))),
            AnyXref::Plain(Xref::new("3456", source("Entrez Gene"))),
            AnyXref::Plain(Xref::new("3456", source("Entrez Gene"))),
            AnyXref::Symbol(XrefWithSymbol::new(
                Xref::new("3456", source("Entrez Gene")),
                "INSR",
            )),
            AnyXref::Symbol(XrefWithSymbol::new(
                Xref::new("3456", source("Entrez Gene")),
                "Insulin Receptor",
            )),
        ]
    }

    #[test]
    fn equality_is_reflexive_and_never_equal_to_absence() {
        for x in samples() {
            assert!(x.equals(&x));
            assert!(!x.equals_option(None));
        }
    }

    #[test]
    fn equality_is_symmetric_and_consistent_with_hash() {
        let list = samples();
        for (i, a) in list.iter().enumerate() {
            for b in &list[..i] {
                assert_eq!(a.equals(b), b.equals(a), "symmetry fails for {a:?} and {b:?}");
                if a.equals(b) {
                    assert_eq!(a.hash(), b.hash());
                }
            }
        }
    }

    #[test]
    fn equality_is_transitive() {
        let list = samples();
        for a in &list {
            for b in &list {
                for c in &list {
                    if a.equals(b) && b.equals(c) {
                        assert!(a.equals(c));
                    }
                }
            }
        }
    }

    #[test]
    fn symbol_is_auxiliary() {
        let list = samples();
        let (AnyXref::Symbol(a), AnyXref::Symbol(b)) = (&list[5], &list[6]) else {
            unreachable!()
        };
        assert_eq!(a, b);
        assert_ne!(a.symbol(), b.symbol());
    }

    #[test]
    fn data_source_equality_ignores_system_code() {
        let with_code = DataSource::new("Entrez Gene", Some("L")).unwrap();
        let without = DataSource::new("Entrez Gene", None).unwrap();
        assert_eq!(with_code, without);
        assert_eq!(hash_of(&with_code), hash_of(&without));
    }

    #[test]
    fn well_known_lookup_accepts_system_code() {
        let by_code = DataSource::well_known("l").unwrap();
        assert_eq!(by_code.full_name(), "Entrez Gene");
    }

    #[test]
    fn unknown_database_names_are_kept() {
        let source = DataSource::from_database_name("My Local DB").unwrap();
        assert_eq!(source.full_name(), "My Local DB");
        assert_eq!(source.system_code(), None);
        assert!(DataSource::from_database_name("  ").is_none());
    }

    #[test]
    fn database_attribute_matches_full_names_only() {
        let entrez = DataSource::from_database_name("entrez gene").unwrap();
        assert_eq!(entrez.full_name(), "Entrez Gene");
        assert_eq!(entrez.system_code(), Some("L"));

        let custom = DataSource::from_database_name("L").unwrap();
        assert_eq!(custom.full_name(), "L");
        assert_eq!(custom.system_code(), None);
        assert_ne!(Some(custom), DataSource::well_known("Entrez Gene"));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_eq!(DataSource::new("", None).unwrap_err(), EmptyNameError);
    }

    #[test]
    fn organism_round_trips_through_latin_name() {
        for organism in Organism::ALL {
            assert_eq!(Organism::from_latin_name(organism.latin_name()), Some(*organism));
        }
        assert_eq!(Organism::from_latin_name("Arabidopsis thaliana"), None);
    }
}
