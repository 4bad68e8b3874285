//! Upgrades for documents written against older conventions.
//!
//! Older pathways reference Ensembl genes through a single, generic
//! `Ensembl` data source. Ensembl treats every species database as a
//! separate source, so those references are rewritten to the
//! species-specific source for the pathway's organism.

use tracing::{debug, instrument};

use crate::domain::{
    element::{ElementKey, ElementType, Properties},
    model::PathwayModel,
    xref::{DataSource, Organism, Xref, XrefResolver},
};

const GENERIC_ENSEMBL: &str = "Ensembl";

/// The species-specific Ensembl source for the model's organism, if the
/// organism has one.
#[must_use]
pub fn species_ensembl(model: &PathwayModel) -> Option<DataSource> {
    let organism = model.pathway().as_pathway()?.organism()?;
    let organism = Organism::from_latin_name(organism)?;
    DataSource::well_known(organism.ensembl_source_name())
}

fn generic_ensembl_nodes(model: &PathwayModel) -> Vec<ElementKey> {
    model
        .elements()
        .filter(|e| e.element_type() == ElementType::DataNode)
        .filter(|e| {
            e.xref()
                .and_then(Xref::data_source)
                .is_some_and(|source| source.full_name() == GENERIC_ENSEMBL)
        })
        .map(|e| e.key())
        .collect()
}

/// Whether the model has data nodes using the generic Ensembl source while
/// its organism has a species-specific one.
#[must_use]
pub fn uses_old_ensembl(model: &PathwayModel) -> bool {
    species_ensembl(model).is_some() && !generic_ensembl_nodes(model).is_empty()
}

/// Rewrite generic Ensembl cross-references on data nodes to the
/// species-specific source. Returns the number of nodes changed.
#[instrument(skip(model), fields(model = %model.id()))]
pub fn convert_ensembl(model: &mut PathwayModel) -> usize {
    let Some(species) = species_ensembl(model) else {
        debug!("organism has no species-specific Ensembl source");
        return 0;
    };

    let mut converted = 0;
    for key in generic_ensembl_nodes(model) {
        let Some(mut node) = model.element_mut(key) else {
            continue;
        };
        let Some(id) = node.xref().map(|xref| xref.id().to_string()) else {
            continue;
        };
        if node.set_xref(Xref::new(id, Some(species.clone()))).is_ok() {
            converted += 1;
        }
    }
    debug!(converted, source = %species, "converted Ensembl references");
    converted
}

/// Fill in missing data sources using `resolver`.
///
/// Only cross-references with an identifier but no data source are
/// offered to the resolver. Returns the number of references completed.
pub fn resolve_xrefs(model: &mut PathwayModel, resolver: &dyn XrefResolver) -> usize {
    let pending: Vec<(ElementKey, Xref)> = model
        .elements()
        .filter_map(|e| e.xref().map(|xref| (e.key(), xref.clone())))
        .filter(|(_, xref)| !xref.id().is_empty() && xref.data_source().is_none())
        .collect();

    let mut resolved = 0;
    for (key, xref) in pending {
        let Some(source) = resolver.resolve(&xref) else {
            continue;
        };
        if let Some(mut element) = model.element_mut(key) {
            if element
                .set_xref(Xref::new(xref.id(), Some(source)))
                .is_ok()
            {
                resolved += 1;
            }
        }
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{element::Element, values::DataNodeType};

    fn ensembl_node(id: &str, source: &str) -> Element {
        let mut node = Element::data_node(id, DataNodeType::GeneProduct);
        node.set_xref(Xref::new(id, DataSource::well_known(source)))
            .unwrap();
        node
    }

    fn human_model() -> PathwayModel {
        let mut model = PathwayModel::new();
        model
            .pathway_mut()
            .set_organism(Some("Homo sapiens"))
            .unwrap();
        model
    }

    #[test]
    fn converts_generic_ensembl_for_known_species() {
        let mut model = human_model();
        model.add(ensembl_node("ENSG00000141510", "Ensembl")).unwrap();
        model.add(ensembl_node("7157", "Entrez Gene")).unwrap();

        assert!(uses_old_ensembl(&model));
        assert_eq!(convert_ensembl(&mut model), 1);
        assert!(!uses_old_ensembl(&model));

        let sources: Vec<_> = model
            .elements()
            .filter_map(|e| e.xref())
            .filter_map(|x| x.data_source())
            .map(DataSource::full_name)
            .collect();
        assert_eq!(sources, vec!["Ensembl Human", "Entrez Gene"]);
    }

    #[test]
    fn unknown_organism_is_left_alone() {
        let mut model = PathwayModel::new();
        model.add(ensembl_node("ENSG00000141510", "Ensembl")).unwrap();

        assert!(!uses_old_ensembl(&model));
        assert_eq!(convert_ensembl(&mut model), 0);
    }

    struct Fixed;

    impl XrefResolver for Fixed {
        fn resolve(&self, xref: &Xref) -> Option<DataSource> {
            xref.id()
                .starts_with("ENS")
                .then(|| DataSource::well_known("Ensembl Human"))
                .flatten()
        }
    }

    #[test]
    fn resolver_fills_in_missing_sources() {
        let mut model = PathwayModel::new();
        for id in ["ENSG1", "unknown", ""] {
            let mut node = Element::data_node(id, DataNodeType::GeneProduct);
            node.set_xref(Xref::new(id, None)).unwrap();
            model.add(node).unwrap();
        }

        assert_eq!(resolve_xrefs(&mut model, &Fixed), 1);
    }
}
