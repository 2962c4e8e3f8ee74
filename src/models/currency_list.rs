// ============================================================================
// Structure : CurrencyList
// ============================================================================
// Lot de devises récupérées en une requête, dans l'ordre du document source
//
// CONCEPTS RUST :
// 1. Ownership : la liste possède le Vec, le Vec possède les records
// 2. IntoIterator sur &CurrencyList : itération sans consommer la liste,
//    relançable autant de fois qu'on veut (la liste est immuable après
//    construction)
// ============================================================================

use std::path::Path;
use std::slice;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::chart;
use crate::models::CurrencyRecord;

/// Collection ordonnée de devises
///
/// L'ordre suit le document source ; aucun dédoublonnage (deux éléments
/// avec le même code survivent tous les deux).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyList {
    /// Liste des records, dans l'ordre du flux
    records: Vec<CurrencyRecord>,
}

impl CurrencyList {
    /// Crée une liste depuis les records parsés
    pub fn new(records: Vec<CurrencyRecord>) -> Self {
        Self { records }
    }

    /// Retourne le nombre de devises
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Vérifie si la liste est vide
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Itère sur les records (relançable, ordre stable)
    pub fn iter(&self) -> slice::Iter<'_, CurrencyRecord> {
        self.records.iter()
    }

    /// Construit les paires (nom, valeur) dans l'ordre de la liste
    ///
    /// C'est le contrat exact passé au collaborateur graphique : la valeur
    /// est reconstruite depuis le DecimalValue (entier + "." + fraction).
    pub fn chart_series(&self) -> Vec<(String, f64)> {
        self.records
            .iter()
            .map(|r| (r.name.clone(), r.rate.to_f64()))
            .collect()
    }

    /// Trace l'histogramme des cours et l'écrit dans le fichier `path`
    ///
    /// CONCEPT RUST : délégation
    /// - La liste prépare les données, le module chart fait le rendu
    /// - Effet de bord uniquement (écriture du fichier image)
    pub fn visualize(&self, path: &Path) -> Result<()> {
        chart::render_bar_chart(path, &self.chart_series())
    }
}

impl<'a> IntoIterator for &'a CurrencyList {
    type Item = &'a CurrencyRecord;
    type IntoIter = slice::Iter<'a, CurrencyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
