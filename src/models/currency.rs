// ============================================================================
// Structure : CurrencyRecord
// ============================================================================
// Représente une devise issue du flux quotidien de la Banque de Russie
//
// CONCEPTS RUST :
// 1. Composition : CurrencyRecord contient un DecimalValue
// 2. String vs &str : le record possède ses données (owned)
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::DecimalValue;

/// Une devise avec son cours déjà ramené à une unité
///
/// Le cours est ajusté par le nominal au parsing : un record est toujours
/// le prix d'UNE unité de la devise, en roubles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyRecord {
    /// Code alphabétique court (ex: "USD", "EUR")
    pub code: String,

    /// Nom lisible, tel que fourni par le flux (en russe, ex: "Доллар США")
    pub name: String,

    /// Cours en roubles, représentation décimale exacte
    pub rate: DecimalValue,
}

impl CurrencyRecord {
    /// Constructeur : crée un nouveau record
    pub fn new(code: String, name: String, rate: DecimalValue) -> Self {
        Self { code, name, rate }
    }

    /// Formatte le record pour l'affichage console
    ///
    /// Format : "USD      Доллар США                75.3214 RUB"
    pub fn display(&self) -> String {
        format!(
            "{:<8} {:<25} {:>10} RUB",
            self.code,
            self.name,
            self.rate.to_string()
        )
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
