// ============================================================================
// Structure : DecimalValue
// ============================================================================
// Représente un cours de devise comme nombre à virgule fixe exact
//
// CONCEPTS RUST :
// 1. Newtype-like struct : encapsuler deux String avec un invariant
// 2. Option<T> : parsing qui peut échouer sans exception
// 3. f64 uniquement en sortie : les chiffres source ne passent jamais
//    par un flottant binaire (pas d'erreur d'arrondi type 0.1 + 0.2)
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

/// Nombre décimal exact : partie entière et partie fractionnaire
/// conservées comme chaînes de chiffres ASCII
///
/// Invariant : les deux parties ne contiennent que des chiffres ASCII,
/// la partie fractionnaire n'est jamais vide ("75" est stocké ("75", "0")).
/// La valeur représentée est `integer + "." + fractional`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecimalValue {
    /// Partie entière (ex: "75"), sans signe
    pub integer: String,

    /// Partie fractionnaire (ex: "3214"), longueur variable
    pub fractional: String,
}

impl DecimalValue {
    /// Construit un DecimalValue à partir des deux parties
    ///
    /// Retourne None si une partie contient autre chose que des chiffres
    /// ASCII ou si la partie entière est vide.
    pub fn new(integer: &str, fractional: &str) -> Option<Self> {
        // La partie fractionnaire absente vaut "0"
        let fractional = if fractional.is_empty() { "0" } else { fractional };

        if integer.is_empty() || !is_ascii_digits(integer) || !is_ascii_digits(fractional) {
            return None;
        }

        Some(Self {
            integer: integer.to_string(),
            fractional: fractional.to_string(),
        })
    }

    /// Parse une chaîne décimale avec un point comme séparateur
    ///
    /// CONCEPT RUST : split_once
    /// - "75.3214" -> Some(("75", "3214"))
    /// - "75" (pas de point) -> partie fractionnaire "0"
    ///
    /// # Exemple
    /// let v = DecimalValue::parse("75.3214").unwrap();
    /// assert_eq!(v.integer, "75");
    pub fn parse(s: &str) -> Option<Self> {
        match s.split_once('.') {
            Some((integer, fractional)) => Self::new(integer, fractional),
            None => Self::new(s, "0"),
        }
    }

    /// Construit un DecimalValue depuis un flottant arrondi à 2 décimales
    ///
    /// Utilisé après l'ajustement par le nominal : format!("{:.2}") garantit
    /// exactement deux chiffres fractionnaires (75.0 -> "75.00", 100.0 ->
    /// "100.00"), donc le split ne voit jamais une partie fractionnaire
    /// manquante ou trop courte.
    pub fn from_f64_rounded(value: f64) -> Option<Self> {
        // Valeurs négatives ou non finies : pas de cours valide
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        Self::parse(&format!("{:.2}", value))
    }

    /// Reconstruit la valeur flottante (pour le tracé du graphique)
    ///
    /// CONCEPT RUST : unwrap_or
    /// - L'invariant (chiffres uniquement) rend le parse infaillible,
    ///   mais on garde un fallback plutôt qu'un unwrap()
    pub fn to_f64(&self) -> f64 {
        format!("{}.{}", self.integer, self.fractional)
            .parse()
            .unwrap_or(0.0)
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.integer, self.fractional)
    }
}

/// Vérifie qu'une chaîne non vide ne contient que des chiffres ASCII
fn is_ascii_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

// ============================================================================
// Tests unitaires
// ============================================================================
