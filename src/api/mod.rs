// ============================================================================
// Module : api
// ============================================================================
// Ce module contient les clients API pour récupérer les cours de change
// depuis les sources externes (Banque centrale de Russie)
// ============================================================================

pub mod cbr;  // Client du flux XML quotidien de cbr.ru

// Re-export du fournisseur principal
pub use cbr::CbrRates;
