// ============================================================================
// cbrates - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;     // Client du flux de la Banque centrale de Russie
pub mod models;  // Structures de données
pub mod chart;   // Rendu du graphique vers un fichier image
