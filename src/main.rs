// ============================================================================
// cbrates : Cours de change quotidiens de la Banque de Russie
// ============================================================================
// Récupère le flux XML quotidien de cbr.ru, parse les devises demandées
// et écrit un histogramme des cours dans un fichier image
//
// CONCEPTS RUST CLÉS :
// 1. Async dans sync : tokio::runtime::Runtime pour l'appel API
// 2. Dependency injection : une seule instance CbrRates, passée aux appelants
// 3. Logging fichier : tracing avec rotation quotidienne
// ============================================================================

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use cbrates::api::CbrRates;
use cbrates::models::CurrencyList;

/// Identifiants internes du flux chargés par défaut
///
/// Ce sont les ID de l'attribut <Valute ID="...">, pas les codes devise :
/// R01035 = livre sterling, R01335 = tenge kazakh, R01700J = livre turque
const DEFAULT_CURRENCY_IDS: [&str; 3] = ["R01035", "R01335", "R01700J"];

/// Délai minimum entre deux requêtes vers cbr.ru
const REQUEST_INTERVAL: Duration = Duration::from_secs(2);

/// Fichier image produit par défaut
const DEFAULT_OUTPUT: &str = "currencies.jpg";

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging fichier
// - Tracing : framework moderne de logging structuré
// - Rotation quotidienne automatique des logs
// - Le répertoire est résolu avec dirs (~/.local/share/cbrates/logs
//   sur Linux), fallback ./logs
// ============================================================================

/// Initialise le système de logging vers fichier
///
/// CONCEPT RUST : Tracing subscriber
/// - Registry : point central des logs
/// - Layer : transforme et route les logs
/// - EnvFilter : filtre par niveau (RUST_LOG env var)
/// - RollingFileAppender : rotation automatique
///
/// # Utilisation
/// ```bash
/// # Voir les logs en temps réel
/// tail -f ~/.local/share/cbrates/logs/cbrates.log
///
/// # Contrôler le niveau de log
/// RUST_LOG=debug cargo run
/// RUST_LOG=cbrates=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = dirs::data_local_dir()
        .map(|d| d.join("cbrates").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"));

    // Crée le répertoire s'il n'existe pas
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    // Configure la rotation quotidienne des logs
    // CONCEPT : Log rotation
    // - Rotation::DAILY : nouveau fichier chaque jour
    // - Évite que les logs deviennent trop gros
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "cbrates.log");

    // Configure le subscriber (receveur de logs)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender) // Écrit dans le fichier
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true) // Inclut le module (ex: cbrates::api::cbr)
                .with_line_number(true), // Inclut le numéro de ligne
        )
        .with(
            // Filtre les logs par niveau
            // - RUST_LOG=debug : tous les logs debug+
            // - Par défaut : debug pour cbrates, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cbrates=debug,info".into()),
        )
        .init();

    // Premier log : confirme que le logging est initialisé
    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================
// CONCEPT RUST : Async dans sync
// - main() est synchrone
// - L'appel API est async : tokio::runtime::Runtime + block_on
// ============================================================================

fn main() -> Result<()> {
    // Initialize logging FIRST
    // - Si init échoue, on affiche l'erreur et continue quand même
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("cbrates starting up");

    // Chemin de sortie : premier argument CLI, sinon currencies.jpg
    let output: PathBuf = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string())
        .into();

    // Une seule instance du fournisseur, construite ici et passée partout
    // où on en a besoin (pas de singleton implicite)
    let provider = CbrRates::new(REQUEST_INTERVAL);

    let filter: HashSet<String> = DEFAULT_CURRENCY_IDS
        .iter()
        .map(|id| id.to_string())
        .collect();

    println!("📊 Récupération des cours depuis cbr.ru...");
    let runtime = tokio::runtime::Runtime::new()?;
    let records = runtime.block_on(provider.get_currencies(Some(&filter)));

    let currencies = CurrencyList::new(records);

    if currencies.is_empty() {
        // Échec réseau ou filtre sans correspondance : rien à tracer
        error!("No currency rates retrieved");
        println!("⚠ Aucun cours récupéré, pas de graphique généré");
        return Ok(());
    }

    info!(currencies = currencies.len(), "Currency rates loaded");
    println!("✅ {} devises récupérées :\n", currencies.len());
    for record in &currencies {
        println!("  {}", record.display());
    }

    currencies
        .visualize(&output)
        .context("Échec de la génération du graphique")?;

    println!("\n✅ Graphique écrit dans {}", output.display());
    Ok(())
}
