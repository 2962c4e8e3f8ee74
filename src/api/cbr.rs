// ============================================================================
// API Client : Banque centrale de Russie (cbr.ru)
// ============================================================================
// Récupère les cours de change quotidiens depuis le flux XML officiel
//
// CONCEPTS RUST AVANCÉS :
// 1. async/await : programmation asynchrone (non-bloquante)
// 2. Result<T, E> : gestion d'erreurs avec contexte
// 3. Serde + quick-xml : désérialisation XML automatique
// 4. tokio::sync::Mutex : section critique tenable à travers un .await
// ============================================================================

use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::models::{CurrencyRecord, DecimalValue};

/// URL du flux quotidien (pas de paramètres, pas d'authentification)
const DAILY_FEED_URL: &str = "https://www.cbr.ru/scripts/XML_daily.asp";

// ============================================================================
// Structures pour parser le document XML du flux
// ============================================================================
// Le flux retourne un document <ValCurs> avec un élément <Valute> répété,
// on définit des structures qui matchent exactement la structure XML pour
// que serde puisse désérialiser automatiquement
//
// CONCEPT RUST : #[serde(rename = "@ID")]
// - Le préfixe @ désigne un attribut XML (et non un élément enfant)
// - Exemple : <Valute ID="R01035"> -> champ id
//
// Les champs enfants sont Option : un élément auquel il manque un champ
// doit être ignorable individuellement, pas faire échouer tout le document
// ============================================================================

/// Document complet du flux quotidien
#[derive(Debug, Deserialize)]
struct ValCurs {
    /// Date de cotation, format "07.08.2026"
    #[serde(rename = "@Date")]
    date: Option<String>,

    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

/// Un élément <Valute> : une devise cotée
#[derive(Debug, Deserialize)]
struct Valute {
    /// Identifiant interne du flux (ex: "R01035"), distinct du code devise
    #[serde(rename = "@ID")]
    id: Option<String>,

    /// Nom lisible, en russe
    #[serde(rename = "Name")]
    name: Option<String>,

    /// Cours avec une virgule comme séparateur décimal (ex: "75,3214")
    #[serde(rename = "Value")]
    value: Option<String>,

    /// Nominal : taille de lot à laquelle s'applique le cours (ex: "100")
    #[serde(rename = "Nominal")]
    nominal: Option<String>,

    /// Code alphabétique court (ex: "USD")
    #[serde(rename = "CharCode")]
    char_code: Option<String>,
}

// ============================================================================
// CbrRates : le fournisseur de cours
// ============================================================================
// CONCEPT : Dependency injection plutôt que singleton
// - main() construit UNE instance et la passe aux appelants
// - L'état du throttle (timestamp de la dernière requête) vit dans
//   l'instance, protégé par un Mutex
// ============================================================================

/// Fournisseur des cours quotidiens, avec throttle entre requêtes
///
/// Le throttle est une politesse envers le serveur : on garantit un délai
/// minimum entre deux requêtes réseau, quel que soit l'appelant.
pub struct CbrRates {
    /// Délai minimum entre deux requêtes
    min_interval: Duration,

    /// Instant de la dernière requête (None avant la première)
    ///
    /// CONCEPT RUST : tokio::sync::Mutex vs std::sync::Mutex
    /// - Le guard tokio peut être tenu à travers un .await (le sleep)
    /// - La séquence lire-attendre-mettre à jour est donc une section
    ///   critique : deux appelants concurrents ne peuvent pas passer le
    ///   throttle en même temps
    last_request: Mutex<Option<Instant>>,
}

impl CbrRates {
    /// Crée un fournisseur avec le délai minimum donné entre requêtes
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Récupère les cours du jour, éventuellement filtrés
    ///
    /// `filter` contient des identifiants INTERNES du flux (ex: "R01035"),
    /// pas des codes devise. None = toutes les devises du flux.
    ///
    /// Une erreur de transport ou un document illisible ne remonte pas à
    /// l'appelant : l'erreur est loggée et la liste retournée est vide.
    /// Un filtre sans correspondance retourne aussi une liste vide (succès).
    ///
    /// CONCEPT RUST : #[instrument]
    /// - Macro tracing qui ajoute automatiquement un span
    /// - Tous les logs à l'intérieur auront le contexte de l'appel
    #[instrument(skip(self, filter), fields(filtered = filter.is_some()))]
    pub async fn get_currencies(&self, filter: Option<&HashSet<String>>) -> Vec<CurrencyRecord> {
        // Throttle AVANT la requête, timestamp mis à jour après l'attente
        self.wait_for_next_request().await;

        let body = match self.fetch_feed().await {
            Ok(body) => body,
            Err(e) => {
                error!(error = ?e, "Failed to fetch daily feed");
                return Vec::new();
            }
        };

        match parse_val_curs(&body, filter) {
            Ok(records) => {
                info!(records = records.len(), "Successfully fetched currency rates");
                records
            }
            Err(e) => {
                error!(error = ?e, "Failed to parse daily feed");
                Vec::new()
            }
        }
    }

    /// Bloque jusqu'à ce que le délai minimum soit écoulé, puis enregistre
    /// l'instant courant comme dernière requête
    ///
    /// Le guard du Mutex est tenu pendant toute la séquence (lecture,
    /// attente, écriture) : c'est ce qui rend le throttle correct même si
    /// le fournisseur est partagé entre plusieurs tâches.
    async fn wait_for_next_request(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Throttling before next request");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Effectue la requête HTTP et retourne le corps décodé
    ///
    /// Le flux est encodé en windows-1251 ; response.text() décode selon le
    /// charset annoncé dans l'en-tête Content-Type.
    async fn fetch_feed(&self) -> Result<String> {
        debug!(url = DAILY_FEED_URL, "Creating HTTP client");
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .context("Échec de la création du client HTTP")?;

        debug!("Sending HTTP request to cbr.ru");
        let response = client
            .get(DAILY_FEED_URL)
            .send()
            .await
            .context("Échec de la requête HTTP vers cbr.ru")?;

        let status = response.status();
        debug!(status = %status, "Received HTTP response");

        // Vérifie que la réponse est un succès HTTP (200-299)
        if !status.is_success() {
            error!(status = %status, "cbr.ru returned error status");
            anyhow::bail!("La Banque de Russie a retourné une erreur : HTTP {}", status);
        }

        response
            .text()
            .await
            .context("Échec de la lecture du corps de la réponse")
    }
}

// ============================================================================
// Parsing du document
// ============================================================================

/// Parse le document ValCurs et convertit chaque élément retenu en record
///
/// Politique pour les éléments malformés : skip-and-log. Un élément auquel
/// il manque un champ (ou dont le cours/nominal est illisible) est ignoré
/// et compté, le reste du document est traité normalement. Un seul warn!
/// rapporte le total ignoré.
fn parse_val_curs(
    body: &str,
    filter: Option<&HashSet<String>>,
) -> Result<Vec<CurrencyRecord>> {
    debug!("Parsing XML response");
    let document: ValCurs =
        quick_xml::de::from_str(body).context("Document ValCurs illisible")?;

    // La date de cotation est informative (loggée, pas stockée)
    if let Some(raw_date) = &document.date {
        match NaiveDate::parse_from_str(raw_date, "%d.%m.%Y") {
            Ok(date) => debug!(date = %date, "Feed quotation date"),
            Err(_) => warn!(date = %raw_date, "Unparseable feed quotation date"),
        }
    }

    let total = document.valutes.len();
    let mut records = Vec::new();
    let mut skipped_count = 0;

    for valute in &document.valutes {
        // Filtrage par identifiant interne (attribut ID), pas par CharCode
        if let Some(filter) = filter {
            match &valute.id {
                Some(id) if filter.contains(id) => {}
                _ => continue,
            }
        }

        match convert_valute(valute) {
            Some(record) => records.push(record),
            None => {
                skipped_count += 1;
            }
        }
    }

    // Log des statistiques de parsing
    if skipped_count > 0 {
        warn!(
            skipped = skipped_count,
            total,
            "Skipped malformed currency elements"
        );
    }

    debug!(
        parsed = records.len(),
        total,
        skipped = skipped_count,
        "Finished parsing daily feed"
    );

    Ok(records)
}

/// Convertit un élément <Valute> en CurrencyRecord
///
/// Retourne None (élément malformé) si un champ requis manque, si le cours
/// n'est pas un nombre décimal ou si le nominal n'est pas un entier non nul.
///
/// CONCEPT RUST : Option chaining avec ?
/// - Chaque champ manquant ou illisible fait un early return None
fn convert_valute(valute: &Valute) -> Option<CurrencyRecord> {
    let name = valute.name.as_deref()?;
    let code = valute.char_code.as_deref()?;
    let nominal: u32 = valute.nominal.as_deref()?.trim().parse().ok()?;
    if nominal == 0 {
        return None;
    }

    // Le flux utilise la virgule comme séparateur décimal
    let raw_value = valute.value.as_deref()?.trim().replace(',', ".");
    let exact = DecimalValue::parse(&raw_value)?;

    // Ajustement par le nominal : le cours publié s'applique à `nominal`
    // unités de la devise, on le ramène à une unité
    let rate = if nominal == 1 {
        // Nominal 1 : les chiffres source sont conservés tels quels
        exact
    } else {
        // Division flottante puis arrondi à 2 décimales, toujours complété
        // à exactement deux chiffres fractionnaires (75.0 -> "75.00")
        DecimalValue::from_f64_rounded(exact.to_f64() / f64::from(nominal))?
    };

    Some(CurrencyRecord::new(
        code.to_string(),
        name.to_string(),
        rate,
    ))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Extrait réaliste du flux quotidien (déjà décodé en UTF-8)
    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="07.08.2026" name="Foreign Currency Market">
    <Valute ID="R01035">
        <NumCode>826</NumCode>
        <CharCode>GBP</CharCode>
        <Nominal>1</Nominal>
        <Name>Фунт стерлингов</Name>
        <Value>112,2754</Value>
    </Valute>
    <Valute ID="R01335">
        <NumCode>398</NumCode>
        <CharCode>KZT</CharCode>
        <Nominal>100</Nominal>
        <Name>Казахстанских тенге</Name>
        <Value>44,8912</Value>
    </Valute>
    <Valute ID="R01700J">
        <NumCode>949</NumCode>
        <CharCode>TRY</CharCode>
        <Nominal>10</Nominal>
        <Name>Турецких лир</Name>
        <Value>150,0000</Value>
    </Valute>
</ValCurs>"#;

    #[test]
    fn test_parse_all_without_filter() {
        let records = parse_val_curs(SAMPLE_FEED, None).unwrap();

        // Toutes les devises, dans l'ordre du document
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].code, "GBP");
        assert_eq!(records[1].code, "KZT");
        assert_eq!(records[2].code, "TRY");
    }

    #[test]
    fn test_nominal_one_keeps_exact_digits() {
        let records = parse_val_curs(SAMPLE_FEED, None).unwrap();

        // Nominal 1 : aucun arrondi, les chiffres source sont conservés
        let gbp = &records[0];
        assert_eq!(gbp.rate.integer, "112");
        assert_eq!(gbp.rate.fractional, "2754");
        assert_eq!(gbp.name, "Фунт стерлингов");
    }

    #[test]
    fn test_nominal_adjustment_rounds_to_two_digits() {
        let records = parse_val_curs(SAMPLE_FEED, None).unwrap();

        // 44.8912 / 100 = 0.448912 -> arrondi 0.45
        let kzt = &records[1];
        assert_eq!(kzt.rate.integer, "0");
        assert_eq!(kzt.rate.fractional, "45");
    }

    #[test]
    fn test_nominal_adjustment_pads_whole_result() {
        let records = parse_val_curs(SAMPLE_FEED, None).unwrap();

        // 150.0000 / 10 = 15.0 : la partie fractionnaire doit être "00",
        // pas manquante (le défaut du split naïf sur ".")
        let try_lira = &records[2];
        assert_eq!(try_lira.rate.integer, "15");
        assert_eq!(try_lira.rate.fractional, "00");
        assert!((try_lira.rate.to_f64() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_filter_by_internal_id() {
        let filter: HashSet<String> = ["R01035".to_string()].into();
        let records = parse_val_curs(SAMPLE_FEED, Some(&filter)).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "GBP");
    }

    #[test]
    fn test_filter_unknown_id_returns_empty() {
        // Identifiant absent du flux : liste vide, pas une erreur
        let filter: HashSet<String> = ["R9999".to_string()].into();
        let records = parse_val_curs(SAMPLE_FEED, Some(&filter)).unwrap();

        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_skips_malformed_element() {
        // Le deuxième élément n'a pas de <Value> : il est ignoré,
        // le reste du document est traité normalement
        let feed = r#"<ValCurs Date="07.08.2026" name="Foreign Currency Market">
            <Valute ID="R01235">
                <CharCode>USD</CharCode>
                <Nominal>1</Nominal>
                <Name>Доллар США</Name>
                <Value>75,3214</Value>
            </Valute>
            <Valute ID="R01239">
                <CharCode>EUR</CharCode>
                <Nominal>1</Nominal>
                <Name>Евро</Name>
            </Valute>
        </ValCurs>"#;

        let records = parse_val_curs(feed, None).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code, "USD");
    }

    #[test]
    fn test_parse_skips_bad_nominal() {
        // Nominal illisible ou nul : élément ignoré
        let feed = r#"<ValCurs Date="07.08.2026" name="Foreign Currency Market">
            <Valute ID="R01235">
                <CharCode>USD</CharCode>
                <Nominal>abc</Nominal>
                <Name>Доллар США</Name>
                <Value>75,3214</Value>
            </Valute>
            <Valute ID="R01239">
                <CharCode>EUR</CharCode>
                <Nominal>0</Nominal>
                <Name>Евро</Name>
                <Value>89,0500</Value>
            </Valute>
        </ValCurs>"#;

        let records = parse_val_curs(feed, None).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_duplicate_ids_both_survive() {
        // Pas de dédoublonnage : deux éléments avec le même ID donnent
        // deux records
        let feed = r#"<ValCurs Date="07.08.2026" name="Foreign Currency Market">
            <Valute ID="R01235">
                <CharCode>USD</CharCode>
                <Nominal>1</Nominal>
                <Name>Доллар США</Name>
                <Value>75,3214</Value>
            </Valute>
            <Valute ID="R01235">
                <CharCode>USD</CharCode>
                <Nominal>1</Nominal>
                <Name>Доллар США</Name>
                <Value>75,3300</Value>
            </Valute>
        </ValCurs>"#;

        let filter: HashSet<String> = ["R01235".to_string()].into();
        let records = parse_val_curs(feed, Some(&filter)).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_garbage_document_is_an_error() {
        assert!(parse_val_curs("pas du xml", None).is_err());
    }

    // CONCEPT RUST : #[tokio::test]
    // - Macro qui setup un runtime tokio pour le test
    // - Permet d'utiliser .await dans les tests
    #[tokio::test]
    async fn test_throttle_spaces_out_requests() {
        let provider = CbrRates::new(Duration::from_millis(150));

        let start = Instant::now();
        provider.wait_for_next_request().await;
        provider.wait_for_next_request().await;

        // Le premier passage est immédiat, le deuxième doit attendre
        // au moins l'intervalle configuré
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_fetch_real_feed() {
        // Test avec un vrai appel réseau (peut échouer si pas de connexion)
        let provider = CbrRates::new(Duration::from_secs(1));
        let filter: HashSet<String> = ["R01035".to_string()].into();

        let start = Instant::now();
        let records = provider.get_currencies(Some(&filter)).await;

        if records.is_empty() {
            println!("⚠ Test skippé (pas de connexion?)");
            return;
        }

        // Propriété attendue : le cours reconstruit d'une devise réelle
        // reste dans une plage plausible
        for record in &records {
            let value = record.rate.to_f64();
            assert!((0.0..=999.0).contains(&value));
            assert!(!record.name.is_empty());
            println!("✓ {} = {} RUB", record.code, record.rate);
        }

        // Deuxième appel identique : le throttle espace les deux requêtes,
        // et le flux quotidien n'ayant pas changé entre-temps, les records
        // sont structurellement identiques
        let second = provider.get_currencies(Some(&filter)).await;
        assert!(start.elapsed() >= Duration::from_secs(1));
        if !second.is_empty() {
            assert_eq!(records, second);
        }
    }

    #[tokio::test]
    async fn test_fetch_unknown_id_real_feed() {
        let provider = CbrRates::new(Duration::from_secs(1));
        let filter: HashSet<String> = ["R9999".to_string()].into();

        // Identifiant inexistant : séquence vide, que le réseau soit
        // disponible ou non
        let records = provider.get_currencies(Some(&filter)).await;
        assert!(records.is_empty());
    }
}
