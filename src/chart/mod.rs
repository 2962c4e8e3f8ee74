// ============================================================================
// Chart - Rendu de l'histogramme des cours
// ============================================================================
// Dessine un bar chart nom-vs-cours et l'écrit dans un fichier image
//
// CONCEPTS RUST :
// 1. Iterator avec fold : calculer le max en un seul passage
// 2. Closures : pour les labels de l'axe X
//
// CONCEPTS PLOTTERS :
// 1. BitMapBackend : rendu bitmap, format choisi par l'extension du fichier
// 2. Coordonnées segmentées : une barre par segment, label au centre
// 3. ChartBuilder : caption, marges, zones de labels
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use plotters::prelude::*;
use tracing::{debug, info};

/// Dimensions de l'image générée
const CHART_SIZE: (u32, u32) = (1024, 768);

/// Titre du graphique
const CHART_TITLE: &str = "Курсы валют ЦБ РФ";

/// Dessine un bar chart des paires (nom, valeur) dans le fichier `path`
///
/// Le contrat d'entrée est une liste ordonnée de labels et de valeurs :
/// une barre par paire, dans l'ordre reçu. Une liste vide produit quand
/// même une image valide (fond + titre, pas de barres).
///
/// CONCEPT RUST : early return
/// - Le cas vide est traité à part pour éviter un axe de largeur nulle
pub fn render_bar_chart(path: &Path, series: &[(String, f64)]) -> Result<()> {
    debug!(path = %path.display(), bars = series.len(), "Rendering bar chart");

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .context("Échec du remplissage du fond du graphique")?;

    if series.is_empty() {
        // Pas de données : image valide avec titre seul
        root.titled(CHART_TITLE, ("sans-serif", 32))
            .context("Échec du rendu du titre")?;
        root.present()
            .context("Échec de l'écriture du fichier image")?;
        info!(path = %path.display(), "Empty chart written");
        return Ok(());
    }

    // Calcule la borne haute de l'axe Y avec une marge de 10%
    // pour que le graphique respire
    let max_value = series.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    let y_max = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };

    // CONCEPT PLOTTERS : into_segmented
    // - Transforme l'axe 0..n en segments discrets
    // - Chaque barre occupe un segment entier, le label est centré dessous
    let mut chart = ChartBuilder::on(&root)
        .caption(CHART_TITLE, ("sans-serif", 32))
        .margin(12)
        .x_label_area_size(110)
        .y_label_area_size(70)
        .build_cartesian_2d((0usize..series.len()).into_segmented(), 0f64..y_max)
        .context("Échec de la construction des axes")?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Валюта")
        .y_desc("Курс (RUB)")
        .x_labels(series.len())
        .x_label_formatter(&|position| match position {
            // Label de segment : le nom de la devise correspondante
            SegmentValue::CenterOf(i) => series
                .get(*i)
                .map(|(name, _)| name.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .draw()
        .context("Échec du rendu de la grille")?;

    // Une barre rectangulaire par devise, du bas de l'axe à sa valeur
    chart
        .draw_series(series.iter().enumerate().map(|(i, (_, value))| {
            let mut bar = Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), *value),
                ],
                BLUE.filled(),
            );
            // Petit espace entre les barres
            bar.set_margin(0, 0, 6, 6);
            bar
        }))
        .context("Échec du rendu des barres")?;

    root.present()
        .context("Échec de l'écriture du fichier image")?;

    info!(path = %path.display(), bars = series.len(), "Chart written");
    Ok(())
}

// ============================================================================
// Tests unitaires
// ============================================================================
