use comfy_table::{Table, ContentArrangement, presets::UTF8_FULL, Cell, Color};
use textplots::Plot;

use crate::import::ImportResult;
use daletou_db::models::{Candidate, Draw, NumberStats, Region};
use daletou_gen::analysis::{HotColdSelection, draw_metrics};
use daletou_gen::{Generation, StopReason};

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:02}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Tirage", "Date", "Zone avant", "Zone arrière", "Somme avant", "Impairs", "Ventes", "Cagnotte"]);

    for draw in draws {
        let metrics = draw_metrics(draw);
        let or_dash = |s: &str| if s.is_empty() { "—".to_string() } else { s.to_string() };

        table.add_row(vec![
            draw.issue.clone(),
            draw.date.clone(),
            join_numbers(&draw.front),
            join_numbers(&draw.back),
            metrics.sum_front.to_string(),
            format!("{}/7", metrics.odd_count),
            or_dash(&draw.sales),
            or_dash(&draw.pool),
        ]);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total lignes lues : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn stats_table(stats: &[NumberStats], hot: &[u8], cold: &[u8]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Numéro", "Fréquence", "Retard", "Tag"]);

    let mut sorted = stats.to_vec();
    sorted.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));

    for stat in &sorted {
        let (tag, color) = if hot.contains(&stat.number) {
            ("Chaud", Color::Green)
        } else if cold.contains(&stat.number) {
            ("Froid", Color::Red)
        } else {
            ("", Color::White)
        };
        table.add_row(vec![
            Cell::new(format!("{:02}", stat.number)),
            Cell::new(stat.frequency.to_string()),
            Cell::new(stat.gap.to_string()),
            Cell::new(tag).fg(color),
        ]);
    }
    table
}

pub fn display_stats(
    front_stats: &[NumberStats],
    back_stats: &[NumberStats],
    selection: &HotColdSelection,
    window: usize,
) {
    println!("\n📊 Statistiques sur {} tirages\n", window);

    println!("── {} (1-{}) ──", Region::Front.label(), Region::Front.size());
    println!("{}", stats_table(front_stats, &selection.hot_front, &selection.cold_front));

    println!("\n── {} (1-{}) ──", Region::Back.label(), Region::Back.size());
    println!("{}", stats_table(back_stats, &selection.hot_back, &selection.cold_back));

    println!("\nChauds : avant [{}]  arrière [{}]", join_numbers(&selection.hot_front), join_numbers(&selection.hot_back));
    println!("Froids : avant [{}]  arrière [{}]", join_numbers(&selection.cold_front), join_numbers(&selection.cold_back));
}

/// Somme de la zone avant, du plus ancien au plus récent. draws[0] = le plus récent.
pub fn display_sum_chart(draws: &[Draw]) {
    println!("\n== Somme de la zone avant par tirage ==\n");

    let points: Vec<(f32, f32)> = draws
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| (i as f32, draw_metrics(d).sum_front as f32))
        .collect();

    if points.len() < 2 {
        println!("  (Pas assez de données à afficher)");
        return;
    }

    let x_max = (points.len() - 1) as f32;
    let y_min = points.iter().map(|p| p.1).fold(f32::INFINITY, f32::min) - 5.0;
    let y_max = points.iter().map(|p| p.1).fold(f32::NEG_INFINITY, f32::max) + 5.0;

    let shape = textplots::Shape::Lines(&points);
    let mut chart = textplots::Chart::new_with_y_range(120, 40, 0.0, x_max, y_min, y_max);
    println!("{}", chart.lineplot(&shape));
}

pub fn display_candidates(candidates: &[Candidate]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Zone avant", "Zone arrière", "Somme avant", "Impairs avant"]);

    for (i, candidate) in candidates.iter().enumerate() {
        let sum: u32 = candidate.front.iter().map(|&n| n as u32).sum();
        let odd = candidate.front.iter().filter(|&&n| n % 2 == 1).count();
        table.add_row(vec![
            format!("{}", i + 1),
            join_numbers(&candidate.front),
            join_numbers(&candidate.back),
            sum.to_string(),
            odd.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_generation(generation: &Generation, requested: usize) {
    println!("\n🎲 Combinaisons générées\n");

    if generation.candidates.is_empty() {
        println!("Aucune combinaison ne satisfait les conditions ({}).", generation.reason);
        println!("Conseil : relâchez les contraintes (moins d'exclusions ou plage de somme plus large).");
        return;
    }

    display_candidates(&generation.candidates);

    match generation.reason {
        StopReason::Filled => println!(
            "{} combinaison(s) en {} essai(s).",
            generation.candidates.len(),
            generation.attempts
        ),
        _ => println!(
            "{} combinaison(s) sur {} demandée(s) : {} après {} essai(s).",
            generation.candidates.len(),
            requested,
            generation.reason,
            generation.attempts
        ),
    }
}
