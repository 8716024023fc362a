use std::collections::BTreeSet;

use daletou_db::models::{Draw, NumberStats, Region};
use serde::{Deserialize, Serialize};

use crate::constraints::ConstraintSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOrder {
    NewestFirst,
    OldestFirst,
}

/// Valeur par numéro sur tout l'univers d'une zone, numéros croissants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberTable {
    region: Region,
    values: Vec<u32>,
}

impl NumberTable {
    fn zeros(region: Region) -> Self {
        Self {
            region,
            values: vec![0; region.size()],
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn get(&self, number: u8) -> Option<u32> {
        if !self.region.contains(number) {
            return None;
        }
        Some(self.values[(number - 1) as usize])
    }

    pub fn values(&self) -> &[u32] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.values.iter().enumerate().map(|(i, &v)| ((i + 1) as u8, v))
    }

    pub fn total(&self) -> u32 {
        self.values.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawTables {
    pub front: NumberTable,
    pub back: NumberTable,
}

impl DrawTables {
    pub fn get(&self, region: Region) -> &NumberTable {
        match region {
            Region::Front => &self.front,
            Region::Back => &self.back,
        }
    }
}

pub fn region_frequency(draws: &[Draw], region: Region) -> NumberTable {
    let mut table = NumberTable::zeros(region);
    for draw in draws {
        for &n in region.numbers_from(draw) {
            if region.contains(n) {
                table.values[(n - 1) as usize] += 1;
            }
        }
    }
    table
}

/// Nombre d'apparitions de chaque numéro sur l'ensemble des tirages.
pub fn frequency_table(draws: &[Draw]) -> DrawTables {
    DrawTables {
        front: region_frequency(draws, Region::Front),
        back: region_frequency(draws, Region::Back),
    }
}

/// Retard : tirages écoulés depuis la dernière apparition (0 = sorti au dernier
/// tirage). Un numéro absent de la fenêtre reçoit la taille de la fenêtre.
pub fn region_gap(draws: &[Draw], region: Region, order: DrawOrder) -> NumberTable {
    let newest_first: Vec<&Draw> = match order {
        DrawOrder::NewestFirst => draws.iter().collect(),
        DrawOrder::OldestFirst => draws.iter().rev().collect(),
    };

    let mut last_seen: Vec<Option<u32>> = vec![None; region.size()];
    for (i, draw) in newest_first.iter().enumerate() {
        for &n in region.numbers_from(draw) {
            if region.contains(n) {
                let slot = &mut last_seen[(n - 1) as usize];
                if slot.is_none() {
                    *slot = Some(i as u32);
                }
            }
        }
    }

    let window = draws.len() as u32;
    NumberTable {
        region,
        values: last_seen.into_iter().map(|g| g.unwrap_or(window)).collect(),
    }
}

pub fn gap_table(draws: &[Draw], order: DrawOrder) -> DrawTables {
    DrawTables {
        front: region_gap(draws, Region::Front, order),
        back: region_gap(draws, Region::Back, order),
    }
}

/// Fréquence et retard par numéro. draws[0] = tirage le plus récent.
pub fn compute_stats(draws: &[Draw], region: Region) -> Vec<NumberStats> {
    let frequency = region_frequency(draws, region);
    let gap = region_gap(draws, region, DrawOrder::NewestFirst);
    frequency
        .iter()
        .zip(gap.iter())
        .map(|((number, frequency), (_, gap))| NumberStats { number, frequency, gap })
        .collect()
}

/// Les `top_k` numéros les plus fréquents sur les `recent` derniers tirages
/// (draws[0] = le plus récent). Égalités : le plus petit retard, puis le plus petit numéro.
/// Seuls les numéros sortis au moins une fois dans la fenêtre sont retenus.
pub fn hot_numbers(draws: &[Draw], region: Region, recent: usize, top_k: usize) -> Vec<u8> {
    let mut stats = compute_stats(&draws[..recent.min(draws.len())], region);
    stats.retain(|s| s.frequency > 0);
    stats.sort_by(|a, b| {
        b.frequency
            .cmp(&a.frequency)
            .then(a.gap.cmp(&b.gap))
            .then(a.number.cmp(&b.number))
    });
    stats.into_iter().take(top_k).map(|s| s.number).collect()
}

/// Les `top_k` numéros les moins fréquents. Égalités : le plus grand retard, puis le plus petit numéro.
pub fn cold_numbers(draws: &[Draw], region: Region, recent: usize, top_k: usize) -> Vec<u8> {
    let mut stats = compute_stats(&draws[..recent.min(draws.len())], region);
    stats.sort_by(|a, b| {
        a.frequency
            .cmp(&b.frequency)
            .then(b.gap.cmp(&a.gap))
            .then(a.number.cmp(&b.number))
    });
    stats.into_iter().take(top_k).map(|s| s.number).collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HotColdMode {
    /// Les numéros chauds sont exclus.
    #[default]
    Exclude,
    /// Les numéros chauds sont favorisés et les froids défavorisés.
    Weight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HotColdRule {
    pub recent: usize,
    pub front_top: usize,
    pub back_top: usize,
    pub mode: HotColdMode,
}

impl Default for HotColdRule {
    fn default() -> Self {
        Self {
            recent: 20,
            front_top: 2,
            back_top: 1,
            mode: HotColdMode::Exclude,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotColdSelection {
    pub hot_front: Vec<u8>,
    pub hot_back: Vec<u8>,
    pub cold_front: Vec<u8>,
    pub cold_back: Vec<u8>,
}

impl HotColdRule {
    fn top(&self, region: Region) -> usize {
        match region {
            Region::Front => self.front_top,
            Region::Back => self.back_top,
        }
    }

    /// Calcule les numéros chauds (et froids en mode pondéré) et les fusionne dans `spec`.
    pub fn apply(&self, draws: &[Draw], spec: &mut ConstraintSpec) -> HotColdSelection {
        let mut selection = HotColdSelection::default();
        for region in Region::ALL {
            let k = self.top(region);
            let hot = hot_numbers(draws, region, self.recent, k);
            let cold = match self.mode {
                HotColdMode::Exclude => Vec::new(),
                HotColdMode::Weight => cold_numbers(draws, region, self.recent, k),
            };

            match self.mode {
                HotColdMode::Exclude => spec.exclude_mut(region).extend(hot.iter().copied()),
                HotColdMode::Weight => {
                    spec.hot_mut(region).extend(hot.iter().copied());
                    let hot_set: BTreeSet<u8> = hot.iter().copied().collect();
                    spec.cold_mut(region)
                        .extend(cold.iter().copied().filter(|n| !hot_set.contains(n)));
                }
            }

            match region {
                Region::Front => {
                    selection.hot_front = hot;
                    selection.cold_front = cold;
                }
                Region::Back => {
                    selection.hot_back = hot;
                    selection.cold_back = cold;
                }
            }
        }
        selection
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DrawMetrics {
    pub sum_front: u32,
    pub sum_back: u32,
    pub sum_all: u32,
    /// Impairs sur les 7 numéros.
    pub odd_count: u32,
}

pub fn draw_metrics(draw: &Draw) -> DrawMetrics {
    let sum_front: u32 = draw.front.iter().map(|&n| n as u32).sum();
    let sum_back: u32 = draw.back.iter().map(|&n| n as u32).sum();
    let odd_count = draw
        .front
        .iter()
        .chain(draw.back.iter())
        .filter(|&&n| n % 2 == 1)
        .count() as u32;
    DrawMetrics {
        sum_front,
        sum_back,
        sum_all: sum_front + sum_back,
        odd_count,
    }
}
