use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::seq::index;

use crate::config::Block;

/// Tirage uniforme sans remise de `k` numéros, trié.
pub fn sample_uniform<R: Rng + ?Sized>(pool: &[u8], k: usize, rng: &mut R) -> Option<Vec<u8>> {
    if pool.len() < k {
        return None;
    }
    let mut picked: Vec<u8> = index::sample(rng, pool.len(), k)
        .into_iter()
        .map(|i| pool[i])
        .collect();
    picked.sort_unstable();
    Some(picked)
}

/// Pondération scalaire chaud/froid : chaud × hot_weight, froid × cold_weight, sinon 1.
#[derive(Debug, Clone)]
pub struct HotColdSampler {
    pool: Vec<u8>,
    weights: Vec<f64>,
}

impl HotColdSampler {
    pub fn new(
        pool: Vec<u8>,
        hot: &BTreeSet<u8>,
        cold: &BTreeSet<u8>,
        hot_weight: f64,
        cold_weight: f64,
    ) -> Self {
        let weights = pool
            .iter()
            .map(|n| {
                if hot.contains(n) {
                    hot_weight
                } else if cold.contains(n) {
                    cold_weight
                } else {
                    1.0
                }
            })
            .collect();
        Self { pool, weights }
    }

    pub fn pool(&self) -> &[u8] {
        &self.pool
    }

    pub fn weight_of(&self, n: u8) -> Option<f64> {
        self.pool.iter().position(|&p| p == n).map(|i| self.weights[i])
    }

    /// Tirages pondérés successifs sans remise. Si les poids restants deviennent
    /// inutilisables, on termine par un tirage uniforme sur tout le pool.
    pub fn draw<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Option<Vec<u8>> {
        if self.pool.len() < k {
            return None;
        }

        let mut available: Vec<(u8, f64)> = self
            .pool
            .iter()
            .copied()
            .zip(self.weights.iter().copied())
            .collect();
        let mut selected = Vec::with_capacity(k);

        for _ in 0..k {
            let weights: Vec<f64> = available.iter().map(|(_, w)| *w).collect();
            let dist = match WeightedIndex::new(&weights) {
                Ok(dist) => dist,
                Err(e) => {
                    log::debug!("Poids inutilisables ({e}), repli sur un tirage uniforme");
                    return sample_uniform(&self.pool, k, rng);
                }
            };
            let (number, _) = available.remove(dist.sample(rng));
            selected.push(number);
        }

        selected.sort_unstable();
        Some(selected)
    }
}

#[derive(Debug, Clone)]
struct BlockGroup {
    name: String,
    weight: f64,
    members: Vec<u8>,
}

/// Tirage par blocs pondérés : quotas entiers par bloc, reste réparti au hasard
/// selon les poids, puis tirage uniforme dans chaque bloc.
#[derive(Debug, Clone)]
pub struct BlockSampler {
    pool: Vec<u8>,
    groups: Vec<BlockGroup>,
}

impl BlockSampler {
    pub fn new(pool: Vec<u8>, blocks: &[Block], weights: &BTreeMap<String, f64>) -> Self {
        let eligible: Vec<BlockGroup> = blocks
            .iter()
            .map(|block| BlockGroup {
                name: block.name.clone(),
                weight: weights.get(&block.name).copied().unwrap_or(0.0),
                members: pool.iter().copied().filter(|&n| block.contains(n)).collect(),
            })
            .filter(|g| !g.members.is_empty())
            .collect();

        let mut groups: Vec<BlockGroup> = eligible.iter().filter(|g| g.weight > 0.0).cloned().collect();
        if groups.is_empty() {
            // Exclusions ayant vidé tous les blocs pondérés : on garde tous les blocs non vides.
            log::debug!("Aucun bloc pondéré éligible, repli sur tous les blocs non vides");
            groups = eligible;
            if groups.iter().all(|g| g.weight <= 0.0) {
                for g in &mut groups {
                    g.weight = 1.0;
                }
            }
        }

        let total: f64 = groups.iter().map(|g| g.weight).sum();
        if total > 0.0 {
            for g in &mut groups {
                g.weight /= total;
            }
        }

        Self { pool, groups }
    }

    pub fn pool(&self) -> &[u8] {
        &self.pool
    }

    /// Blocs participants et poids normalisés.
    pub fn normalized_weights(&self) -> Vec<(&str, f64)> {
        self.groups.iter().map(|g| (g.name.as_str(), g.weight)).collect()
    }

    pub fn draw<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Option<Vec<u8>> {
        if self.pool.len() < k {
            return None;
        }

        let weights: Vec<f64> = self.groups.iter().map(|g| g.weight).collect();
        let capacities: Vec<usize> = self.groups.iter().map(|g| g.members.len()).collect();
        let quotas = allocate_quotas(&weights, &capacities, k, rng);

        let mut picked = BTreeSet::new();
        for (group, &quota) in self.groups.iter().zip(quotas.iter()) {
            if quota == 0 {
                continue;
            }
            picked.extend(sample_uniform(&group.members, quota, rng)?);
        }

        if picked.len() < k {
            let remaining: Vec<u8> = self.pool.iter().copied().filter(|n| !picked.contains(n)).collect();
            picked.extend(sample_uniform(&remaining, k - picked.len(), rng)?);
        }

        let mut numbers: Vec<u8> = picked.into_iter().collect();
        numbers.truncate(k);
        Some(numbers)
    }
}

/// Quotas par bloc : floor(poids × k), plafonnés à la capacité du bloc ; chaque
/// unité restante va à un bloc tiré au hasard selon son poids parmi ceux qui ont
/// encore de la place. Le total peut rester inférieur à k si tous les blocs sont pleins.
pub fn allocate_quotas<R: Rng + ?Sized>(
    weights: &[f64],
    capacities: &[usize],
    k: usize,
    rng: &mut R,
) -> Vec<usize> {
    let mut quotas: Vec<usize> = weights
        .iter()
        .zip(capacities.iter())
        .map(|(&w, &cap)| (((w * k as f64) + 1e-9).floor() as usize).min(cap))
        .collect();

    let mut assigned: usize = quotas.iter().sum();
    while assigned < k {
        let open: Vec<f64> = weights
            .iter()
            .enumerate()
            .map(|(i, &w)| if quotas[i] < capacities[i] { w } else { 0.0 })
            .collect();
        let Ok(dist) = WeightedIndex::new(&open) else {
            break;
        };
        quotas[dist.sample(rng)] += 1;
        assigned += 1;
    }

    quotas
}

/// Stratégie de tirage retenue pour une zone.
#[derive(Debug, Clone)]
pub enum RegionSampler {
    HotCold(HotColdSampler),
    Blocks(BlockSampler),
}

impl RegionSampler {
    pub fn pool(&self) -> &[u8] {
        match self {
            RegionSampler::HotCold(s) => s.pool(),
            RegionSampler::Blocks(s) => s.pool(),
        }
    }

    pub fn draw<R: Rng + ?Sized>(&self, k: usize, rng: &mut R) -> Option<Vec<u8>> {
        match self {
            RegionSampler::HotCold(s) => s.draw(k, rng),
            RegionSampler::Blocks(s) => s.draw(k, rng),
        }
    }
}
