use std::collections::{BTreeMap, BTreeSet};

use daletou_db::models::{Candidate, Region};
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::error::{GenerateError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Exact,
    Min,
}

/// Nombre de paires consécutives exigé dans la zone avant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsecutiveRule {
    pub count: usize,
    #[serde(default)]
    pub mode: RunMode,
}

impl ConsecutiveRule {
    pub fn accepts(&self, runs: usize) -> bool {
        match self.mode {
            RunMode::Exact => runs == self.count,
            RunMode::Min => runs >= self.count,
        }
    }
}

/// Bornes incluses sur la somme de la zone avant ; une borne absente ne contraint pas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumRange {
    pub min: Option<u32>,
    pub max: Option<u32>,
}

impl SumRange {
    pub fn contains(&self, sum: u32) -> bool {
        self.min.is_none_or(|min| sum >= min) && self.max.is_none_or(|max| sum <= max)
    }
}

/// Répartition impairs/pairs. Seul `odd` est vérifié ; `even` vaut normalement 5 - odd.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddEven {
    pub odd: usize,
    pub even: usize,
}

impl OddEven {
    pub fn with_odd(odd: usize) -> Self {
        Self {
            odd,
            even: Region::Front.pick_count().saturating_sub(odd),
        }
    }
}

/// Ensemble de règles d'une requête de génération. Chaque champ absent signifie
/// « non contraint ». Aucune cohérence interne n'est vérifiée : des règles
/// contradictoires donnent simplement un résultat vide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintSpec {
    pub front_include: BTreeSet<u8>,
    pub front_exclude: BTreeSet<u8>,
    pub back_include: BTreeSet<u8>,
    pub back_exclude: BTreeSet<u8>,
    #[serde(alias = "sum_front_range")]
    pub sum_front: Option<SumRange>,
    pub odd_even_front: Option<OddEven>,
    pub consecutive: Option<ConsecutiveRule>,
    pub hot_front: BTreeSet<u8>,
    pub cold_front: BTreeSet<u8>,
    pub hot_back: BTreeSet<u8>,
    pub cold_back: BTreeSet<u8>,
    pub front_blocks: BTreeMap<String, f64>,
    pub back_blocks: BTreeMap<String, f64>,
}

impl ConstraintSpec {
    pub fn include(&self, region: Region) -> &BTreeSet<u8> {
        match region {
            Region::Front => &self.front_include,
            Region::Back => &self.back_include,
        }
    }

    pub fn exclude(&self, region: Region) -> &BTreeSet<u8> {
        match region {
            Region::Front => &self.front_exclude,
            Region::Back => &self.back_exclude,
        }
    }

    pub fn exclude_mut(&mut self, region: Region) -> &mut BTreeSet<u8> {
        match region {
            Region::Front => &mut self.front_exclude,
            Region::Back => &mut self.back_exclude,
        }
    }

    pub fn hot(&self, region: Region) -> &BTreeSet<u8> {
        match region {
            Region::Front => &self.hot_front,
            Region::Back => &self.hot_back,
        }
    }

    pub fn hot_mut(&mut self, region: Region) -> &mut BTreeSet<u8> {
        match region {
            Region::Front => &mut self.hot_front,
            Region::Back => &mut self.hot_back,
        }
    }

    pub fn cold(&self, region: Region) -> &BTreeSet<u8> {
        match region {
            Region::Front => &self.cold_front,
            Region::Back => &self.cold_back,
        }
    }

    pub fn cold_mut(&mut self, region: Region) -> &mut BTreeSet<u8> {
        match region {
            Region::Front => &mut self.cold_front,
            Region::Back => &mut self.cold_back,
        }
    }

    pub fn block_weights(&self, region: Region) -> &BTreeMap<String, f64> {
        match region {
            Region::Front => &self.front_blocks,
            Region::Back => &self.back_blocks,
        }
    }

    /// Vérifie les numéros et les noms de blocs. Les contradictions entre règles
    /// (impairs + pairs != 5, min > max) restent de la responsabilité de l'appelant.
    pub fn validate(&self, config: &GeneratorConfig) -> Result<()> {
        for region in Region::ALL {
            let sets = [
                ("include", self.include(region)),
                ("exclude", self.exclude(region)),
                ("hot", self.hot(region)),
                ("cold", self.cold(region)),
            ];
            for (field, set) in sets {
                if let Some(&number) = set.iter().find(|&&n| !region.contains(n)) {
                    return Err(GenerateError::NumberOutOfRange { region, field, number });
                }
            }
            for (name, &weight) in self.block_weights(region) {
                if config.find_block(region, name).is_none() {
                    return Err(GenerateError::UnknownBlock {
                        region,
                        name: name.clone(),
                    });
                }
                if !weight.is_finite() || weight < 0.0 {
                    return Err(GenerateError::InvalidBlockWeight {
                        name: name.clone(),
                        weight,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Résultat détaillé de la validation : `true` = contrôle réussi.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub include: bool,
    pub sum: bool,
    pub odd_even: bool,
    pub consecutive: bool,
}

impl Verdict {
    pub fn accepted(&self) -> bool {
        self.include && self.sum && self.odd_even && self.consecutive
    }
}

/// Nombre d'indices i > 0 tels que v[i] == v[i-1] + 1 (liste triée).
pub fn run_count(front: &[u8]) -> usize {
    front.windows(2).filter(|w| w[1] == w[0] + 1).count()
}

pub fn odd_count(numbers: &[u8]) -> usize {
    numbers.iter().filter(|&&n| n % 2 == 1).count()
}

pub fn check(candidate: &Candidate, spec: &ConstraintSpec) -> Verdict {
    let include = spec.front_include.iter().all(|n| candidate.front.contains(n))
        && spec.back_include.iter().all(|n| candidate.back.contains(n));

    let sum_front: u32 = candidate.front.iter().map(|&n| n as u32).sum();
    let sum = spec.sum_front.is_none_or(|range| range.contains(sum_front));

    let odd_even = spec
        .odd_even_front
        .is_none_or(|oe| odd_count(&candidate.front) == oe.odd);

    let consecutive = spec
        .consecutive
        .is_none_or(|rule| rule.accepts(run_count(&candidate.front)));

    Verdict {
        include,
        sum,
        odd_even,
        consecutive,
    }
}
