use daletou_db::models::{Candidate, Region};
use rand::Rng;
use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::constraints::{check, ConstraintSpec, Verdict};
use crate::error::{GenerateError, Result};
use crate::pool::{build_pool, is_sufficient, PoolOverrides};
use crate::sampler::{BlockSampler, HotColdSampler, RegionSampler};

/// Raison de l'arrêt de la boucle d'échantillonnage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Le nombre demandé a été atteint.
    Filled,
    /// Budget de tentatives épuisé avant d'atteindre le nombre demandé.
    BudgetExhausted,
    /// Une zone a moins de numéros éligibles que de numéros à tirer.
    PoolExhausted,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Filled => write!(f, "objectif atteint"),
            StopReason::BudgetExhausted => write!(f, "budget de tentatives épuisé"),
            StopReason::PoolExhausted => write!(f, "pool de numéros insuffisant"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    /// Grilles acceptées, dans l'ordre d'acceptation. Les doublons sont conservés.
    pub candidates: Vec<Candidate>,
    pub reason: StopReason,
    pub attempts: usize,
}

impl Generation {
    pub fn is_complete(&self) -> bool {
        self.reason == StopReason::Filled
    }
}

/// Réservation initiale maximale du vecteur de résultats ; au-delà il croît à la demande.
const MAX_PREALLOCATED: usize = 1024;

fn initial_capacity(count: usize) -> usize {
    count.min(MAX_PREALLOCATED)
}

#[derive(Debug, Default)]
struct Rejections {
    draw_failed: usize,
    include: usize,
    sum: usize,
    odd_even: usize,
    consecutive: usize,
}

impl Rejections {
    fn record(&mut self, verdict: &Verdict) {
        self.include += usize::from(!verdict.include);
        self.sum += usize::from(!verdict.sum);
        self.odd_even += usize::from(!verdict.odd_even);
        self.consecutive += usize::from(!verdict.consecutive);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn budget(&self, count: usize) -> usize {
        count.saturating_mul(self.config.attempts_per_candidate)
    }

    /// Pool et stratégie d'une zone ; `None` si le pool est trop petit.
    pub fn prepare(&self, region: Region, spec: &ConstraintSpec, overrides: &PoolOverrides) -> Option<RegionSampler> {
        let pool = build_pool(region, overrides.get(region), spec.exclude(region));
        if !is_sufficient(region, &pool) {
            log::info!(
                "Zone {region} : {} numéros éligibles pour {} à tirer",
                pool.len(),
                region.pick_count()
            );
            return None;
        }

        let block_weights = spec.block_weights(region);
        if !block_weights.is_empty() && !(spec.hot(region).is_empty() && spec.cold(region).is_empty()) {
            log::debug!("Zone {region} : poids de blocs fournis, numéros chauds/froids ignorés");
        }
        let sampler = if block_weights.is_empty() {
            RegionSampler::HotCold(HotColdSampler::new(
                pool,
                spec.hot(region),
                spec.cold(region),
                self.config.hot_weight,
                self.config.cold_weight,
            ))
        } else {
            RegionSampler::Blocks(BlockSampler::new(pool, self.config.blocks(region), block_weights))
        };
        Some(sampler)
    }

    /// Boucle de rejet : tire, valide, accumule jusqu'à `count` grilles ou
    /// épuisement du budget. Ne renvoie une erreur que pour une entrée mal formée.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        spec: &ConstraintSpec,
        overrides: &PoolOverrides,
        rng: &mut R,
    ) -> Result<Generation> {
        if count == 0 {
            return Err(GenerateError::ZeroCount);
        }
        spec.validate(&self.config)?;
        overrides.validate()?;

        // Les pools ne dépendent que des règles : construits une fois par appel.
        let (Some(front), Some(back)) = (
            self.prepare(Region::Front, spec, overrides),
            self.prepare(Region::Back, spec, overrides),
        ) else {
            return Ok(Generation {
                candidates: Vec::new(),
                reason: StopReason::PoolExhausted,
                attempts: 0,
            });
        };

        let budget = self.budget(count);
        let mut candidates = Vec::with_capacity(initial_capacity(count));
        let mut rejections = Rejections::default();
        let mut attempts = 0usize;

        while candidates.len() < count && attempts < budget {
            attempts += 1;

            let Some(candidate) = draw_candidate(&front, &back, rng) else {
                rejections.draw_failed += 1;
                continue;
            };

            let verdict = check(&candidate, spec);
            if verdict.accepted() {
                candidates.push(candidate);
            } else {
                rejections.record(&verdict);
            }
        }

        let reason = if candidates.len() >= count {
            StopReason::Filled
        } else {
            StopReason::BudgetExhausted
        };

        log::debug!("Rejets : {:?}", rejections);
        log::info!(
            "{} grille(s) sur {} en {} tentative(s) ({})",
            candidates.len(),
            count,
            attempts,
            reason
        );

        Ok(Generation {
            candidates,
            reason,
            attempts,
        })
    }
}

fn draw_candidate<R: Rng + ?Sized>(
    front: &RegionSampler,
    back: &RegionSampler,
    rng: &mut R,
) -> Option<Candidate> {
    let front: [u8; 5] = front.draw(Region::Front.pick_count(), rng)?.try_into().ok()?;
    let back: [u8; 2] = back.draw(Region::Back.pick_count(), rng)?.try_into().ok()?;
    Some(Candidate { front, back })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{ConsecutiveRule, OddEven, RunMode, SumRange};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::{BTreeMap, BTreeSet};

    fn assert_well_formed(c: &Candidate) {
        assert!(c.front.windows(2).all(|w| w[0] < w[1]), "front {:?}", c.front);
        assert!(c.back[0] < c.back[1], "back {:?}", c.back);
        assert!(c.front.iter().all(|&n| (1..=35).contains(&n)));
        assert!(c.back.iter().all(|&n| (1..=12).contains(&n)));
    }

    fn generate(count: usize, spec: &ConstraintSpec, seed: u64) -> Generation {
        let mut rng = StdRng::seed_from_u64(seed);
        Generator::default()
            .generate(count, spec, &PoolOverrides::default(), &mut rng)
            .unwrap()
    }

    #[test]
    fn test_unconstrained_fills_request() {
        let generation = generate(20, &ConstraintSpec::default(), 1);
        assert_eq!(generation.reason, StopReason::Filled);
        assert!(generation.is_complete());
        assert_eq!(generation.candidates.len(), 20);
        assert_eq!(generation.attempts, 20);
        generation.candidates.iter().for_each(assert_well_formed);
    }

    #[test]
    fn test_dashboard_rules() {
        let spec = ConstraintSpec {
            front_include: BTreeSet::from([1, 2]),
            sum_front: Some(SumRange { min: Some(70), max: Some(140) }),
            odd_even_front: Some(OddEven { odd: 3, even: 2 }),
            ..Default::default()
        };
        let generation = generate(5, &spec, 2);
        assert_eq!(generation.candidates.len(), 5);
        for c in &generation.candidates {
            assert_well_formed(c);
            assert!(c.front.contains(&1) && c.front.contains(&2));
            let sum: u32 = c.front.iter().map(|&n| n as u32).sum();
            assert!((70..=140).contains(&sum), "somme {sum}");
            assert_eq!(c.front.iter().filter(|&&n| n % 2 == 1).count(), 3);
        }
    }

    #[test]
    fn test_consecutive_and_back_rules() {
        let spec = ConstraintSpec {
            back_include: BTreeSet::from([12]),
            back_exclude: BTreeSet::from([1, 2, 3]),
            consecutive: Some(ConsecutiveRule { count: 2, mode: RunMode::Min }),
            ..Default::default()
        };
        let generation = generate(5, &spec, 3);
        assert_eq!(generation.candidates.len(), 5);
        for c in &generation.candidates {
            assert!(c.back.contains(&12));
            assert!(c.back.iter().all(|n| ![1, 2, 3].contains(n)));
            assert!(crate::constraints::run_count(&c.front) >= 2);
        }
    }

    #[test]
    fn test_pool_exhaustion_exits_immediately() {
        let spec = ConstraintSpec {
            front_exclude: (1..=34).collect(),
            ..Default::default()
        };
        let generation = generate(5, &spec, 4);
        assert!(generation.candidates.is_empty());
        assert_eq!(generation.reason, StopReason::PoolExhausted);
        assert_eq!(generation.attempts, 0);
    }

    #[test]
    fn test_impossible_rules_exhaust_budget() {
        // 5 impairs et 0 pair demandés, mais seuls des pairs sont disponibles
        let spec = ConstraintSpec {
            front_exclude: (1..=35).filter(|n| n % 2 == 1).collect(),
            odd_even_front: Some(OddEven { odd: 5, even: 0 }),
            ..Default::default()
        };
        let generator = Generator::new(GeneratorConfig {
            attempts_per_candidate: 50,
            ..Default::default()
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let generation = generator
            .generate(3, &spec, &PoolOverrides::default(), &mut rng)
            .unwrap();
        assert!(generation.candidates.is_empty());
        assert_eq!(generation.reason, StopReason::BudgetExhausted);
        assert_eq!(generation.attempts, 150);
    }

    #[test]
    fn test_huge_count_does_not_preallocate() {
        assert_eq!(initial_capacity(3), 3);
        assert_eq!(initial_capacity(usize::MAX), MAX_PREALLOCATED);
        assert_eq!(Generator::default().budget(usize::MAX), usize::MAX);
    }

    #[test]
    fn test_count_above_preallocation_fills() {
        let count = MAX_PREALLOCATED * 2 + 1;
        let generator = Generator::new(GeneratorConfig {
            attempts_per_candidate: 1,
            ..Default::default()
        })
        .unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let generation = generator
            .generate(count, &ConstraintSpec::default(), &PoolOverrides::default(), &mut rng)
            .unwrap();
        assert_eq!(generation.reason, StopReason::Filled);
        assert_eq!(generation.candidates.len(), count);
        assert_eq!(generation.attempts, count);
    }

    #[test]
    fn test_block_weights_take_precedence_over_hot_cold() {
        let spec = ConstraintSpec {
            back_blocks: BTreeMap::from([("A".to_string(), 1.0)]),
            hot_back: BTreeSet::from([12]),
            ..Default::default()
        };
        let sampler = Generator::default()
            .prepare(Region::Back, &spec, &PoolOverrides::default())
            .unwrap();
        assert!(matches!(sampler, RegionSampler::Blocks(_)));
        let generation = generate(10, &spec, 22);
        assert!(generation.candidates.iter().all(|c| c.back.iter().all(|&n| n <= 4)));
    }

    #[test]
    fn test_zero_count_is_an_error() {
        let mut rng = StdRng::seed_from_u64(6);
        let result = Generator::default().generate(0, &ConstraintSpec::default(), &PoolOverrides::default(), &mut rng);
        assert!(matches!(result, Err(GenerateError::ZeroCount)));
    }

    #[test]
    fn test_malformed_spec_is_an_error() {
        let spec = ConstraintSpec {
            front_include: BTreeSet::from([36]),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(6);
        let result = Generator::default().generate(1, &spec, &PoolOverrides::default(), &mut rng);
        assert!(matches!(result, Err(GenerateError::NumberOutOfRange { .. })));
    }

    #[test]
    fn test_pool_overrides_restrict_draws() {
        let overrides = PoolOverrides {
            front: Some(vec![2, 4, 6, 8, 10, 12]),
            back: Some(vec![7, 8]),
        };
        let mut rng = StdRng::seed_from_u64(8);
        let generation = Generator::default()
            .generate(10, &ConstraintSpec::default(), &overrides, &mut rng)
            .unwrap();
        assert_eq!(generation.candidates.len(), 10);
        for c in &generation.candidates {
            assert!(c.front.iter().all(|n| n % 2 == 0 && *n <= 12));
            assert_eq!(c.back, [7, 8]);
        }
    }

    #[test]
    fn test_block_weights_strategy() {
        let spec = ConstraintSpec {
            front_blocks: BTreeMap::from([("A".to_string(), 1.0), ("E".to_string(), 4.0)]),
            back_blocks: BTreeMap::from([("C".to_string(), 1.0)]),
            ..Default::default()
        };
        let generation = generate(10, &spec, 9);
        assert_eq!(generation.candidates.len(), 10);
        for c in &generation.candidates {
            assert_well_formed(c);
            assert_eq!(c.front.iter().filter(|&&n| n <= 7).count(), 1);
            assert_eq!(c.front.iter().filter(|&&n| n >= 29).count(), 4);
            assert!(c.back.iter().all(|&n| n >= 9));
        }
    }

    #[test]
    fn test_duplicates_are_kept() {
        // pool avant de 5 numéros et arrière de 2 : une seule grille possible
        let overrides = PoolOverrides {
            front: Some(vec![1, 2, 3, 4, 5]),
            back: Some(vec![1, 2]),
        };
        let mut rng = StdRng::seed_from_u64(10);
        let generation = Generator::default()
            .generate(3, &ConstraintSpec::default(), &overrides, &mut rng)
            .unwrap();
        assert_eq!(generation.candidates.len(), 3);
        assert!(generation.candidates.iter().all(|c| c.front == [1, 2, 3, 4, 5] && c.back == [1, 2]));
    }

    #[test]
    fn test_seed_determinism() {
        let spec = ConstraintSpec {
            hot_front: BTreeSet::from([3, 13, 23]),
            cold_back: BTreeSet::from([6]),
            sum_front: Some(SumRange { min: Some(60), max: Some(120) }),
            ..Default::default()
        };
        let a = generate(8, &spec, 123);
        let b = generate(8, &spec, 123);
        assert_eq!(a.candidates, b.candidates);
        assert_eq!(a.attempts, b.attempts);
    }
}
