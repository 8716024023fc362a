use std::collections::BTreeSet;

use daletou_db::models::Region;
use serde::{Deserialize, Serialize};

use crate::config::Block;
use crate::error::{GenerateError, Result};

/// Pools restreints fournis par l'appelant (par exemple les numéros de certains blocs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOverrides {
    pub front: Option<Vec<u8>>,
    pub back: Option<Vec<u8>>,
}

impl PoolOverrides {
    pub fn get(&self, region: Region) -> Option<&[u8]> {
        match region {
            Region::Front => self.front.as_deref(),
            Region::Back => self.back.as_deref(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for region in Region::ALL {
            if let Some(&number) = self
                .get(region)
                .and_then(|pool| pool.iter().find(|&&n| !region.contains(n)))
            {
                return Err(GenerateError::NumberOutOfRange {
                    region,
                    field: "pool",
                    number,
                });
            }
        }
        Ok(())
    }
}

/// (pool restreint ou univers complet) moins les exclusions, trié et sans doublon.
pub fn build_pool(region: Region, restricted: Option<&[u8]>, exclude: &BTreeSet<u8>) -> Vec<u8> {
    let base: BTreeSet<u8> = match restricted {
        Some(numbers) => numbers.iter().copied().filter(|&n| region.contains(n)).collect(),
        None => region.universe().collect(),
    };
    base.into_iter().filter(|n| !exclude.contains(n)).collect()
}

pub fn is_sufficient(region: Region, pool: &[u8]) -> bool {
    pool.len() >= region.pick_count()
}

/// Union des numéros des blocs nommés, triée.
pub fn numbers_in_blocks(blocks: &[Block], names: &[String]) -> Vec<u8> {
    let numbers: BTreeSet<u8> = blocks
        .iter()
        .filter(|b| names.iter().any(|name| *name == b.name))
        .flat_map(|b| b.start..=b.end)
        .collect();
    numbers.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;

    #[test]
    fn test_full_universe_without_rules() {
        let pool = build_pool(Region::Front, None, &BTreeSet::new());
        assert_eq!(pool, (1..=35).collect::<Vec<u8>>());
        let pool = build_pool(Region::Back, None, &BTreeSet::new());
        assert_eq!(pool.len(), 12);
    }

    #[test]
    fn test_exclusions_removed() {
        let exclude = BTreeSet::from([1, 2, 35]);
        let pool = build_pool(Region::Front, None, &exclude);
        assert_eq!(pool.len(), 32);
        assert_eq!(pool[0], 3);
        assert_eq!(*pool.last().unwrap(), 34);
    }

    #[test]
    fn test_restricted_pool_minus_exclusions() {
        let restricted = [9, 3, 3, 12, 40, 0];
        let exclude = BTreeSet::from([12]);
        let pool = build_pool(Region::Back, Some(&restricted), &exclude);
        // hors univers et doublons écartés, trié
        assert_eq!(pool, vec![3, 9]);
        assert!(is_sufficient(Region::Back, &pool));
        assert!(!is_sufficient(Region::Front, &pool));
    }

    #[test]
    fn test_undersized_pool() {
        let exclude: BTreeSet<u8> = (1..=34).collect();
        let pool = build_pool(Region::Front, None, &exclude);
        assert_eq!(pool, vec![35]);
        assert!(!is_sufficient(Region::Front, &pool));
    }

    #[test]
    fn test_numbers_in_blocks() {
        let config = GeneratorConfig::default();
        let numbers = numbers_in_blocks(config.blocks(Region::Front), &["E".into(), "A".into()]);
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6, 7, 29, 30, 31, 32, 33, 34, 35]);
        assert!(numbers_in_blocks(config.blocks(Region::Back), &["Q".into()]).is_empty());
    }

    #[test]
    fn test_overrides_validation() {
        let overrides = PoolOverrides { front: Some(vec![1, 2, 3, 4, 5]), back: None };
        assert!(overrides.validate().is_ok());
        assert_eq!(overrides.get(Region::Front), Some(&[1, 2, 3, 4, 5][..]));
        assert_eq!(overrides.get(Region::Back), None);

        let overrides = PoolOverrides { front: None, back: Some(vec![1, 13]) };
        assert!(matches!(
            overrides.validate(),
            Err(GenerateError::NumberOutOfRange { region: Region::Back, number: 13, .. })
        ));
    }
}
