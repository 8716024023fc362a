use std::collections::BTreeSet;

use daletou_db::models::Region;
use serde::{Deserialize, Serialize};

use crate::error::{GenerateError, Result};

/// Sous-intervalle nommé et contigu d'une zone, bornes incluses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub start: u8,
    pub end: u8,
}

impl Block {
    pub fn new(name: impl Into<String>, start: u8, end: u8) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, n: u8) -> bool {
        n >= self.start && n <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Budget total = nombre demandé × attempts_per_candidate.
    pub attempts_per_candidate: usize,
    pub hot_weight: f64,
    pub cold_weight: f64,
    pub front_blocks: Vec<Block>,
    pub back_blocks: Vec<Block>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            attempts_per_candidate: 5000,
            hot_weight: 3.0,
            cold_weight: 0.7,
            front_blocks: vec![
                Block::new("A", 1, 7),
                Block::new("B", 8, 14),
                Block::new("C", 15, 21),
                Block::new("D", 22, 28),
                Block::new("E", 29, 35),
            ],
            back_blocks: vec![
                Block::new("A", 1, 4),
                Block::new("B", 5, 8),
                Block::new("C", 9, 12),
            ],
        }
    }
}

impl GeneratorConfig {
    pub fn blocks(&self, region: Region) -> &[Block] {
        match region {
            Region::Front => &self.front_blocks,
            Region::Back => &self.back_blocks,
        }
    }

    pub fn find_block(&self, region: Region, name: &str) -> Option<&Block> {
        self.blocks(region).iter().find(|b| b.name == name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.attempts_per_candidate == 0 {
            return Err(GenerateError::ZeroBudget);
        }
        for (field, value) in [("hot_weight", self.hot_weight), ("cold_weight", self.cold_weight)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GenerateError::InvalidWeight { field, value });
            }
        }
        for region in Region::ALL {
            let mut seen = BTreeSet::new();
            for block in self.blocks(region) {
                if block.start > block.end || !region.contains(block.start) || !region.contains(block.end) {
                    return Err(GenerateError::InvalidBlock {
                        region,
                        name: block.name.clone(),
                        start: block.start,
                        end: block.end,
                    });
                }
                if !seen.insert(block.name.as_str()) {
                    return Err(GenerateError::DuplicateBlock {
                        region,
                        name: block.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GeneratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.attempts_per_candidate, 5000);
        assert!((config.hot_weight - 3.0).abs() < 1e-10);
        assert!((config.cold_weight - 0.7).abs() < 1e-10);
    }

    #[test]
    fn test_default_blocks_cover_universe() {
        let config = GeneratorConfig::default();
        for region in Region::ALL {
            for n in region.universe() {
                let owners = config.blocks(region).iter().filter(|b| b.contains(n)).count();
                assert_eq!(owners, 1, "{region} {n} devrait appartenir à un seul bloc");
            }
        }
    }

    #[test]
    fn test_invalid_block_rejected() {
        let mut config = GeneratorConfig::default();
        config.back_blocks.push(Block::new("Z", 10, 13));
        assert!(matches!(config.validate(), Err(GenerateError::InvalidBlock { .. })));

        let mut config = GeneratorConfig::default();
        config.front_blocks.push(Block::new("A", 3, 4));
        assert!(matches!(config.validate(), Err(GenerateError::DuplicateBlock { .. })));
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let config = GeneratorConfig { hot_weight: 0.0, ..Default::default() };
        assert!(matches!(config.validate(), Err(GenerateError::InvalidWeight { field: "hot_weight", .. })));

        let config = GeneratorConfig { cold_weight: f64::NAN, ..Default::default() };
        assert!(config.validate().is_err());

        let config = GeneratorConfig { attempts_per_candidate: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(GenerateError::ZeroBudget)));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: GeneratorConfig = serde_json::from_str(r#"{"hot_weight": 2.5}"#).unwrap();
        assert!((config.hot_weight - 2.5).abs() < 1e-10);
        assert_eq!(config.attempts_per_candidate, 5000);
        assert_eq!(config.front_blocks.len(), 5);
    }
}
