use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub issue: String,
    pub date: String,
    pub front: [u8; 5],
    pub back: [u8; 2],
    pub sales: String,
    pub pool: String,
}

impl Draw {
    /// Construit un tirage en triant les deux zones.
    pub fn new(issue: impl Into<String>, date: impl Into<String>, mut front: [u8; 5], mut back: [u8; 2]) -> Self {
        front.sort_unstable();
        back.sort_unstable();
        Self {
            issue: issue.into(),
            date: date.into(),
            front,
            back,
            sales: String::new(),
            pool: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Front,
    Back,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Front, Region::Back];

    pub fn size(&self) -> usize {
        match self {
            Region::Front => 35,
            Region::Back => 12,
        }
    }

    pub fn pick_count(&self) -> usize {
        match self {
            Region::Front => 5,
            Region::Back => 2,
        }
    }

    pub fn contains(&self, n: u8) -> bool {
        n >= 1 && (n as usize) <= self.size()
    }

    pub fn universe(&self) -> impl Iterator<Item = u8> {
        1..=self.size() as u8
    }

    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> &'a [u8] {
        match self {
            Region::Front => &draw.front,
            Region::Back => &draw.back,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Region::Front => "Zone avant",
            Region::Back => "Zone arrière",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Front => write!(f, "front"),
            Region::Back => write!(f, "back"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    pub gap: u32,
}

/// Combinaison générée : zones triées, valeurs distinctes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub front: [u8; 5],
    pub back: [u8; 2],
}

impl Candidate {
    pub fn numbers(&self, region: Region) -> &[u8] {
        match region {
            Region::Front => &self.front,
            Region::Back => &self.back,
        }
    }
}

pub fn validate_draw(front: &[u8; 5], back: &[u8; 2]) -> Result<()> {
    for &f in front {
        if !Region::Front.contains(f) {
            bail!("Numéro avant {} hors limites (1-35)", f);
        }
    }
    for &b in back {
        if !Region::Back.contains(b) {
            bail!("Numéro arrière {} hors limites (1-12)", b);
        }
    }
    for i in 0..front.len() {
        for j in (i + 1)..front.len() {
            if front[i] == front[j] {
                bail!("Numéro avant en double : {}", front[i]);
            }
        }
    }
    if back[0] == back[1] {
        bail!("Numéro arrière en double : {}", back[0]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_draw_ok() {
        assert!(validate_draw(&[1, 2, 3, 4, 5], &[1, 2]).is_ok());
        assert!(validate_draw(&[35, 34, 33, 32, 31], &[11, 12]).is_ok());
    }

    #[test]
    fn test_validate_draw_front_out_of_range() {
        assert!(validate_draw(&[0, 2, 3, 4, 5], &[1, 2]).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 36], &[1, 2]).is_err());
    }

    #[test]
    fn test_validate_draw_back_out_of_range() {
        assert!(validate_draw(&[1, 2, 3, 4, 5], &[0, 2]).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5], &[1, 13]).is_err());
    }

    #[test]
    fn test_validate_draw_duplicates() {
        assert!(validate_draw(&[1, 1, 3, 4, 5], &[1, 2]).is_err());
        assert!(validate_draw(&[1, 2, 3, 4, 5], &[3, 3]).is_err());
    }

    #[test]
    fn test_region_size_and_pick_count() {
        assert_eq!(Region::Front.size(), 35);
        assert_eq!(Region::Back.size(), 12);
        assert_eq!(Region::Front.pick_count(), 5);
        assert_eq!(Region::Back.pick_count(), 2);
    }

    #[test]
    fn test_region_universe() {
        let front: Vec<u8> = Region::Front.universe().collect();
        assert_eq!(front.len(), 35);
        assert_eq!(front[0], 1);
        assert_eq!(front[34], 35);
        assert!(!Region::Back.contains(13));
        assert!(!Region::Back.contains(0));
    }

    #[test]
    fn test_draw_new_sorts() {
        let draw = Draw::new("25001", "2025-01-01", [30, 2, 17, 5, 9], [12, 3]);
        assert_eq!(draw.front, [2, 5, 9, 17, 30]);
        assert_eq!(draw.back, [3, 12]);
        assert_eq!(Region::Front.numbers_from(&draw), &[2, 5, 9, 17, 30]);
        assert_eq!(Region::Back.numbers_from(&draw), &[3, 12]);
    }
}
