//! Paytable rules and paylines

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::RoundError;
use crate::model::WinPattern;

/// How a rule's symbols must line up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    /// Consecutive from the leftmost reel
    Leftmost,
    /// Consecutive from either edge
    BothWays,
    /// Anywhere on the grid
    Scatter,
}

/// Free spins granted by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinAward {
    /// Free spin reel set id
    pub id: u32,
    /// Spins granted
    pub amount: u32,
}

/// A single payout rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolRule {
    pub id: u32,
    /// Symbol the rule pays for
    pub pattern_symbol_id: u32,
    /// Symbol counts this rule covers
    pub symbol_counts: BTreeSet<u32>,
    pub match_type: PatternType,
    /// Line/way multiplier
    pub reward_multiplier: f64,
    /// Symbol that counts double for this rule
    #[serde(default)]
    pub doubled_symbol_id: Option<u32>,
    #[serde(default)]
    pub free_spin_award: Option<FreeSpinAward>,
}

impl SymbolRule {
    pub fn new(
        id: u32,
        pattern_symbol_id: u32,
        counts: impl IntoIterator<Item = u32>,
        match_type: PatternType,
        reward_multiplier: f64,
    ) -> Self {
        Self {
            id,
            pattern_symbol_id,
            symbol_counts: counts.into_iter().collect(),
            match_type,
            reward_multiplier,
            doubled_symbol_id: None,
            free_spin_award: None,
        }
    }

    /// Does this rule pay for `count` of `symbol_id`?
    pub fn matches(&self, symbol_id: u32, count: u32) -> bool {
        self.pattern_symbol_id == symbol_id && self.symbol_counts.contains(&count)
    }
}

/// Rule lookup by symbol and count
///
/// Rule sets are small (tens to a few hundred entries), so lookup is a
/// linear scan and the first match wins.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    rules: Vec<SymbolRule>,
}

impl RuleIndex {
    pub fn new(rules: Vec<SymbolRule>) -> Self {
        Self { rules }
    }

    /// All rules in load order
    pub fn rules(&self) -> &[SymbolRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the rule paying for `count` of `symbol_id`
    pub fn find_rule(&self, symbol_id: u32, count: u32) -> Result<&SymbolRule, RoundError> {
        self.rules
            .iter()
            .find(|rule| rule.matches(symbol_id, count))
            .ok_or(RoundError::RuleNotFound { symbol_id, count })
    }

    /// Symbol that doubles `symbol_id`'s count, if any rule declares one
    pub fn doubled_symbol(&self, symbol_id: u32) -> Option<u32> {
        self.rules
            .iter()
            .filter(|rule| rule.pattern_symbol_id == symbol_id)
            .find_map(|rule| rule.doubled_symbol_id)
    }

    /// Rules granting free spins
    pub fn free_spin_rules(&self) -> impl Iterator<Item = &SymbolRule> {
        self.rules.iter().filter(|r| r.free_spin_award.is_some())
    }
}

/// Direction a line win is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineDirection {
    LeftToRight,
    RightToLeft,
}

impl LineDirection {
    /// Wire code: 1 is left-to-right, anything else right-to-left
    pub fn from_code(code: u32) -> Self {
        if code == 1 {
            Self::LeftToRight
        } else {
            Self::RightToLeft
        }
    }
}

/// A payline: one row index per reel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payline {
    /// Row positions for each reel (e.g., [1, 0, 0, 0, 1] for a "V" shape)
    pub positions: Vec<u8>,
}

impl Payline {
    pub fn new(positions: impl Into<Vec<u8>>) -> Self {
        Self {
            positions: positions.into(),
        }
    }

    /// Same row across all reels
    pub fn straight(row: u8, reel_count: u8) -> Self {
        Self::new(vec![row; reel_count as usize])
    }

    /// Mark the first (or last) `count` cells of this line on a grid of `shape`
    ///
    /// Cells past the grid edge are an error: the server reported a win the
    /// machine layout cannot hold.
    pub fn pattern(
        &self,
        shape: &[usize],
        count: usize,
        direction: LineDirection,
    ) -> Result<WinPattern, RoundError> {
        if count > self.positions.len() || count > shape.len() {
            return Err(RoundError::Parse(format!(
                "Line win of {count} symbols exceeds payline {:?}",
                self.positions
            )));
        }

        let mut pattern = WinPattern::empty(shape);
        let last = self.positions.len().saturating_sub(1);
        for i in 0..count {
            let reel = match direction {
                LineDirection::LeftToRight => i,
                LineDirection::RightToLeft => last - i,
            };
            let row = self.positions[reel] as usize;
            if !pattern.set(reel, row) {
                return Err(RoundError::Parse(format!(
                    "Payline cell ({reel}, {row}) outside the reel layout"
                )));
            }
        }
        Ok(pattern)
    }
}

/// Standard payline patterns for a 5×3 grid
pub fn standard_20_paylines() -> Vec<Payline> {
    vec![
        // Straight lines
        Payline::straight(1, 5),
        Payline::straight(0, 5),
        Payline::straight(2, 5),
        // V shapes
        Payline::new([0, 1, 2, 1, 0]),
        Payline::new([2, 1, 0, 1, 2]),
        // Zigzag
        Payline::new([0, 0, 1, 2, 2]),
        Payline::new([2, 2, 1, 0, 0]),
        Payline::new([1, 0, 0, 0, 1]),
        Payline::new([1, 2, 2, 2, 1]),
        // W shapes
        Payline::new([0, 1, 0, 1, 0]),
        Payline::new([2, 1, 2, 1, 2]),
        Payline::new([0, 1, 1, 1, 0]),
        Payline::new([2, 1, 1, 1, 2]),
        // Steps
        Payline::new([1, 1, 0, 1, 1]),
        Payline::new([1, 1, 2, 1, 1]),
        Payline::new([0, 2, 0, 2, 0]),
        Payline::new([2, 0, 2, 0, 2]),
        Payline::new([1, 0, 1, 0, 1]),
        Payline::new([1, 2, 1, 2, 1]),
        Payline::new([0, 0, 2, 0, 0]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> RuleIndex {
        let mut doubled = SymbolRule::new(2, 201, [5], PatternType::BothWays, 100.0);
        doubled.doubled_symbol_id = Some(205);
        RuleIndex::new(vec![
            SymbolRule::new(0, 201, [3], PatternType::BothWays, 10.0),
            SymbolRule::new(1, 201, [4], PatternType::BothWays, 40.0),
            doubled,
            SymbolRule::new(3, 302, [3, 4, 5], PatternType::Scatter, 2.0),
        ])
    }

    #[test]
    fn test_find_rule() {
        let index = sample_index();

        assert_eq!(index.find_rule(201, 4).unwrap().id, 1);
        assert_eq!(index.find_rule(302, 5).unwrap().id, 3);
        assert_eq!(index.find_rule(302, 3).unwrap().id, 3);
    }

    #[test]
    fn test_find_rule_not_found() {
        let index = sample_index();

        let err = index.find_rule(201, 2).unwrap_err();
        assert!(matches!(
            err,
            RoundError::RuleNotFound {
                symbol_id: 201,
                count: 2
            }
        ));
        assert!(index.find_rule(999, 3).is_err());
    }

    #[test]
    fn test_find_rule_unique_per_count() {
        let index = sample_index();
        for rule in index.rules() {
            for count in &rule.symbol_counts {
                let matching = index
                    .rules()
                    .iter()
                    .filter(|r| r.matches(rule.pattern_symbol_id, *count))
                    .count();
                assert_eq!(matching, 1);
            }
        }
    }

    #[test]
    fn test_doubled_symbol() {
        let index = sample_index();
        assert_eq!(index.doubled_symbol(201), Some(205));
        assert_eq!(index.doubled_symbol(302), None);
    }

    #[test]
    fn test_line_pattern_directions() {
        let line = Payline::new([0, 1, 2, 1, 0]);
        let shape = [3; 5];

        let ltr = line.pattern(&shape, 3, LineDirection::LeftToRight).unwrap();
        assert!(ltr.get(0, 0) && ltr.get(1, 1) && ltr.get(2, 2));
        assert!(!ltr.get(3, 1));
        assert_eq!(ltr.count(), 3);

        let rtl = line.pattern(&shape, 2, LineDirection::RightToLeft).unwrap();
        assert!(rtl.get(4, 0) && rtl.get(3, 1));
        assert_eq!(rtl.count(), 2);
    }

    #[test]
    fn test_line_pattern_out_of_layout() {
        let line = Payline::straight(3, 5);
        assert!(line.pattern(&[3; 5], 3, LineDirection::LeftToRight).is_err());
        assert!(Payline::straight(0, 5)
            .pattern(&[3; 5], 6, LineDirection::LeftToRight)
            .is_err());
    }

    #[test]
    fn test_direction_code() {
        assert_eq!(LineDirection::from_code(1), LineDirection::LeftToRight);
        assert_eq!(LineDirection::from_code(2), LineDirection::RightToLeft);
    }

    #[test]
    fn test_standard_paylines() {
        let lines = standard_20_paylines();
        assert_eq!(lines.len(), 20);
        assert!(lines.iter().all(|l| l.positions.len() == 5));
    }
}
