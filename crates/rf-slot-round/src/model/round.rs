//! Round and spin results

use serde::{Deserialize, Serialize};

use super::pattern::WinPattern;
use super::transaction::TransactionType;
use crate::paytable::LineDirection;

/// Reel outcome, indexed `[reel][row]`
pub type ReelGrid = Vec<Vec<u32>>;

/// A ways/combination win
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationWin {
    pub symbol_id: u32,
    pub multiplier: f64,
    pub way_payout: f64,
    /// Winning cells as `(reel, row)`
    pub cells: Vec<(usize, usize)>,
    pub pattern: WinPattern,
}

/// A payline win
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineWin {
    /// Rule that pays this win
    pub rule_id: u32,
    /// 0-based payline index
    pub line_index: usize,
    pub symbol_id: u32,
    pub symbol_count: u32,
    pub direction: LineDirection,
    /// Multiplier the server applied
    pub multiplier: f64,
    /// Multiplier of the paying rule
    pub win_multiplier: f64,
    pub win_value: f64,
    pub pattern: WinPattern,
}

/// Scatter symbols on the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterWin {
    pub symbol_id: u32,
    /// Scatter count reported by the server
    pub count: u32,
    pub win_value: f64,
    pub pattern: WinPattern,
}

/// Free-spin sub-round progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreespinWin {
    /// Index of the current free spin (0 before the first one)
    pub freespin_id: u32,
    pub total_count: u32,
    pub remaining_count: u32,
    /// The round-start presentation was acknowledged
    pub round_started: bool,
    /// The round-end presentation was acknowledged
    pub round_complete: bool,
    #[serde(default)]
    pub pattern: Option<WinPattern>,
}

/// Wins of one spin plus their acknowledgement flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpinWin {
    pub multi_win_shown: bool,
    pub combinations: Vec<CombinationWin>,
    pub lines: Vec<LineWin>,
    pub scatter_win_shown: bool,
    pub scatters: Option<ScatterWin>,
    pub freespin_win_shown: bool,
    pub freespins: Option<FreespinWin>,
}

impl SpinWin {
    /// Every win pattern carried by this block
    pub fn patterns(&self) -> impl Iterator<Item = &WinPattern> {
        self.lines
            .iter()
            .map(|w| &w.pattern)
            .chain(self.combinations.iter().map(|w| &w.pattern))
            .chain(self.scatters.iter().map(|w| &w.pattern))
            .chain(self.freespins.iter().filter_map(|w| w.pattern.as_ref()))
    }
}

/// Bonus game acknowledgement flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BonusState {
    pub bonus_game_shown: bool,
    pub bonus_game_complete: bool,
}

/// One atomic reel outcome within a round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpinResult {
    pub reel_grid: ReelGrid,
    /// Win of this spin
    pub win_value: f64,
    /// Round payout so far, including this spin
    pub current_total_win_value: f64,
    pub win: Option<SpinWin>,
    pub bonus: Option<BonusState>,
    pub freespins: Option<FreespinWin>,
}

impl SpinResult {
    pub fn new(reel_grid: ReelGrid) -> Self {
        Self {
            reel_grid,
            ..Default::default()
        }
    }

    pub fn with_win(mut self, win: SpinWin) -> Self {
        self.win = Some(win);
        self
    }

    pub fn with_bonus(mut self) -> Self {
        self.bonus = Some(BonusState::default());
        self
    }

    pub fn with_freespins(mut self, freespins: FreespinWin) -> Self {
        self.freespins = Some(freespins);
        self
    }

    /// Rows per reel
    pub fn grid_shape(&self) -> Vec<usize> {
        self.reel_grid.iter().map(Vec::len).collect()
    }

    /// OR of every win pattern on this spin, shaped like the reel grid
    pub fn multi_win_pattern(&self) -> WinPattern {
        let shape = self.grid_shape();
        match &self.win {
            Some(win) => WinPattern::union_all(&shape, win.patterns()),
            None => WinPattern::empty(&shape),
        }
    }

    /// Sum of line win values
    pub fn line_win_value(&self) -> f64 {
        self.win
            .as_ref()
            .map(|w| w.lines.iter().map(|l| l.win_value).sum())
            .unwrap_or(0.0)
    }
}

/// A multiplier placed on one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MultiplierCell {
    pub x: u32,
    pub y: u32,
    pub multiplier: f64,
}

/// One complete wager outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub id: String,
    pub complete: bool,
    /// Coin value per line/way in wallet currency
    pub line_bet_value: f64,
    pub bet_lines: u32,
    pub total_bet: f64,
    pub total_win_value: f64,
    pub multiplier_map: Vec<MultiplierCell>,
    /// Cursor into `spins`
    pub spin_index: usize,
    /// Transaction the server expects next
    pub next_type: Option<TransactionType>,
    pub spins: Vec<SpinResult>,
}

impl RoundResult {
    /// Round with a fresh id and one spin
    pub fn new(spin: SpinResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            complete: false,
            line_bet_value: 0.0,
            bet_lines: 0,
            total_bet: 0.0,
            total_win_value: 0.0,
            multiplier_map: Vec::new(),
            spin_index: 0,
            next_type: None,
            spins: vec![spin],
        }
    }

    pub fn with_totals(mut self, total_bet: f64, total_win_value: f64) -> Self {
        self.total_bet = total_bet;
        self.total_win_value = total_win_value;
        self
    }

    pub fn with_next_type(mut self, next_type: TransactionType) -> Self {
        self.next_type = Some(next_type);
        self
    }

    pub fn current_spin(&self) -> Option<&SpinResult> {
        self.spins.get(self.spin_index)
    }

    pub fn current_spin_mut(&mut self) -> Option<&mut SpinResult> {
        self.spins.get_mut(self.spin_index)
    }

    pub fn next_spin(&self) -> Option<&SpinResult> {
        self.spins.get(self.spin_index + 1)
    }

    pub fn previous_spin(&self) -> Option<&SpinResult> {
        self.spin_index
            .checked_sub(1)
            .and_then(|i| self.spins.get(i))
    }

    pub fn last_spin(&self) -> Option<&SpinResult> {
        self.spins.last()
    }

    /// Move the cursor to the next accumulated spin; false if there is none
    pub fn advance(&mut self) -> bool {
        if self.spin_index + 1 < self.spins.len() {
            self.spin_index += 1;
            true
        } else {
            false
        }
    }

    /// Win-to-bet ratio (0 when nothing was staked)
    pub fn win_ratio(&self) -> f64 {
        if self.total_bet > 0.0 {
            self.total_win_value / self.total_bet
        } else {
            0.0
        }
    }

    /// Remove `symbol_id` from every reel column of every spin
    pub fn strip_symbol(&mut self, symbol_id: u32) {
        for spin in &mut self.spins {
            for reel in &mut spin.reel_grid {
                reel.retain(|&s| s != symbol_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> ReelGrid {
        vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9]]
    }

    fn combination(cells: &[(usize, usize)]) -> CombinationWin {
        CombinationWin {
            symbol_id: 1,
            multiplier: 1.0,
            way_payout: 1.0,
            cells: cells.to_vec(),
            pattern: WinPattern::from_cells(&[3, 3, 3], cells).unwrap(),
        }
    }

    #[test]
    fn test_spin_cursors() {
        let mut round = RoundResult::new(SpinResult::new(grid()));
        round.spins.push(SpinResult::new(vec![vec![0; 3]; 3]));

        assert!(round.previous_spin().is_none());
        assert!(round.next_spin().is_some());

        assert!(round.advance());
        assert_eq!(round.spin_index, 1);
        assert_eq!(round.previous_spin().unwrap().reel_grid, grid());
        assert!(round.next_spin().is_none());

        assert!(!round.advance());
        assert_eq!(round.spin_index, 1);
    }

    #[test]
    fn test_multi_win_pattern_without_win() {
        let spin = SpinResult::new(grid());
        let pattern = spin.multi_win_pattern();
        assert_eq!(pattern.shape(), vec![3, 3, 3]);
        assert!(pattern.is_empty());
    }

    #[test]
    fn test_multi_win_pattern_combines_kinds() {
        let win = SpinWin {
            combinations: vec![combination(&[(0, 0), (1, 0)])],
            scatters: Some(ScatterWin {
                symbol_id: 9,
                count: 1,
                win_value: 0.0,
                pattern: WinPattern::from_cells(&[3, 3, 3], &[(2, 2)]).unwrap(),
            }),
            freespins: Some(FreespinWin {
                freespin_id: 0,
                total_count: 10,
                remaining_count: 10,
                round_started: false,
                round_complete: false,
                pattern: Some(WinPattern::from_cells(&[3, 3, 3], &[(1, 0), (0, 2)]).unwrap()),
            }),
            ..Default::default()
        };
        let spin = SpinResult::new(grid()).with_win(win);
        let pattern = spin.multi_win_pattern();

        assert_eq!(pattern.count(), 4);
        assert!(pattern.get(0, 0) && pattern.get(1, 0) && pattern.get(2, 2) && pattern.get(0, 2));
    }

    #[test]
    fn test_line_win_value() {
        let line = |value| LineWin {
            rule_id: 0,
            line_index: 0,
            symbol_id: 1,
            symbol_count: 3,
            direction: LineDirection::LeftToRight,
            multiplier: 1.0,
            win_multiplier: 5.0,
            win_value: value,
            pattern: WinPattern::empty(&[3, 3, 3]),
        };
        let spin = SpinResult::new(grid()).with_win(SpinWin {
            lines: vec![line(2.5), line(4.0)],
            ..Default::default()
        });
        assert_eq!(spin.line_win_value(), 6.5);
        assert_eq!(SpinResult::new(grid()).line_win_value(), 0.0);
    }

    #[test]
    fn test_strip_symbol() {
        let mut round = RoundResult::new(SpinResult::new(vec![vec![0, 3, 0], vec![4, 0, 6]]));
        round.strip_symbol(0);
        assert_eq!(round.spins[0].reel_grid, vec![vec![3], vec![4, 6]]);
    }

    #[test]
    fn test_win_ratio() {
        let round = RoundResult::new(SpinResult::default()).with_totals(100.0, 1000.0);
        assert_eq!(round.win_ratio(), 10.0);
        assert_eq!(RoundResult::new(SpinResult::default()).win_ratio(), 0.0);
    }
}
