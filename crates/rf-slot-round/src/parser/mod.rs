//! Round Parser — Raw transact payloads into `RoundResult`s
//!
//! Decoding is strict: any token that does not parse fails the whole
//! round with [`RoundError::Parse`], and a win reported for a symbol/count
//! with no paying rule fails with [`RoundError::RuleNotFound`]. Nothing is
//! ever defaulted to a zero payout.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let parser = RoundParser::new(&description, RoundParserConfig::default())?;
//! let round = parser.parse_round(&payload, true)?;
//! ```

mod cascade;

use crate::config::{MachineDescription, RoundParserConfig};
use crate::error::RoundError;
use crate::model::{
    CombinationWin, FreespinWin, LineWin, MultiplierCell, ReelGrid, RoundResult, ScatterWin,
    SpinResult, SpinWin, WinPattern,
};
use crate::paytable::{LineDirection, Payline, RuleIndex};
use crate::wire::{RawCurrent, RawNext, RawRoundPayload, RawWinRecord};

/// `T` value of a line-win `WR` entry
const LINE_WIN_RECORD: u32 = 1;

/// Decoder from wire payloads to the round model
#[derive(Debug, Clone)]
pub struct RoundParser {
    /// Rows per reel of the regular reel set
    shape: Vec<usize>,
    lines: Vec<Payline>,
    scatter_symbol_id: Option<u32>,
    block_symbol_id: u32,
    rules: RuleIndex,
    config: RoundParserConfig,
}

impl RoundParser {
    pub fn new(
        description: &MachineDescription,
        config: RoundParserConfig,
    ) -> Result<Self, RoundError> {
        if !(config.denomination > 0.0) {
            return Err(RoundError::Config(format!(
                "Denomination must be positive, got {}",
                config.denomination
            )));
        }

        Ok(Self {
            shape: description.grid_shape(),
            lines: description.lines.clone(),
            scatter_symbol_id: description.scatter_symbol_id,
            block_symbol_id: description.block_symbol_id,
            rules: RuleIndex::new(description.rules.clone()),
            config,
        })
    }

    pub fn config(&self) -> &RoundParserConfig {
        &self.config
    }

    /// Decode one payload
    ///
    /// With `full_parse` false only the grid and bet/value fields are filled;
    /// such a round is for display after a reconnect and is never actionable.
    pub fn parse_round(
        &self,
        raw: &RawRoundPayload,
        full_parse: bool,
    ) -> Result<RoundResult, RoundError> {
        let Some(current) = &raw.current else {
            let mut round = RoundResult::new(SpinResult::new(self.blank_grid()));
            round.next_type = raw.next.kind;
            return Ok(round);
        };

        let reel_grid = decode_reel_grid(&current.result.reels)?;
        let win = if full_parse {
            self.decode_win(current, &raw.next, &reel_grid)?
        } else {
            None
        };

        let spin = SpinResult {
            reel_grid,
            win_value: current.acc_win,
            current_total_win_value: current.round.payout,
            win,
            bonus: None,
            freespins: decode_freespins(current, &raw.next),
        };

        let mut round = RoundResult::new(spin);
        round.line_bet_value = current.round.line_bet * self.config.denomination;
        round.bet_lines = current.round.line;
        round.total_bet = current.round.bet;
        round.total_win_value = current.round.payout;
        round.multiplier_map = decode_multiplier_map(current)?;
        round.next_type = raw.next.kind;
        Ok(round)
    }

    /// Remove the placeholder symbol the server pads restored grids with
    pub fn strip_block_symbols(&self, round: &mut RoundResult) {
        round.strip_symbol(self.block_symbol_id);
    }

    fn blank_grid(&self) -> ReelGrid {
        self.shape
            .iter()
            .map(|&rows| vec![self.block_symbol_id; rows])
            .collect()
    }

    fn decode_win(
        &self,
        current: &RawCurrent,
        next: &RawNext,
        grid: &ReelGrid,
    ) -> Result<Option<SpinWin>, RoundError> {
        let result = &current.result;
        let triggers_free_spins = current.free_spin.is_none() && next.free_spin.is_some();
        if result.wins.is_empty() && result.scatter_count == 0 {
            return Ok(None);
        }

        let mut win = SpinWin::default();
        for record in &result.wins {
            match record {
                RawWinRecord::Lines { kind, records } if *kind == LINE_WIN_RECORD => {
                    win.lines.extend(self.decode_line_wins(records)?);
                }
                RawWinRecord::Lines { kind, .. } => {
                    return Err(RoundError::Parse(format!("Unknown win record type {kind}")));
                }
                RawWinRecord::Combination {
                    symbol,
                    way_payout,
                    way,
                    multiplier,
                } => {
                    win.combinations.push(self.decode_combination(
                        *symbol,
                        *way_payout,
                        way,
                        *multiplier,
                    )?);
                }
            }
        }

        if result.scatter_count > 0 {
            win.scatters = Some(self.decode_scatter(result.scatter_count, grid)?);
        }

        if let Some(awarded) = next.free_spin.filter(|_| triggers_free_spins) {
            win.freespins = Some(FreespinWin {
                freespin_id: 0,
                total_count: awarded.total,
                remaining_count: awarded.total,
                round_started: false,
                round_complete: false,
                pattern: win.scatters.as_ref().map(|s| s.pattern.clone()),
            });
        }

        Ok(Some(win))
    }

    fn decode_combination(
        &self,
        symbol_id: u32,
        way_payout: f64,
        way: &[String],
        multiplier: f64,
    ) -> Result<CombinationWin, RoundError> {
        let cells = way
            .iter()
            .map(|token| decode_cell(token))
            .collect::<Result<Vec<_>, _>>()?;
        let pattern = WinPattern::from_cells(&self.shape, &cells).ok_or_else(|| {
            RoundError::Parse(format!("Way {way:?} outside the reel layout"))
        })?;

        Ok(CombinationWin {
            symbol_id,
            multiplier,
            way_payout,
            cells,
            pattern,
        })
    }

    /// `CoinPayout,Line,Count,Multiplier,Symbol,Direction` records separated by `|`
    fn decode_line_wins(&self, records: &str) -> Result<Vec<LineWin>, RoundError> {
        records
            .split('|')
            .map(|record| {
                let fields: Vec<&str> = record.split(',').map(str::trim).collect();
                if fields.len() < 6 {
                    return Err(RoundError::Parse(format!("Short line win record '{record}'")));
                }

                let coin_payout: f64 = parse_token(fields[0])?;
                let line_number: usize = parse_token(fields[1])?;
                let symbol_count: u32 = parse_token(fields[2])?;
                let multiplier: f64 = parse_token(fields[3])?;
                let symbol_id: u32 = parse_token(fields[4])?;
                let direction = LineDirection::from_code(parse_token(fields[5])?);

                let rule = self.rules.find_rule(symbol_id, symbol_count)?;
                let line_index = line_number
                    .checked_sub(1)
                    .filter(|&i| i < self.lines.len())
                    .ok_or_else(|| RoundError::Parse(format!("Unknown payline {line_number}")))?;
                let pattern =
                    self.lines[line_index].pattern(&self.shape, symbol_count as usize, direction)?;

                Ok(LineWin {
                    rule_id: rule.id,
                    line_index,
                    symbol_id,
                    symbol_count,
                    direction,
                    multiplier,
                    win_multiplier: rule.reward_multiplier,
                    win_value: coin_payout * self.config.denomination,
                    pattern,
                })
            })
            .collect()
    }

    fn decode_scatter(&self, count: u32, grid: &ReelGrid) -> Result<ScatterWin, RoundError> {
        let symbol_id = self.scatter_symbol_id.ok_or_else(|| {
            RoundError::Config("Scatter reported but no scatter symbol configured".into())
        })?;

        Ok(ScatterWin {
            symbol_id,
            count,
            win_value: 0.0,
            pattern: WinPattern::from_grid(grid, |s| s == symbol_id),
        })
    }
}

/// Decode `"a,b,c|d,e,f"` into reel columns
pub fn decode_reel_grid(encoded: &str) -> Result<ReelGrid, RoundError> {
    encoded
        .split('|')
        .map(|column| column.split(',').map(parse_token).collect())
        .collect()
}

/// Free-spin progress, present when either side reports a free-spin round
fn decode_freespins(current: &RawCurrent, next: &RawNext) -> Option<FreespinWin> {
    match (current.free_spin, next.free_spin) {
        (Some(active), _) => Some(FreespinWin {
            freespin_id: active.current,
            total_count: active.total,
            remaining_count: active.total.saturating_sub(active.current),
            round_started: active.current > 0,
            round_complete: false,
            pattern: None,
        }),
        (None, Some(awarded)) => Some(FreespinWin {
            freespin_id: 0,
            total_count: awarded.total,
            remaining_count: awarded.total,
            round_started: false,
            round_complete: false,
            pattern: None,
        }),
        (None, None) => None,
    }
}

fn decode_multiplier_map(current: &RawCurrent) -> Result<Vec<MultiplierCell>, RoundError> {
    current
        .multiplier_map
        .iter()
        .map(|(key, &multiplier)| {
            let (x, y) = key
                .split_once(',')
                .ok_or_else(|| RoundError::Parse(format!("Bad multiplier key '{key}'")))?;
            Ok(MultiplierCell {
                x: parse_token(x)?,
                y: parse_token(y)?,
                multiplier,
            })
        })
        .collect()
}

/// `"reel-row"`
fn decode_cell(token: &str) -> Result<(usize, usize), RoundError> {
    let (reel, row) = token
        .split_once('-')
        .ok_or_else(|| RoundError::Parse(format!("Bad way cell '{token}'")))?;
    Ok((parse_token(reel)?, parse_token(row)?))
}

fn parse_token<T: std::str::FromStr>(token: &str) -> Result<T, RoundError> {
    token
        .trim()
        .parse()
        .map_err(|_| RoundError::Parse(format!("Bad token '{token}'")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::model::TransactionType;
    use crate::scenario::PayloadBuilder;

    fn ways_parser() -> RoundParser {
        RoundParser::new(
            &MachineDescription::combinations_5x4(),
            RoundParserConfig::default(),
        )
        .unwrap()
    }

    fn lines_parser(denomination: f64) -> RoundParser {
        RoundParser::new(
            &MachineDescription::lines_5x3(),
            RoundParserConfig {
                denomination,
                ..Default::default()
            },
        )
        .unwrap()
    }

    const WAYS_GRID: &str = "101,102,103,104|101,105,302,201|101,102,103,104|204,203,202,201|105,104,103,102";
    const LINES_GRID: &str = "105,101,102|105,103,104|105,201,202|203,204,302|101,102,103";

    #[test]
    fn test_decode_reel_grid() {
        let grid = decode_reel_grid("1,2,3|4,5,6").unwrap();
        assert_eq!(grid, vec![vec![1, 2, 3], vec![4, 5, 6]]);

        assert!(matches!(decode_reel_grid("1,x,3|4,5,6"), Err(RoundError::Parse(_))));
        assert!(matches!(decode_reel_grid("1,2,|4,5,6"), Err(RoundError::Parse(_))));
        assert!(decode_reel_grid("").is_err());
    }

    #[test]
    fn test_parse_round_fields() {
        let raw = PayloadBuilder::new(WAYS_GRID)
            .bet(1.0, 20, 20.0)
            .payout(6.0)
            .acc_win(6.0)
            .next(TransactionType::Normal)
            .build();

        let round = ways_parser().parse_round(&raw, true).unwrap();
        assert_eq!(round.line_bet_value, 1.0);
        assert_eq!(round.bet_lines, 20);
        assert_eq!(round.total_bet, 20.0);
        assert_eq!(round.total_win_value, 6.0);
        assert_eq!(round.next_type, Some(TransactionType::Normal));
        assert_eq!(round.spin_index, 0);
        assert_eq!(round.spins.len(), 1);
        assert!(!round.complete);

        let spin = &round.spins[0];
        assert_eq!(spin.reel_grid.len(), 5);
        assert_eq!(spin.reel_grid[1], vec![101, 105, 302, 201]);
        assert_eq!(spin.win_value, 6.0);
        assert_eq!(spin.current_total_win_value, 6.0);
        assert!(spin.win.is_none());
        assert!(spin.freespins.is_none());
    }

    #[test]
    fn test_parse_combination_win() {
        let raw = PayloadBuilder::new(WAYS_GRID)
            .bet(1.0, 20, 20.0)
            .combination(101, 3.0, &["0-0", "1-0", "2-0"], 2.0)
            .build();

        let round = ways_parser().parse_round(&raw, true).unwrap();
        let win = round.spins[0].win.as_ref().unwrap();
        assert!(!win.multi_win_shown);
        assert_eq!(win.combinations.len(), 1);

        let combination = &win.combinations[0];
        assert_eq!(combination.symbol_id, 101);
        assert_eq!(combination.multiplier, 2.0);
        assert_eq!(combination.way_payout, 3.0);
        assert_eq!(combination.cells, vec![(0, 0), (1, 0), (2, 0)]);
        assert_eq!(combination.pattern.shape(), vec![4; 5]);
        assert_eq!(combination.pattern.count(), 3);
        assert!(combination.pattern.get(2, 0));
    }

    #[test]
    fn test_combination_outside_layout() {
        let raw = PayloadBuilder::new(WAYS_GRID)
            .combination(101, 3.0, &["0-0", "7-0"], 1.0)
            .build();
        assert!(matches!(
            ways_parser().parse_round(&raw, true),
            Err(RoundError::Parse(_))
        ));

        let raw = PayloadBuilder::new(WAYS_GRID)
            .combination(101, 3.0, &["0:0"], 1.0)
            .build();
        assert!(ways_parser().parse_round(&raw, true).is_err());
    }

    #[test]
    fn test_parse_line_wins() {
        let raw = PayloadBuilder::new(LINES_GRID)
            .bet(1.0, 20, 20.0)
            .lines("5,2,3,1,105,1|8,4,3,1,203,2")
            .build();

        let round = lines_parser(0.5).parse_round(&raw, true).unwrap();
        let lines = &round.spins[0].win.as_ref().unwrap().lines;
        assert_eq!(lines.len(), 2);

        // Line 2 is the top row, counted from the left
        let first = &lines[0];
        assert_eq!(first.line_index, 1);
        assert_eq!(first.symbol_count, 3);
        assert_eq!(first.win_value, 2.5);
        assert_eq!(first.win_multiplier, 2.0);
        assert_eq!(first.direction, LineDirection::LeftToRight);
        assert!(first.pattern.get(0, 0) && first.pattern.get(1, 0) && first.pattern.get(2, 0));
        assert_eq!(first.pattern.count(), 3);

        // Line 4 is [0, 1, 2, 1, 0], counted from the right
        let second = &lines[1];
        assert_eq!(second.direction, LineDirection::RightToLeft);
        assert!(second.pattern.get(4, 0) && second.pattern.get(3, 1) && second.pattern.get(2, 2));
        assert_eq!(second.pattern.count(), 3);
        assert_eq!(second.win_multiplier, 30.0);

        assert_eq!(round.spins[0].line_win_value(), 6.5);
        assert_eq!(round.line_bet_value, 0.5);
    }

    #[test]
    fn test_line_win_without_rule() {
        let raw = PayloadBuilder::new(LINES_GRID)
            .lines("5,1,2,1,105,1")
            .build();

        let err = lines_parser(1.0).parse_round(&raw, true).unwrap_err();
        assert_eq!(
            err,
            RoundError::RuleNotFound {
                symbol_id: 105,
                count: 2
            }
        );
    }

    #[test]
    fn test_line_win_bad_records() {
        let parser = lines_parser(1.0);
        for records in ["5,1,3,1,105", "5,0,3,1,105,1", "5,21,3,1,105,1", "x,1,3,1,105,1"] {
            let raw = PayloadBuilder::new(LINES_GRID).lines(records).build();
            assert!(
                matches!(parser.parse_round(&raw, true), Err(RoundError::Parse(_))),
                "{records}"
            );
        }
    }

    #[test]
    fn test_parse_scatter() {
        let raw = PayloadBuilder::new(WAYS_GRID).scatter(1).build();

        let round = ways_parser().parse_round(&raw, true).unwrap();
        let scatter = round.spins[0]
            .win
            .as_ref()
            .and_then(|w| w.scatters.as_ref())
            .unwrap();
        assert_eq!(scatter.symbol_id, 302);
        assert_eq!(scatter.count, 1);
        assert!(scatter.pattern.get(1, 2));
        assert_eq!(scatter.pattern.count(), 1);
    }

    #[test]
    fn test_scatter_without_symbol_is_config_error() {
        let mut description = MachineDescription::combinations_5x4();
        description.scatter_symbol_id = None;
        let parser = RoundParser::new(&description, RoundParserConfig::default()).unwrap();

        let raw = PayloadBuilder::new(WAYS_GRID).scatter(3).build();
        assert!(matches!(
            parser.parse_round(&raw, true),
            Err(RoundError::Config(_))
        ));
    }

    #[test]
    fn test_multiplier_map_as_set() {
        let raw = PayloadBuilder::new(WAYS_GRID)
            .multiplier(0, 1, 2.0)
            .multiplier(3, 2, 5.0)
            .multiplier(4, 0, 3.0)
            .build();

        let round = ways_parser().parse_round(&raw, true).unwrap();
        let cells: HashSet<(u32, u32, u64)> = round
            .multiplier_map
            .iter()
            .map(|c| (c.x, c.y, c.multiplier as u64))
            .collect();
        assert_eq!(cells, HashSet::from([(0, 1, 2), (3, 2, 5), (4, 0, 3)]));
    }

    #[test]
    fn test_bad_multiplier_key() {
        let mut raw = PayloadBuilder::new(WAYS_GRID).build();
        if let Some(current) = raw.current.as_mut() {
            current.multiplier_map.insert("3".into(), 2.0);
        }
        assert!(ways_parser().parse_round(&raw, true).is_err());
    }

    #[test]
    fn test_freespins_in_progress() {
        let raw = PayloadBuilder::new(WAYS_GRID)
            .free_spin(3, 10)
            .next(TransactionType::FreeSpin)
            .build();

        let round = ways_parser().parse_round(&raw, true).unwrap();
        let freespins = round.spins[0].freespins.as_ref().unwrap();
        assert_eq!(freespins.freespin_id, 3);
        assert_eq!(freespins.total_count, 10);
        assert_eq!(freespins.remaining_count, 7);
        assert!(freespins.round_started);
        assert!(!freespins.round_complete);
        assert!(round.spins[0].win.is_none());
    }

    #[test]
    fn test_freespins_awarded() {
        let raw = PayloadBuilder::new(WAYS_GRID)
            .scatter(1)
            .next_free_spins(10)
            .next(TransactionType::FreeSpin)
            .build();

        let round = ways_parser().parse_round(&raw, true).unwrap();
        let spin = &round.spins[0];
        let freespins = spin.freespins.as_ref().unwrap();
        assert_eq!(freespins.freespin_id, 0);
        assert_eq!(freespins.remaining_count, 10);
        assert!(!freespins.round_started);

        let win = spin.win.as_ref().unwrap();
        let award = win.freespins.as_ref().unwrap();
        assert_eq!(award.total_count, 10);
        assert_eq!(award.pattern.as_ref().map(|p| p.count()), Some(1));
    }

    #[test]
    fn test_award_without_win_has_no_win_block() {
        let raw = PayloadBuilder::new(WAYS_GRID)
            .next_free_spins(10)
            .next(TransactionType::FreeSpin)
            .build();

        let round = ways_parser().parse_round(&raw, true).unwrap();
        let spin = &round.spins[0];
        assert!(spin.win.is_none());

        let freespins = spin.freespins.as_ref().unwrap();
        assert_eq!(freespins.remaining_count, 10);
        assert!(!freespins.round_started);
    }

    #[test]
    fn test_partial_parse_skips_wins() {
        let raw = PayloadBuilder::new(WAYS_GRID)
            .bet(2.0, 20, 40.0)
            .payout(12.0)
            .combination(101, 3.0, &["0-0", "1-0", "2-0"], 1.0)
            .scatter(1)
            .build();

        let round = ways_parser().parse_round(&raw, false).unwrap();
        assert!(round.spins[0].win.is_none());
        assert_eq!(round.total_bet, 40.0);
        assert_eq!(round.total_win_value, 12.0);
        assert_eq!(round.line_bet_value, 2.0);
    }

    #[test]
    fn test_missing_current_gives_blank_round() {
        let raw = RawRoundPayload::from_json(r#"{ "Next": { "Type": 2 } }"#).unwrap();
        let round = ways_parser().parse_round(&raw, true).unwrap();

        assert_eq!(round.spins[0].reel_grid, vec![vec![0; 4]; 5]);
        assert_eq!(round.next_type, Some(TransactionType::FreeSpin));
        assert_eq!(round.total_bet, 0.0);
    }

    #[test]
    fn test_strip_block_symbols() {
        let raw = PayloadBuilder::new("0,101,102,0|103,0,104,105|0,0,0,0|1,2,3,4|5,6,7,8").build();
        let parser = ways_parser();
        let mut round = parser.parse_round(&raw, false).unwrap();
        parser.strip_block_symbols(&mut round);

        assert_eq!(round.spins[0].reel_grid[0], vec![101, 102]);
        assert_eq!(round.spins[0].reel_grid[1], vec![103, 104, 105]);
        assert!(round.spins[0].reel_grid[2].is_empty());
    }

    #[test]
    fn test_non_positive_denomination_rejected() {
        let config = RoundParserConfig {
            denomination: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            RoundParser::new(&MachineDescription::lines_5x3(), config),
            Err(RoundError::Config(_))
        ));
    }
}
