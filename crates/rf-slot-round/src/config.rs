//! Machine description and loading
//!
//! The description is immutable for a machine's lifetime. It is usually
//! shipped as JSON or YAML next to the game and validated once on load.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::paytable::{Payline, PatternType, SymbolRule};

/// Payout model of a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineType {
    /// Fixed paylines
    Lines,
    /// Ways/combinations keyed by symbol adjacency across reels
    Combinations,
}

/// One reel column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelDescription {
    /// Visible rows
    pub num_rows: u8,
    /// Symbols this reel may show
    #[serde(default)]
    pub available_symbols: Vec<u32>,
}

/// A set of reels used together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelSetDescription {
    #[serde(default)]
    pub id: u32,
    /// Winning symbols are removed and the server sends continuation spins
    #[serde(default)]
    pub cascading: bool,
    pub reels: Vec<ReelDescription>,
}

impl ReelSetDescription {
    /// Rows per reel, left to right
    pub fn shape(&self) -> Vec<usize> {
        self.reels.iter().map(|r| r.num_rows as usize).collect()
    }
}

/// Regular and free-spin reel sets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReelSets {
    pub regular: ReelSetDescription,
    #[serde(default)]
    pub free_spins: Vec<ReelSetDescription>,
}

/// Static description of a slot machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineDescription {
    /// Game identifier
    #[serde(default)]
    pub game_id: String,
    /// Payout model
    pub machine_type: MachineType,
    /// Selectable coin values, ascending; the first is the initial bet
    pub bet_limits: Vec<f64>,
    /// Largest bet quantity the "max bet" control selects
    #[serde(default = "default_bet_max_quantity")]
    pub bet_max_quantity: u8,
    /// Way count for combination machines
    #[serde(default)]
    pub combinations: u32,
    /// Paylines (empty for combination machines)
    #[serde(default)]
    pub lines: Vec<Payline>,
    /// Ascending win/bet ratios that trigger the big win celebration
    #[serde(default)]
    pub big_win_multiplier_levels: Vec<f64>,
    /// Every symbol id the machine can show
    pub symbols: Vec<u32>,
    /// Symbol whose presence the server reports as a scatter count
    #[serde(default)]
    pub scatter_symbol_id: Option<u32>,
    /// Placeholder id the server uses for empty cells on restore
    #[serde(default)]
    pub block_symbol_id: u32,
    /// Reel layout
    pub reels: ReelSets,
    /// Payout rules
    #[serde(default)]
    pub rules: Vec<SymbolRule>,
}

fn default_bet_max_quantity() -> u8 {
    10
}

impl MachineDescription {
    /// Number of paylines (0 for combination machines)
    pub fn num_lines(&self) -> usize {
        self.lines.len()
    }

    /// Does the regular reel set cascade?
    pub fn is_cascading(&self) -> bool {
        self.reels.regular.cascading
    }

    /// Rows per reel of the regular reel set
    pub fn grid_shape(&self) -> Vec<usize> {
        self.reels.regular.shape()
    }

    /// Built-in description by game id
    pub fn preset(game_id: &str) -> Option<Self> {
        match game_id {
            "lines_5x3" => Some(Self::lines_5x3()),
            "combinations_5x4" => Some(Self::combinations_5x4()),
            _ => None,
        }
    }

    /// 5×3, 20 lines, non-cascading
    pub fn lines_5x3() -> Self {
        let symbols = vec![105, 104, 103, 102, 101, 204, 203, 202, 201, 303, 302, 301];
        let reel = ReelDescription {
            num_rows: 3,
            available_symbols: symbols.clone(),
        };

        let mut rules = Vec::new();
        let mut id = 0;
        for (symbol, pays) in [
            (105, [2.0, 8.0, 30.0]),
            (104, [2.0, 8.0, 30.0]),
            (103, [2.0, 8.0, 30.0]),
            (102, [2.0, 8.0, 30.0]),
            (101, [2.0, 8.0, 30.0]),
            (204, [25.0, 75.0, 300.0]),
            (203, [30.0, 100.0, 400.0]),
            (202, [40.0, 150.0, 500.0]),
            (201, [50.0, 200.0, 1000.0]),
        ] {
            for (count, pay) in (3..=5).zip(pays) {
                rules.push(SymbolRule::new(id, symbol, [count], PatternType::Leftmost, pay));
                id += 1;
            }
        }

        Self {
            game_id: "lines_5x3".into(),
            machine_type: MachineType::Lines,
            bet_limits: vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0],
            bet_max_quantity: 10,
            combinations: 0,
            lines: crate::paytable::standard_20_paylines(),
            big_win_multiplier_levels: vec![10.0],
            symbols,
            scatter_symbol_id: Some(302),
            block_symbol_id: 0,
            reels: ReelSets {
                regular: ReelSetDescription {
                    id: 0,
                    cascading: false,
                    reels: vec![reel; 5],
                },
                free_spins: Vec::new(),
            },
            rules,
        }
    }

    /// 5×4, 20 ways, cascading
    pub fn combinations_5x4() -> Self {
        let symbols = vec![
            25, 105, 104, 103, 102, 101, 204, 203, 202, 201, 302, 301, 205, 206, 207, 208,
        ];
        let reel = ReelDescription {
            num_rows: 4,
            available_symbols: symbols.clone(),
        };
        let reel_set = ReelSetDescription {
            id: 0,
            cascading: true,
            reels: vec![reel; 5],
        };

        let mut rules = Vec::new();
        let mut id = 0;
        for (symbol, pays) in [
            (201, [10.0, 40.0, 100.0]),
            (202, [8.0, 30.0, 80.0]),
            (203, [5.0, 20.0, 50.0]),
            (204, [4.0, 15.0, 40.0]),
            (101, [1.0, 3.0, 10.0]),
            (102, [1.0, 3.0, 10.0]),
            (103, [1.0, 2.0, 5.0]),
            (104, [1.0, 2.0, 5.0]),
            (105, [1.0, 2.0, 5.0]),
        ] {
            for (count, pay) in (3..=5).zip(pays) {
                let mut rule = SymbolRule::new(id, symbol, [count], PatternType::BothWays, pay);
                if symbol == 201 {
                    rule.doubled_symbol_id = Some(205);
                }
                rules.push(rule);
                id += 1;
            }
        }
        let mut scatter = SymbolRule::new(id, 302, [4, 5], PatternType::Scatter, 0.0);
        scatter.free_spin_award = Some(crate::paytable::FreeSpinAward { id: 0, amount: 10 });
        rules.push(scatter);

        Self {
            game_id: "combinations_5x4".into(),
            machine_type: MachineType::Combinations,
            bet_limits: vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0],
            bet_max_quantity: 10,
            combinations: 20,
            lines: Vec::new(),
            big_win_multiplier_levels: vec![10.0, 20.0, 30.0, 40.0],
            symbols,
            scatter_symbol_id: Some(302),
            block_symbol_id: 0,
            reels: ReelSets {
                regular: reel_set.clone(),
                free_spins: vec![reel_set],
            },
            rules,
        }
    }
}

/// Presentation options of a machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineOptions {
    /// Number of selectable reel speed levels
    pub game_speed_levels: u8,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            game_speed_levels: 1,
        }
    }
}

/// Round parser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundParserConfig {
    /// Wallet denomination applied to line bets and coin payouts
    #[serde(default = "default_denomination")]
    pub denomination: f64,
    /// Upper bound on continuation transacts within one round
    #[serde(default = "default_max_cascade_steps")]
    pub max_cascade_steps: usize,
}

fn default_denomination() -> f64 {
    1.0
}

fn default_max_cascade_steps() -> usize {
    64
}

impl Default for RoundParserConfig {
    fn default() -> Self {
        Self {
            denomination: default_denomination(),
            max_cascade_steps: default_max_cascade_steps(),
        }
    }
}

/// Description loader with validation
pub struct DescriptionParser {
    /// Validation limits
    pub limits: DescriptionLimits,
}

/// Loading limits
#[derive(Debug, Clone)]
pub struct DescriptionLimits {
    pub max_reels: usize,
    pub max_rows: usize,
    pub max_rules: usize,
    pub max_lines: usize,
    pub max_symbols: usize,
}

impl Default for DescriptionLimits {
    fn default() -> Self {
        Self {
            max_reels: 10,
            max_rows: 10,
            max_rules: 500,
            max_lines: 100,
            max_symbols: 100,
        }
    }
}

impl DescriptionParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self {
            limits: DescriptionLimits::default(),
        }
    }

    /// Create parser with custom limits
    pub fn with_limits(limits: DescriptionLimits) -> Self {
        Self { limits }
    }

    /// Parse and validate a JSON description
    pub fn parse_json(&self, json: &str) -> Result<MachineDescription, DescriptionError> {
        let description: MachineDescription =
            serde_json::from_str(json).map_err(|e| DescriptionError::Json(e.to_string()))?;
        self.validate(&description)?;
        Ok(description)
    }

    /// Parse and validate a YAML description
    pub fn parse_yaml(&self, yaml: &str) -> Result<MachineDescription, DescriptionError> {
        let description: MachineDescription =
            serde_yml::from_str(yaml).map_err(|e| DescriptionError::Yaml(e.to_string()))?;
        self.validate(&description)?;
        Ok(description)
    }

    /// Validate a description
    pub fn validate(&self, description: &MachineDescription) -> Result<(), DescriptionError> {
        let reels = &description.reels.regular.reels;
        if reels.is_empty() || reels.len() > self.limits.max_reels {
            return Err(DescriptionError::Validation(format!(
                "Reel count {} outside 1..={}",
                reels.len(),
                self.limits.max_reels
            )));
        }
        if let Some(reel) = reels
            .iter()
            .find(|r| r.num_rows == 0 || r.num_rows as usize > self.limits.max_rows)
        {
            return Err(DescriptionError::Validation(format!(
                "Row count {} outside 1..={}",
                reel.num_rows, self.limits.max_rows
            )));
        }

        if description.symbols.is_empty() || description.symbols.len() > self.limits.max_symbols {
            return Err(DescriptionError::Validation(format!(
                "Symbol count {} outside 1..={}",
                description.symbols.len(),
                self.limits.max_symbols
            )));
        }

        if description.bet_limits.is_empty() {
            return Err(DescriptionError::Validation("No bet limits".into()));
        }

        if !(1..=10).contains(&description.bet_max_quantity) {
            return Err(DescriptionError::Validation(format!(
                "Max bet quantity {} outside 1..=10",
                description.bet_max_quantity
            )));
        }

        if description
            .big_win_multiplier_levels
            .windows(2)
            .any(|w| w[0] > w[1])
        {
            return Err(DescriptionError::Validation(
                "Big win levels must be ascending".into(),
            ));
        }

        match description.machine_type {
            MachineType::Lines => {
                if description.lines.is_empty() || description.lines.len() > self.limits.max_lines
                {
                    return Err(DescriptionError::Validation(format!(
                        "Line count {} outside 1..={}",
                        description.lines.len(),
                        self.limits.max_lines
                    )));
                }
                if let Some(line) = description
                    .lines
                    .iter()
                    .find(|l| l.positions.len() != reels.len())
                {
                    return Err(DescriptionError::Validation(format!(
                        "Payline {:?} does not span {} reels",
                        line.positions,
                        reels.len()
                    )));
                }
            }
            MachineType::Combinations => {
                if description.combinations == 0 {
                    return Err(DescriptionError::Validation(
                        "Combination machine without a way count".into(),
                    ));
                }
            }
        }

        if description.rules.len() > self.limits.max_rules {
            return Err(DescriptionError::Validation(format!(
                "Too many rules: {} > {}",
                description.rules.len(),
                self.limits.max_rules
            )));
        }
        check_rule_partition(&description.rules)?;

        Ok(())
    }
}

impl Default for DescriptionParser {
    fn default() -> Self {
        Self::new()
    }
}

/// No two rules for the same (symbol, match type) may share a count
fn check_rule_partition(rules: &[SymbolRule]) -> Result<(), DescriptionError> {
    let mut seen: HashMap<(u32, PatternType), BTreeSet<u32>> = HashMap::new();
    for rule in rules {
        let counts = seen
            .entry((rule.pattern_symbol_id, rule.match_type))
            .or_default();
        for count in &rule.symbol_counts {
            if !counts.insert(*count) {
                return Err(DescriptionError::Validation(format!(
                    "Rule {} overlaps another rule for symbol {} x{}",
                    rule.id, rule.pattern_symbol_id, count
                )));
            }
        }
    }
    Ok(())
}

/// Description loading errors
#[derive(Debug, thiserror::Error)]
pub enum DescriptionError {
    #[error("JSON parse error: {0}")]
    Json(String),

    #[error("YAML parse error: {0}")]
    Yaml(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
