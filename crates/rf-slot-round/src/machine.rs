//! Slot Machine — Round state, bet configuration and derived queries
//!
//! One machine per game session. It owns the current and previous round,
//! the bet settings and the presentation state, and announces every change
//! on its [`EventBus`].

use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use rand::Rng;
use rand::seq::IndexedRandom;

use rf_stage::{EventBus, MachineEvent, PresentationState, StateChange};

use crate::config::{MachineDescription, MachineOptions};
use crate::error::RoundError;
use crate::model::{ReelGrid, RoundResult, SpinResult, WinPattern};
use crate::paytable::{RuleIndex, SymbolRule};

/// Largest bet quantity the setter accepts
pub const MAX_BET_QUANTITY: i32 = 10;

/// Machine behind a lock, for hosts that drive it from several threads
pub type SharedMachine = Arc<Mutex<SlotMachine>>;

/// Bet quantity controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetAdjust {
    Up,
    Down,
    /// The description's max bet quantity
    Max,
}

/// Slot machine state
pub struct SlotMachine {
    description: MachineDescription,
    options: MachineOptions,
    rules: RuleIndex,
    current_bet_value: f64,
    bet_quantity: u8,
    current_game_speed_level: u8,
    current_state: PresentationState,
    current_line_win: Option<usize>,
    round_result: Option<RoundResult>,
    previous_round_result: Option<RoundResult>,
    /// Big win celebration of the current round was acknowledged
    big_win_shown: bool,
    show_free_spins_popup: bool,
    bus: EventBus,
}

impl SlotMachine {
    pub fn new(description: MachineDescription, options: MachineOptions) -> Self {
        let rules = RuleIndex::new(description.rules.clone());
        let current_bet_value = description.bet_limits.first().copied().unwrap_or(0.0);

        Self {
            description,
            options,
            rules,
            current_bet_value,
            bet_quantity: 1,
            current_game_speed_level: 0,
            current_state: PresentationState::NotInitialized,
            current_line_win: None,
            round_result: None,
            previous_round_result: None,
            big_win_shown: false,
            show_free_spins_popup: false,
            bus: EventBus::new(),
        }
    }

    /// Wrap in a lock for multi-threaded hosts
    pub fn into_shared(self) -> SharedMachine {
        Arc::new(Mutex::new(self))
    }

    pub fn description(&self) -> &MachineDescription {
        &self.description
    }

    pub fn options(&self) -> &MachineOptions {
        &self.options
    }

    pub fn rules(&self) -> &RuleIndex {
        &self.rules
    }

    /// Receive every event published from now on
    pub fn subscribe(&mut self) -> Receiver<MachineEvent> {
        self.bus.subscribe()
    }

    pub(crate) fn publish(&mut self, event: MachineEvent) {
        self.bus.publish(event);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // BET CONFIGURATION
    // ═══════════════════════════════════════════════════════════════════════

    pub fn current_bet_value(&self) -> f64 {
        self.current_bet_value
    }

    pub fn set_current_bet_value(&mut self, value: f64) {
        if value == self.current_bet_value {
            return;
        }
        self.current_bet_value = value;
        self.publish(MachineEvent::BetValueChanged { value });
    }

    pub fn bet_quantity(&self) -> u8 {
        self.bet_quantity
    }

    /// Set the bet quantity; values outside 1..=10 or equal to the current one are ignored
    pub fn set_bet_quantity(&mut self, quantity: i32) {
        if quantity <= 0 || quantity > MAX_BET_QUANTITY {
            log::debug!("Ignoring bet quantity {quantity}");
            return;
        }
        let quantity = quantity as u8;
        if quantity == self.bet_quantity {
            return;
        }
        self.bet_quantity = quantity;
        self.publish(MachineEvent::BetQuantityChanged { quantity });
    }

    pub fn adjust_bet_quantity(&mut self, adjust: BetAdjust) {
        let current = i32::from(self.bet_quantity);
        let quantity = match adjust {
            BetAdjust::Up => current + 1,
            BetAdjust::Down => current - 1,
            BetAdjust::Max => i32::from(self.description.bet_max_quantity),
        };
        self.set_bet_quantity(quantity);
    }

    /// Paylines played (0 for combination machines)
    pub fn num_lines(&self) -> usize {
        self.description.num_lines()
    }

    pub fn combinations(&self) -> u32 {
        self.description.combinations
    }

    /// Lines or ways the bet value is multiplied by
    pub fn bet_lines(&self) -> u32 {
        match self.num_lines() {
            0 => self.combinations(),
            lines => lines as u32,
        }
    }

    /// Bet value × lines (or ways) × quantity
    pub fn total_bet(&self) -> f64 {
        self.current_bet_value * f64::from(self.bet_lines()) * f64::from(self.bet_quantity)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PRESENTATION
    // ═══════════════════════════════════════════════════════════════════════

    pub fn current_game_speed_level(&self) -> u8 {
        self.current_game_speed_level
    }

    /// Levels outside the configured range are ignored
    pub fn set_current_game_speed_level(&mut self, level: u8) {
        if level == self.current_game_speed_level {
            return;
        }
        if level >= self.options.game_speed_levels {
            log::debug!(
                "Ignoring game speed level {level} of {}",
                self.options.game_speed_levels
            );
            return;
        }
        self.current_game_speed_level = level;
        self.publish(MachineEvent::GameSpeedLevelChanged { level });
    }

    pub fn current_state(&self) -> PresentationState {
        self.current_state
    }

    /// Enter `state`; returns false (and publishes nothing) if already there
    pub fn set_current_state(&mut self, state: PresentationState) -> bool {
        if state == self.current_state {
            return false;
        }
        self.enter_state(state);
        true
    }

    /// Enter `state` and publish even if the machine is already in it
    pub(crate) fn enter_state(&mut self, state: PresentationState) {
        let previous = self.current_state;
        self.current_state = state;
        log::debug!("State {previous} -> {state}");

        let mut change = StateChange::new(state, previous);
        if let Some(round) = &self.round_result {
            change = change.with_round(round.id.clone(), round.spin_index);
        }
        self.publish(MachineEvent::StateChanged(change));
    }

    pub fn current_line_win(&self) -> Option<usize> {
        self.current_line_win
    }

    pub fn set_current_line_win(&mut self, line: usize) {
        if self.current_line_win == Some(line) {
            return;
        }
        self.current_line_win = Some(line);
        self.publish(MachineEvent::LineWinShown { line });
    }

    pub fn big_win_shown(&self) -> bool {
        self.big_win_shown
    }

    pub fn set_big_win_shown(&mut self, shown: bool) {
        self.big_win_shown = shown;
    }

    pub fn show_free_spins_popup(&self) -> bool {
        self.show_free_spins_popup
    }

    pub fn set_show_free_spins_popup(&mut self, show: bool) {
        self.show_free_spins_popup = show;
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ROUNDS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn round_result(&self) -> Option<&RoundResult> {
        self.round_result.as_ref()
    }

    pub fn round_result_mut(&mut self) -> Option<&mut RoundResult> {
        self.round_result.as_mut()
    }

    pub fn previous_round_result(&self) -> Option<&RoundResult> {
        self.previous_round_result.as_ref()
    }

    /// Install a fresh round; the current one becomes the previous round
    pub fn begin_round(&mut self, round: RoundResult) {
        log::info!("Round {} loaded with {} spins", round.id, round.spins.len());
        if let Some(finished) = self.round_result.replace(round) {
            self.previous_round_result = Some(finished);
        }
        self.big_win_shown = false;
        self.current_line_win = None;
    }

    /// Replace the current round without touching the previous one
    pub fn set_round_result(&mut self, round: RoundResult) {
        self.round_result = Some(round);
    }

    pub fn set_previous_round_result(&mut self, round: RoundResult) {
        self.previous_round_result = Some(round);
    }

    pub fn current_spin_result(&self) -> Option<&SpinResult> {
        self.round_result.as_ref()?.current_spin()
    }

    pub fn next_spin_result(&self) -> Option<&SpinResult> {
        self.round_result.as_ref()?.next_spin()
    }

    pub fn previous_spin_result(&self) -> Option<&SpinResult> {
        self.round_result.as_ref()?.previous_spin()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // DERIVED QUERIES
    // ═══════════════════════════════════════════════════════════════════════

    pub fn is_cascading(&self) -> bool {
        self.description.is_cascading()
    }

    pub fn find_rule(&self, symbol_id: u32, count: u32) -> Result<&SymbolRule, RoundError> {
        self.rules.find_rule(symbol_id, count)
    }

    /// OR of every win pattern on `spin`
    pub fn multi_win_pattern(&self, spin: &SpinResult) -> WinPattern {
        spin.multi_win_pattern()
    }

    pub fn line_win_value(&self, spin: &SpinResult) -> f64 {
        spin.line_win_value()
    }

    /// Highest big win level whose threshold the round's win/bet ratio meets
    pub fn big_win_level(&self, round: &RoundResult) -> Option<usize> {
        if round.total_bet <= 0.0 {
            return None;
        }
        let ratio = round.win_ratio();
        self.description
            .big_win_multiplier_levels
            .iter()
            .rposition(|&threshold| ratio >= threshold)
    }

    /// Zero-value round to show when no server data is available
    ///
    /// With a previous round the last reel grid and the pending transaction
    /// type are kept; otherwise the grid is random.
    pub fn dummy_round_result<R: Rng + ?Sized>(
        &self,
        previous: Option<&RoundResult>,
        rng: &mut R,
    ) -> RoundResult {
        let reel_grid = previous
            .and_then(RoundResult::last_spin)
            .map(|spin| spin.reel_grid.clone())
            .unwrap_or_else(|| self.random_grid(rng));

        let mut round = RoundResult::new(SpinResult::new(reel_grid));
        round.next_type = previous.and_then(|p| p.next_type);
        round
    }

    /// [`Self::dummy_round_result`] with the thread-local RNG
    pub fn dummy_round(&self, previous: Option<&RoundResult>) -> RoundResult {
        self.dummy_round_result(previous, &mut rand::rng())
    }

    fn random_grid<R: Rng + ?Sized>(&self, rng: &mut R) -> ReelGrid {
        let symbols = &self.description.symbols;
        self.description
            .grid_shape()
            .into_iter()
            .map(|rows| {
                (0..rows)
                    .map(|_| symbols.choose(rng).copied().unwrap_or(self.description.block_symbol_id))
                    .collect()
            })
            .collect()
    }
}
