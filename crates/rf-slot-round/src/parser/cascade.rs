//! Cascade accumulation
//!
//! A cascading round arrives as a chain of transacts. Each response whose
//! next type is a respin asks for another one; the spins are appended in
//! arrival order until a terminal type comes back.

use super::RoundParser;
use crate::error::{FetchFailure, RoundError};
use crate::model::RoundResult;
use crate::service::{GameService, TransactRequest};

impl RoundParser {
    /// Run `first` and every continuation transact it leads to
    ///
    /// Every continuation stakes `first.line_bet`. Round-level fields
    /// (totals, next type, multiplier map) come from the last response; the
    /// round id and spin cursor are those of the first.
    /// A transport failure or cascade overrun hands back the spins gathered
    /// so far in [`FetchFailure::partial`].
    pub async fn fetch_round<S: GameService>(
        &self,
        service: &mut S,
        first: TransactRequest,
    ) -> Result<RoundResult, FetchFailure> {
        let raw = service.transact(first).await.map_err(|e| {
            log::warn!("Transact failed: {e}");
            FetchFailure::new(e.into())
        })?;
        let mut round = self.parse_round(&raw, true).map_err(FetchFailure::new)?;

        let mut steps = 0;
        while let Some(next_type) = round.next_type.filter(|t| t.is_continuation()) {
            if steps >= self.config.max_cascade_steps {
                log::error!(
                    "Round {} still continuing after {} cascade steps",
                    round.id,
                    steps
                );
                carry_freespins(&mut round);
                return Err(FetchFailure::new(RoundError::CascadeOverrun {
                    limit: self.config.max_cascade_steps,
                })
                .with_partial(round));
            }
            steps += 1;

            let request = TransactRequest {
                line_bet: first.line_bet,
                num_lines: first.num_lines,
                transaction_type: Some(next_type),
                round_type: first.round_type,
            };
            let raw = match service.transact(request).await {
                Ok(raw) => raw,
                Err(e) => {
                    log::warn!("Transact failed on cascade step {steps}: {e}");
                    carry_freespins(&mut round);
                    return Err(FetchFailure::new(e.into()).with_partial(round));
                }
            };

            let continuation = self.parse_round(&raw, true).map_err(FetchFailure::new)?;
            append_continuation(&mut round, continuation);
            log::debug!(
                "Cascade step {}: {} spins accumulated, next {:?}",
                steps,
                round.spins.len(),
                round.next_type
            );
        }

        carry_freespins(&mut round);
        Ok(round)
    }
}

fn append_continuation(round: &mut RoundResult, continuation: RoundResult) {
    let RoundResult {
        line_bet_value,
        bet_lines,
        total_bet,
        total_win_value,
        multiplier_map,
        next_type,
        spins,
        ..
    } = continuation;

    round.line_bet_value = line_bet_value;
    round.bet_lines = bet_lines;
    round.total_bet = total_bet;
    round.total_win_value = total_win_value;
    round.multiplier_map = multiplier_map;
    round.next_type = next_type;
    round.spins.extend(spins);
}

/// Every spin of a cascade shares the free-spin state of its first spin
fn carry_freespins(round: &mut RoundResult) {
    let Some((first, rest)) = round.spins.split_first_mut() else {
        return;
    };
    if let Some(freespins) = &first.freespins {
        for spin in rest {
            spin.freespins = Some(freespins.clone());
        }
    }
}
