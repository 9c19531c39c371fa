//! Built-in round scripts

use super::{PayloadBuilder, RoundScript};
use crate::model::TransactionType;

const WAYS_DEAD: &str = "101,102,103,104|105,201,202,203|204,101,102,103|104,105,201,202|203,204,101,102";
const WAYS_WIN: &str = "101,102,103,104|101,105,201,202|101,204,103,104|102,105,201,202|203,204,101,102";
const WAYS_SCATTER: &str = "302,101,102,103|101,302,103,104|105,104,302,102|201,202,203,204|101,102,103,104";
const LINES_WIN: &str = "105,101,102|105,103,104|105,201,202|203,204,302|101,102,103";

/// All presets
pub fn all_presets() -> Vec<RoundScript> {
    vec![
        no_win(),
        line_win(),
        cascade_chain(3),
        free_spins_trigger(),
        big_win(),
        connection_drop(),
    ]
}

/// Look up a preset by id
pub fn preset(id: &str) -> Option<RoundScript> {
    all_presets().into_iter().find(|s| s.id == id)
}

/// Dead spin
pub fn no_win() -> RoundScript {
    RoundScript::new("no_win", "No Win", "combinations_5x4")
        .with_description("A spin with nothing to present")
        .add_payload(PayloadBuilder::new(WAYS_DEAD).build())
}

/// One payline win on a lines machine
pub fn line_win() -> RoundScript {
    RoundScript::new("line_win", "Line Win", "lines_5x3")
        .with_description("Three 105s on the top line")
        .add_payload(
            PayloadBuilder::new(LINES_WIN)
                .payout(5.0)
                .acc_win(5.0)
                .lines("5,2,3,1,105,1")
                .build(),
        )
}

/// A ways win followed by `respins` cascade continuations
pub fn cascade_chain(respins: u32) -> RoundScript {
    let mut script = RoundScript::new("cascade_chain", "Cascade Chain", "combinations_5x4")
        .with_description(format!("Ways win followed by {respins} respins"));

    let mut payout = 3.0;
    script = script.add_payload(
        PayloadBuilder::new(WAYS_WIN)
            .payout(payout)
            .acc_win(payout)
            .combination(101, 3.0, &["0-0", "1-0", "2-0"], 1.0)
            .next(if respins > 0 {
                TransactionType::Respin
            } else {
                TransactionType::Normal
            })
            .build(),
    );

    for step in 1..=respins {
        payout += 1.0;
        let next = if step < respins {
            TransactionType::Respin
        } else {
            TransactionType::Normal
        };
        script = script.add_payload(
            PayloadBuilder::new(WAYS_WIN)
                .payout(payout)
                .acc_win(1.0)
                .combination(101, 1.0, &["0-0", "1-0", "2-0"], step as f64 + 1.0)
                .multiplier(0, 0, step as f64 + 1.0)
                .next(next)
                .build(),
        );
    }

    script
}

/// Three scatters award two free spins, which are then played
pub fn free_spins_trigger() -> RoundScript {
    RoundScript::new("free_spins_trigger", "Free Spins Trigger", "combinations_5x4")
        .with_description("Scatter trigger and a two-spin free spin round")
        .with_rounds(3)
        .add_payload(
            PayloadBuilder::new(WAYS_SCATTER)
                .scatter(3)
                .next_free_spins(2)
                .next(TransactionType::FreeSpin)
                .build(),
        )
        .add_payload(
            PayloadBuilder::new(WAYS_WIN)
                .payout(3.0)
                .acc_win(3.0)
                .combination(101, 3.0, &["0-0", "1-0", "2-0"], 1.0)
                .free_spin(1, 2)
                .next(TransactionType::FreeSpin)
                .build(),
        )
        .add_payload(
            PayloadBuilder::new(WAYS_DEAD)
                .payout(3.0)
                .free_spin(2, 2)
                .next(TransactionType::Normal)
                .build(),
        )
}

/// Win of 12.5× the bet
pub fn big_win() -> RoundScript {
    RoundScript::new("big_win", "Big Win", "combinations_5x4")
        .with_description("Ways win above the first big win level")
        .add_payload(
            PayloadBuilder::new(WAYS_WIN)
                .payout(250.0)
                .acc_win(250.0)
                .combination(101, 250.0, &["0-0", "1-0", "2-0"], 1.0)
                .build(),
        )
}

/// The connection drops between two cascade steps
pub fn connection_drop() -> RoundScript {
    RoundScript::new("connection_drop", "Connection Drop", "combinations_5x4")
        .with_description("Transport failure after the first cascade step")
        .add_payload(
            PayloadBuilder::new(WAYS_WIN)
                .payout(3.0)
                .acc_win(3.0)
                .combination(101, 3.0, &["0-0", "1-0", "2-0"], 1.0)
                .next(TransactionType::Respin)
                .build(),
        )
        .add_failure("Connection reset by peer")
}
