//! Replay — Plays a round script through a full game session
//!
//! The host side of a session is simulated: every stage that takes an
//! acknowledgement gets one immediately, every other stage is followed by
//! another decision. Play of a round stops at `IDLE`, at
//! `COMMUNICATION_ERROR`, or at `FREE_SPINS` where the next transact starts.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::json;

use rf_slot_round::{
    Acknowledgement, Decision, DescriptionParser, GameService, GameSession, MachineDescription,
    MachineOptions, RoundParser, RoundParserConfig, RoundScript, ScriptedGameService,
    SlotMachine,
};
use rf_stage::{PresentationState, StageTrace};

/// Presentation steps allowed per round before giving up
const MAX_STEPS_PER_ROUND: usize = 512;

/// Session settings for a replay
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub parser: RoundParserConfig,
    pub machine: MachineOptions,
    pub bet_quantity: i32,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            parser: RoundParserConfig::default(),
            machine: MachineOptions::default(),
            bet_quantity: 1,
        }
    }
}

pub fn parse_script(json: &str) -> Result<RoundScript> {
    let script: RoundScript = serde_json::from_str(json).context("Invalid round script")?;
    if script.is_empty() {
        bail!("Round script '{}' has no steps", script.id);
    }
    Ok(script)
}

pub fn load_script(path: &Path) -> Result<RoundScript> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_script(&text).with_context(|| format!("Failed to load {}", path.display()))
}

/// Load a machine description, YAML by extension, JSON otherwise
pub fn load_description(path: &Path) -> Result<MachineDescription> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let parser = DescriptionParser::new();
    let description = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => parser.parse_yaml(&text),
        _ => parser.parse_json(&text),
    }
    .with_context(|| format!("Invalid machine description {}", path.display()))?;

    Ok(description)
}

/// Explicit description file, or the preset the script names
pub fn resolve_description(
    script: &RoundScript,
    path: Option<&Path>,
) -> Result<MachineDescription> {
    match path {
        Some(path) => load_description(path),
        None => MachineDescription::preset(&script.machine)
            .with_context(|| format!("Unknown machine preset '{}'", script.machine)),
    }
}

/// Play every round of `script` and collect the presentation trace
pub async fn replay(
    script: &RoundScript,
    description: MachineDescription,
    options: &ReplayOptions,
) -> Result<StageTrace> {
    let parser = RoundParser::new(&description, options.parser.clone())?;
    let game_id = description.game_id.clone();

    let mut machine = SlotMachine::new(description, options.machine.clone());
    machine.set_bet_quantity(options.bet_quantity);

    let mut session = GameSession::new(machine, parser, ScriptedGameService::from_script(script));
    let events = session.subscribe();

    log::info!("Replaying '{}' ({} rounds)", script.id, script.rounds);

    let mut played = 0u32;
    let mut last_state = PresentationState::NotInitialized;
    for round in 1..=script.rounds {
        if let Err(e) = session.spin().await {
            log::warn!("Round {round} of '{}' failed: {e}", script.id);
            last_state = session.machine().current_state();
            break;
        }
        played += 1;
        last_state = present(&mut session)?;
        log::debug!("Round {round} settled in {last_state}");
    }

    let received: Vec<_> = events.try_iter().collect();
    let mut trace = StageTrace::new(uuid::Uuid::new_v4().to_string(), game_id)
        .with_metadata("script", json!(script.id))
        .with_metadata("rounds_played", json!(played))
        .with_metadata("final_state", json!(last_state.type_name()));
    trace.record_all(&received);

    Ok(trace)
}

/// Walk the installed round until it settles
pub fn present<S: GameService>(session: &mut GameSession<S>) -> Result<PresentationState> {
    let mut decision = session.process_spin_result()?;

    for _ in 0..MAX_STEPS_PER_ROUND {
        let state = session.machine().current_state();
        if decision == Decision::NoOp || settles(state) {
            return Ok(state);
        }

        decision = match Acknowledgement::for_stage(state) {
            Some(ack) => {
                log::debug!("{}", ack.type_name());
                session.acknowledge(ack)?
            }
            None => session.process_spin_result()?,
        };
    }

    bail!("Presentation did not settle within {MAX_STEPS_PER_ROUND} steps")
}

fn settles(state: PresentationState) -> bool {
    matches!(
        state,
        PresentationState::Idle
            | PresentationState::CommunicationError
            | PresentationState::FreeSpins
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rf_slot_round::{cascade_chain, connection_drop, free_spins_trigger, no_win};

    async fn replay_preset(script: RoundScript) -> StageTrace {
        let description = resolve_description(&script, None).unwrap();
        replay(&script, description, &ReplayOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_replay_dead_spin() {
        let trace = replay_preset(no_win()).await;

        assert_eq!(
            trace.states(),
            vec![
                PresentationState::Spinning,
                PresentationState::SpinEnd,
                PresentationState::Idle,
            ]
        );
        assert_eq!(trace.completed_rounds.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_cascade_chain() {
        let trace = replay_preset(cascade_chain(2)).await;
        let validation = trace.validate();

        assert!(validation.is_valid());
        assert!(validation.ends_terminal);
        assert_eq!(trace.cascade_count(), 2);
        assert_eq!(validation.round_count, 1);
    }

    #[tokio::test]
    async fn test_replay_free_spins_spans_rounds() {
        let trace = replay_preset(free_spins_trigger()).await;

        assert_eq!(trace.metadata["rounds_played"], json!(3));
        assert_eq!(trace.metadata["final_state"], json!("idle"));
        assert!(trace.has_state(PresentationState::FreeSpinsRoundStart));
        assert_eq!(trace.completed_rounds.len(), 1);
    }

    #[tokio::test]
    async fn test_replay_stops_on_transport_failure() {
        let trace = replay_preset(connection_drop()).await;

        assert_eq!(trace.metadata["rounds_played"], json!(0));
        assert_eq!(
            trace.states().last(),
            Some(&PresentationState::CommunicationError)
        );
        assert!(trace.completed_rounds.is_empty());
    }

    #[test]
    fn test_parse_script_roundtrip() {
        let json = serde_json::to_string(&cascade_chain(1)).unwrap();
        let script = parse_script(&json).unwrap();

        assert_eq!(script.id, "cascade_chain");
        assert_eq!(script.len(), 2);
    }

    #[test]
    fn test_parse_script_rejects_empty() {
        let json = r#"{ "id": "empty", "name": "Empty", "machine": "lines_5x3", "steps": [] }"#;
        assert!(parse_script(json).is_err());
    }

    #[test]
    fn test_unknown_machine_preset() {
        let script = RoundScript::new("x", "X", "no_such_machine");
        let err = resolve_description(&script, None).unwrap_err();
        assert!(err.to_string().contains("no_such_machine"));
    }

    #[test]
    fn test_load_description_from_json_file() {
        let path = std::env::temp_dir()
            .join(format!("rf-round-replay-{}.json", uuid::Uuid::new_v4()));
        let json = serde_json::to_string(&MachineDescription::lines_5x3()).unwrap();
        fs::write(&path, json).unwrap();

        let description = load_description(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(description, MachineDescription::lines_5x3());
    }
}
