//! Integration tests for the game actor, driven through its channels
//! with scripted dice.

use std::collections::VecDeque;
use std::time::Duration;

use cantstop_game::{
    Dice, GameCommand, GameHandle, GameInput, GameLimits, GameOutput, RuleSet,
    spawn_game, spawn_game_with,
};
use cantstop_protocol::ServerMessage;

// =========================================================================
// Helpers
// =========================================================================

/// Replays a fixed list of rolls, then rolls all ones.
struct ScriptedDice(VecDeque<Vec<u8>>);

impl ScriptedDice {
    fn new(rolls: &[&[u8]]) -> Self {
        Self(rolls.iter().map(|r| r.to_vec()).collect())
    }
}

impl Dice for ScriptedDice {
    fn roll(&mut self, faces: &[u8]) -> Vec<u8> {
        self.0.pop_front().unwrap_or_else(|| vec![1; faces.len()])
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn start(ruleset: usize, players: &[&str], rolls: &[&[u8]]) -> GameHandle {
    start_with_limits(ruleset, players, rolls, GameLimits::default())
}

fn start_with_limits(
    ruleset: usize,
    players: &[&str],
    rolls: &[&[u8]],
    limits: GameLimits,
) -> GameHandle {
    spawn_game_with(
        "test",
        RuleSet::get(ruleset).unwrap(),
        names(players),
        ScriptedDice::new(rolls),
        limits,
        64,
    )
    .expect("game should start")
}

async fn recv_raw(handle: &mut GameHandle) -> Option<GameOutput> {
    tokio::time::timeout(Duration::from_secs(2), handle.from_game.recv())
        .await
        .expect("game should answer")
}

/// Next output that isn't a log announcement.
async fn next(handle: &mut GameHandle) -> GameOutput {
    loop {
        let out = recv_raw(handle).await.expect("channel open");
        if !matches!(out.message, ServerMessage::Log { .. }) {
            return out;
        }
    }
}

async fn next_log(handle: &mut GameHandle) -> String {
    loop {
        let out = recv_raw(handle).await.expect("channel open");
        if let ServerMessage::Log { content } = out.message {
            return content;
        }
    }
}

async fn send(handle: &GameHandle, username: &str, command: GameCommand) {
    handle
        .to_game
        .send(GameInput {
            username: username.to_string(),
            command,
        })
        .await
        .expect("game should accept input");
}

fn broadcast(message: ServerMessage) -> GameOutput {
    GameOutput { target: None, message }
}

fn to(username: &str, message: ServerMessage) -> GameOutput {
    GameOutput {
        target: Some(username.to_string()),
        message,
    }
}

fn player(username: &str, is_playing: bool, score: usize) -> GameOutput {
    broadcast(ServerMessage::Player {
        username: username.to_string(),
        is_playing,
        score,
    })
}

/// Consumes the opening sequence up to the first roll prompt.
async fn skip_opening(handle: &mut GameHandle, first: &str) {
    loop {
        if next(handle).await == to(first, ServerMessage::Roll {}) {
            return;
        }
    }
}

/// Reads until a roll result and returns it.
async fn next_result(handle: &mut GameHandle) -> ServerMessage {
    loop {
        let out = next(handle).await;
        if let ServerMessage::RollResult { .. } = out.message {
            assert_eq!(out.target, None, "roll results are broadcast");
            return out.message;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_opening_sequence() {
    let mut game = start(0, &["ann", "bob"], &[]);

    let rules = RuleSet::get(0).unwrap();
    assert_eq!(
        next(&mut game).await,
        broadcast(ServerMessage::Start {
            usernames: names(&["ann", "bob"]),
            path_lengths: rules.path_lengths.to_vec(),
        })
    );
    assert_eq!(next_log(&mut game).await, "Game starts!");
    assert_eq!(
        next(&mut game).await,
        broadcast(ServerMessage::TurnCount { turn_count: 1 })
    );
    assert_eq!(next_log(&mut game).await, "ann's turn");
    assert_eq!(next(&mut game).await, player("ann", true, 0));
    assert_eq!(
        next(&mut game).await,
        broadcast(ServerMessage::MoveCount { move_count: 1 })
    );
    assert_eq!(next(&mut game).await, to("ann", ServerMessage::Roll {}));
}

#[tokio::test]
async fn test_spawn_game_shuffles_but_keeps_everyone() {
    let mut game = spawn_game("test", 0, names(&["ann", "bob", "cat"]), 64)
        .expect("game should start");
    match next(&mut game).await.message {
        ServerMessage::Start { mut usernames, .. } => {
            usernames.sort();
            assert_eq!(usernames, names(&["ann", "bob", "cat"]));
        }
        other => panic!("expected Start, got {other:?}"),
    }
}

#[tokio::test]
async fn test_spawn_game_rejects_unknown_ruleset_and_empty_roster() {
    assert!(spawn_game("test", 9, names(&["ann"]), 8).is_err());
    assert!(spawn_game("test", 0, Vec::new(), 8).is_err());
}

#[tokio::test]
async fn test_roll_offers_options_and_off_turn_input_is_ignored() {
    let mut game = start(0, &["ann", "bob"], &[&[1, 2, 3, 4]]);
    skip_opening(&mut game, "ann").await;

    // bob is not active; his roll must not consume the scripted dice.
    send(&game, "bob", GameCommand::Roll).await;
    send(&game, "ann", GameCommand::Roll).await;

    assert_eq!(next_log(&mut game).await, "ann rolled 1, 2, 3, 4");
    match next_result(&mut game).await {
        ServerMessage::RollResult { points, options, failed } => {
            assert_eq!(points, vec![1, 2, 3, 4]);
            assert!(!failed);
            let actions: Vec<_> = options.into_iter().map(|o| o.actions).collect();
            assert_eq!(
                actions,
                vec![vec![vec![3, 7]], vec![vec![4, 6]], vec![vec![5, 5]]]
            );
        }
        other => panic!("expected RollResult, got {other:?}"),
    }
}

#[tokio::test]
async fn test_act_must_match_an_offered_action() {
    let mut game = start(0, &["ann", "bob"], &[&[1, 2, 3, 4]]);
    skip_opening(&mut game, "ann").await;
    send(&game, "ann", GameCommand::Roll).await;
    next_result(&mut game).await;

    // Not offered, wrong phase, then the real thing.
    send(&game, "ann", GameCommand::Act { action: vec![2, 12] }).await;
    send(&game, "ann", GameCommand::Confirm { will_continue: Some(false) }).await;
    send(&game, "ann", GameCommand::Act { action: vec![3, 7] }).await;

    match next(&mut game).await.message {
        ServerMessage::Gameboard { gameboard, blocked_paths } => {
            assert!(blocked_paths.is_empty());
            assert!(gameboard[3][0].has_temp);
            assert!(gameboard[7][0].has_temp);
            assert_eq!(gameboard.iter().flatten().filter(|s| s.has_temp).count(), 2);
        }
        other => panic!("expected Gameboard, got {other:?}"),
    }
    assert_eq!(next_log(&mut game).await, "ann advanced on path(s) 3, 7");
    assert_eq!(next(&mut game).await, to("ann", ServerMessage::Confirm {}));
}

#[tokio::test]
async fn test_turn_order_visits_every_player_before_next_turn() {
    let roll: &[u8] = &[1, 2, 3, 4];
    let mut game = start(0, &["ann", "bob", "cat"], &[roll, roll, roll, roll]);

    let mut active = Vec::new();
    let mut turn_counts = Vec::new();
    for _ in 0..4 {
        loop {
            let out = next(&mut game).await;
            match out.message {
                ServerMessage::TurnCount { turn_count } => turn_counts.push(turn_count),
                ServerMessage::Player { username, is_playing: true, .. } => {
                    active.push((username, turn_counts.len()))
                }
                ServerMessage::Roll {} => break,
                _ => {}
            }
        }
        let current = active.last().unwrap().0.clone();
        send(&game, &current, GameCommand::Roll).await;
        next_result(&mut game).await;
        send(&game, &current, GameCommand::Act { action: vec![3, 7] }).await;
        send(&game, &current, GameCommand::Confirm { will_continue: Some(false) }).await;
    }

    assert_eq!(turn_counts, vec![1, 2]);
    assert_eq!(
        active,
        vec![
            ("ann".to_string(), 1),
            ("bob".to_string(), 1),
            ("cat".to_string(), 1),
            ("ann".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn test_continue_rerolls_without_prompt() {
    let mut game = start(0, &["ann", "bob"], &[&[1, 2, 3, 4], &[1, 1, 1, 1]]);
    skip_opening(&mut game, "ann").await;
    send(&game, "ann", GameCommand::Roll).await;
    next_result(&mut game).await;
    send(&game, "ann", GameCommand::Act { action: vec![3, 7] }).await;
    assert!(matches!(
        next(&mut game).await.message,
        ServerMessage::Gameboard { .. }
    ));
    assert_eq!(next(&mut game).await, to("ann", ServerMessage::Confirm {}));

    send(&game, "ann", GameCommand::Confirm { will_continue: Some(true) }).await;
    assert_eq!(
        next(&mut game).await,
        broadcast(ServerMessage::MoveCount { move_count: 2 })
    );
    match next(&mut game).await.message {
        ServerMessage::RollResult { points, .. } => assert_eq!(points, vec![1, 1, 1, 1]),
        other => panic!("expected an immediate RollResult, got {other:?}"),
    }
}

#[tokio::test]
async fn test_confirm_without_choice_is_ignored_after_an_act() {
    let mut game = start(0, &["ann", "bob"], &[&[1, 2, 3, 4], &[1, 1, 1, 1]]);
    skip_opening(&mut game, "ann").await;
    send(&game, "ann", GameCommand::Roll).await;
    next_result(&mut game).await;
    send(&game, "ann", GameCommand::Act { action: vec![3, 7] }).await;
    assert!(matches!(
        next(&mut game).await.message,
        ServerMessage::Gameboard { .. }
    ));
    assert_eq!(next(&mut game).await, to("ann", ServerMessage::Confirm {}));

    // Nothing is committed; the turn is still waiting on a real choice.
    send(&game, "ann", GameCommand::Confirm { will_continue: None }).await;
    send(&game, "ann", GameCommand::Confirm { will_continue: Some(true) }).await;
    assert_eq!(
        next(&mut game).await,
        broadcast(ServerMessage::MoveCount { move_count: 2 })
    );
}

#[tokio::test]
async fn test_forced_failure_ends_turn_and_discards_temp() {
    let mut game = start(
        0,
        &["ann", "bob"],
        &[&[1, 1, 2, 2], &[1, 2, 3, 3], &[6, 6, 6, 6]],
    );
    skip_opening(&mut game, "ann").await;

    send(&game, "ann", GameCommand::Roll).await;
    next_result(&mut game).await;
    send(&game, "ann", GameCommand::Act { action: vec![2, 4] }).await;
    send(&game, "ann", GameCommand::Confirm { will_continue: Some(true) }).await;
    next_result(&mut game).await;
    send(&game, "ann", GameCommand::Act { action: vec![3] }).await;
    send(&game, "ann", GameCommand::Confirm { will_continue: Some(true) }).await;

    match next_result(&mut game).await {
        ServerMessage::RollResult { failed, options, .. } => {
            assert!(failed);
            assert!(options.iter().all(|o| o.actions.is_empty()));
        }
        other => panic!("expected RollResult, got {other:?}"),
    }

    // willContinue is ignored after a failed roll.
    send(&game, "ann", GameCommand::Confirm { will_continue: Some(true) }).await;
    match next(&mut game).await.message {
        ServerMessage::Gameboard { gameboard, .. } => {
            assert!(gameboard.iter().flatten().all(|s| !s.has_temp));
            assert!(gameboard.iter().flatten().all(|s| s.colors.is_empty()));
        }
        other => panic!("expected Gameboard, got {other:?}"),
    }
    assert_eq!(next(&mut game).await, player("ann", false, 0));
    assert_eq!(next_log(&mut game).await, "bob's turn");
    assert_eq!(next(&mut game).await, player("bob", true, 0));
    assert_eq!(
        next(&mut game).await,
        broadcast(ServerMessage::MoveCount { move_count: 1 })
    );
    assert_eq!(next(&mut game).await, to("bob", ServerMessage::Roll {}));
}

#[tokio::test]
async fn test_win_then_exit_then_terminate() {
    // Quick variant: two paths of length 6 win. Three double-ones fill
    // path 1, three double-twos fill path 2.
    let ones: &[u8] = &[1, 1];
    let twos: &[u8] = &[2, 2];
    let mut game = start(1, &["ann", "bob"], &[ones, ones, ones, twos, twos, twos]);
    skip_opening(&mut game, "ann").await;

    send(&game, "ann", GameCommand::Roll).await;
    for step in 0..6 {
        let action = if step < 3 { vec![1, 1] } else { vec![2, 2] };
        next_result(&mut game).await;
        send(&game, "ann", GameCommand::Act { action }).await;
        assert!(matches!(
            next(&mut game).await.message,
            ServerMessage::Gameboard { .. }
        ));
        assert_eq!(next(&mut game).await, to("ann", ServerMessage::Confirm {}));
        send(&game, "ann", GameCommand::Confirm { will_continue: Some(step < 5) }).await;
    }

    match next(&mut game).await.message {
        ServerMessage::Gameboard { blocked_paths, .. } => {
            assert_eq!(blocked_paths.len(), 2);
        }
        other => panic!("expected Gameboard, got {other:?}"),
    }
    assert_eq!(next(&mut game).await, player("ann", false, 2));
    assert_eq!(
        next(&mut game).await,
        broadcast(ServerMessage::Winner { winner: "ann".into() })
    );
    assert_eq!(next_log(&mut game).await, "ann won the game!");

    // Play is over: only exits are served.
    send(&game, "bob", GameCommand::Roll).await;
    send(&game, "ann", GameCommand::Exit).await;
    assert_eq!(next(&mut game).await, to("ann", ServerMessage::Exit {}));
    send(&game, "bob", GameCommand::Exit).await;
    assert_eq!(next(&mut game).await, to("bob", ServerMessage::Exit {}));
    assert_eq!(next(&mut game).await, broadcast(ServerMessage::Terminate {}));
    assert!(recv_raw(&mut game).await.is_none(), "actor should be gone");
}

#[tokio::test]
async fn test_early_exit_terminates_session() {
    let mut game = start(0, &["ann", "bob"], &[]);
    skip_opening(&mut game, "ann").await;

    send(&game, "bob", GameCommand::Exit).await;
    assert_eq!(
        next_log(&mut game).await,
        "Game terminated: player bob exited unexpectedly"
    );
    assert_eq!(next(&mut game).await, to("bob", ServerMessage::Exit {}));
    assert_eq!(next(&mut game).await, broadcast(ServerMessage::Terminate {}));
    assert!(recv_raw(&mut game).await.is_none());
}

#[tokio::test]
async fn test_closed_inbound_terminates_session() {
    let mut game = start(0, &["ann", "bob"], &[]);
    skip_opening(&mut game, "ann").await;

    let GameHandle { to_game, mut from_game } = game;
    drop(to_game);

    let mut rest = Vec::new();
    while let Some(out) = from_game.recv().await {
        rest.push(out);
    }
    assert_eq!(
        rest,
        vec![
            broadcast(ServerMessage::log("Game terminated: inbound channel closed")),
            broadcast(ServerMessage::Terminate {}),
        ]
    );
}

// =========================================================================
// Safety ceilings
// =========================================================================

#[tokio::test]
async fn test_max_turn_count_terminates_session() {
    let limits = GameLimits {
        max_turns: 1,
        ..GameLimits::default()
    };
    let mut game = start_with_limits(0, &["ann"], &[&[1, 2, 3, 4]], limits);
    skip_opening(&mut game, "ann").await;

    send(&game, "ann", GameCommand::Roll).await;
    next_result(&mut game).await;
    send(&game, "ann", GameCommand::Act { action: vec![3, 7] }).await;
    send(&game, "ann", GameCommand::Confirm { will_continue: Some(false) }).await;

    assert!(matches!(
        next(&mut game).await.message,
        ServerMessage::Gameboard { .. }
    ));
    assert_eq!(next(&mut game).await, to("ann", ServerMessage::Confirm {}));
    assert!(matches!(
        next(&mut game).await.message,
        ServerMessage::Gameboard { .. }
    ));
    assert_eq!(next(&mut game).await, player("ann", false, 0));
    assert_eq!(next_log(&mut game).await, "ann ended their turn");
    assert_eq!(
        next_log(&mut game).await,
        "Game terminated: max turn count reached"
    );
    assert_eq!(next(&mut game).await, broadcast(ServerMessage::Terminate {}));
    assert!(recv_raw(&mut game).await.is_none());
}

#[tokio::test]
async fn test_max_move_count_terminates_session() {
    let limits = GameLimits {
        max_moves: 1,
        ..GameLimits::default()
    };
    let mut game = start_with_limits(0, &["ann", "bob"], &[&[1, 2, 3, 4]], limits);
    skip_opening(&mut game, "ann").await;

    send(&game, "ann", GameCommand::Roll).await;
    next_result(&mut game).await;
    send(&game, "ann", GameCommand::Act { action: vec![3, 7] }).await;
    send(&game, "ann", GameCommand::Confirm { will_continue: Some(true) }).await;

    assert!(matches!(
        next(&mut game).await.message,
        ServerMessage::Gameboard { .. }
    ));
    assert_eq!(next(&mut game).await, to("ann", ServerMessage::Confirm {}));
    assert_eq!(
        next_log(&mut game).await,
        "Game terminated: max move count reached"
    );
    assert_eq!(next(&mut game).await, broadcast(ServerMessage::Terminate {}));
    assert!(recv_raw(&mut game).await.is_none());
}
