//! Game actor: one Tokio task per session that owns all game state.
//!
//! The actor is reachable only through a [`GameHandle`]: inputs go in on
//! `to_game`, announcements and prompts come out on `from_game`. Nothing
//! else ever touches the [`Board`], so the rules run single-threaded no
//! matter how many connections feed the room.

use cantstop_protocol::ServerMessage;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tokio::sync::mpsc;

use crate::{Board, Dice, GameError, RandomDice, RuleSet};

/// Turns after which a session is considered runaway and terminated.
pub const MAX_TURN_COUNT: u32 = 1000;

/// Moves within one turn after which a session is terminated.
pub const MAX_MOVE_COUNT: u32 = 1000;

/// Safety ceilings on a single session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameLimits {
    pub max_turns: u32,
    /// Per turn.
    pub max_moves: u32,
}

impl Default for GameLimits {
    fn default() -> Self {
        Self {
            max_turns: MAX_TURN_COUNT,
            max_moves: MAX_MOVE_COUNT,
        }
    }
}

/// A player's in-game request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    Roll,
    Act { action: Vec<usize> },
    /// `None` is accepted only after a failed roll.
    Confirm { will_continue: Option<bool> },
    Exit,
}

/// A command tagged with the username of the connection that sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameInput {
    pub username: String,
    pub command: GameCommand,
}

/// A message from the game, for one player (`target`) or for everyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutput {
    pub target: Option<String>,
    pub message: ServerMessage,
}

/// Both ends of a running game.
pub struct GameHandle {
    pub to_game: mpsc::Sender<GameInput>,
    pub from_game: mpsc::Receiver<GameOutput>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Rolling,
    Acting,
    Confirming,
}

/// Starts a game with random dice and a random turn order.
pub fn spawn_game(
    label: &str,
    ruleset: usize,
    mut usernames: Vec<String>,
    channel_size: usize,
) -> Result<GameHandle, GameError> {
    let rules = RuleSet::get(ruleset)?;
    let mut rng = StdRng::from_os_rng();
    usernames.shuffle(&mut rng);
    spawn_game_with(
        label,
        rules,
        usernames,
        RandomDice::new(rng),
        GameLimits::default(),
        channel_size,
    )
}

/// Starts a game with the given dice, seating players in the given order.
pub fn spawn_game_with<D: Dice>(
    label: &str,
    rules: &'static RuleSet,
    usernames: Vec<String>,
    dice: D,
    limits: GameLimits,
    channel_size: usize,
) -> Result<GameHandle, GameError> {
    if usernames.is_empty() {
        return Err(GameError::NoPlayers);
    }

    let (to_game, inbound) = mpsc::channel(channel_size);
    let (outbound, from_game) = mpsc::channel(channel_size);

    let game = Game {
        label: label.to_string(),
        board: Board::new(rules, &usernames),
        dice,
        limits,
        inbound,
        outbound,
        turn_count: 0,
        move_count: 0,
        phase: Phase::Rolling,
        failed: false,
        terminated: false,
        ended: false,
        offered: Vec::new(),
    };
    tokio::spawn(game.run());

    Ok(GameHandle { to_game, from_game })
}

struct Game<D: Dice> {
    label: String,
    board: Board,
    dice: D,
    limits: GameLimits,
    inbound: mpsc::Receiver<GameInput>,
    outbound: mpsc::Sender<GameOutput>,
    turn_count: u32,
    move_count: u32,
    phase: Phase,
    failed: bool,
    terminated: bool,
    ended: bool,
    /// Actions offered by the last roll; an `act` must pick one of these.
    offered: Vec<Vec<usize>>,
}

impl<D: Dice> Game<D> {
    async fn run(mut self) {
        tracing::info!(
            game = %self.label,
            ruleset = self.board.rules().name,
            players = self.board.players().len(),
            "game actor started"
        );

        if let Err(e) = self.play().await {
            tracing::warn!(game = %self.label, error = %e, "game actor aborted");
        }

        tracing::info!(
            game = %self.label,
            turns = self.turn_count,
            "game actor stopped"
        );
    }

    async fn play(&mut self) -> Result<(), GameError> {
        self.broadcast(ServerMessage::Start {
            usernames: self.board.usernames(),
            path_lengths: self.board.rules().path_lengths.to_vec(),
        })
        .await?;
        self.announce("Game starts!").await?;
        self.next_turn().await?;

        loop {
            if self.terminated || self.board.all_left() {
                self.broadcast(ServerMessage::Terminate {}).await?;
                return Ok(());
            }

            let Some(input) = self.inbound.recv().await else {
                self.terminate("inbound channel closed").await?;
                continue;
            };

            let GameInput { username, command } = input;
            if command == GameCommand::Exit {
                self.handle_exit(&username).await?;
                continue;
            }
            if self.ended {
                tracing::debug!(game = %self.label, %username, "game over, ignoring input");
                continue;
            }
            if username != self.board.active().username() {
                tracing::debug!(game = %self.label, %username, "off-turn input, ignoring");
                continue;
            }

            match command {
                GameCommand::Roll => self.handle_roll().await?,
                GameCommand::Act { action } => self.handle_act(action).await?,
                GameCommand::Confirm { will_continue } => {
                    self.handle_confirm(will_continue).await?
                }
                GameCommand::Exit => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Turn flow
    // -----------------------------------------------------------------------

    async fn next_turn(&mut self) -> Result<(), GameError> {
        if self.turn_count >= self.limits.max_turns {
            return self.terminate("max turn count reached").await;
        }
        self.turn_count += 1;
        self.broadcast(ServerMessage::TurnCount {
            turn_count: self.turn_count,
        })
        .await?;
        self.start_player(0).await
    }

    async fn next_player(&mut self) -> Result<(), GameError> {
        let next = self.board.playing() + 1;
        if next == self.board.players().len() {
            self.next_turn().await
        } else {
            self.start_player(next).await
        }
    }

    async fn start_player(&mut self, index: usize) -> Result<(), GameError> {
        self.board.set_playing(index);
        self.move_count = 0;
        self.failed = false;

        let active = self.board.active();
        let username = active.username().to_string();
        let score = active.score();
        self.announce(format!("{username}'s turn")).await?;
        self.broadcast(ServerMessage::Player {
            username,
            is_playing: true,
            score,
        })
        .await?;
        self.next_move().await
    }

    /// Starts a move. The first move of a turn waits for the client to
    /// roll; later moves roll straight away.
    async fn next_move(&mut self) -> Result<(), GameError> {
        if self.move_count >= self.limits.max_moves {
            return self.terminate("max move count reached").await;
        }
        self.move_count += 1;
        self.broadcast(ServerMessage::MoveCount {
            move_count: self.move_count,
        })
        .await?;
        self.phase = Phase::Rolling;

        if self.move_count == 1 {
            self.send_active(ServerMessage::Roll {}).await
        } else {
            self.handle_roll().await
        }
    }

    // -----------------------------------------------------------------------
    // Handlers
    // -----------------------------------------------------------------------

    async fn handle_roll(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::Rolling {
            tracing::debug!(game = %self.label, phase = ?self.phase, "unexpected roll");
            return Ok(());
        }

        let points = self.dice.roll(self.board.rules().dice);
        let username = self.board.active().username().to_string();
        self.announce(format!("{username} rolled {}", join(&points)))
            .await?;

        let (options, failed) = self.board.options(&points);
        self.offered = options
            .iter()
            .flat_map(|o| o.actions.iter().cloned())
            .collect();

        if failed {
            self.announce("No valid actions").await?;
            self.failed = true;
            self.phase = Phase::Confirming;
        } else {
            self.phase = Phase::Acting;
        }

        self.broadcast(ServerMessage::RollResult {
            points,
            options,
            failed,
        })
        .await
    }

    async fn handle_act(&mut self, action: Vec<usize>) -> Result<(), GameError> {
        if self.phase != Phase::Acting {
            tracing::debug!(game = %self.label, phase = ?self.phase, "unexpected act");
            return Ok(());
        }
        if !self.offered.contains(&action) {
            tracing::debug!(game = %self.label, ?action, "act was not offered");
            return Ok(());
        }

        self.board.apply(&action);
        self.offered.clear();
        self.broadcast_gameboard().await?;

        let username = self.board.active().username().to_string();
        self.announce(format!("{username} advanced on path(s) {}", join(&action)))
            .await?;
        self.phase = Phase::Confirming;
        self.send_active(ServerMessage::Confirm {}).await
    }

    async fn handle_confirm(&mut self, will_continue: Option<bool>) -> Result<(), GameError> {
        if self.phase != Phase::Confirming {
            tracing::debug!(game = %self.label, phase = ?self.phase, "unexpected confirm");
            return Ok(());
        }

        if self.failed {
            let moves = self.move_count;
            let active = self.board.active_mut();
            active.discard();
            active.add_moves(moves);
            return self.end_turn().await;
        }

        let Some(will_continue) = will_continue else {
            tracing::debug!(game = %self.label, "confirm without a choice, ignoring");
            return Ok(());
        };
        if will_continue {
            return self.next_move().await;
        }

        let moves = self.move_count;
        let active = self.board.active_mut();
        active.commit();
        active.add_moves(moves);
        self.broadcast_gameboard().await?;
        self.broadcast_active_score().await?;

        let active = self.board.active();
        let username = active.username().to_string();
        let won = active.score() >= self.board.rules().goal;
        self.announce(format!("{username} ended their turn")).await?;

        if won {
            tracing::info!(game = %self.label, winner = %username, "game won");
            self.broadcast(ServerMessage::Winner {
                winner: username.clone(),
            })
            .await?;
            self.announce(format!("{username} won the game!")).await?;
            self.ended = true;
            return Ok(());
        }
        self.next_player().await
    }

    /// Turn end after a failed roll.
    async fn end_turn(&mut self) -> Result<(), GameError> {
        self.broadcast_gameboard().await?;
        self.broadcast_active_score().await?;
        self.next_player().await
    }

    async fn handle_exit(&mut self, username: &str) -> Result<(), GameError> {
        if !self.ended {
            self.terminate(&format!("player {username} exited unexpectedly"))
                .await?;
        }
        if let Some(player) = self.board.player_mut(username) {
            player.leave();
        }
        self.send(Some(username.to_string()), ServerMessage::Exit {})
            .await
    }

    async fn terminate(&mut self, reason: &str) -> Result<(), GameError> {
        tracing::warn!(game = %self.label, reason, "terminating game");
        self.terminated = true;
        self.announce(format!("Game terminated: {reason}")).await
    }

    // -----------------------------------------------------------------------
    // Output
    // -----------------------------------------------------------------------

    async fn send(
        &self,
        target: Option<String>,
        message: ServerMessage,
    ) -> Result<(), GameError> {
        self.outbound
            .send(GameOutput { target, message })
            .await
            .map_err(|_| GameError::RelayClosed)
    }

    async fn broadcast(&self, message: ServerMessage) -> Result<(), GameError> {
        self.send(None, message).await
    }

    async fn send_active(&self, message: ServerMessage) -> Result<(), GameError> {
        let target = self.board.active().username().to_string();
        self.send(Some(target), message).await
    }

    async fn announce(&self, content: impl Into<String>) -> Result<(), GameError> {
        self.broadcast(ServerMessage::log(content)).await
    }

    async fn broadcast_gameboard(&self) -> Result<(), GameError> {
        self.broadcast(ServerMessage::Gameboard {
            gameboard: self.board.gameboard(),
            blocked_paths: self.board.blocked_paths(),
        })
        .await
    }

    async fn broadcast_active_score(&self) -> Result<(), GameError> {
        let active = self.board.active();
        self.broadcast(ServerMessage::Player {
            username: active.username().to_string(),
            is_playing: false,
            score: active.score(),
        })
        .await
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
