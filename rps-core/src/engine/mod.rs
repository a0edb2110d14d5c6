//! The game state machine.
//!
//! Every operation reads the height once, checks all of its preconditions
//! and only then mutates the store and ledger, so a failed call leaves no
//! trace. Operations take `&mut self`; callers sharing an engine across
//! threads go through [`SharedEngine`].

pub mod events;


pub use events::GameEvent;

use crate::commitment::move_commitment;
use crate::config::EngineConfig;
use crate::error::{EscrowError, Result};
use crate::external::{HeightOracle, PayoutSink};
use crate::game::{determine_winner, Game, GameEntry, GameInfo, Outcome, Resolution, Seat};
use crate::ledger::Ledger;
use crate::store::GameStore;
use crate::types::{Call, Digest32, GameKey, Move, PlayerId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub type SharedEngine<H> = Arc<Mutex<GameEngine<H>>>;

/// Parameters of [`GameEngine::new_game`].
#[derive(Debug, Clone)]
pub struct NewGame {
    pub key: GameKey,
    pub commitment: Digest32,
    pub delta: u64,
    pub stake: u64,
    pub opponent: Option<PlayerId>,
}

impl NewGame {
    pub fn new(key: GameKey, commitment: Digest32, delta: u64, stake: u64) -> Self {
        Self {
            key,
            commitment,
            delta,
            stake,
            opponent: None,
        }
    }

    /// Reserve the second seat for `opponent`.
    pub fn against(mut self, opponent: PlayerId) -> Self {
        self.opponent = Some(opponent);
        self
    }
}

/// Everything the engine owns, in a form that can be persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    pub games: GameStore,
    pub ledger: Ledger,
    pub paused: bool,
}

pub struct GameEngine<H> {
    config: EngineConfig,
    height: H,
    games: GameStore,
    ledger: Ledger,
    paused: bool,
}

impl<H: HeightOracle> GameEngine<H> {
    pub fn new(config: EngineConfig, height: H) -> Result<Self> {
        Self::restore(config, height, EngineState::default())
    }

    pub fn restore(config: EngineConfig, height: H, state: EngineState) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            height,
            games: state.games,
            ledger: state.ledger,
            paused: state.paused,
        })
    }

    pub fn into_shared(self) -> SharedEngine<H> {
        Arc::new(Mutex::new(self))
    }

    pub fn snapshot(&self) -> EngineState {
        EngineState {
            games: self.games.clone(),
            ledger: self.ledger.clone(),
            paused: self.paused,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_height(&self) -> u64 {
        self.height.current_height()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn game(&self, key: &GameKey) -> Result<GameInfo> {
        let game = self.games.get(key)?;
        Ok(GameInfo::from_game(*key, game))
    }

    pub fn entry(&self, key: &GameKey) -> Option<&GameEntry> {
        self.games.entry(key)
    }

    pub fn live_games(&self) -> Vec<GameInfo> {
        self.games
            .live_games()
            .map(|(key, game)| GameInfo::from_game(*key, game))
            .collect()
    }

    pub fn balance_of(&self, player: &PlayerId) -> u64 {
        self.ledger.balance_of(player)
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Stakes locked in live games.
    pub fn escrowed(&self) -> u64 {
        self.games.escrowed()
    }

    /// Value the engine must be holding: escrow plus unwithdrawn credit.
    pub fn held_value(&self) -> u64 {
        self.escrowed().saturating_add(self.ledger.total())
    }

    /// Open a game with the caller in seat one.
    pub fn new_game(&mut self, call: Call, params: NewGame) -> Result<GameEvent> {
        self.ensure_unpaused()?;
        Self::ensure_player(&call)?;
        let height = self.height.current_height();

        if params.key.is_zero() {
            return Err(EscrowError::InvalidKey);
        }
        if params.opponent.map_or(false, |opponent| opponent.is_zero()) {
            return Err(EscrowError::InvalidKey);
        }
        if params.delta == 0 || params.delta > self.config.max_delta {
            return Err(EscrowError::InvalidDelta(params.delta));
        }
        let expiry_height = height
            .checked_add(params.delta)
            .ok_or(EscrowError::InvalidDelta(params.delta))?;
        if call.value != params.stake {
            return Err(EscrowError::WrongStake {
                expected: params.stake,
                got: call.value,
            });
        }
        if params.stake > self.config.max_stake {
            return Err(EscrowError::StakeTooLarge {
                stake: params.stake,
                max: self.config.max_stake,
            });
        }

        let game = Game {
            stake: params.stake,
            expiry_height,
            delta_height: params.delta,
            seat1: Seat::new(call.caller, params.commitment),
            seat2: None,
            opponent: params.opponent,
        };
        self.games.create(params.key, game)?;

        tracing::info!(
            "Game {} created by {} (stake {}, expires after height {})",
            params.key,
            call.caller,
            params.stake,
            expiry_height
        );

        Ok(GameEvent::GameCreated {
            player1: call.caller,
            key: params.key,
            commitment: params.commitment,
            stake: params.stake,
            expiry_height,
        })
    }

    /// Take the second seat, staking the same amount as player one.
    pub fn join(&mut self, call: Call, key: GameKey, commitment: Digest32) -> Result<GameEvent> {
        self.ensure_unpaused()?;
        Self::ensure_player(&call)?;
        let height = self.height.current_height();

        if key.is_zero() {
            return Err(EscrowError::InvalidKey);
        }
        let extend = self.config.extend_expiry_on_join;
        let allow_self_play = self.config.allow_self_play;

        let game = self.games.get_mut(&key)?;
        if game.is_expired_at(height) {
            return Err(EscrowError::Expired {
                expiry: game.expiry_height,
                height,
            });
        }
        if call.value != game.stake {
            return Err(EscrowError::WrongStake {
                expected: game.stake,
                got: call.value,
            });
        }
        if game.is_joined() {
            return Err(EscrowError::AlreadyJoined);
        }
        if game.opponent.map_or(false, |opponent| opponent != call.caller) {
            return Err(EscrowError::UnknownCaller);
        }
        if !allow_self_play && call.caller == game.player1() {
            return Err(EscrowError::SelfPlay);
        }
        let expiry_height = if extend {
            game.expiry_height
                .checked_add(game.delta_height)
                .ok_or(EscrowError::InvalidDelta(game.delta_height))?
        } else {
            game.expiry_height
        };

        game.seat2 = Some(Seat::new(call.caller, commitment));
        game.expiry_height = expiry_height;

        tracing::info!("Player {} joined game {}", call.caller, key);

        Ok(GameEvent::Joined {
            player2: call.caller,
            key,
            commitment,
            expiry_height,
        })
    }

    /// Disclose a committed move. The second reveal settles the game.
    pub fn reveal(
        &mut self,
        call: Call,
        key: GameKey,
        move_code: u8,
        secret: &[u8],
    ) -> Result<GameEvent> {
        self.ensure_unpaused()?;
        let height = self.height.current_height();

        if key.is_zero() {
            return Err(EscrowError::InvalidKey);
        }
        let game = self.games.get(&key)?;
        if game.is_expired_at(height) {
            return Err(EscrowError::Expired {
                expiry: game.expiry_height,
                height,
            });
        }
        let mv = Move::try_from(move_code)?;
        let seat2 = game.seat2.as_ref().ok_or(EscrowError::AwaitingOpponent)?;
        let seat_index = Self::matching_seat(&game.seat1, seat2, call.caller, mv, secret)?;

        let other = if seat_index == 1 {
            seat2.revealed
        } else {
            game.seat1.revealed
        };

        let winner_id = match other {
            None => {
                let game = self.games.get_mut(&key)?;
                let seat = if seat_index == 1 {
                    &mut game.seat1
                } else {
                    game.seat2.as_mut().ok_or(EscrowError::AwaitingOpponent)?
                };
                seat.revealed = Some(mv);

                tracing::info!(
                    "Player {} revealed {} in game {}, waiting for the other move",
                    call.caller,
                    mv,
                    key
                );
                0
            }
            Some(other_move) => {
                let (move1, move2) = if seat_index == 1 {
                    (mv, other_move)
                } else {
                    (other_move, mv)
                };
                let outcome = determine_winner(move1, move2);
                let credits = Self::settlement_credits(game, seat2.player, outcome);

                self.ledger.credit_all(&credits)?;
                self.games.clear(
                    &key,
                    Resolution::Settled {
                        winner_id: outcome.winner_id(),
                    },
                    height,
                )?;

                tracing::info!(
                    "Game {} settled: {} vs {}, winner id {}",
                    key,
                    move1,
                    move2,
                    outcome.winner_id()
                );
                outcome.winner_id()
            }
        };

        Ok(GameEvent::Revealed {
            player: call.caller,
            key,
            mv,
            winner_id,
        })
    }

    /// Resolve a game whose timeout has passed.
    ///
    /// Unjoined games refund player one, joined games with no reveal refund
    /// both, and a single reveal takes the whole pot.
    pub fn cancel(&mut self, call: Call, key: GameKey) -> Result<GameEvent> {
        self.ensure_unpaused()?;
        let height = self.height.current_height();

        if key.is_zero() {
            return Err(EscrowError::InvalidKey);
        }
        let game = match self.games.entry(&key) {
            None => return Err(EscrowError::NotFound),
            Some(GameEntry::Closed { .. }) => return Err(EscrowError::AlreadySettled),
            Some(GameEntry::Live(game)) => game,
        };
        if !game.is_expired_at(height) {
            return Err(EscrowError::NotYetExpired {
                expiry: game.expiry_height,
                height,
            });
        }

        let player1 = game.player1();
        let player2 = game.player2();
        let stake = game.stake;
        let (winner_id, credits) = match &game.seat2 {
            None => (0, vec![(player1, stake)]),
            Some(seat2) => match (game.seat1.has_revealed(), seat2.has_revealed()) {
                (false, false) => (0, vec![(player1, stake), (seat2.player, stake)]),
                (true, false) => (1, vec![(player1, stake * 2)]),
                (false, true) => (2, vec![(seat2.player, stake * 2)]),
                (true, true) => return Err(EscrowError::AlreadySettled),
            },
        };

        self.ledger.credit_all(&credits)?;
        self.games
            .clear(&key, Resolution::Cancelled { winner_id }, height)?;

        tracing::info!(
            "Game {} cancelled by {} at height {}, winner id {}",
            key,
            call.caller,
            height,
            winner_id
        );

        Ok(GameEvent::Cancelled {
            key,
            player1,
            player2,
            winner_id,
        })
    }

    /// Pay out the caller's whole ledger balance through `sink`.
    ///
    /// The balance is zeroed before the transfer runs and restored only if
    /// the transfer fails.
    pub fn withdraw<S: PayoutSink + ?Sized>(&mut self, call: Call, sink: &mut S) -> Result<GameEvent> {
        self.ensure_unpaused()?;

        let amount = self.ledger.withdraw(&call.caller)?;
        if let Err(e) = sink.transfer(call.caller, amount) {
            self.ledger.restore(call.caller, amount)?;
            tracing::warn!("Withdrawal of {} to {} failed: {}", amount, call.caller, e);
            return Err(match e {
                EscrowError::TransferFailed(msg) => EscrowError::TransferFailed(msg),
                other => EscrowError::transfer(other.to_string()),
            });
        }

        tracing::info!("Player {} withdrew {}", call.caller, amount);

        Ok(GameEvent::Withdrawn {
            player: call.caller,
            amount,
        })
    }

    pub fn pause(&mut self, call: Call) -> Result<GameEvent> {
        self.ensure_controller(&call)?;
        if self.paused {
            return Err(EscrowError::AlreadyPaused);
        }
        self.paused = true;

        tracing::warn!("Engine paused by {}", call.caller);
        Ok(GameEvent::Paused {
            account: call.caller,
        })
    }

    pub fn unpause(&mut self, call: Call) -> Result<GameEvent> {
        self.ensure_controller(&call)?;
        if !self.paused {
            return Err(EscrowError::NotPaused);
        }
        self.paused = false;

        tracing::info!("Engine unpaused by {}", call.caller);
        Ok(GameEvent::Unpaused {
            account: call.caller,
        })
    }

    fn ensure_unpaused(&self) -> Result<()> {
        if self.paused {
            return Err(EscrowError::Paused);
        }
        Ok(())
    }

    /// The zero identity stands for "nobody" and never takes a seat.
    fn ensure_player(call: &Call) -> Result<()> {
        if call.caller.is_zero() {
            return Err(EscrowError::UnknownCaller);
        }
        Ok(())
    }

    fn ensure_controller(&self, call: &Call) -> Result<()> {
        if call.caller != self.config.controller {
            return Err(EscrowError::Unauthorized);
        }
        Ok(())
    }

    /// Seat (1 or 2) the caller is revealing for. When the caller holds
    /// both seats, the first unrevealed seat whose commitment matches wins.
    fn matching_seat(
        seat1: &Seat,
        seat2: &Seat,
        caller: PlayerId,
        mv: Move,
        secret: &[u8],
    ) -> Result<u8> {
        let mine: Vec<(u8, &Seat)> = [(1, seat1), (2, seat2)]
            .into_iter()
            .filter(|(_, seat)| seat.player == caller)
            .collect();
        if mine.is_empty() {
            return Err(EscrowError::UnknownCaller);
        }

        let open: Vec<(u8, &Seat)> = mine
            .into_iter()
            .filter(|(_, seat)| !seat.has_revealed())
            .collect();
        if open.is_empty() {
            return Err(EscrowError::AlreadyRevealed);
        }

        let commitment = move_commitment(&caller, mv, secret);
        open.into_iter()
            .find(|(_, seat)| seat.commitment == commitment)
            .map(|(index, _)| index)
            .ok_or(EscrowError::CommitmentMismatch)
    }

    fn settlement_credits(game: &Game, player2: PlayerId, outcome: Outcome) -> Vec<(PlayerId, u64)> {
        let player1 = game.player1();
        match outcome {
            Outcome::Draw => vec![(player1, game.stake), (player2, game.stake)],
            Outcome::Player1 => vec![(player1, game.stake * 2)],
            Outcome::Player2 => vec![(player2, game.stake * 2)],
        }
    }
}
