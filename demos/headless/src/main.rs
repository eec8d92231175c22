//! A console host for arenalink.
//!
//! Players exist only as names typed on stdin; notices are printed. Point it
//! at a matchmaking service and drive two players through a match by hand:
//!
//! ```text
//! cargo run -p headless -- ws://localhost:8000/ws
//! > join alice
//! > join bob
//! > queue alice ranked
//! > queue bob ranked
//! > eliminate alice
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use arenalink::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

struct Player {
    name: String,
    online: bool,
    health: f64,
    position: Position,
}

/// Shared between the coordinator (through [`ConsoleWorld`]) and the
/// stdin loop.
#[derive(Default)]
struct Roster {
    players: HashMap<ParticipantId, Player>,
    by_name: HashMap<String, ParticipantId>,
    next_arena: u32,
}

impl Roster {
    fn id_of(&self, name: &str) -> Option<ParticipantId> {
        self.by_name.get(name).copied()
    }

    fn name_of(&self, id: ParticipantId) -> String {
        self.players
            .get(&id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Registers `name` on first sight and marks it online.
    fn join(&mut self, name: &str) -> ParticipantId {
        let id = *self
            .by_name
            .entry(name.to_string())
            .or_insert_with(ParticipantId::new_v4);
        let player = self.players.entry(id).or_insert_with(|| Player {
            name: name.to_string(),
            online: true,
            health: 20.0,
            position: Position {
                world: "lobby".into(),
                x: 0.0,
                y: 64.0,
                z: 0.0,
                yaw: 0.0,
                pitch: 0.0,
            },
        });
        player.online = true;
        id
    }
}

#[derive(Clone, Default)]
struct ConsoleWorld(Arc<Mutex<Roster>>);

impl ConsoleWorld {
    fn roster(&self) -> std::sync::MutexGuard<'_, Roster> {
        // A panic while holding the lock leaves the roster usable.
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl World for ConsoleWorld {
    fn is_online(&self, participant: ParticipantId) -> bool {
        self.roster()
            .players
            .get(&participant)
            .is_some_and(|p| p.online)
    }

    fn notify(&mut self, participant: ParticipantId, notice: &Notice) {
        let roster = self.roster();
        let text = match notice {
            Notice::MatchStarting { opponent, kind, .. } => {
                format!("{kind} match against {} is starting", roster.name_of(*opponent))
            }
            Notice::ChallengeSent { target } => format!("challenged {}", roster.name_of(*target)),
            Notice::ChallengeReceived { challenger } => {
                format!("{} challenged you", roster.name_of(*challenger))
            }
            other => other.to_string(),
        };
        println!("[{}] {text}", roster.name_of(participant));
    }

    fn health(&self, participant: ParticipantId) -> Option<f64> {
        self.roster()
            .players
            .get(&participant)
            .filter(|p| p.online)
            .map(|p| p.health)
    }

    fn reset_vitals(&mut self, participant: ParticipantId) {
        if let Some(p) = self.roster().players.get_mut(&participant) {
            p.health = 20.0;
        }
    }

    fn respawn(&mut self, participant: ParticipantId) {
        self.reset_vitals(participant);
    }

    fn position(&self, participant: ParticipantId) -> Option<Position> {
        self.roster()
            .players
            .get(&participant)
            .map(|p| p.position.clone())
    }

    fn teleport(&mut self, participant: ParticipantId, position: &Position) -> bool {
        let mut roster = self.roster();
        let Some(player) = roster.players.get_mut(&participant) else {
            return false;
        };
        player.position = position.clone();
        println!("[{}] back at {}", player.name, position.world);
        true
    }

    fn send_to_spawn(&mut self, participant: ParticipantId) {
        let mut roster = self.roster();
        if let Some(player) = roster.players.get_mut(&participant) {
            player.position.world = "lobby".into();
            println!("[{}] sent to spawn", player.name);
        }
    }

    fn create_arena(&mut self, kind: QueueKind) -> Option<ArenaHandle> {
        let mut roster = self.roster();
        roster.next_arena += 1;
        Some(ArenaHandle(format!("{kind}-arena-{}", roster.next_arena)))
    }

    fn teleport_to_slot(&mut self, arena: &ArenaHandle, slot: usize, participant: ParticipantId) {
        if let Some(p) = self.roster().players.get_mut(&participant) {
            p.position.world = format!("{arena}#{slot}");
        }
    }

    fn release_arena(&mut self, arena: ArenaHandle) {
        tracing::debug!(%arena, "arena released");
    }

    fn apply_loadout(&mut self, _participant: ParticipantId, _kind: QueueKind) {}

    fn clear_loadout(&mut self, _participant: ParticipantId) {}
}

// ---------------------------------------------------------------------------
// Console commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Input {
    Join(String),
    Leave(String),
    Queue(String, QueueKind),
    Cancel(String),
    Eliminate(String),
    Hurt(String, f64),
    Rating(String),
    Challenge(String, String),
    Accept(String),
    Deny(String),
    Status(String),
    Quit,
}

impl FromStr for Input {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let name = |i: usize| {
            words
                .get(i)
                .map(|w| w.to_string())
                .ok_or_else(|| format!("usage: {} <name>", words.first().unwrap_or(&"")))
        };
        match words.first().copied() {
            Some("join") => Ok(Input::Join(name(1)?)),
            Some("leave") => Ok(Input::Leave(name(1)?)),
            Some("queue") => {
                let kind = match words.get(2) {
                    Some(k) => k.parse::<QueueKind>().map_err(|e| e.to_string())?,
                    None => QueueKind::default(),
                };
                Ok(Input::Queue(name(1)?, kind))
            }
            Some("cancel") => Ok(Input::Cancel(name(1)?)),
            Some("eliminate") => Ok(Input::Eliminate(name(1)?)),
            Some("hurt") => {
                let health = words
                    .get(2)
                    .and_then(|h| h.parse().ok())
                    .ok_or("usage: hurt <name> <health>")?;
                Ok(Input::Hurt(name(1)?, health))
            }
            Some("rating") => Ok(Input::Rating(name(1)?)),
            Some("challenge") => Ok(Input::Challenge(name(1)?, name(2)?)),
            Some("accept") => Ok(Input::Accept(name(1)?)),
            Some("deny") => Ok(Input::Deny(name(1)?)),
            Some("status") => Ok(Input::Status(name(1)?)),
            Some("quit") | Some("exit") => Ok(Input::Quit),
            Some(other) => Err(format!("unknown command: {other}")),
            None => Err("empty line".into()),
        }
    }
}

/// Runs one console command. Returns `false` to stop.
async fn execute(
    input: Input,
    handle: &CoordinatorHandle,
    world: &ConsoleWorld,
) -> Result<bool, Box<dyn std::error::Error>> {
    let lookup = |name: &str| {
        world
            .roster()
            .id_of(name)
            .ok_or_else(|| format!("nobody called {name} has joined"))
    };

    match input {
        Input::Join(name) => {
            let id = world.roster().join(&name);
            println!("{name} is {id}");
            handle.participant_joined(id).await?;
        }
        Input::Leave(name) => {
            let id = lookup(&name)?;
            if let Some(p) = world.roster().players.get_mut(&id) {
                p.online = false;
            }
            handle.participant_left(id).await?;
        }
        Input::Queue(name, kind) => handle.enqueue(lookup(&name)?, kind).await?,
        Input::Cancel(name) => {
            handle.dequeue(lookup(&name)?).await?;
        }
        Input::Eliminate(name) => {
            if !handle.participant_eliminated(lookup(&name)?).await? {
                println!("{name} is not in a live round");
            }
        }
        Input::Hurt(name, health) => {
            let id = lookup(&name)?;
            if let Some(p) = world.roster().players.get_mut(&id) {
                p.health = health;
            }
        }
        Input::Rating(name) => {
            let id = lookup(&name)?;
            match handle.rating(id).await? {
                Some(r) => println!("{name}: {r} (cached)"),
                None => println!("{name}: no rating cached"),
            }
            handle.request_rating(id).await?;
        }
        Input::Challenge(from, to) => handle.challenge(lookup(&from)?, lookup(&to)?).await?,
        Input::Accept(name) => {
            let match_id = handle.accept_challenge(lookup(&name)?).await?;
            println!("duel {match_id} started");
        }
        Input::Deny(name) => handle.deny_challenge(lookup(&name)?).await?,
        Input::Status(name) => match handle.match_snapshot(lookup(&name)?).await? {
            Some(snapshot) => match serde_json::to_string_pretty(&snapshot) {
                Ok(json) => println!("{json}"),
                Err(e) => println!("{e}"),
            },
            None => println!("{name} is not in a match"),
        },
        Input::Quit => return Ok(false),
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ARENALINK_URL").ok())
        .unwrap_or_else(|| CoordinatorConfig::default().server_url);

    let world = ConsoleWorld::default();
    let handle = CoordinatorBuilder::new()
        .server_url(url)
        .spawn(WebSocketConnector, world.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let input = match line.parse::<Input>() {
            Ok(input) => input,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match execute(input, &handle, &world).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("error: {e}"),
        }
    }

    handle.shutdown().await?;
    Ok(())
}
