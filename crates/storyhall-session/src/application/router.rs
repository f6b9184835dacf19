//! The connection router.
//!
//! Interprets inbound commands against session state, mutates the session
//! registry and campaign memory, and fans resulting events out to the
//! session's connection group.
//!
//! All registry, memory and membership state sits behind one mutex, so every
//! mutation is linearizable. The lock is never held across an `.await`: the
//! narration call is the only suspension point, and a handler resuming from
//! it re-checks that its session still exists before it appends or
//! broadcasts anything.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use storyhall_core::clock::Clock;
use storyhall_core::command::Command;
use storyhall_core::error::DomainError;
use storyhall_core::rng::DeterministicRng;
use storyhall_dice::roll::{RollMode, roll_with_mode};
use storyhall_memory::campaign::{CampaignSnapshot, LoreCategory, LoreRecord};
use storyhall_memory::entry::{DM_SPEAKER, EventLogEntry};
use storyhall_memory::memory::CampaignMemory;
use storyhall_narration::guarded::GuardedNarrator;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, instrument, warn};

use crate::application::query_handlers::{RouterStats, SessionView};
use crate::domain::aggregates::{ConnectionId, Session, SessionId};
use crate::domain::commands::ClientCommand;
use crate::domain::events::{FACILITATOR_DISCONNECTED, ServerEvent};
use crate::domain::membership::{Binding, Membership, Role};
use crate::domain::store::SessionStore;

/// Events buffered per connection before further events are dropped.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Receiving half of a connection's outbound queue.
pub type EventReceiver = mpsc::Receiver<ServerEvent>;

type Outlet = mpsc::Sender<ServerEvent>;

struct RouterState {
    sessions: SessionStore,
    memory: CampaignMemory,
    membership: Membership,
    outlets: HashMap<ConnectionId, Outlet>,
}

impl RouterState {
    fn send(&self, connection: ConnectionId, event: ServerEvent) {
        match self.outlets.get(&connection) {
            Some(outlet) => match outlet.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(%connection, "outbound queue full, dropping event");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(%connection, "outlet closed, dropping event");
                }
            },
            None => debug!(%connection, "no outlet for connection, dropping event"),
        }
    }

    /// Sends to every connection in the session's group at this moment.
    fn broadcast(&self, session_id: &SessionId, event: &ServerEvent) {
        for connection in self.membership.members(session_id) {
            self.send(connection, event.clone());
        }
    }

    fn binding(&self, connection: ConnectionId) -> Result<Binding, DomainError> {
        self.membership
            .binding(connection)
            .cloned()
            .ok_or(DomainError::NotInSession)
    }

    fn session(&self, session_id: &SessionId) -> Result<&Session, DomainError> {
        self.sessions
            .get(session_id.as_str())
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))
    }

    /// Label used for log entries and broadcasts from `connection`.
    fn speaker(&self, connection: ConnectionId, binding: &Binding) -> Result<String, DomainError> {
        match binding.role {
            Role::Facilitator => Ok(DM_SPEAKER.to_owned()),
            Role::Participant => self
                .session(&binding.session_id)?
                .participant(connection)
                .map(|p| p.name.clone())
                .ok_or(DomainError::NotInSession),
        }
    }

    /// Returns the caller's session if it is that session's bound facilitator.
    fn facilitator_session(
        &self,
        connection: ConnectionId,
        action: &str,
    ) -> Result<SessionId, DomainError> {
        let binding = self.binding(connection)?;
        if self.session(&binding.session_id)?.is_facilitator(connection) {
            Ok(binding.session_id)
        } else {
            Err(DomainError::Unauthorized(format!(
                "only the facilitator may {action}"
            )))
        }
    }

    fn has_history(&self, session_id: &SessionId) -> bool {
        self.memory
            .get(session_id.as_str())
            .is_some_and(|campaign| !campaign.is_empty())
    }
}

/// Routes protocol commands for every connection in the process.
pub struct ConnectionRouter {
    state: Mutex<RouterState>,
    clock: Arc<dyn Clock>,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    narrator: GuardedNarrator,
    queue_capacity: usize,
}

impl std::fmt::Debug for ConnectionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRouter")
            .field("narrator", &self.narrator)
            .field("queue_capacity", &self.queue_capacity)
            .finish_non_exhaustive()
    }
}

impl ConnectionRouter {
    /// Creates a router with empty state.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        narrator: GuardedNarrator,
    ) -> Self {
        Self {
            state: Mutex::new(RouterState {
                sessions: SessionStore::new(),
                memory: CampaignMemory::new(clock.clone()),
                membership: Membership::new(),
                outlets: HashMap::new(),
            }),
            clock,
            rng,
            narrator,
            queue_capacity: OUTBOUND_QUEUE_CAPACITY,
        }
    }

    /// Sets how many events each new connection may have queued. A
    /// connection that falls this far behind misses events until it drains.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, RouterState>, DomainError> {
        self.state
            .lock()
            .map_err(|e| DomainError::Infrastructure(format!("router state mutex poisoned: {e}")))
    }

    /// Registers a new connection and returns its outbound queue.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if router state is unavailable.
    pub fn connect(&self) -> Result<(ConnectionId, EventReceiver), DomainError> {
        let connection = ConnectionId::new();
        let (outlet, receiver) = mpsc::channel(self.queue_capacity);
        self.lock()?.outlets.insert(connection, outlet);
        debug!(%connection, "connection registered");
        Ok((connection, receiver))
    }

    /// Registers a new, inactive session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionAlreadyExists` if the identifier is taken.
    pub fn create_session(&self, session_id: SessionId) -> Result<SessionView, DomainError> {
        let now = self.clock.now();
        let mut guard = self.lock()?;
        let view = SessionView::from(guard.sessions.create(session_id, now)?);
        info!(session_id = %view.session_id, "session created");
        Ok(view)
    }

    /// Deletes a session, its campaign memory and its group. Members are sent
    /// `session:closed` and return to the unbound state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if no such session exists.
    pub fn delete_session(&self, session_id: &str) -> Result<(), DomainError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let session = state
            .sessions
            .delete(session_id)
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_owned()))?;
        state.memory.clear(session_id);
        for connection in state.membership.remove_session(&session.id) {
            state.send(
                connection,
                ServerEvent::SessionClosed {
                    session_id: session.id.clone(),
                },
            );
        }
        info!(session_id, "session deleted");
        Ok(())
    }

    /// Summary of one session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if no such session exists.
    pub fn session(&self, session_id: &str) -> Result<SessionView, DomainError> {
        self.lock()?
            .sessions
            .get(session_id)
            .map(SessionView::from)
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_owned()))
    }

    /// Summaries of every session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if router state is unavailable.
    pub fn sessions(&self) -> Result<Vec<SessionView>, DomainError> {
        Ok(self
            .lock()?
            .sessions
            .list()
            .into_iter()
            .map(SessionView::from)
            .collect())
    }

    /// The session's campaign snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` if no such session exists.
    pub fn campaign(&self, session_id: &str) -> Result<CampaignSnapshot, DomainError> {
        let guard = self.lock()?;
        if guard.sessions.get(session_id).is_none() {
            return Err(DomainError::SessionNotFound(session_id.to_owned()));
        }
        Ok(guard.memory.snapshot(session_id))
    }

    /// Process-wide counters.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if router state is unavailable.
    pub fn stats(&self) -> Result<RouterStats, DomainError> {
        let guard = self.lock()?;
        Ok(RouterStats {
            sessions: guard.sessions.len(),
            connections: guard.outlets.len(),
            bound_connections: guard.membership.bound_connections(),
        })
    }

    /// Handles one inbound command. Failures are reported privately to the
    /// sender as an `error` event and never broadcast.
    #[instrument(skip(self, command), fields(connection_id = %connection, command = command.command_type()))]
    pub async fn handle(&self, connection: ConnectionId, command: ClientCommand) {
        if let Err(error) = self.dispatch(connection, command).await {
            match &error {
                DomainError::Infrastructure(_) => error!(%error, "command failed"),
                DomainError::Unauthorized(_) => warn!(%error, "unauthorized command"),
                _ => debug!(%error, "command rejected"),
            }
            self.reject(connection, &error);
        }
    }

    /// Sends a private `error` event to `connection`.
    pub fn reject(&self, connection: ConnectionId, error: &DomainError) {
        match self.lock() {
            Ok(state) => state.send(connection, ServerEvent::error(error)),
            Err(e) => error!(%connection, error = %e, "cannot report rejection"),
        }
    }

    /// Tears down a connection. Participants leave the roster; a departing
    /// facilitator pauses its session. Unbound connections are a no-op.
    #[instrument(skip(self), fields(connection_id = %connection))]
    pub fn disconnect(&self, connection: ConnectionId) {
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(e) => {
                error!(error = %e, "cannot process disconnect");
                return;
            }
        };
        let state = &mut *guard;
        state.outlets.remove(&connection);

        let Some(binding) = state.membership.unbind(connection) else {
            debug!("disconnect of unbound connection");
            return;
        };
        let Some(session) = state.sessions.get_mut(binding.session_id.as_str()) else {
            return;
        };

        let departed = session.remove_participant(connection);
        let paused = session.release_facilitator(connection);
        let players = session.participants().to_vec();

        if let Some(participant) = departed {
            info!(session_id = %binding.session_id, player = %participant.name, "participant left");
            state.broadcast(
                &binding.session_id,
                &ServerEvent::ParticipantLeft {
                    player_name: participant.name,
                    players,
                },
            );
        }
        if paused {
            info!(session_id = %binding.session_id, "facilitator left, session paused");
            state.broadcast(
                &binding.session_id,
                &ServerEvent::SessionPaused {
                    message: FACILITATOR_DISCONNECTED.to_owned(),
                },
            );
        }
    }

    async fn dispatch(
        &self,
        connection: ConnectionId,
        command: ClientCommand,
    ) -> Result<(), DomainError> {
        match command {
            ClientCommand::JoinAsFacilitator { session_id } => {
                self.join_as_facilitator(connection, session_id)
            }
            ClientCommand::JoinAsParticipant { session_id, name } => {
                self.join_as_participant(connection, session_id, name.as_deref())
            }
            ClientCommand::Speak { text } => self.speak(connection, text).await,
            ClientCommand::RollDice { notation, mode } => {
                self.roll_dice(connection, &notation, mode)
            }
            ClientCommand::Narrate { text } => self.narrate(connection, text),
            ClientCommand::StartSession { setting } => {
                self.start_session(connection, setting).await
            }
            ClientCommand::RecordLore {
                category,
                name,
                description,
            } => self.record_lore(connection, category, name, description),
        }
    }

    fn join_as_facilitator(
        &self,
        connection: ConnectionId,
        session_id: SessionId,
    ) -> Result<(), DomainError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if state.membership.binding(connection).is_some() {
            return Err(DomainError::AlreadyInSession);
        }
        let session = state
            .sessions
            .get_mut(session_id.as_str())
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;

        let displaced = session.bind_facilitator(connection);
        let players = session.participants().to_vec();
        state
            .membership
            .bind(connection, session_id.clone(), Role::Facilitator)?;

        if let Some(previous) = displaced {
            info!(%session_id, %previous, "facilitator seat taken over");
            state.membership.unbind(previous);
            state.send(
                previous,
                ServerEvent::error(&DomainError::Unauthorized(
                    "another connection has taken over as facilitator".to_owned(),
                )),
            );
        }

        info!(%session_id, "facilitator joined");
        let campaign_state = state.memory.snapshot(session_id.as_str());
        state.send(
            connection,
            ServerEvent::FacilitatorJoined {
                session_id,
                players,
                campaign_state,
            },
        );
        Ok(())
    }

    fn join_as_participant(
        &self,
        connection: ConnectionId,
        session_id: SessionId,
        name: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if state.membership.binding(connection).is_some() {
            return Err(DomainError::AlreadyInSession);
        }
        let session = state
            .sessions
            .get_mut(session_id.as_str())
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;

        let player = session.admit(connection, name)?;
        let players = session.participants().to_vec();
        state
            .membership
            .bind(connection, session_id.clone(), Role::Participant)?;

        info!(%session_id, player = %player.name, "participant joined");
        state.broadcast(
            &session_id,
            &ServerEvent::ParticipantJoined {
                player: player.clone(),
                players,
            },
        );
        let campaign_state = state.memory.snapshot(session_id.as_str());
        state.send(
            connection,
            ServerEvent::Welcome {
                session_id,
                player_info: player,
                campaign_state,
            },
        );
        Ok(())
    }

    async fn speak(&self, connection: ConnectionId, text: String) -> Result<(), DomainError> {
        let (session_id, context) = {
            let mut guard = self.lock()?;
            let state = &mut *guard;
            let binding = state.binding(connection)?;
            let speaker = state.speaker(connection, &binding)?;

            state.memory.append(
                binding.session_id.as_str(),
                EventLogEntry::speech(&speaker, &text, self.clock.now()),
            );
            state.broadcast(
                &binding.session_id,
                &ServerEvent::ParticipantSpoke {
                    player_name: speaker,
                    text: text.clone(),
                },
            );
            let context = state.memory.snapshot(binding.session_id.as_str());
            (binding.session_id, context)
        };

        let narration = self.narrator.narrate(&text, &context).await;
        self.resume_with_narration(&session_id, narration, false)
    }

    /// Publishes narration produced across a suspension point, provided the
    /// session still exists.
    fn resume_with_narration(
        &self,
        session_id: &SessionId,
        text: String,
        requires_empty_log: bool,
    ) -> Result<(), DomainError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        if state.sessions.get(session_id.as_str()).is_none() {
            debug!(%session_id, "session ended while awaiting narration, discarding it");
            return Ok(());
        }
        if requires_empty_log && state.has_history(session_id) {
            debug!(%session_id, "campaign gained history while introducing, dropping introduction");
            return Ok(());
        }
        state.memory.append(
            session_id.as_str(),
            EventLogEntry::narration(&text, self.clock.now()),
        );
        state.broadcast(session_id, &ServerEvent::Narration { text });
        Ok(())
    }

    fn roll_dice(
        &self,
        connection: ConnectionId,
        notation: &str,
        mode: RollMode,
    ) -> Result<(), DomainError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let binding = state.binding(connection)?;
        let roller = state.speaker(connection, &binding)?;

        let (result, composite) = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
            roll_with_mode(notation, mode, &mut *rng)?
        };

        let details = serde_json::to_value(&result).map_err(|e| {
            DomainError::Infrastructure(format!("dice result serialization failed: {e}"))
        })?;
        let qualifier = match mode {
            RollMode::Normal => "",
            RollMode::Advantage => " with advantage",
            RollMode::Disadvantage => " with disadvantage",
        };
        state.memory.append(
            binding.session_id.as_str(),
            EventLogEntry::dice(
                format!("{roller} rolled {notation}{qualifier}: {}", result.total),
                details,
                self.clock.now(),
            ),
        );

        debug!(session_id = %binding.session_id, %notation, total = result.total, "dice rolled");
        state.broadcast(
            &binding.session_id,
            &ServerEvent::DiceResult {
                player_name: roller,
                notation: notation.to_owned(),
                mode,
                result,
                rolls: composite.map(|c| [c.roll1, c.roll2]),
            },
        );
        Ok(())
    }

    fn narrate(&self, connection: ConnectionId, text: String) -> Result<(), DomainError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let session_id = state.facilitator_session(connection, "narrate")?;

        state.memory.append(
            session_id.as_str(),
            EventLogEntry::narration(&text, self.clock.now()),
        );
        state.broadcast(&session_id, &ServerEvent::Narration { text });
        Ok(())
    }

    async fn start_session(
        &self,
        connection: ConnectionId,
        setting: Option<String>,
    ) -> Result<(), DomainError> {
        let pending_introduction = {
            let mut guard = self.lock()?;
            let state = &mut *guard;
            let session_id = state.facilitator_session(connection, "start the session")?;
            if let Some(session) = state.sessions.get_mut(session_id.as_str()) {
                session.start();
            }

            info!(%session_id, "session started");
            state.broadcast(&session_id, &ServerEvent::SessionStarted);

            if state.has_history(&session_id) {
                None
            } else {
                setting.map(|setting| (session_id, setting))
            }
        };

        let Some((session_id, setting)) = pending_introduction else {
            return Ok(());
        };
        let introduction = self.narrator.introduce(&setting).await;
        self.resume_with_narration(&session_id, introduction, true)
    }

    fn record_lore(
        &self,
        connection: ConnectionId,
        category: LoreCategory,
        name: String,
        description: Option<String>,
    ) -> Result<(), DomainError> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let session_id = state.facilitator_session(connection, "record campaign lore")?;

        let entry = LoreRecord {
            name,
            description,
            added_at: self.clock.now(),
        };
        state
            .memory
            .record(session_id.as_str(), category, entry.clone());
        state.broadcast(&session_id, &ServerEvent::LoreRecorded { category, entry });
        Ok(())
    }
}
