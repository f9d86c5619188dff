use tokio::sync::mpsc::{channel, Sender};

use system::{
    serde_json, ClientMessage, ConnectionId, MalformedFramePolicy, PresenceFormat, RelayPolicy,
    RenameError, RoomId, ServerMessage, PLACEHOLDER_NAME,
};

use super::connection::{ConnectionCommand, ConnectionEvent};
use crate::connection_tx_storage::ConnectionTxStorage;
use crate::server_state::ServerState;

pub type ServerTx = Sender<ConnectionCommand>;

struct Server {
    server_state: ServerState,
    connections: ConnectionTxStorage,
    policy: RelayPolicy,
}

impl Server {
    fn new(policy: RelayPolicy) -> Self {
        Self {
            server_state: ServerState::new(),
            connections: ConnectionTxStorage::new(),
            policy,
        }
    }

    fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { tx, room_id } => {
                let connection_id = self.server_state.join_room(&room_id);
                self.connections.insert(connection_id, tx);
                self.send_to(&connection_id, ConnectionEvent::Connected { connection_id });
            }
            ConnectionCommand::Disconnect { from } => self.disconnect(&from),
            ConnectionCommand::Frame { from, text } => self.handle_frame(&from, &text),
        }
    }

    fn handle_frame(&mut self, from: &ConnectionId, text: &str) {
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => self.handle_client_message(from, message),
            Err(_) => self.handle_unparseable_frame(from, text),
        }
    }

    fn handle_client_message(&mut self, from: &ConnectionId, message: ClientMessage) {
        let room_id = match self.server_state.room_of(from) {
            Some(room_id) => room_id.clone(),
            None => {
                log::warn!("Dropping frame from unknown connection {}", from);
                return;
            }
        };
        match message {
            ClientMessage::Identify { username } => {
                let committed = self
                    .server_state
                    .room_mut(&room_id)
                    .and_then(|room| room.identify(from, &username));
                match committed {
                    Some(username) => {
                        self.send_to(
                            from,
                            ConnectionEvent::ServerMessage(ServerMessage::Identity { username }),
                        );
                        self.broadcast_presence(&room_id);
                    }
                    None => log::debug!("Ignoring repeated identify from connection {}", from),
                }
            }
            ClientMessage::Nick { username } => {
                let result = self
                    .server_state
                    .room_mut(&room_id)
                    .map(|room| room.rename(from, &username));
                match result {
                    Some(Ok(())) => {
                        self.send_to(
                            from,
                            ConnectionEvent::ServerMessage(ServerMessage::Identity { username }),
                        );
                        self.broadcast_presence(&room_id);
                    }
                    Some(Err(RenameError::NameTaken)) => {
                        self.send_to(
                            from,
                            ConnectionEvent::ServerMessage(ServerMessage::Error {
                                message: "Username is taken".into(),
                            }),
                        );
                    }
                    Some(Err(RenameError::UnknownConnection)) | None => {
                        log::warn!("Rename from connection {} not in room {}", from, room_id);
                    }
                }
            }
            ClientMessage::Chat { text } => self.relay_chat(from, &room_id, text),
        }
    }

    /// Structured frames with a `type` tag we don't understand are ignored;
    /// anything else is unstructured input and goes through the policy.
    fn handle_unparseable_frame(&mut self, from: &ConnectionId, text: &str) {
        if let Ok(serde_json::Value::Object(map)) = serde_json::from_str(text) {
            if map.contains_key("type") {
                log::debug!("Ignoring unknown message type from connection {}", from);
                return;
            }
        }
        match self.policy.malformed {
            MalformedFramePolicy::Drop => {
                log::debug!("Dropping malformed frame from connection {}", from);
            }
            MalformedFramePolicy::Relay => {
                if let Some(room_id) = self.server_state.room_of(from).cloned() {
                    self.relay_chat(from, &room_id, text.to_string());
                }
            }
        }
    }

    fn relay_chat(&mut self, from: &ConnectionId, room_id: &RoomId, text: String) {
        let user = self
            .server_state
            .room(room_id)
            .and_then(|room| room.username_of(from))
            .unwrap_or(PLACEHOLDER_NAME)
            .to_string();
        self.broadcast_to_room(room_id, &ServerMessage::Chat { user, text }, Some(from));
    }

    /// Full broadcast of the room's presence, shaped by the policy.
    fn broadcast_presence(&mut self, room_id: &RoomId) {
        let message = match self.server_state.room(room_id) {
            Some(room) => match self.policy.presence {
                PresenceFormat::Roster => ServerMessage::UserList {
                    users: room.usernames(),
                },
                PresenceFormat::Count => ServerMessage::Count { count: room.len() },
            },
            None => return,
        };
        self.broadcast_to_room(room_id, &message, None);
    }

    /// Fan-out with lazy pruning: a recipient whose egress hand-off fails is
    /// removed on the spot and the broadcast carries on for the rest. The
    /// failure is never surfaced to the sender.
    fn broadcast_to_room(
        &mut self,
        room_id: &RoomId,
        message: &ServerMessage,
        without: Option<&ConnectionId>,
    ) {
        let recipients = match self.server_state.room(room_id) {
            Some(room) => room.connection_ids(),
            None => return,
        };
        for connection_id in recipients {
            if without.map_or(false, |c| *c == connection_id) {
                continue;
            }
            if !self
                .connections
                .send(&connection_id, ConnectionEvent::ServerMessage(message.clone()))
            {
                self.prune(&connection_id);
            }
        }
    }

    fn send_to(&mut self, connection_id: &ConnectionId, event: ConnectionEvent) {
        if !self.connections.send(connection_id, event) {
            self.prune(connection_id);
        }
    }

    /// Removal without the presence broadcast a voluntary disconnect gets;
    /// the roster corrects itself on the next membership change.
    fn prune(&mut self, connection_id: &ConnectionId) {
        log::info!("Pruning unreachable connection {}", connection_id);
        self.connections.remove(connection_id);
        self.server_state.leave_room(connection_id);
    }

    fn disconnect(&mut self, connection_id: &ConnectionId) {
        self.connections.remove(connection_id);
        if let Some(room_id) = self.server_state.leave_room(connection_id) {
            self.broadcast_presence(&room_id);
        }
    }
}

pub fn spawn_server(policy: RelayPolicy) -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ConnectionCommand>(16);

    tokio::spawn(async move {
        let mut server = Server::new(policy);

        while let Some(command) = srv_rx.recv().await {
            server.handle_connection_command(command);
        }
    });

    return srv_tx;
}
