use actix::{Actor, ActorContext, AsyncContext, Handler, Message, Running, StreamHandler};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

use system::{serde_json, ConnectionId, RoomId, ServerMessage};

use crate::connection_tx_storage::ConnectionTx;
use crate::server::ServerTx;

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect { tx: ConnectionTx, room_id: RoomId },
    Disconnect { from: ConnectionId },
    Frame { from: ConnectionId, text: String },
}

#[derive(Debug)]
pub enum ConnectionEvent {
    Connected { connection_id: ConnectionId },
    ServerMessage(ServerMessage),
    Disconnected,
}

#[derive(Message)]
#[rtype(result = "()")]
struct ConnectionActorMessage(ConnectionEvent);

enum ConnectionState {
    Idle,
    Connected(ConnectionId),
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
    room_id: RoomId,
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<ConnectionEvent>(32);

        self.srv_tx
            .try_send(ConnectionCommand::Connect {
                tx,
                room_id: self.room_id.clone(),
            })
            .expect("server must not be not closed yet");

        let addr = ctx.address().recipient();

        tokio::spawn(async move {
            let addr = addr;
            log::debug!("connection green thread - started");
            while let Some(msg) = rx.recv().await {
                if addr.try_send(ConnectionActorMessage(msg)).is_err() {
                    break;
                }
            }
            // The relay dropped our sender: either this connection was pruned
            // or the server is gone. Close the socket from our side.
            let _ = addr.try_send(ConnectionActorMessage(ConnectionEvent::Disconnected));
            log::debug!("connection green thread - terminated");
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Connected(id) = self.state {
            if self
                .srv_tx
                .try_send(ConnectionCommand::Disconnect { from: id })
                .is_err()
            {
                log::warn!("Relay mailbox full, disconnect of {} deferred to pruning", id);
            }
        }

        Running::Stop
    }
}

/// Ingress. Frames are forwarded raw; parsing is the relay's concern.
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Text(text)) => {
                if let ConnectionState::Connected(from) = self.state {
                    log::debug!("Ingress {} bytes from connection {}", text.len(), from);
                    if self
                        .srv_tx
                        .try_send(ConnectionCommand::Frame { from, text })
                        .is_err()
                    {
                        log::warn!("Relay mailbox full, dropping frame from connection {}", from);
                    }
                }
            }
            Ok(ws::Message::Close(_)) => {
                if let ConnectionState::Connected(id) = self.state {
                    if self
                        .srv_tx
                        .try_send(ConnectionCommand::Disconnect { from: id })
                        .is_err()
                    {
                        log::warn!("Relay mailbox full, disconnect of {} deferred to pruning", id);
                    }
                    self.state = ConnectionState::Idle;
                }
                ctx.stop();
            }
            _ => (),
        }
    }
}

/// Egress
impl Handler<ConnectionActorMessage> for ConnectionActor {
    type Result = ();

    fn handle(
        &mut self,
        msg: ConnectionActorMessage,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Self::Result {
        let connection_event = &msg.0;
        log::debug!("Egress {:?}", connection_event);
        match connection_event {
            ConnectionEvent::Connected { connection_id } => {
                self.state = ConnectionState::Connected(*connection_id);
            }
            ConnectionEvent::Disconnected => {
                self.state = ConnectionState::Idle;
                ctx.close(None);
                ctx.stop();
            }
            ConnectionEvent::ServerMessage(message) => {
                let serialized = serde_json::to_string(message).expect("must succeed");
                ctx.text(serialized);
            }
        }
    }
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
) -> Result<HttpResponse, Error> {
    let room_id: RoomId = req.match_info().get("room_id").unwrap().to_string();
    ws::start(
        ConnectionActor {
            srv_tx: srv_tx.get_ref().clone(),
            state: ConnectionState::Idle,
            room_id,
        },
        &req,
        stream,
    )
}
