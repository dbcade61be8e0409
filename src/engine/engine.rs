use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use tracing::{debug, info};

use crate::engine::api_client::GameApi;
use crate::engine::protocol::{EngineCommand, EngineResponse};

/// Network worker: serves requests one at a time, in arrival order.
pub struct Engine<A: GameApi> {
    api: A,
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
}

impl<A: GameApi> Engine<A> {
    pub fn new(api: A, rx: Receiver<EngineCommand>, tx: Sender<EngineResponse>) -> Self {
        Self { api, rx, tx }
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::Request { id, action } => {
                    let outcome = self.api.execute(&action);
                    debug!(id, kind = ?action.kind(), ok = outcome.is_ok(), "request settled");

                    if self.tx.send(EngineResponse { id, action, outcome }).is_err() {
                        break;
                    }
                }
                EngineCommand::Shutdown => break,
            }
        }
        info!("engine worker stopped");
    }
}

/// Starts the worker thread and returns the UI-side channel ends.
pub fn spawn<A>(api: A) -> (Sender<EngineCommand>, Receiver<EngineResponse>, JoinHandle<()>)
where
    A: GameApi + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();

    let handle = std::thread::spawn(move || {
        let mut engine = Engine::new(api, cmd_rx, resp_tx);
        engine.run();
    });

    (cmd_tx, resp_rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::protocol::{ActionReply, ApiError, GameAction};
    use serde_json::json;

    struct EchoTurn;

    impl GameApi for EchoTurn {
        fn execute(&self, action: &GameAction) -> Result<ActionReply, ApiError> {
            match action {
                GameAction::AdvanceTurn => Ok(ActionReply {
                    state: Some(json!({ "current_turn": 2 })),
                    ..Default::default()
                }),
                _ => Err(ApiError::Network("offline".into())),
            }
        }
    }

    #[test]
    fn replies_in_request_order_and_stops_on_shutdown() {
        let (tx, rx, handle) = spawn(EchoTurn);

        tx.send(EngineCommand::Request { id: 1, action: GameAction::AdvanceTurn }).unwrap();
        tx.send(EngineCommand::Request { id: 2, action: GameAction::FetchState }).unwrap();
        tx.send(EngineCommand::Shutdown).unwrap();

        let first = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert_eq!(first.id, 1);
        assert!(first.outcome.is_ok());
        assert_eq!(second.id, 2);
        assert!(matches!(second.outcome, Err(ApiError::Network(_))));

        handle.join().unwrap();
    }
}
