//! Server network layer: connection multiplexing and the simulation loop.
//!
//! One owner loop multiplexes accept readiness, frames reported by
//! per-connection reader tasks and the simulation step deadline through a
//! single `select!`. Reader and writer tasks touch nothing but their own
//! socket half, the shared pending queue handle and their channels, so a
//! stalled or dead client can never block the step timer or the other
//! connections.

use crate::controller::ServerController;
use crate::registry::ClientRegistry;
use log::{debug, info, warn};
use shared::controller::CommandController;
use shared::grid::GridModel;
use shared::protocol::{frame, FrameAccumulator};
use shared::READ_BUFFER_SIZE;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{self, Duration, Instant};

/// Messages sent from connection reader tasks to the owner loop.
#[derive(Debug)]
pub enum ServerEvent {
    FrameReceived { client_id: u32, payload: Vec<u8> },
    ClientClosed { client_id: u32 },
}

/// Authoritative server coordinating networking and the grid simulation.
pub struct Server {
    listener: TcpListener,
    controller: ServerController,
    registry: ClientRegistry,
    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
    /// When the last simulation step ran.
    last_step: Instant,
}

impl Server {
    pub async fn bind(addr: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_model(addr, GridModel::new()).await
    }

    pub async fn with_model(
        addr: &str,
        model: GridModel,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("server listening on {}", listener.local_addr()?);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            controller: ServerController::new(model),
            registry: ClientRegistry::new(),
            event_tx,
            event_rx,
            last_step: Instant::now(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn model(&self) -> &GridModel {
        self.controller.model()
    }

    pub fn model_mut(&mut self) -> &mut GridModel {
        self.controller.model_mut()
    }

    /// Main loop. Never returns and never lets a connection error escape;
    /// the only unrecoverable failure is the bind, which happens earlier.
    pub async fn run(&mut self) {
        info!("simulation loop started");

        loop {
            let step_at = self.last_step
                + Duration::from_millis(self.controller.model().update_interval_ms() as u64);
            let mut dirty = false;

            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => self.register_connection(stream, addr),
                    Err(e) => warn!("accept failed: {}", e),
                },

                Some(event) = self.event_rx.recv() => self.handle_event(event),

                _ = time::sleep_until(step_at) => {
                    self.controller.model_mut().update();
                    self.last_step = Instant::now();
                    dirty = true;
                },
            }

            // Drain on the owner's schedule, after whatever woke us.
            dirty |= self.controller.drain_and_apply();
            if self.controller.take_step_timer_reset() {
                self.last_step = Instant::now();
            }

            if dirty && !self.registry.is_empty() {
                let snapshot = self.controller.build_snapshot_message();
                self.registry.broadcast(&snapshot);
            }
        }
    }

    /// Registers an accepted connection, spawns its reader and writer
    /// tasks and immediately sends the full current state.
    fn register_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed for {}: {}", addr, e);
        }

        let (read_half, write_half) = stream.into_split();
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let client_id = self.registry.add(outbox_tx);
        info!("client {} connected from {}", client_id, addr);

        spawn_writer(client_id, write_half, outbox_rx);
        spawn_reader(client_id, read_half, self.event_tx.clone());

        let init = self.controller.build_init_message();
        if !self.registry.send_to(client_id, init) {
            warn!("client {} vanished before INIT could be queued", client_id);
        }
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::FrameReceived { client_id, payload } => {
                debug!("client {} sent {} byte(s)", client_id, payload.len());
                // Every client sees every other client's commands, not just
                // the authoritative outcome.
                self.registry.relay(&payload, client_id);
                self.controller.enqueue(payload);
            }
            ServerEvent::ClientClosed { client_id } => {
                self.registry.remove(client_id);
            }
        }
    }
}

/// Writer task: frames queued payloads onto its socket half until the
/// channel closes or a write fails.
fn spawn_writer(
    client_id: u32,
    mut write_half: OwnedWriteHalf,
    mut outbox: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    tokio::spawn(async move {
        while let Some(payload) = outbox.recv().await {
            if let Err(e) = write_half.write_all(&frame(&payload)).await {
                warn!("write to client {} failed: {}", client_id, e);
                break;
            }
        }
    });
}

/// Reader task: reassembles frames from raw reads and reports them to the
/// owner loop. Exits on EOF, read error or a poisoned frame header, always
/// reporting the close so the registry stays accurate.
fn spawn_reader(
    client_id: u32,
    mut read_half: OwnedReadHalf,
    events: mpsc::UnboundedSender<ServerEvent>,
) {
    tokio::spawn(async move {
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let mut frames = FrameAccumulator::new();

        'reading: loop {
            match read_half.read(&mut buffer).await {
                Ok(0) => break,
                Ok(n) => {
                    frames.push_bytes(&buffer[..n]);
                    loop {
                        match frames.next_frame() {
                            Ok(Some(payload)) => {
                                let received = ServerEvent::FrameReceived { client_id, payload };
                                if events.send(received).is_err() {
                                    return;
                                }
                            }
                            Ok(None) => break,
                            Err(e) => {
                                warn!("client {} sent a bad frame: {}", client_id, e);
                                break 'reading;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("read from client {} failed: {}", client_id, e);
                    break;
                }
            }
        }

        let _ = events.send(ServerEvent::ClientClosed { client_id });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::protocol::Command;

    async fn read_payload(stream: &mut TcpStream) -> Vec<u8> {
        let mut header = [0u8; 4];
        stream.read_exact(&mut header).await.unwrap();
        let mut payload = vec![0u8; u32::from_be_bytes(header) as usize];
        stream.read_exact(&mut payload).await.unwrap();
        payload
    }

    #[test]
    fn accept_sends_init_with_current_state() {
        tokio_test::block_on(async {
            let mut server = Server::bind("127.0.0.1:0").await.unwrap();
            let addr = server.local_addr().unwrap();
            server.model_mut().set_cell(0, 0, true);
            server.model_mut().set_cell(0, 1, true);
            tokio::spawn(async move { server.run().await });

            let mut stream = TcpStream::connect(addr).await.unwrap();
            let payload = read_payload(&mut stream).await;

            match Command::decode(&payload).unwrap() {
                Command::Init(init) => {
                    assert_eq!(init.size, 10);
                    assert_eq!(init.cycle, 0);
                    assert_eq!(init.snapshot, vec![0b0000_0011]);
                }
                other => panic!("expected Init, got {:?}", other),
            }
        });
    }

    #[test]
    fn command_triggers_snapshot_broadcast() {
        tokio_test::block_on(async {
            let mut server = Server::bind("127.0.0.1:0").await.unwrap();
            let addr = server.local_addr().unwrap();
            tokio::spawn(async move { server.run().await });

            let mut stream = TcpStream::connect(addr).await.unwrap();
            let _init = read_payload(&mut stream).await;

            stream
                .write_all(&frame(&Command::SetCell(5).encode()))
                .await
                .unwrap();

            let payload = read_payload(&mut stream).await;
            match Command::decode(&payload).unwrap() {
                Command::Snapshot(bits) => assert_eq!(bits, vec![0b0010_0000]),
                other => panic!("expected Snapshot, got {:?}", other),
            }
        });
    }
}
