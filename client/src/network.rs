//! Client network layer: the listener task and the viewer loop.
//!
//! A spawned listener task owns the read half of the connection,
//! reassembles frames and pushes the raw payloads onto the pending queue.
//! The viewer loop owns everything else: it drains the queue on its own
//! schedule, applies the decoded commands through the controller and
//! repaints whenever the model reports a change.

use crate::controller::ClientController;
use crate::presentation::{render_ascii, Presentation};
use log::{debug, info, warn};
use shared::controller::CommandController;
use shared::grid::{GridModel, ModelEvent};
use shared::protocol::{frame, Command, FrameAccumulator};
use shared::queue::PendingCommands;
use shared::READ_BUFFER_SIZE;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::{self, Duration};

/// How often the viewer loop polls the pending queue between repaints.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Viewer client mirroring the server's authoritative grid.
pub struct Client {
    controller: ClientController,
    writer: OwnedWriteHalf,
    model_events: Receiver<ModelEvent>,
}

impl Client {
    /// Connects to the server and spawns the listener task. The INIT
    /// message lands on the pending queue like any other command and is
    /// applied on the next [`Client::process_pending`] call.
    pub async fn connect(
        addr: &str,
        presentation: Box<dyn Presentation>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(addr).await?;
        info!("connected to server at {}", addr);

        if let Err(e) = stream.set_nodelay(true) {
            debug!("set_nodelay failed: {}", e);
        }

        let (read_half, write_half) = stream.into_split();

        let mut model = GridModel::new();
        let model_events = model.subscribe();
        let controller = ClientController::new(model, presentation);

        spawn_listener(read_half, controller.pending_handle());

        Ok(Client {
            controller,
            writer: write_half,
            model_events,
        })
    }

    pub fn model(&self) -> &GridModel {
        self.controller.model()
    }

    /// Applies everything the listener task queued since the last call.
    /// Returns true if at least one command was processed.
    pub fn process_pending(&mut self) -> bool {
        self.controller.drain_and_apply()
    }

    /// Drains the model's change notifications, reporting whether a
    /// repaint is due.
    pub fn take_repaint(&mut self) -> bool {
        let mut repaint = false;
        while let Ok(ModelEvent::Changed { cycle }) = self.model_events.try_recv() {
            debug!("grid changed at cycle {}", cycle);
            repaint = true;
        }
        repaint
    }

    /// Frames and sends one command to the server.
    pub async fn send_command(&mut self, command: &Command) -> Result<(), std::io::Error> {
        self.writer.write_all(&frame(&command.encode())).await
    }

    /// Headless viewer loop: applies pending commands and prints the grid
    /// whenever it changed. Runs until cancelled.
    pub async fn run(&mut self) {
        loop {
            self.process_pending();

            if self.take_repaint() {
                let model = self.controller.model();
                info!("cycle {} ({} alive)", model.cycle(), model.alive_cell_count());
                print!("{}", render_ascii(model));
            }

            time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Listener task: blocks on the socket, reassembles frames and hands the
/// raw payloads to the pending queue. Exits on EOF, read error or a bad
/// frame header; the viewer keeps showing its last mirrored state.
fn spawn_listener(mut read_half: OwnedReadHalf, pending: Arc<PendingCommands>) {
    tokio::spawn(async move {
        let mut buffer = [0u8; READ_BUFFER_SIZE];
        let mut frames = FrameAccumulator::new();

        'reading: loop {
            match read_half.read(&mut buffer).await {
                Ok(0) => {
                    info!("server closed the connection");
                    break;
                }
                Ok(n) => {
                    frames.push_bytes(&buffer[..n]);
                    loop {
                        match frames.next_frame() {
                            Ok(Some(payload)) => pending.push(payload),
                            Ok(None) => break,
                            Err(e) => {
                                warn!("server sent a bad frame: {}", e);
                                break 'reading;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("read from server failed: {}", e);
                    break;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::LogPresentation;
    use shared::protocol::InitState;
    use tokio::net::TcpListener;

    async fn write_command(stream: &mut TcpStream, command: &Command) {
        stream.write_all(&frame(&command.encode())).await.unwrap();
    }

    #[test]
    fn listener_queues_init_until_processed() {
        tokio_test::block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            let mut client = Client::connect(&addr.to_string(), Box::new(LogPresentation))
                .await
                .unwrap();
            let (mut server_side, _) = listener.accept().await.unwrap();

            write_command(
                &mut server_side,
                &Command::Init(InitState {
                    size: 12,
                    update_rate_ms: 300,
                    survival_min: 2,
                    survival_max: 3,
                    spawn_percent: 50,
                    cycle: 7,
                    snapshot: vec![0b0000_0001],
                }),
            )
            .await;

            // Wait for the listener task to queue the frame.
            while client.controller.pending_handle().is_empty() {
                time::sleep(Duration::from_millis(5)).await;
            }
            assert_eq!(client.model().size(), 10);

            assert!(client.process_pending());
            assert!(client.take_repaint());
            assert_eq!(client.model().size(), 12);
            assert_eq!(client.model().cycle(), 7);
            assert!(client.model().is_alive(0, 0));
        });
    }

    #[test]
    fn snapshots_advance_the_mirrored_cycle() {
        tokio_test::block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            let mut client = Client::connect(&addr.to_string(), Box::new(LogPresentation))
                .await
                .unwrap();
            let (mut server_side, _) = listener.accept().await.unwrap();

            write_command(&mut server_side, &Command::Snapshot(vec![0b0000_0010])).await;
            write_command(&mut server_side, &Command::Snapshot(vec![0b0000_0100])).await;

            while client.controller.pending_handle().len() < 2 {
                time::sleep(Duration::from_millis(5)).await;
            }

            assert!(client.process_pending());
            assert_eq!(client.model().cycle(), 2);
            assert!(client.model().is_alive(0, 2));
            assert!(!client.model().is_alive(0, 1));
        });
    }

    #[test]
    fn send_command_frames_the_payload() {
        tokio_test::block_on(async {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();

            let mut client = Client::connect(&addr.to_string(), Box::new(LogPresentation))
                .await
                .unwrap();
            let (mut server_side, _) = listener.accept().await.unwrap();

            client.send_command(&Command::ChangeRate(750)).await.unwrap();

            let mut header = [0u8; 4];
            server_side.read_exact(&mut header).await.unwrap();
            let mut payload = vec![0u8; u32::from_be_bytes(header) as usize];
            server_side.read_exact(&mut payload).await.unwrap();

            assert_eq!(Command::decode(&payload).unwrap(), Command::ChangeRate(750));
        });
    }
}
