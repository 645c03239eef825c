//! Client network layer: the hub connection and the interactive loop
//!
//! `ScoreConnection` speaks envelopes over one WebSocket session. `Client`
//! owns that connection together with the local sheet, and multiplexes
//! hub frames, typed commands and the submit deadline in a single task.

use crate::debounce::SubmitDebouncer;
use crate::input::{parse_command, Command};
use crate::reconciler::{MergeStrategy, ReconcileOutcome, Reconciler};
use crate::rendering::render_table;
use crate::sheet::ScoreSheet;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{Competition, CompetitionId, Envelope, ScoreGrid};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type ClientResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// One WebSocket session with the hub, speaking envelopes.
pub struct ScoreConnection {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl ScoreConnection {
    /// Opens a session with the hub at `url` (`ws://host:port`)
    ///
    /// The hub registers the session once the handshake completes; from then
    /// on every relayed update is delivered to it.
    pub async fn connect(url: &str) -> ClientResult<Self> {
        let (ws, _) = connect_async(url).await?;
        info!("Connected to {}", url);
        Ok(Self { ws })
    }

    /// Encodes `envelope` and sends it as one text frame
    pub async fn send(&mut self, envelope: &Envelope) -> ClientResult<()> {
        let text = envelope.encode()?;
        self.ws.send(Message::text(text)).await?;
        Ok(())
    }

    /// Sends an `UPDATE_SCORES` carrying `scores` for one competition
    pub async fn send_update(
        &mut self,
        competition_id: &CompetitionId,
        scores: ScoreGrid,
    ) -> ClientResult<()> {
        let envelope = Envelope::UpdateScores {
            competition_id: competition_id.clone(),
            scores,
        };
        self.send(&envelope).await
    }

    /// Next text frame from the hub, or None once the connection is closed.
    pub async fn next_text(&mut self) -> Option<ClientResult<String>> {
        while let Some(message) = self.ws.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_string())),
                Ok(Message::Close(_)) => return None,
                Ok(_) => continue,
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    /// Starts the closing handshake
    ///
    /// The hub deregisters the session when it sees the close frame.
    pub async fn close(&mut self) -> ClientResult<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// Interactive scoreboard client
///
/// Keeps a local sheet for one competition, submits it after the user stops
/// typing and merges updates other sessions send through the hub.
pub struct Client<S: MergeStrategy> {
    connection: ScoreConnection,
    competition: Competition,
    sheet: ScoreSheet,
    reconciler: Reconciler<S>,
    debouncer: SubmitDebouncer,
}

impl<S: MergeStrategy> Client<S> {
    pub fn new(
        connection: ScoreConnection,
        competition: Competition,
        reconciler: Reconciler<S>,
        debounce: Duration,
    ) -> ClientResult<Self> {
        let sheet = ScoreSheet::from_competition(&competition)?;
        Ok(Client {
            connection,
            competition,
            sheet,
            reconciler,
            debouncer: SubmitDebouncer::new(debounce),
        })
    }

    pub fn sheet(&self) -> &ScoreSheet {
        &self.sheet
    }

    /// Sends the whole sheet. Returns false when an invalid cell blocks it.
    pub async fn submit(&mut self) -> ClientResult<bool> {
        let scores = match self.sheet.to_grid() {
            Ok(scores) => scores,
            Err(e) => {
                warn!("Not submitting: {}", e);
                return Ok(false);
            }
        };

        debug!("Submitting {} cells", scores.cell_count());
        self.connection
            .send_update(self.sheet.competition_id(), scores)
            .await?;
        Ok(true)
    }

    fn handle_frame(&mut self, text: &str) {
        match self.reconciler.apply_frame(&mut self.sheet, text, Instant::now()) {
            Ok(ReconcileOutcome::Merged {
                written,
                kept_local,
            }) => {
                info!("Merged {} remote cells ({} kept local)", written, kept_local);
                self.redraw();
            }
            Ok(ReconcileOutcome::Rejected { reason }) => {
                warn!("Hub rejected our update: {}", reason);
            }
            Ok(ReconcileOutcome::ForeignCompetition) | Ok(ReconcileOutcome::Ignored) => {}
            Err(e) => warn!("Discarding invalid frame from hub: {}", e),
        }
    }

    /// Returns false when the user asked to quit.
    async fn handle_line(&mut self, line: &str) -> ClientResult<bool> {
        let command = match parse_command(line) {
            Ok(command) => command,
            Err(e) => {
                warn!("{}", e);
                return Ok(true);
            }
        };

        match command {
            Command::Edit { lake, player, text } => {
                let now = Instant::now();
                self.sheet.edit(&lake, &player, text, now);
                self.debouncer.touch(now);
            }
            Command::Show => self.redraw(),
            Command::Send => {
                self.debouncer.cancel();
                self.submit().await?;
            }
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn redraw(&self) {
        println!("{}", render_table(&self.competition, &self.sheet));
    }

    /// Runs the client on stdin until `quit`, end of input or a lost hub
    pub async fn run(&mut self) -> ClientResult<()> {
        self.run_with(BufReader::new(tokio::io::stdin())).await
    }

    /// Runs the client loop, reading commands line by line from `input`
    ///
    /// An edit still waiting for its quiet period is submitted on the way
    /// out, unless the loop ended because the hub connection failed.
    pub async fn run_with<R>(&mut self, input: R) -> ClientResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();

        info!(
            "Scoring {} ({}) with {} merging",
            self.competition.name,
            self.sheet.competition_id(),
            self.reconciler.strategy().name()
        );
        self.redraw();

        let mut connection_lost = false;

        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                frame = self.connection.next_text() => {
                    match frame {
                        Some(Ok(text)) => self.handle_frame(&text),
                        Some(Err(e)) => {
                            error!("Connection error: {}", e);
                            connection_lost = true;
                            break;
                        }
                        None => {
                            warn!("Hub closed the connection");
                            connection_lost = true;
                            break;
                        }
                    }
                },

                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if !self.handle_line(&line).await? {
                                break;
                            }
                        }
                        None => break,
                    }
                },

                _ = wait_until(deadline) => {
                    if self.debouncer.take_due(Instant::now()) {
                        if let Err(e) = self.submit().await {
                            error!("Error submitting scores: {}", e);
                            connection_lost = true;
                            break;
                        }
                    }
                },
            }
        }

        if connection_lost {
            if self.debouncer.is_pending() {
                warn!("Local edits were not submitted before the connection was lost");
            }
            return Ok(());
        }

        if self.debouncer.is_pending() {
            self.debouncer.cancel();
            self.submit().await?;
        }
        if let Err(e) = self.connection.close().await {
            debug!("Closing hub connection failed: {}", e);
        }

        Ok(())
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
