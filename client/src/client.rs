//! Wiring of a complete client: relay link, both managers and the logic
//! thread that feeds them.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use signaling_protocol::ParticipantId;

use crate::config::ClientConfig;
use crate::context::ClientContext;
use crate::error::Result;
use crate::inbound::Inbound;
use crate::mesh::{MeshEvent, RoomSnapshot, RoomStatus, VoiceMeshManager};
use crate::relay_client::RelayConnection;
use crate::router::EventRouter;
use crate::session::{DirectSessionManager, LogEntry, SessionEvent, SessionSnapshot, SessionStatus};
use crate::transport::{
    Directory, ExclusiveCapture, MediaDevices, PeerConnectionFactory, SignalingSink,
};

/// Platform services the client cannot provide itself.
pub struct Platform {
    pub factory: Arc<dyn PeerConnectionFactory>,
    pub media: Arc<dyn MediaDevices>,
    pub directory: Arc<dyn Directory>,
}

pub struct Client {
    relay: Arc<RelayConnection>,
    sessions: Arc<DirectSessionManager>,
    mesh: Arc<VoiceMeshManager>,
    inbound: Sender<Inbound>,
    logic_thread: Option<JoinHandle<()>>,
    logger: logging::Logger,
}

impl Client {
    /// Connects to the relay, authenticates and starts the logic thread.
    ///
    /// Session and room notifications arrive on the two returned receivers.
    pub fn connect(
        config: &ClientConfig,
        platform: Platform,
        logger: logging::Logger,
    ) -> Result<(Client, Receiver<SessionEvent>, Receiver<MeshEvent>)> {
        let (inbound_tx, inbound_rx) = mpsc::channel();
        let relay = RelayConnection::connect(
            &config.relay,
            inbound_tx.clone(),
            logger.for_component("Relay"),
        )?;
        let signaling: Arc<dyn SignalingSink> = relay.clone();

        let ctx = ClientContext {
            local_id: relay.participant_id().to_string(),
            signaling: Arc::clone(&signaling),
            factory: platform.factory,
            directory: platform.directory,
            capture: Arc::new(ExclusiveCapture::new(
                platform.media,
                logger.for_component("Media"),
            )),
            inbound: inbound_tx.clone(),
            logger: logger.clone(),
        };

        let (session_tx, session_rx) = mpsc::channel();
        let (mesh_tx, mesh_rx) = mpsc::channel();
        let sessions = Arc::new(DirectSessionManager::new(
            ctx.clone(),
            &config.session,
            &config.transfer,
            session_tx,
        ));
        let mesh = Arc::new(VoiceMeshManager::new(ctx, mesh_tx));

        let router = EventRouter::new(
            Arc::clone(&sessions),
            Arc::clone(&mesh),
            signaling,
            logger.for_component("Router"),
        );
        let session_config = config.session.clone();
        let logic_thread = thread::Builder::new()
            .name("client-logic".to_string())
            .spawn(move || router.run(inbound_rx, &session_config))?;

        let logger = logger.for_component("Client");
        logger.info(&format!("Client ready as {}", relay.participant_id()));

        let client = Client {
            relay,
            sessions,
            mesh,
            inbound: inbound_tx,
            logic_thread: Some(logic_thread),
            logger,
        };
        Ok((client, session_rx, mesh_rx))
    }

    pub fn local_id(&self) -> ParticipantId {
        self.relay.participant_id().to_string()
    }

    pub fn sessions(&self) -> &DirectSessionManager {
        &self.sessions
    }

    pub fn mesh(&self) -> &VoiceMeshManager {
        &self.mesh
    }

    // ---- direct sessions ----

    pub fn request_session(&self, peer_id: &str) -> Result<()> {
        self.sessions.request_session(peer_id)
    }

    pub fn accept_session(&self, peer_id: &str) -> Result<()> {
        self.sessions.accept_session(peer_id)
    }

    pub fn reject_session(&self, peer_id: &str) -> Result<()> {
        self.sessions.reject_session(peer_id)
    }

    pub fn end_session(&self, peer_id: &str) -> Result<()> {
        self.sessions.end_session(peer_id)
    }

    pub fn session_status(&self, peer_id: &str) -> Option<SessionStatus> {
        self.sessions.status(peer_id)
    }

    pub fn session_snapshot(&self, peer_id: &str) -> Option<SessionSnapshot> {
        self.sessions.snapshot(peer_id)
    }

    pub fn query_presence(&self, peer_id: &str) -> Result<()> {
        self.sessions.query_presence(peer_id)
    }

    pub fn send_text(&self, peer_id: &str, content: &str) -> Result<LogEntry> {
        self.sessions.send_text(peer_id, content)
    }

    /// Streams `bytes` to the peer on a background thread.
    pub fn send_file(
        &self,
        peer_id: &str,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<JoinHandle<Result<LogEntry>>> {
        let sessions = Arc::clone(&self.sessions);
        let peer_id = peer_id.to_string();
        let file_name = file_name.to_string();
        let mime_type = mime_type.to_string();

        let handle = thread::Builder::new()
            .name("file-transfer".to_string())
            .spawn(move || sessions.send_file(&peer_id, &file_name, &mime_type, &bytes))?;
        Ok(handle)
    }

    /// Reads `path` and sends it like [`send_file`](Client::send_file).
    pub fn send_file_from_path(
        &self,
        peer_id: &str,
        path: &Path,
        mime_type: &str,
    ) -> Result<JoinHandle<Result<LogEntry>>> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        self.send_file(peer_id, &file_name, mime_type, bytes)
    }

    pub fn start_call(&self, peer_id: &str, with_video: bool) -> Result<()> {
        self.sessions.start_call(peer_id, with_video)
    }

    pub fn stop_call(&self, peer_id: &str) -> Result<()> {
        self.sessions.stop_call(peer_id)
    }

    // ---- voice rooms ----

    pub fn join_room(&self, channel_id: &str) -> RoomStatus {
        self.mesh.join_room(channel_id)
    }

    pub fn leave_room(&self) {
        self.mesh.leave_room()
    }

    pub fn set_muted(&self, muted: bool) {
        self.mesh.set_muted(muted)
    }

    pub fn set_video_enabled(&self, enabled: bool) {
        self.mesh.set_video_enabled(enabled)
    }

    pub fn room_snapshot(&self) -> RoomSnapshot {
        self.mesh.snapshot()
    }

    /// Ends every session, leaves the room and disconnects. Idempotent.
    pub fn shutdown(&mut self) {
        let Some(logic_thread) = self.logic_thread.take() else {
            return;
        };
        self.logger.info("Shutting down");

        self.sessions.end_all();
        self.mesh.leave_room();

        let _ = self.inbound.send(Inbound::Shutdown);
        if logic_thread.join().is_err() {
            self.logger.error("Logic thread panicked");
        }
        self.relay.close();
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shutdown();
    }
}
