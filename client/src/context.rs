use std::sync::Arc;
use std::sync::mpsc::Sender;

use signaling_protocol::ParticipantId;

use crate::inbound::{Inbound, next_link_id, peer_event_handler};
use crate::peer::{PeerConnectionAdapter, Role, SignalScope};
use crate::error::PeerError;
use crate::transport::{
    Directory, ExclusiveCapture, PeerConnectionFactory, Profile, SignalingSink,
};

/// Collaborators shared by the session and voice managers.
#[derive(Clone)]
pub struct ClientContext {
    pub local_id: ParticipantId,
    pub signaling: Arc<dyn SignalingSink>,
    pub factory: Arc<dyn PeerConnectionFactory>,
    pub directory: Arc<dyn Directory>,
    pub capture: Arc<ExclusiveCapture>,
    /// Queue of the logic thread; peer callbacks are delivered through it.
    pub inbound: Sender<Inbound>,
    pub logger: logging::Logger,
}

impl ClientContext {
    /// Directory profile, or a placeholder when the lookup comes back empty.
    pub(crate) fn profile(&self, id: &str, logger: &logging::Logger) -> Profile {
        self.directory.lookup(id).unwrap_or_else(|| {
            logger.warn(&format!("No directory entry for {}, using placeholder", id));
            Profile::placeholder(id)
        })
    }

    pub(crate) fn connect(
        &self,
        peer_id: &str,
        scope: SignalScope,
        role: Role,
    ) -> Result<Arc<PeerConnectionAdapter>, PeerError> {
        let link_id = next_link_id();
        let handler = peer_event_handler(self.inbound.clone(), scope.clone(), peer_id, link_id);
        let connection = self.factory.create(peer_id, handler)?;

        Ok(Arc::new(PeerConnectionAdapter::new(
            peer_id,
            scope,
            role,
            link_id,
            connection,
            Arc::clone(&self.signaling),
            self.logger.for_component("Peer"),
        )))
    }
}
