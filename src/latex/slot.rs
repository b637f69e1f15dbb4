//! Single-slot bookkeeping for the render pipeline.

use super::artifact::RenderArtifact;

/// Whether a render only refreshes the preview or produces the final image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Preview,
    Final,
}

/// Snapshot of a dispatched render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub id: u64,
    pub kind: RenderKind,
    /// Formula text at dispatch time.
    pub formula: String,
    /// Process id of the compiler handling this request.
    pub pid: u32,
}

/// Holds at most one in-flight request and one completed preview artifact.
#[derive(Debug, Default)]
pub struct RenderSlot {
    in_flight: Option<RenderRequest>,
    completed: Option<RenderArtifact>,
}

impl RenderSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<&RenderRequest> {
        self.in_flight.as_ref()
    }

    /// Record `request` as outstanding. Hands it back if another one already is.
    pub fn begin(&mut self, request: RenderRequest) -> Result<(), RenderRequest> {
        if self.in_flight.is_some() {
            return Err(request);
        }
        self.in_flight = Some(request);
        Ok(())
    }

    /// Clear the outstanding request if it carries `id`.
    pub fn finish(&mut self, id: u64) -> Option<RenderRequest> {
        match &self.in_flight {
            Some(request) if request.id == id => self.in_flight.take(),
            _ => None,
        }
    }

    pub fn artifact(&self) -> Option<&RenderArtifact> {
        self.completed.as_ref()
    }

    /// Store a new artifact, returning the one it supersedes.
    pub fn replace(&mut self, artifact: RenderArtifact) -> Option<RenderArtifact> {
        self.completed.replace(artifact)
    }

    /// Drop the cached artifact.
    pub fn invalidate(&mut self) -> Option<RenderArtifact> {
        self.completed.take()
    }
}
