//! Desktop stand-in for an AR session.
//!
//! The "real world" is a single horizontal floor plane. The host steers the viewer (mouse
//! aim or a scripted sweep); the hit-test ray runs along the viewer's forward axis.
//! Requests resolve on the next `begin_frame`, like promises settling between frames.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;

use glam::{EulerRot, Quat, Vec3};

use crate::engine::xr::{
    HitTestResult, HitTestSource, Pending, Pose, ReferenceSpace, ReferenceSpaceType, Resolver,
    SessionEndSignal, SessionId, SourceId, SpaceId, XrError, XrFrame, XrSession, pending,
};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy)]
pub struct SimulatedSessionConfig {
    /// Height of the floor in the local space (the origin sits at head height).
    pub floor_height: f32,
    /// Hits further than this along the ray are not reported.
    pub max_distance: f32,
    pub initial_viewer: Pose,
}

impl Default for SimulatedSessionConfig {
    fn default() -> Self {
        Self {
            floor_height: -1.4,
            max_distance: 10.0,
            initial_viewer: Pose::new(Vec3::ZERO, Quat::from_rotation_x(-35f32.to_radians())),
        }
    }
}

/// Record of what the session was asked for, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    ReferenceSpace(ReferenceSpaceType),
    HitTestSource,
}

type Delivery = Box<dyn FnOnce()>;

pub struct SimulatedSession {
    id: SessionId,
    config: SimulatedSessionConfig,
    viewer: Pose,

    next_handle: u64,
    spaces: HashMap<SpaceId, ReferenceSpaceType>,
    sources: HashMap<SourceId, SpaceId>,

    queued: Vec<Delivery>,
    end_subscribers: Vec<Sender<()>>,
    ended: bool,

    /// While set, queued requests stay unresolved across frames.
    pub hold_requests: bool,
    /// Number of upcoming requests to reject.
    pub reject_next: u32,

    requests: Vec<SessionRequest>,
}

impl std::fmt::Debug for SimulatedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedSession")
            .field("id", &self.id)
            .field("viewer", &self.viewer)
            .field("queued", &self.queued.len())
            .field("ended", &self.ended)
            .field("requests", &self.requests.len())
            .finish()
    }
}

impl Default for SimulatedSession {
    fn default() -> Self {
        Self::new(SimulatedSessionConfig::default())
    }
}

impl SimulatedSession {
    pub fn new(config: SimulatedSessionConfig) -> Self {
        let id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        log::info!("simulated AR session {:?} started", id);
        Self {
            id,
            config,
            viewer: config.initial_viewer,
            next_handle: 1,
            spaces: HashMap::new(),
            sources: HashMap::new(),
            queued: Vec::new(),
            end_subscribers: Vec::new(),
            ended: false,
            hold_requests: false,
            reject_next: 0,
            requests: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn viewer(&self) -> Pose {
        self.viewer
    }

    /// Point the viewer by yaw (around +Y) and pitch (around +X), radians.
    pub fn aim(&mut self, yaw: f32, pitch: f32) {
        self.viewer.orientation = Quat::from_euler(EulerRot::YXZ, yaw, pitch, 0.0);
    }

    #[cfg(test)]
    pub fn requests(&self) -> &[SessionRequest] {
        &self.requests
    }

    /// Settle requests made during earlier frames. Call once at the top of each frame.
    pub fn begin_frame(&mut self) {
        if self.hold_requests || self.ended {
            return;
        }
        for deliver in std::mem::take(&mut self.queued) {
            deliver();
        }
    }

    pub fn frame(&mut self) -> SimulatedFrame<'_> {
        SimulatedFrame { session: self }
    }

    /// End the session: outstanding requests are dropped (their `Pending` reads as
    /// rejected), handles become invalid, and end subscribers fire.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.queued.clear();
        self.spaces.clear();
        self.sources.clear();
        for tx in self.end_subscribers.drain(..) {
            let _ = tx.send(());
        }
        log::info!("simulated AR session {:?} ended", self.id);
    }

    fn alloc_handle(&mut self) -> u64 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    /// Queue a delivery, or an immediate rejection if the session is over / a rejection
    /// was injected.
    fn settle_later<T: 'static>(
        &mut self,
        what: &'static str,
        produce: impl FnOnce(&mut Self) -> T,
    ) -> Pending<T> {
        if self.ended {
            return Pending::rejected(XrError::SessionEnded(self.id));
        }

        let (resolver, pending): (Resolver<T>, Pending<T>) = pending();
        if self.reject_next > 0 {
            self.reject_next -= 1;
            let reason = "simulated rejection".to_string();
            self.queued
                .push(Box::new(move || resolver.reject(XrError::Rejected { what, reason })));
        } else {
            let value = produce(self);
            self.queued.push(Box::new(move || resolver.resolve(value)));
        }
        pending
    }

    fn cast(&self, source: &HitTestSource) -> Option<Pose> {
        let anchor = self.sources.get(&source.id)?;
        let origin_pose = match self.spaces.get(anchor)? {
            ReferenceSpaceType::Viewer => self.viewer,
            ReferenceSpaceType::Local => Pose::IDENTITY,
        };

        let origin = origin_pose.position;
        let dir = origin_pose.forward();
        if dir.y.abs() < 1e-6 {
            return None;
        }

        let t = (self.config.floor_height - origin.y) / dir.y;
        if t <= 0.0 || t > self.config.max_distance {
            return None;
        }

        let point = origin + dir * t;
        let to_viewer = self.viewer.position - point;
        let yaw = to_viewer.x.atan2(to_viewer.z);
        Some(Pose::new(point, Quat::from_rotation_y(yaw)))
    }
}

impl XrSession for SimulatedSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn request_reference_space(&mut self, kind: ReferenceSpaceType) -> Pending<ReferenceSpace> {
        self.requests.push(SessionRequest::ReferenceSpace(kind));
        let session = self.id;
        self.settle_later("reference space", |s| {
            let id = SpaceId(s.alloc_handle());
            s.spaces.insert(id, kind);
            ReferenceSpace { id, kind, session }
        })
    }

    fn request_hit_test_source(&mut self, space: &ReferenceSpace) -> Pending<HitTestSource> {
        self.requests.push(SessionRequest::HitTestSource);
        if space.session != self.id || !self.spaces.contains_key(&space.id) {
            return Pending::rejected(XrError::Rejected {
                what: "hit-test source",
                reason: format!("space {:?} does not belong to this session", space.id),
            });
        }

        let session = self.id;
        let anchor = space.id;
        self.settle_later("hit-test source", |s| {
            let id = SourceId(s.alloc_handle());
            s.sources.insert(id, anchor);
            HitTestSource {
                id,
                space: anchor,
                session,
            }
        })
    }

    fn subscribe_end(&mut self) -> SessionEndSignal {
        let (tx, signal) = SessionEndSignal::channel(self.id);
        if self.ended {
            let _ = tx.send(());
        } else {
            self.end_subscribers.push(tx);
        }
        signal
    }
}

pub struct SimulatedFrame<'a> {
    session: &'a mut SimulatedSession,
}

impl XrFrame for SimulatedFrame<'_> {
    fn session_id(&self) -> SessionId {
        self.session.id
    }

    fn session(&mut self) -> &mut dyn XrSession {
        &mut *self.session
    }

    fn hit_test_results(&self, source: &HitTestSource) -> Vec<HitTestResult> {
        if self.session.ended || source.session != self.session.id {
            return Vec::new();
        }
        self.session
            .cast(source)
            .map(|pose| HitTestResult::new(source.id, pose))
            .into_iter()
            .collect()
    }

    fn resolve_pose(&self, hit: &HitTestResult, space: &ReferenceSpace) -> Option<Pose> {
        if space.session != self.session.id {
            return None;
        }
        match self.session.spaces.get(&space.id)? {
            ReferenceSpaceType::Local => Some(hit.native_pose),
            ReferenceSpaceType::Viewer => Some(self.session.viewer.inverse() * hit.native_pose),
        }
    }
}
