//! Immersive-session seam.
//!
//! The placement loop consumes exactly five session capabilities: reference-space requests,
//! hit-test-source requests, per-frame hit-test queries, pose resolution, and the
//! session-end notification. Requests are asynchronous: they hand back a `Pending<T>` that
//! is polled from the frame thread on later frames.

pub mod pending;
pub mod simulated;

use std::ops::Mul;

use glam::{Mat4, Quat, Vec3};

pub use pending::{Pending, Resolver, SessionEndSignal, pending};
pub use simulated::{SimulatedSession, SimulatedSessionConfig};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XrError {
    #[error("{what} request rejected: {reason}")]
    Rejected { what: &'static str, reason: String },

    #[error("request dropped before it resolved")]
    Dropped,

    #[error("session {0:?} has ended")]
    SessionEnded(SessionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSpaceType {
    /// Follows the viewer's head/camera.
    Viewer,
    /// Stationary, origin near the viewer's position at session start.
    Local,
}

impl ReferenceSpaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceSpaceType::Viewer => "viewer",
            ReferenceSpaceType::Local => "local",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceSpace {
    pub id: SpaceId,
    pub kind: ReferenceSpaceType,
    pub session: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTestSource {
    pub id: SourceId,
    /// Space the hit-test ray is anchored to.
    pub space: SpaceId,
    pub session: SessionId,
}

/// One surface intersection reported for a frame.
///
/// The pose is kept in the session's tracking origin; callers go through
/// `XrFrame::resolve_pose` to express it in a space of their choosing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTestResult {
    pub source: SourceId,
    pub(crate) native_pose: Pose,
}

impl HitTestResult {
    pub fn new(source: SourceId, native_pose: Pose) -> Self {
        Self {
            source,
            native_pose,
        }
    }
}

/// Rigid transform: position + orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub orientation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }

    /// Rigid part of `m`; scale is discarded.
    #[cfg(test)]
    pub fn from_matrix(m: Mat4) -> Self {
        let (_scale, orientation, position) = m.to_scale_rotation_translation();
        Self {
            position,
            orientation,
        }
    }

    pub fn inverse(&self) -> Self {
        let inv = self.orientation.inverse();
        Self {
            position: inv * -self.position,
            orientation: inv,
        }
    }

    /// Unit vector the pose looks along (its local -Z).
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

impl Mul for Pose {
    type Output = Pose;

    /// `a * b` applies `b` first, then `a`.
    fn mul(self, rhs: Pose) -> Pose {
        Pose {
            position: self.position + self.orientation * rhs.position,
            orientation: (self.orientation * rhs.orientation).normalize(),
        }
    }
}

/// An active immersive session.
pub trait XrSession {
    fn id(&self) -> SessionId;

    fn request_reference_space(&mut self, kind: ReferenceSpaceType) -> Pending<ReferenceSpace>;

    fn request_hit_test_source(&mut self, space: &ReferenceSpace) -> Pending<HitTestSource>;

    /// Fires once when the session ends (or is dropped).
    fn subscribe_end(&mut self) -> SessionEndSignal;
}

/// Per-frame state handed to the frame callback while a session is running.
pub trait XrFrame {
    fn session_id(&self) -> SessionId;

    fn session(&mut self) -> &mut dyn XrSession;

    /// Results for this frame, in the platform's order (first = best).
    fn hit_test_results(&self, source: &HitTestSource) -> Vec<HitTestResult>;

    fn resolve_pose(&self, hit: &HitTestResult, space: &ReferenceSpace) -> Option<Pose>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pose_inverse_cancels() {
        let p = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.9));
        let id = p * p.inverse();

        assert!(id.position.abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(id.orientation.abs_diff_eq(Quat::IDENTITY, 1e-5));
    }

    #[test]
    fn pose_composition_matches_matrices() {
        let a = Pose::new(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_x(0.3));
        let b = Pose::new(Vec3::new(2.0, 0.0, -1.0), Quat::from_rotation_z(-0.4));

        let composed = (a * b).matrix();
        assert!(composed.abs_diff_eq(a.matrix() * b.matrix(), 1e-5));
        assert!(
            Pose::from_matrix(composed)
                .position
                .abs_diff_eq((a * b).position, 1e-5)
        );
    }
}
