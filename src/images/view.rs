// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Per-frame view state and projections.
//!
//! The host hands a [`ViewState`] to every frame.  Matrices are recomputed from it
//! each frame and never cached.

use glam::{Mat4, Vec2, Vec3};

/// Window size and interaction state for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub window_size: (u32, u32),
    /// Orbit angles in radians: x turns about the y axis, y about the x axis.
    pub rotation: Vec2,
    /// `y` is the camera distance from the origin.
    pub translation: Vec2,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            window_size: (640, 480),
            rotation: Vec2::splat(std::f32::consts::PI * 0.2),
            translation: Vec2::new(0.0, 4.0),
        }
    }
}

impl ViewState {
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// The same view with the window no larger than `surface` on either axis.
    pub fn clamped_to(mut self, (width, height): (u32, u32)) -> Self {
        self.window_size = (
            self.window_size.0.min(width),
            self.window_size.1.min(height),
        );
        self
    }

    pub fn aspect(&self) -> f32 {
        aspect(self.window_size)
    }

    /// Camera transform: pull back by `translation.y`, then orbit.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.translation.y))
            * Mat4::from_rotation_x(self.rotation.y)
            * Mat4::from_rotation_y(self.rotation.x)
    }
}

pub(crate) fn aspect((width, height): (u32, u32)) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// How a frame's geometry reaches clip space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Right-handed perspective with a [0, 1] depth range, behind the view matrix.
    Perspective { fov_y: f32, near: f32, far: f32 },
    /// Vertex positions are already clip-space; projection and view are identity.
    ClipSpace,
}

impl Projection {
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match self {
            Projection::Perspective { fov_y, near, far } => {
                Mat4::perspective_rh(*fov_y, aspect, *near, *far)
            }
            Projection::ClipSpace => Mat4::IDENTITY,
        }
    }

    pub fn view(&self, view: &ViewState) -> Mat4 {
        match self {
            Projection::Perspective { .. } => view.view_matrix(),
            Projection::ClipSpace => Mat4::IDENTITY,
        }
    }

    /// `projection * view * model` for a target of `aspect`.
    pub fn transform(&self, aspect: f32, view: &ViewState, model: Mat4) -> Mat4 {
        self.matrix(aspect) * self.view(view) * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn clip_space_is_identity() {
        let m = Projection::ClipSpace.transform(2.0, &ViewState::default(), Mat4::IDENTITY);
        assert_eq!(m, Mat4::IDENTITY);
    }

    #[test]
    fn view_pulls_camera_back() {
        let view = ViewState {
            rotation: Vec2::ZERO,
            ..ViewState::default()
        };
        let p = view.view_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(p, Vec4::new(0.0, 0.0, -4.0, 1.0));
    }

    #[test]
    fn perspective_maps_near_plane_to_zero_depth() {
        let projection = Projection::Perspective {
            fov_y: std::f32::consts::FRAC_PI_4,
            near: 0.1,
            far: 100.0,
        };
        let clip = projection.matrix(1.0) * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);
    }

    #[test]
    fn aspect_handles_zero_height() {
        assert_eq!(aspect((640, 0)), 1.0);
        assert_eq!(ViewState::default().aspect(), 640.0 / 480.0);
    }

    #[test]
    fn clamping_only_shrinks() {
        let view = ViewState::default().with_window_size(1280, 300);
        assert_eq!(view.clamped_to((640, 480)).window_size, (640, 300));
        assert_eq!(view.clamped_to((2000, 2000)), view);
    }
}
