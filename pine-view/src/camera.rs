//! Orbit camera for the 3D viewport.

use glam::{Mat4, Vec3, Vec4Swizzles};
use pine_core::pick::Ray;

/// Clip-space `w` below which a point counts as behind the camera.
const MIN_CLIP_W: f32 = 1e-3;

pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    fovy_rad: f32,
    z_near: f32,
    z_far: f32,
    // input tuning
    orbit_sens: f32,
    zoom_sens: f32,
}

/// A world point mapped onto the viewport.
#[derive(Clone, Copy, Debug)]
pub struct Projected {
    pub pos: egui::Pos2,
    /// View-space distance along the camera's forward axis.
    pub depth: f32,
}

impl OrbitCamera {
    /// Camera looking at the origin from `distance` units down `+Z`.
    pub fn new(distance: f32) -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance,
            fovy_rad: 45.0_f32.to_radians(),
            z_near: 0.1,
            z_far: 1000.0,
            orbit_sens: 0.005,
            zoom_sens: 0.001,
        }
    }

    pub fn position(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw, self.pitch);
        self.target
            + Vec3::new(
                yaw.sin() * pitch.cos(),
                pitch.sin(),
                yaw.cos() * pitch.cos(),
            ) * self.distance
    }

    /// Drag in screen pixels orbits around `target`.
    pub fn orbit(&mut self, delta: egui::Vec2) {
        self.yaw -= delta.x * self.orbit_sens;
        self.pitch = (self.pitch + delta.y * self.orbit_sens).clamp(-1.55, 1.55);
    }

    /// Positive scroll moves closer.
    pub fn zoom(&mut self, scroll: f32) {
        let factor = (1.0 - scroll * self.zoom_sens).clamp(0.5, 2.0);
        self.distance = (self.distance * factor).clamp(self.z_near * 10.0, self.z_far * 0.9);
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fovy_rad, aspect, self.z_near, self.z_far)
    }

    /// Combined view-projection for a viewport. The aspect ratio is taken
    /// from `rect`, so resizing the window needs no extra bookkeeping.
    pub fn view_proj(&self, rect: egui::Rect) -> Mat4 {
        self.proj(aspect(rect)) * self.view()
    }

    /// Maps a world point into `rect`, or `None` if it is behind the camera.
    pub fn project(view_proj: &Mat4, p: Vec3, rect: egui::Rect) -> Option<Projected> {
        let clip = *view_proj * p.extend(1.0);
        if clip.w < MIN_CLIP_W {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Projected {
            pos: egui::pos2(
                rect.left() + (ndc.x + 1.0) * 0.5 * rect.width(),
                rect.top() + (1.0 - ndc.y) * 0.5 * rect.height(),
            ),
            depth: clip.w,
        })
    }

    /// World-space ray from the eye through a screen position.
    pub fn ray_through(&self, p: egui::Pos2, rect: egui::Rect) -> Ray {
        let x = (p.x - rect.left()) / rect.width() * 2.0 - 1.0;
        let y = 1.0 - (p.y - rect.top()) / rect.height() * 2.0;

        let inv = self.view_proj(rect).inverse();
        let near = inv.project_point3(Vec3::new(x, y, 0.0));
        let far = inv.project_point3(Vec3::new(x, y, 1.0));

        Ray::new(self.position(), far - near)
    }
}

fn aspect(rect: egui::Rect) -> f32 {
    if rect.height() > 0.0 {
        rect.width() / rect.height()
    } else {
        1.0
    }
}
