//! Interactive 3D pine tree viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the current tree, the shape
//! parameters it was built from and the camera, and implements [`eframe::App`]
//! to render the tree and let the user rebuild it or graft new branches.

use std::time::Instant;

use eframe::App;
use pine_core::{
    BuildError, PineTree, ShapeParameters, build,
    config::{BRANCHING_FACTOR_RANGE, RECURSION_DEPTH_RANGE},
    graft,
    pick::Ray,
    resources::CylinderMesh,
    types::NodeId,
};

use crate::{
    camera::OrbitCamera,
    render::{self, DirectionalLight, Frame},
};

/// Viewer tuning that is not part of the tree's shape.
#[derive(Clone, Copy, Debug)]
pub struct ViewConfig {
    pub camera_distance: f32,
    /// Whole-tree rotation about world `Y`, in radians per second.
    pub spin_rate: f32,
    pub light: DirectionalLight,
    /// Above this many triangles the tree is drawn as lines.
    pub max_mesh_triangles: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            camera_distance: 300.0,
            spin_rate: 0.06,
            light: DirectionalLight::default(),
            max_mesh_triangles: 200_000,
        }
    }
}

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The generation core: [`ShapeParameters`], [`build`], [`graft`] and [`PineTree`].
/// - UI state (camera, draft parameter values, spin toggle).
/// - eframe/egui callbacks for drawing and user interaction.
///
/// The typical per-frame update is:
/// 1. Handle panel edits; a finished edit rebuilds the tree via [`Viewer::commit`].
/// 2. Handle viewport input: drag orbits, scroll zooms, click grafts.
/// 3. Spin the tree and draw it.
///
/// ### Fields
/// - `params` - Parameters the current tree was built from.
/// - `tree` - The tree being displayed.
/// - `cylinder_mesh` - Tessellation of the shared branch geometry.
///
/// - `draft_branching` / `draft_depth` - Panel values not yet committed.
///
/// - `camera` - Orbit camera.
/// - `cfg` - Viewer tuning.
/// - `spinning` - Whether the tree rotates every frame.
///
/// - `last_build_ms` - Duration of the last successful build.
/// - `last_error` - Message of the last rejected rebuild or graft.
/// - `last_graft` - Node created by the last click, highlighted in the status bar.
pub struct Viewer {
    params: ShapeParameters,
    tree: PineTree,
    cylinder_mesh: CylinderMesh,

    draft_branching: u32,
    draft_depth: u32,

    camera: OrbitCamera,
    cfg: ViewConfig,
    spinning: bool,

    last_build_ms: f64,
    last_error: Option<String>,
    last_graft: Option<NodeId>,
}

impl Viewer {
    /// Creates a viewer showing a tree built from [`ShapeParameters::default`].
    ///
    /// ### Returns
    /// A fully-initialized [`Viewer`], or the [`BuildError`] of the initial
    /// build.
    pub fn new() -> Result<Self, BuildError> {
        Self::with_params(ShapeParameters::default(), ViewConfig::default())
    }

    pub fn with_params(params: ShapeParameters, cfg: ViewConfig) -> Result<Self, BuildError> {
        let started = Instant::now();
        let tree = build(&params)?;
        let last_build_ms = started.elapsed().as_secs_f64() * 1e3;
        log::info!("initial tree: {} nodes in {last_build_ms:.2} ms", tree.len());

        Ok(Self {
            cylinder_mesh: params.geometry.mesh(),
            draft_branching: params.branching_factor,
            draft_depth: params.recursion_depth,
            params,
            tree,
            camera: OrbitCamera::new(cfg.camera_distance),
            cfg,
            spinning: true,
            last_build_ms,
            last_error: None,
            last_graft: None,
        })
    }

    /// Rebuilds the tree with a new branching factor and recursion depth.
    ///
    /// The new tree is built completely before it replaces the current one.
    /// On failure the current tree and parameters stay as they were, the
    /// drafts snap back to the committed values and the error is shown in
    /// the status bar.
    pub fn commit(&mut self, branching_factor: u32, recursion_depth: u32) -> Result<(), BuildError> {
        let candidate = self.params.with_structure(branching_factor, recursion_depth);

        let started = Instant::now();
        match build(&candidate) {
            Ok(tree) => {
                self.last_build_ms = started.elapsed().as_secs_f64() * 1e3;
                log::info!(
                    "rebuilt tree: b = {branching_factor}, depth = {recursion_depth}, {} nodes in {:.2} ms",
                    tree.len(),
                    self.last_build_ms
                );
                self.tree = tree;
                self.params = candidate;
                self.last_error = None;
                self.last_graft = None;
                Ok(())
            }
            Err(err) => {
                log::warn!("rebuild rejected: {err}");
                self.last_error = Some(err.to_string());
                self.draft_branching = self.params.branching_factor;
                self.draft_depth = self.params.recursion_depth;
                Err(err)
            }
        }
    }

    /// Restores default parameters and camera.
    fn reset(&mut self) {
        let defaults = ShapeParameters::default();
        self.draft_branching = defaults.branching_factor;
        self.draft_depth = defaults.recursion_depth;
        self.camera = OrbitCamera::new(self.cfg.camera_distance);
        let rebuilt = self
            .commit(defaults.branching_factor, defaults.recursion_depth)
            .is_ok();
        debug_assert!(rebuilt, "default shape parameters must build");
    }

    /// Commits the drafts once the user has finished editing them.
    ///
    /// Nothing happens while an edit is still in progress or when the drafts
    /// match the committed parameters. A rejected build leaves its message in
    /// `last_error` (see [`Viewer::commit`]).
    ///
    /// ### Returns
    /// `true` if the tree was rebuilt.
    fn finish_edit(&mut self, finished: bool) -> bool {
        let changed = self.draft_branching != self.params.branching_factor
            || self.draft_depth != self.params.recursion_depth;
        finished && changed && self.commit(self.draft_branching, self.draft_depth).is_ok()
    }

    /// Casts `ray` into the tree and grafts a branch onto the first node hit.
    ///
    /// ### Returns
    /// The new node, or `None` if the ray hit nothing or the graft failed.
    fn graft_at(&mut self, ray: &Ray) -> Option<NodeId> {
        let hit = self.tree.raycast(ray)?;
        match graft(
            &mut self.tree,
            hit.node,
            hit.local_point,
            hit.local_normal,
            &self.params,
        ) {
            Ok(id) => {
                log::info!("grafted branch {id} onto node {}", hit.node);
                self.last_graft = Some(id);
                Some(id)
            }
            Err(err) => {
                log::warn!("graft rejected: {err}");
                self.last_error = Some(err.to_string());
                None
            }
        }
    }

    /// Helper to draw a labeled `u32` [`egui::DragValue`].
    ///
    /// Returns `true` once the user finishes editing: the drag is released or
    /// a typed value loses focus.
    fn labeled_drag_u32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut u32,
        range: std::ops::RangeInclusive<u32>,
    ) -> bool {
        ui.horizontal(|ui| {
            ui.label(label);
            let response = ui.add(egui::DragValue::new(value).range(range).speed(0.05));
            response.drag_stopped() || response.lost_focus()
        })
        .inner
    }

    fn readonly_row(ui: &mut egui::Ui, label: &str, value: String) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.monospace(value);
        });
    }

    /// Builds the top panel UI (spin toggle, reset).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.spinning { "⏸ Spin" } else { "▶ Spin" })
                    .clicked()
                {
                    self.spinning = !self.spinning;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.label("drag: orbit · scroll: zoom · click: graft");
            });
        });
    }

    /// Builds the bottom status bar (node counts, build time, last error).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("build = {:.2} ms", self.last_build_ms));
                ui.separator();
                ui.label(format!("nodes = {}", self.tree.len()));
                ui.label(format!("grafted = {}", self.tree.grafted_count()));
                if let Some(id) = self.last_graft {
                    ui.label(format!("last graft = #{id}"));
                }
                if let Some(err) = &self.last_error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });
        });
    }

    /// Builds the right-hand panel with the shape parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Shape");

                ui.separator();
                ui.label("Structure");
                let mut finished = Self::labeled_drag_u32(
                    ui,
                    "branching_factor:",
                    &mut self.draft_branching,
                    BRANCHING_FACTOR_RANGE,
                );
                finished |= Self::labeled_drag_u32(
                    ui,
                    "recursion_depth:",
                    &mut self.draft_depth,
                    RECURSION_DEPTH_RANGE,
                );
                self.finish_edit(finished);

                ui.separator();
                ui.label("Fixed");
                let p = &self.params;
                Self::readonly_row(ui, "base_radius:", format!("{:.2}", p.base_radius));
                Self::readonly_row(ui, "base_length:", format!("{:.1}", p.base_length));
                Self::readonly_row(
                    ui,
                    "branch_angle:",
                    format!("{:.1}°", p.branch_angle.to_degrees()),
                );
                Self::readonly_row(ui, "scaling_factor:", format!("{:.2}", p.scaling_factor));
                Self::readonly_row(
                    ui,
                    "length_padding:",
                    format!("{:.2}", p.branch_length_padding),
                );
            });
    }

    /// Builds the central 3D viewport.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Orbit with drag.
            if response.dragged() {
                self.camera.orbit(response.drag_delta());
            }

            // Zoom towards the target.
            if response.hovered() {
                let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    self.camera.zoom(scroll);
                }
            }

            // Graft on click.
            if response.clicked()
                && let Some(pos) = response.interact_pointer_pos()
            {
                let ray = self.camera.ray_through(pos, rect);
                self.graft_at(&ray);
            }

            if self.spinning {
                let dt = ctx.input(|i| i.stable_dt);
                self.tree.spin(self.cfg.spin_rate * dt);
                ctx.request_repaint();
            }

            let frame = Frame {
                rect,
                view_proj: self.camera.view_proj(rect),
                eye: self.camera.position(),
                light: self.cfg.light,
            };

            if render::triangle_estimate(&self.tree, &self.cylinder_mesh) <= self.cfg.max_mesh_triangles
            {
                let mesh = render::tree_mesh(&self.tree, &self.cylinder_mesh, &frame);
                painter.add(egui::Shape::mesh(mesh));
            } else {
                painter.extend(render::tree_skeleton(&self.tree, &frame));
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
