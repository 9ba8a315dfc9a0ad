use eframe::egui::{self, Color32, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};
use nalgebra::{Rotation3, Vector3};

use crate::render::Scene;
use crate::state::{AppState, ShownStructure, ViewAngles};
use crate::structure::Vec3;
use crate::ui::panels;

/// Pixels per Å of covalent radius for atom markers.
const MARKER_SCALE: f32 = 6.0;

// ---------------------------------------------------------------------------
// Structure section (selector + trigger + viewer)
// ---------------------------------------------------------------------------

pub fn structure_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("View Crystal Structure (CIF)");

    for banner in &state.structure_banners {
        panels::banner(ui, banner);
    }
    if state.structures.materials.is_empty() {
        return;
    }

    ui.label("Select a material (only entries with `cif_available == 'yes'` are shown):");
    ui.horizontal(|ui: &mut Ui| {
        let materials = &state.structures.materials;
        let current = materials.get(state.selected).cloned().unwrap_or_default();
        egui::ComboBox::from_id_salt("material_with_cif")
            .selected_text(current)
            .width(280.0)
            .show_ui(ui, |ui: &mut Ui| {
                for (i, material) in materials.iter().enumerate() {
                    ui.selectable_value(&mut state.selected, i, material.as_str());
                }
            });

        if ui.button("🔍 View Structure").clicked() {
            state.view_selected();
        }
    });

    for banner in &state.viewer_banners {
        panels::banner(ui, banner);
    }

    if let Some(shown) = &state.shown {
        structure_view(ui, shown, &mut state.angles);
    }
}

// ---------------------------------------------------------------------------
// Projected scene
// ---------------------------------------------------------------------------

fn structure_view(ui: &mut Ui, shown: &ShownStructure, angles: &mut ViewAngles) {
    let scene = &shown.rendered.scene;

    ui.horizontal(|ui: &mut Ui| {
        ui.strong(shown.material.as_str());
        ui.label(format!(
            "{}  ·  V = {:.2} Å³  ·  {} atoms, {} bonds  ·  {} renderer",
            shown.formula,
            shown.volume,
            scene.atoms.len(),
            scene.bonds.len(),
            shown.rendered.renderer
        ));
    });
    ui.horizontal(|ui: &mut Ui| {
        ui.add(egui::Slider::new(&mut angles.yaw, -180.0..=180.0).text("yaw °"));
        ui.add(egui::Slider::new(&mut angles.pitch, -90.0..=90.0).text("pitch °"));
        if ui.small_button("Reset view").clicked() {
            *angles = ViewAngles::default();
        }
    });

    let projection = Projection::new(scene, *angles);

    Plot::new("structure_view")
        .legend(Legend::default())
        .data_aspect(1.0)
        .height(520.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for [a, b] in &scene.cell_edges {
                let points: PlotPoints = vec![projection.screen(a), projection.screen(b)].into();
                plot_ui.line(Line::new(points).color(Color32::DARK_GRAY).width(1.0));
            }

            for [a, b] in &scene.bonds {
                let points: PlotPoints = vec![projection.screen(a), projection.screen(b)].into();
                plot_ui.line(Line::new(points).color(Color32::LIGHT_GRAY).width(2.0));
            }

            // One series per species, far atoms first so near ones paint over.
            for species in scene.species() {
                let mut atoms: Vec<_> = scene
                    .atoms
                    .iter()
                    .filter(|a| a.species == species)
                    .collect();
                atoms.sort_by(|a, b| {
                    projection
                        .depth(&b.position)
                        .total_cmp(&projection.depth(&a.position))
                });
                let radius = atoms.first().map_or(1.0, |a| a.radius) as f32 * MARKER_SCALE;
                let points: PlotPoints = atoms
                    .iter()
                    .map(|a| projection.screen(&a.position))
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .name(species)
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(radius)
                        .color(shown.colors.color_for(species)),
                );
            }
        });
}

/// Orthographic projection about the scene centroid: rotate by yaw around z,
/// then pitch around the screen x axis, and look along +y.
struct Projection {
    center: Vec3,
    rotation: Rotation3<f64>,
}

impl Projection {
    fn new(scene: &Scene, angles: ViewAngles) -> Self {
        let yaw = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.yaw.to_radians());
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.pitch.to_radians());
        Self {
            center: scene.centroid(),
            rotation: pitch * yaw,
        }
    }

    fn rotate(&self, p: &Vec3) -> Vec3 {
        self.rotation * (p - self.center)
    }

    fn screen(&self, p: &Vec3) -> [f64; 2] {
        let r = self.rotate(p);
        [r.x, r.z]
    }

    /// Larger is farther from the viewer.
    fn depth(&self, p: &Vec3) -> f64 {
        self.rotate(p).y
    }
}
