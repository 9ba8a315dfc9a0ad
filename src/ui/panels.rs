use eframe::egui::{self, Color32, RichText, Ui};

use crate::error::{Banner, BannerLevel};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(format!("Data folder: {}", state.config.root.display()));

        ui.separator();
        let rows = |t: &crate::state::LoadedTable| t.table.as_ref().map_or(0, |t| t.len());
        ui.label(format!(
            "{} compositions, {} benchmark rows, {} with CIF",
            rows(&state.composition),
            rows(&state.benchmark),
            state.structures.materials.len()
        ));
    });
}

// ---------------------------------------------------------------------------
// Header / description / footer (static)
// ---------------------------------------------------------------------------

pub fn header(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        if let Some(logo) = state.config.logo_path() {
            let uri = format!("file://{}", logo.display());
            ui.add(
                egui::Image::new(uri)
                    .max_width(120.0)
                    .max_height(120.0)
                    .rounding(4.0),
            );
        }
        ui.vertical(|ui: &mut Ui| {
            ui.heading(
                RichText::new("Text Mined Crystal Structure Database of Superconductors")
                    .size(26.0)
                    .strong(),
            );
            ui.label("Suhas Adiga¹ ² and Umesh V. Waghmare¹");
            ui.small(
                "[1] Theoretical Sciences Unit, School of Advanced Materials (SAMat), JNCASR, Bengaluru 560064",
            );
            ui.small("[2] Chemistry and Physics of Materials Unit, JNCASR, Bengaluru 560064");
        });
    });
}

pub fn description(ui: &mut Ui) {
    ui.label("The dataset is generated through text mining and benchmarking of 60 research articles.");
    ui.label("A total of 461 compositions along with their Tc values were extracted.");
    ui.label("• 97 have full crystal structure information");
    ui.label("• 54 have CIF files");
    ui.label("• 77 contain partial information");
    ui.label("• 287 have no crystal structure data");
}

pub fn references(ui: &mut Ui) {
    ui.heading("References");
    ui.label("[1] Center for Basic Research on Materials, MDR SuperCon Datasheet, ver.240322 (2024).");
    ui.label("[2] K. M. Rabe et al., Phys. Rev. B 45, 7650 (1992).");
    ui.label("[3] D. Davies et al., J. Open Source Softw. 4, 1361 (2019).");
    ui.label("[4] V. Stanev et al., npj Comput. Mater. 4, 28 (2018).");
    ui.add_space(8.0);
    ui.small("Dashboard by Suhas Adiga, Theoretical Sciences Unit (TSU), JNCASR");
}

// ---------------------------------------------------------------------------
// Banners
// ---------------------------------------------------------------------------

/// Render an inline success/info/warning/error message.
pub fn banner(ui: &mut Ui, banner: &Banner) {
    let (fill, stroke, icon) = match banner.level {
        BannerLevel::Success => (Color32::from_rgb(220, 245, 225), Color32::DARK_GREEN, "✔"),
        BannerLevel::Info => (Color32::from_rgb(222, 235, 250), Color32::from_rgb(30, 80, 160), "ℹ"),
        BannerLevel::Warning => (Color32::from_rgb(252, 243, 210), Color32::from_rgb(150, 110, 0), "⚠"),
        BannerLevel::Error => (Color32::from_rgb(252, 222, 222), Color32::DARK_RED, "✖"),
    };

    egui::Frame::none()
        .fill(fill)
        .stroke(egui::Stroke::new(1.0, stroke))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui: &mut Ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(format!("{icon}  {}", banner.text)).color(stroke));
        });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open dataset folder")
        .set_directory(&state.config.root)
        .pick_folder();

    if let Some(path) = folder {
        state.set_root(path);
    }
}
