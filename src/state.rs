use std::path::{Path, PathBuf};

use crate::color::SpeciesColors;
use crate::config::DashboardConfig;
use crate::data::loader::load_table;
use crate::data::locate::{resolve_structure_path, StructureIndex};
use crate::data::model::Table;
use crate::error::{Banner, DashboardError};
use crate::render::{default_renderers, render_with_fallback, Renderer, Rendered};
use crate::structure::cif::CifParser;
use crate::structure::StructureParser;

// ---------------------------------------------------------------------------
// Loaded dataset
// ---------------------------------------------------------------------------

/// One dataset section: the table if it loaded, otherwise the banner saying
/// why not.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub title: &'static str,
    pub file_name: String,
    pub table: Option<Table>,
    pub banner: Option<Banner>,
}

impl LoadedTable {
    pub fn load(title: &'static str, path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match load_table(path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows with columns {:?} from {}",
                    table.len(),
                    table.columns,
                    path.display()
                );
                LoadedTable {
                    title,
                    file_name,
                    table: Some(table),
                    banner: None,
                }
            }
            Err(e) => {
                let banner = match DashboardError::from(e) {
                    DashboardError::MissingFile { .. } => {
                        log::warn!("{} not found", path.display());
                        Banner::warning(format!(
                            "`{file_name}` not found in the data folder. Place it next to the other dataset files."
                        ))
                    }
                    other => {
                        log::error!("Failed to load {}: {other}", path.display());
                        Banner::error(format!("Failed to load `{file_name}`: {other}"))
                    }
                };
                LoadedTable {
                    title,
                    file_name,
                    table: None,
                    banner: Some(banner),
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Structure viewer
// ---------------------------------------------------------------------------

/// A structure that rendered successfully, ready to paint.
#[derive(Debug, Clone)]
pub struct ShownStructure {
    pub material: String,
    pub formula: String,
    /// Unit-cell volume in Å³.
    pub volume: f64,
    pub rendered: Rendered,
    pub colors: SpeciesColors,
}

/// View rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewAngles {
    pub yaw: f64,
    pub pitch: f64,
}

impl Default for ViewAngles {
    fn default() -> Self {
        Self {
            yaw: 30.0,
            pitch: 20.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. Rebuilt from disk by
/// [`AppState::reload`].
pub struct AppState {
    pub config: DashboardConfig,
    pub composition: LoadedTable,
    pub benchmark: LoadedTable,
    pub structures: StructureIndex,
    /// Locator messages (column detection, empty selection).
    pub structure_banners: Vec<Banner>,
    /// Index into `structures.materials`.
    pub selected: usize,
    /// Messages from the last view request.
    pub viewer_banners: Vec<Banner>,
    pub shown: Option<ShownStructure>,
    pub angles: ViewAngles,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let composition = LoadedTable::load("Full Crystal Data", &config.composition_path());
        let benchmark = LoadedTable::load("Benchmark Results", &config.benchmark_path());
        let mut state = Self {
            config,
            composition,
            benchmark,
            structures: StructureIndex::default(),
            structure_banners: Vec::new(),
            selected: 0,
            viewer_banners: Vec::new(),
            shown: None,
            angles: ViewAngles::default(),
        };
        state.locate_structures();
        state
    }

    /// Re-read every input from disk and reset the viewer.
    pub fn reload(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Switch to another data folder and reload.
    pub fn set_root(&mut self, root: PathBuf) {
        log::info!("Switching data folder to {}", root.display());
        *self = Self::new(DashboardConfig::load_or_default(&root));
    }

    fn locate_structures(&mut self) {
        self.structure_banners.clear();

        if let Some(table) = &self.composition.table {
            self.structures = StructureIndex::from_table(table);
            if let Some(err) = self.structures.detection_error() {
                log::warn!("{err}");
                self.structure_banners.push(Banner::warning(format!(
                    "{err}. Please ensure there is a column like 'Material-ID'."
                )));
            }
        }

        if self.structures.materials.is_empty() {
            self.structure_banners.push(Banner::info(format!(
                "No CIFs detected in the table (or `cif_available` != 'yes'). Ensure `{}/<material-id>.{}` exists and `cif_available` is 'yes'.",
                self.config.structure_dir, self.config.structure_extension
            )));
        } else {
            log::info!(
                "{} materials have a structure file ({:?} / {:?})",
                self.structures.materials.len(),
                self.structures.id_column,
                self.structures.availability_column
            );
        }
    }

    /// The currently selected identifier.
    pub fn selected_material(&self) -> Option<&str> {
        self.structures
            .materials
            .get(self.selected)
            .map(String::as_str)
    }

    /// Look up, parse and render the selected material with the default
    /// collaborators.
    pub fn view_selected(&mut self) {
        let Some(material) = self.selected_material().map(str::to_string) else {
            return;
        };
        self.view_structure(&material, &CifParser, &default_renderers());
    }

    /// resolve → parse → render, each failure becoming a banner.
    pub fn view_structure(
        &mut self,
        material: &str,
        parser: &dyn StructureParser,
        renderers: &[&dyn Renderer],
    ) {
        self.viewer_banners.clear();
        self.shown = None;

        let structure_dir = self.config.structure_dir();
        let extension = self.config.structure_extension.as_str();
        let path = match resolve_structure_path(&structure_dir, material, extension) {
            Ok(path) => path,
            Err(e) => {
                log::warn!("{material}: {e}");
                let text = match &e {
                    DashboardError::MissingFile { path } => format!(
                        "CIF file not found at `{}`. Ensure the CIF is present at `{}/{material}.{extension}`",
                        self.config.relative(path).display(),
                        self.config.structure_dir,
                    ),
                    other => other.to_string(),
                };
                self.viewer_banners.push(Banner::error(text));
                return;
            }
        };

        log::info!("{material}: resolved {}", path.display());
        self.viewer_banners.push(Banner::success(format!(
            "Found CIF: `{}`",
            self.config.relative(&path).display()
        )));

        let structure = match parser.parse_file(&path) {
            Ok(structure) => structure,
            Err(e) => {
                log::error!("{e}");
                self.viewer_banners.push(Banner::from(&e));
                return;
            }
        };

        match render_with_fallback(renderers, &structure) {
            Ok(rendered) => {
                self.viewer_banners
                    .extend(rendered.notes.iter().map(|note| Banner::info(note.as_str())));
                let colors = SpeciesColors::new(&rendered.scene.species());
                self.shown = Some(ShownStructure {
                    material: material.to_string(),
                    formula: structure.formula(),
                    volume: structure.lattice.volume(),
                    rendered,
                    colors,
                });
            }
            Err(e) => {
                let err = DashboardError::Render {
                    message: e.to_string(),
                };
                log::error!("{material}: {err}");
                self.viewer_banners.push(Banner::from(&err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BannerLevel;
    use crate::render::{RenderError, Scene};
    use crate::structure::Structure;
    use std::cell::Cell;

    const CUBIC_CIF: &str = "data_test\n_cell_length_a 4.0\n_cell_length_b 4.0\n_cell_length_c 4.0\n\
        _cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\n\
        loop_\n_atom_site_label\n_atom_site_type_symbol\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\n\
        Nb1 Nb 0 0 0\nNb2 Nb 0.5 0.5 0.5\n";

    struct Counting {
        calls: Cell<usize>,
    }

    impl Renderer for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }
        fn render(&self, _: &Structure) -> Result<Scene, RenderError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Scene::default())
        }
    }

    fn data_folder() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("SAUVW_full_crysdata.csv"),
            "Material-ID,Composition,Tc,cif_available\n\
             Mat 1,Nb,9.2,yes\n\
             Mat 2,NbTi,10.0, Yes \n\
             Mat 3,MgB2,39,no\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("SAUVW_Benchmark.csv"),
            "model,mae\nbaseline,4.2\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("crystal_structure")).unwrap();
        std::fs::write(dir.path().join("crystal_structure/Mat_1.cif"), CUBIC_CIF).unwrap();
        dir
    }

    fn state_for(dir: &tempfile::TempDir) -> AppState {
        AppState::new(DashboardConfig::load(dir.path()).unwrap())
    }

    #[test]
    fn test_load_populates_tables_and_materials() {
        let dir = data_folder();
        let state = state_for(&dir);

        assert_eq!(state.composition.table.as_ref().unwrap().len(), 3);
        assert_eq!(state.benchmark.table.as_ref().unwrap().len(), 1);
        assert!(state.composition.banner.is_none());
        assert_eq!(state.structures.materials, vec!["Mat 1", "Mat 2"]);
        assert!(state.structure_banners.is_empty());
        assert_eq!(state.selected_material(), Some("Mat 1"));
    }

    #[test]
    fn test_missing_dataset_is_a_warning_not_a_failure() {
        let dir = data_folder();
        std::fs::remove_file(dir.path().join("SAUVW_Benchmark.csv")).unwrap();
        let state = state_for(&dir);

        let banner = state.benchmark.banner.as_ref().unwrap();
        assert_eq!(banner.level, BannerLevel::Warning);
        assert!(banner.text.contains("SAUVW_Benchmark.csv"));
        assert!(state.composition.table.is_some());
    }

    #[test]
    fn test_malformed_dataset_is_an_error_banner() {
        let dir = data_folder();
        std::fs::write(dir.path().join("SAUVW_Benchmark.csv"), "a,b\n1,2,3\n").unwrap();
        let state = state_for(&dir);
        assert_eq!(
            state.benchmark.banner.as_ref().unwrap().level,
            BannerLevel::Error
        );
    }

    #[test]
    fn test_missing_id_column_warns() {
        let dir = data_folder();
        std::fs::write(
            dir.path().join("SAUVW_full_crysdata.csv"),
            "Composition,cif_available\nNb,yes\n",
        )
        .unwrap();
        let state = state_for(&dir);
        assert!(state.structures.materials.is_empty());
        assert_eq!(state.structure_banners[0].level, BannerLevel::Warning);
        assert_eq!(state.structure_banners[1].level, BannerLevel::Info);
    }

    #[test]
    fn test_view_resolves_underscore_variant_and_renders() {
        let dir = data_folder();
        let mut state = state_for(&dir);
        state.view_selected();

        assert_eq!(state.viewer_banners[0].level, BannerLevel::Success);
        assert!(state.viewer_banners[0].text.contains("Mat_1.cif"));
        let shown = state.shown.as_ref().unwrap();
        assert_eq!(shown.material, "Mat 1");
        assert_eq!(shown.rendered.renderer, "unit-cell");
        assert_eq!(shown.formula, "Nb2");
        assert!((shown.volume - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_missing_file_invokes_no_renderer() {
        let dir = data_folder();
        let mut state = state_for(&dir);
        let renderer = Counting {
            calls: Cell::new(0),
        };

        state.view_structure("Mat 2", &CifParser, &[&renderer]);

        assert_eq!(renderer.calls.get(), 0);
        assert!(state.shown.is_none());
        assert_eq!(state.viewer_banners.len(), 1);
        assert_eq!(state.viewer_banners[0].level, BannerLevel::Error);
        assert!(state.viewer_banners[0].text.contains("Mat 2.cif"));
    }

    #[test]
    fn test_view_parse_error_invokes_no_renderer() {
        let dir = data_folder();
        std::fs::write(dir.path().join("crystal_structure/Mat 2.cif"), "data_x\n").unwrap();
        let mut state = state_for(&dir);
        let renderer = Counting {
            calls: Cell::new(0),
        };

        state.view_structure("Mat 2", &CifParser, &[&renderer]);

        assert_eq!(renderer.calls.get(), 0);
        assert_eq!(state.viewer_banners.last().unwrap().level, BannerLevel::Error);
    }

    #[test]
    fn test_reload_resets_viewer() {
        let dir = data_folder();
        let mut state = state_for(&dir);
        state.view_selected();
        assert!(state.shown.is_some());

        state.reload();
        assert!(state.shown.is_none());
        assert!(state.viewer_banners.is_empty());
    }
}
