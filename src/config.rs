use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Name of the optional override file inside the data folder.
pub const CONFIG_FILE: &str = "dashboard.json";

/// Where the dashboard finds its inputs.
///
/// Every file name is relative to `root`. Any field missing from
/// `dashboard.json` keeps its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    #[serde(skip)]
    pub root: PathBuf,
    pub composition_file: String,
    pub benchmark_file: String,
    pub structure_dir: String,
    pub structure_extension: String,
    pub logo_candidates: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            composition_file: "SAUVW_full_crysdata.csv".to_string(),
            benchmark_file: "SAUVW_Benchmark.csv".to_string(),
            structure_dir: "crystal_structure".to_string(),
            structure_extension: "cif".to_string(),
            logo_candidates: ["LOGO.png", "LOGO.jpg", "LOGO.jpeg", "logo.png", "LOGO"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl DashboardConfig {
    /// Read `<root>/dashboard.json` if it exists, otherwise use defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        let mut config = if path.is_file() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<DashboardConfig>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            DashboardConfig::default()
        };
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Like [`load`](Self::load), but falls back to defaults on a bad file.
    pub fn load_or_default(root: &Path) -> Self {
        Self::load(root).unwrap_or_else(|e| {
            log::warn!("ignoring config: {e:#}");
            DashboardConfig {
                root: root.to_path_buf(),
                ..DashboardConfig::default()
            }
        })
    }

    pub fn composition_path(&self) -> PathBuf {
        self.root.join(&self.composition_file)
    }

    pub fn benchmark_path(&self) -> PathBuf {
        self.root.join(&self.benchmark_file)
    }

    pub fn structure_dir(&self) -> PathBuf {
        self.root.join(&self.structure_dir)
    }

    /// First logo candidate that exists in the root.
    pub fn logo_path(&self) -> Option<PathBuf> {
        self.logo_candidates
            .iter()
            .map(|name| self.root.join(name))
            .find(|p| p.is_file())
    }

    /// `path` relative to the root, for display.
    pub fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}
