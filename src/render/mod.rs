/// Structure renderers and the ordered fallback chain that drives them.
///
/// A renderer turns a parsed [`Structure`] into a [`Scene`]: atoms, bonds and
/// cell edges in Cartesian space. The UI projects and paints the scene.
pub mod cell;
pub mod elements;
pub mod xyz;

use std::collections::BTreeSet;

use thiserror::Error;

use crate::structure::{Structure, Vec3};

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SceneAtom {
    pub species: String,
    pub position: Vec3,
    /// Radius in Å, used to size the marker.
    pub radius: f64,
}

/// Renderer output, in Å.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub atoms: Vec<SceneAtom>,
    pub bonds: Vec<[Vec3; 2]>,
    pub cell_edges: Vec<[Vec3; 2]>,
}

impl Scene {
    /// Distinct species present, sorted.
    pub fn species(&self) -> BTreeSet<&str> {
        self.atoms.iter().map(|a| a.species.as_str()).collect()
    }

    /// Geometric centre of all atoms (origin for an empty scene).
    pub fn centroid(&self) -> Vec3 {
        if self.atoms.is_empty() {
            return Vec3::zeros();
        }
        let sum: Vec3 = self.atoms.iter().map(|a| a.position).sum();
        sum / self.atoms.len() as f64
    }
}

/// Connect every pair of atoms closer than the sum of their radii times
/// `tolerance`.
pub(crate) fn bonds_by_distance(atoms: &[SceneAtom], tolerance: f64) -> Vec<[Vec3; 2]> {
    let mut bonds = Vec::new();
    for (i, a) in atoms.iter().enumerate() {
        for b in &atoms[i + 1..] {
            let d = (a.position - b.position).norm();
            if d > 0.1 && d < (a.radius + b.radius) * tolerance {
                bonds.push([a.position, b.position]);
            }
        }
    }
    bonds
}

// ---------------------------------------------------------------------------
// Renderer seam
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no radius known for species '{0}'")]
    UnsupportedSpecies(String),

    #[error("{count} atoms exceed the limit of {limit}")]
    TooManyAtoms { count: usize, limit: usize },

    #[error("structure has no atoms")]
    EmptyStructure,

    #[error("malformed coordinates: {0}")]
    Coordinates(String),

    #[error("{}", describe_failures(failures))]
    AllFailed {
        failures: Vec<(&'static str, RenderError)>,
    },
}

fn describe_failures(failures: &[(&'static str, RenderError)]) -> String {
    if failures.is_empty() {
        return "no renderer available".to_string();
    }
    failures
        .iter()
        .map(|(name, err)| format!("{name}: {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Turns a structure into a drawable scene.
pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&self, structure: &Structure) -> Result<Scene, RenderError>;
}

/// A successful render plus informational notes about earlier tiers that
/// failed.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub scene: Scene,
    pub renderer: &'static str,
    pub notes: Vec<String>,
}

/// Try each renderer in order; the first success wins.
///
/// Each renderer runs at most once. When all fail, every failure is returned.
pub fn render_with_fallback(
    renderers: &[&dyn Renderer],
    structure: &Structure,
) -> Result<Rendered, RenderError> {
    let mut failures: Vec<(&'static str, RenderError)> = Vec::new();

    for renderer in renderers {
        match renderer.render(structure) {
            Ok(scene) => {
                let notes = failures
                    .iter()
                    .map(|(name, err)| {
                        format!(
                            "{name} renderer unavailable ({err}), used {} instead",
                            renderer.name()
                        )
                    })
                    .collect();
                return Ok(Rendered {
                    scene,
                    renderer: renderer.name(),
                    notes,
                });
            }
            Err(err) => {
                log::warn!("{} renderer failed: {err}", renderer.name());
                failures.push((renderer.name(), err));
            }
        }
    }

    Err(RenderError::AllFailed { failures })
}

/// The default chain: unit-cell scene first, XYZ sticks as fallback.
pub fn default_renderers() -> [&'static dyn Renderer; 2] {
    [&cell::CellRenderer, &xyz::XyzRenderer]
}
