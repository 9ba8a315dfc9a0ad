use super::cell::MAX_ATOMS;
use super::elements::{covalent_radius, DEFAULT_RADIUS};
use super::{bonds_by_distance, RenderError, Renderer, Scene, SceneAtom};
use crate::structure::{Structure, Vec3};

const BOND_TOLERANCE: f64 = 1.15;

/// Fallback renderer: converts the structure to XYZ text and draws sticks
/// between the atoms read back from it. No cell, no periodic images, and any
/// species is accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct XyzRenderer;

impl Renderer for XyzRenderer {
    fn name(&self) -> &'static str {
        "xyz"
    }

    fn render(&self, structure: &Structure) -> Result<Scene, RenderError> {
        if structure.sites.len() > MAX_ATOMS {
            return Err(RenderError::TooManyAtoms {
                count: structure.sites.len(),
                limit: MAX_ATOMS,
            });
        }
        let atoms = read_xyz(&structure.to_xyz())?;
        if atoms.is_empty() {
            return Err(RenderError::EmptyStructure);
        }
        let bonds = bonds_by_distance(&atoms, BOND_TOLERANCE);
        Ok(Scene {
            atoms,
            bonds,
            cell_edges: Vec::new(),
        })
    }
}

/// Read atoms from XYZ text: count line, comment line, `El x y z` lines.
pub fn read_xyz(text: &str) -> Result<Vec<SceneAtom>, RenderError> {
    let mut lines = text.lines();
    let count: usize = lines
        .next()
        .and_then(|l| l.trim().parse().ok())
        .ok_or_else(|| RenderError::Coordinates("missing atom count".to_string()))?;
    let _comment = lines.next();

    let mut atoms = Vec::with_capacity(count);
    for (i, line) in lines.take(count).enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [species, x, y, z] = fields.as_slice() else {
            return Err(RenderError::Coordinates(format!(
                "atom {}: expected 4 fields, got {}",
                i + 1,
                fields.len()
            )));
        };
        let coord = |s: &str| {
            s.parse::<f64>().map_err(|_| {
                RenderError::Coordinates(format!("atom {}: '{s}' is not a number", i + 1))
            })
        };
        atoms.push(SceneAtom {
            species: species.to_string(),
            position: Vec3::new(coord(x)?, coord(y)?, coord(z)?),
            radius: covalent_radius(species).unwrap_or(DEFAULT_RADIUS),
        });
    }

    if atoms.len() != count {
        return Err(RenderError::Coordinates(format!(
            "expected {count} atoms, found {}",
            atoms.len()
        )));
    }
    Ok(atoms)
}
