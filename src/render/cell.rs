use super::elements::covalent_radius;
use super::{bonds_by_distance, RenderError, Renderer, Scene, SceneAtom};
use crate::structure::{Structure, Vec3};

/// Largest scene (after boundary images) the cell renderer will build.
pub const MAX_ATOMS: usize = 2000;

/// Bond when the distance is below this multiple of the summed radii.
const BOND_TOLERANCE: f64 = 1.15;

/// Fractional distance from a face at which a site is repeated on the
/// opposite face.
const FACE_TOLERANCE: f64 = 1e-3;

/// Primary renderer: the unit cell with its edges, face-sharing periodic
/// images and radius-based bonds.
#[derive(Debug, Default, Clone, Copy)]
pub struct CellRenderer;

impl Renderer for CellRenderer {
    fn name(&self) -> &'static str {
        "unit-cell"
    }

    fn render(&self, structure: &Structure) -> Result<Scene, RenderError> {
        if structure.sites.is_empty() {
            return Err(RenderError::EmptyStructure);
        }

        let mut atoms = Vec::new();
        for site in &structure.sites {
            let radius = covalent_radius(&site.species)
                .ok_or_else(|| RenderError::UnsupportedSpecies(site.species.clone()))?;
            for frac in boundary_images(&site.frac) {
                atoms.push(SceneAtom {
                    species: site.species.clone(),
                    position: structure.lattice.to_cartesian(&frac),
                    radius,
                });
            }
            if atoms.len() > MAX_ATOMS {
                return Err(RenderError::TooManyAtoms {
                    count: atoms.len(),
                    limit: MAX_ATOMS,
                });
            }
        }

        let bonds = bonds_by_distance(&atoms, BOND_TOLERANCE);
        let cell_edges = cell_edges(structure);

        Ok(Scene {
            atoms,
            bonds,
            cell_edges,
        })
    }
}

/// The site itself plus copies shifted by +1 along every axis where it sits
/// on the cell face at 0.
fn boundary_images(frac: &Vec3) -> Vec<Vec3> {
    let mut images = vec![*frac];
    for axis in 0..3 {
        if frac[axis] < FACE_TOLERANCE {
            let step = Vec3::ith(axis, 1.0);
            let shifted: Vec<Vec3> = images.iter().map(|p| p + step).collect();
            images.extend(shifted);
        }
    }
    images
}

/// The 12 edges of the unit cell in Cartesian coordinates.
fn cell_edges(structure: &Structure) -> Vec<[Vec3; 2]> {
    let corner = |i: usize, j: usize, k: usize| {
        structure
            .lattice
            .to_cartesian(&Vec3::new(i as f64, j as f64, k as f64))
    };

    let mut edges = Vec::with_capacity(12);
    for a in 0..2 {
        for b in 0..2 {
            edges.push([corner(0, a, b), corner(1, a, b)]);
            edges.push([corner(a, 0, b), corner(a, 1, b)]);
            edges.push([corner(a, b, 0), corner(a, b, 1)]);
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Lattice, Site};

    fn structure(sites: Vec<Site>) -> Structure {
        Structure {
            lattice: Lattice::from_parameters([3.0, 3.0, 3.0], [90.0, 90.0, 90.0]).unwrap(),
            sites,
        }
    }

    fn site(species: &str, frac: Vec3) -> Site {
        Site {
            species: species.into(),
            frac,
        }
    }

    #[test]
    fn test_corner_atom_is_repeated_on_all_corners() {
        let scene = CellRenderer
            .render(&structure(vec![site("Nb", Vec3::zeros())]))
            .unwrap();
        assert_eq!(scene.atoms.len(), 8);
        assert_eq!(scene.cell_edges.len(), 12);
        // Corner atoms 3 Å apart, radius sum 3.28 Å → bonded along edges.
        assert_eq!(scene.bonds.len(), 12);
    }

    #[test]
    fn test_interior_atom_is_not_repeated() {
        let scene = CellRenderer
            .render(&structure(vec![site("Nb", Vec3::new(0.5, 0.5, 0.5))]))
            .unwrap();
        assert_eq!(scene.atoms.len(), 1);
        assert!(scene.bonds.is_empty());
    }

    #[test]
    fn test_unknown_species_fails() {
        let err = CellRenderer
            .render(&structure(vec![site("Xx", Vec3::new(0.5, 0.5, 0.5))]))
            .unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedSpecies(s) if s == "Xx"));
    }

    #[test]
    fn test_empty_structure_fails() {
        let err = CellRenderer.render(&structure(Vec::new())).unwrap_err();
        assert!(matches!(err, RenderError::EmptyStructure));
    }

    #[test]
    fn test_too_many_atoms_fails() {
        let sites = (0..MAX_ATOMS + 1)
            .map(|i| site("O", Vec3::new(0.5, 0.5, (i as f64 + 0.5) / (MAX_ATOMS as f64 + 2.0))))
            .collect();
        let err = CellRenderer.render(&structure(sites)).unwrap_err();
        assert!(matches!(err, RenderError::TooManyAtoms { .. }));
    }
}
