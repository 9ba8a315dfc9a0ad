/// Crystal structures: the in-memory model and the parser seam.
///
/// ```text
///  crystal_structure/<id>.cif
///        │
///        ▼
///   ┌──────────────────┐
///   │ StructureParser  │  CifParser
///   └──────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Structure │  Lattice + fractional sites, XYZ export
///   └──────────┘
/// ```
pub mod cif;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use nalgebra::{Matrix3, Vector3};

use crate::error::DashboardError;

pub type Vec3 = Vector3<f64>;
pub type Mat3 = Matrix3<f64>;

// ---------------------------------------------------------------------------
// Lattice
// ---------------------------------------------------------------------------

/// Unit cell as three row vectors (Å), `a` along x and `b` in the xy-plane.
#[derive(Debug, Clone, PartialEq)]
pub struct Lattice {
    pub matrix: Mat3,
}

impl Lattice {
    /// Build a lattice from cell lengths (Å) and angles (degrees).
    ///
    /// Returns `None` for non-positive lengths or angles that cannot close a
    /// cell.
    pub fn from_parameters(lengths: [f64; 3], angles_deg: [f64; 3]) -> Option<Self> {
        let [a, b, c] = lengths;
        if lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) {
            return None;
        }
        let [alpha, beta, gamma] = angles_deg.map(f64::to_radians);
        let (cos_a, cos_b, cos_g) = (alpha.cos(), beta.cos(), gamma.cos());
        let sin_g = gamma.sin();
        if sin_g.abs() < 1e-8 {
            return None;
        }

        let cx = cos_b;
        let cy = (cos_a - cos_b * cos_g) / sin_g;
        let cz_sq = 1.0 - cx * cx - cy * cy;
        if cz_sq <= 1e-12 {
            return None;
        }

        #[rustfmt::skip]
        let matrix = Mat3::new(
            a,         0.0,       0.0,
            b * cos_g, b * sin_g, 0.0,
            c * cx,    c * cy,    c * cz_sq.sqrt(),
        );
        Some(Lattice { matrix })
    }

    /// Fractional → Cartesian coordinates.
    pub fn to_cartesian(&self, frac: &Vec3) -> Vec3 {
        self.matrix.tr_mul(frac)
    }

    /// Cell volume in Å³.
    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// One atom position in the unit cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// Element symbol, e.g. `"Cu"`.
    pub species: String,
    /// Fractional coordinates in `[0, 1)`.
    pub frac: Vec3,
}

/// A periodic crystal structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub lattice: Lattice,
    pub sites: Vec<Site>,
}

impl Structure {
    /// Cartesian position of every site.
    pub fn cartesian_sites(&self) -> impl Iterator<Item = (&str, Vec3)> + '_ {
        self.sites
            .iter()
            .map(|s| (s.species.as_str(), self.lattice.to_cartesian(&s.frac)))
    }

    /// Site count per element in order of first appearance, e.g.
    /// `"Y1 Ba2 Cu3 O7"`.
    pub fn formula(&self) -> String {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for site in &self.sites {
            let count = counts.entry(site.species.as_str()).or_insert(0);
            if *count == 0 {
                order.push(site.species.as_str());
            }
            *count += 1;
        }
        order
            .iter()
            .map(|el| format!("{el}{}", counts[el]))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Export as XYZ text: atom count, a comment line, then `El x y z` in Å.
    pub fn to_xyz(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.sites.len());
        let _ = writeln!(out, "{}", self.formula());
        for (species, p) in self.cartesian_sites() {
            let _ = writeln!(out, "{species} {:.6} {:.6} {:.6}", p.x, p.y, p.z);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Parser seam
// ---------------------------------------------------------------------------

/// Turns a structure file into a [`Structure`].
pub trait StructureParser {
    fn parse_file(&self, path: &Path) -> Result<Structure, DashboardError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(a: f64) -> Lattice {
        Lattice::from_parameters([a, a, a], [90.0, 90.0, 90.0]).unwrap()
    }

    #[test]
    fn test_cubic_lattice() {
        let lattice = cubic(4.0);
        assert!((lattice.volume() - 64.0).abs() < 1e-9);
        let p = lattice.to_cartesian(&Vec3::new(0.5, 0.25, 1.0));
        assert!((p - Vec3::new(2.0, 1.0, 4.0)).norm() < 1e-9);
    }

    #[test]
    fn test_hexagonal_lattice_volume() {
        let lattice = Lattice::from_parameters([3.0, 3.0, 5.0], [90.0, 90.0, 120.0]).unwrap();
        let expected = 3.0 * 3.0 * 5.0 * (120f64.to_radians()).sin();
        assert!((lattice.volume() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_impossible_angles_rejected() {
        assert!(Lattice::from_parameters([1.0, 1.0, 1.0], [10.0, 10.0, 150.0]).is_none());
        assert!(Lattice::from_parameters([0.0, 1.0, 1.0], [90.0, 90.0, 90.0]).is_none());
    }

    #[test]
    fn test_xyz_export() {
        let structure = Structure {
            lattice: cubic(2.0),
            sites: vec![
                Site {
                    species: "Mg".into(),
                    frac: Vec3::zeros(),
                },
                Site {
                    species: "B".into(),
                    frac: Vec3::new(0.5, 0.5, 0.5),
                },
            ],
        };
        let xyz = structure.to_xyz();
        let lines: Vec<&str> = xyz.lines().collect();
        assert_eq!(lines[0], "2");
        assert_eq!(lines[1], "Mg1 B1");
        assert_eq!(lines[2], "Mg 0.000000 0.000000 0.000000");
        assert_eq!(lines[3], "B 1.000000 1.000000 1.000000");
    }
}
