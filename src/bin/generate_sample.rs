use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// One demo material. `cell` is `[a, b, c, alpha, beta, gamma]`.
struct Material {
    id: &'static str,
    formula: &'static str,
    space_group: &'static str,
    tc: f64,
    structure: Option<Cif>,
}

struct Cif {
    cell: [f64; 6],
    symops: &'static [&'static str],
    sites: &'static [(&'static str, [f64; 3])],
    /// Listed as available but no file written.
    withhold: bool,
}

const IDENTITY: &[&str] = &["x,y,z"];
const BODY_CENTRED: &[&str] = &["x,y,z", "x+1/2,y+1/2,z+1/2"];

fn materials() -> Vec<Material> {
    vec![
        Material {
            id: "MgB2",
            formula: "MgB2",
            space_group: "P6/mmm",
            tc: 39.0,
            structure: Some(Cif {
                cell: [3.086, 3.086, 3.524, 90.0, 90.0, 120.0],
                symops: IDENTITY,
                sites: &[
                    ("Mg", [0.0, 0.0, 0.0]),
                    ("B", [1.0 / 3.0, 2.0 / 3.0, 0.5]),
                    ("B", [2.0 / 3.0, 1.0 / 3.0, 0.5]),
                ],
                withhold: false,
            }),
        },
        Material {
            id: "Nb",
            formula: "Nb",
            space_group: "Im-3m",
            tc: 9.25,
            structure: Some(Cif {
                cell: [3.3004, 3.3004, 3.3004, 90.0, 90.0, 90.0],
                symops: BODY_CENTRED,
                sites: &[("Nb", [0.0, 0.0, 0.0])],
                withhold: false,
            }),
        },
        Material {
            id: "Nb3Sn",
            formula: "Nb3Sn",
            space_group: "Pm-3n",
            tc: 18.3,
            structure: Some(Cif {
                cell: [5.29, 5.29, 5.29, 90.0, 90.0, 90.0],
                symops: IDENTITY,
                sites: &[
                    ("Sn", [0.0, 0.0, 0.0]),
                    ("Sn", [0.5, 0.5, 0.5]),
                    ("Nb", [0.25, 0.0, 0.5]),
                    ("Nb", [0.75, 0.0, 0.5]),
                    ("Nb", [0.5, 0.25, 0.0]),
                    ("Nb", [0.5, 0.75, 0.0]),
                    ("Nb", [0.0, 0.5, 0.25]),
                    ("Nb", [0.0, 0.5, 0.75]),
                ],
                withhold: false,
            }),
        },
        // Identifier with a space: stored on disk as `YBCO_123.cif`.
        Material {
            id: "YBCO 123",
            formula: "YBa2Cu3O7",
            space_group: "Pmmm",
            tc: 92.0,
            structure: Some(Cif {
                cell: [3.82, 3.89, 11.68, 90.0, 90.0, 90.0],
                symops: IDENTITY,
                sites: &[
                    ("Y", [0.5, 0.5, 0.5]),
                    ("Ba", [0.5, 0.5, 0.184]),
                    ("Ba", [0.5, 0.5, 0.816]),
                    ("Cu", [0.0, 0.0, 0.0]),
                    ("Cu", [0.0, 0.0, 0.355]),
                    ("Cu", [0.0, 0.0, 0.645]),
                    ("O", [0.0, 0.5, 0.0]),
                    ("O", [0.0, 0.0, 0.159]),
                    ("O", [0.0, 0.0, 0.841]),
                    ("O", [0.5, 0.0, 0.378]),
                    ("O", [0.5, 0.0, 0.622]),
                    ("O", [0.0, 0.5, 0.377]),
                    ("O", [0.0, 0.5, 0.623]),
                ],
                withhold: false,
            }),
        },
        Material {
            id: "H3S",
            formula: "H3S",
            space_group: "Im-3m",
            tc: 203.0,
            structure: Some(Cif {
                cell: [3.09, 3.09, 3.09, 90.0, 90.0, 90.0],
                symops: BODY_CENTRED,
                sites: &[("S", [0.0, 0.0, 0.0])],
                withhold: true,
            }),
        },
        Material { id: "Pb", formula: "Pb", space_group: "Fm-3m", tc: 7.2, structure: None },
        Material { id: "NbN", formula: "NbN", space_group: "Fm-3m", tc: 16.0, structure: None },
        Material { id: "K3C60", formula: "K3C60", space_group: "Fm-3m", tc: 19.3, structure: None },
        Material { id: "Hg-1223", formula: "HgBa2Ca2Cu3O8", space_group: "P4/mmm", tc: 133.0, structure: None },
    ]
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn cif_text(material: &Material, cif: &Cif) -> String {
    let mut out = String::new();
    let [a, b, c, alpha, beta, gamma] = cif.cell;
    // Writing into a String cannot fail.
    let _ = writeln!(out, "data_{}", material.id.replace(' ', "_"));
    let _ = writeln!(out, "_chemical_formula_sum '{}'", material.formula);
    let _ = writeln!(out, "_symmetry_space_group_name_H-M '{}'", material.space_group);
    let _ = writeln!(out, "_cell_length_a {a:.4}");
    let _ = writeln!(out, "_cell_length_b {b:.4}");
    let _ = writeln!(out, "_cell_length_c {c:.4}");
    let _ = writeln!(out, "_cell_angle_alpha {alpha:.1}");
    let _ = writeln!(out, "_cell_angle_beta {beta:.1}");
    let _ = writeln!(out, "_cell_angle_gamma {gamma:.1}");
    out.push_str("loop_\n_symmetry_equiv_pos_as_xyz\n");
    for op in cif.symops {
        let _ = writeln!(out, "'{op}'");
    }
    out.push_str("loop_\n_atom_site_label\n_atom_site_type_symbol\n");
    out.push_str("_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\n");
    for (i, (species, [x, y, z])) in cif.sites.iter().enumerate() {
        let _ = writeln!(out, "{species}{} {species} {x:.5} {y:.5} {z:.5}", i + 1);
    }
    out
}

fn write_composition(dir: &Path, materials: &[Material]) -> Result<()> {
    let path = dir.join("SAUVW_full_crysdata.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["material_id", "formula", "space_group", "Tc (K)", "cif_available"])?;
    for m in materials {
        let available = if m.structure.is_some() { "yes" } else { "no" };
        let tc = format!("{:.2}", m.tc);
        writer.write_record([m.id, m.formula, m.space_group, tc.as_str(), available])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_benchmark(dir: &Path, materials: &[Material], rng: &mut SimpleRng) -> Result<()> {
    let path = dir.join("SAUVW_Benchmark.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["material_id", "Tc_reported", "Tc_predicted", "abs_error"])?;
    for m in materials {
        let predicted = rng.gauss(m.tc, 0.08 * m.tc).max(0.0);
        writer.write_record([
            m.id.to_string(),
            format!("{:.2}", m.tc),
            format!("{predicted:.2}"),
            format!("{:.2}", (predicted - m.tc).abs()),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    let structure_dir = dir.join("crystal_structure");
    fs::create_dir_all(&structure_dir)
        .with_context(|| format!("creating {}", structure_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let materials = materials();

    write_composition(&dir, &materials)?;
    write_benchmark(&dir, &materials, &mut rng)?;

    let mut written = 0;
    for m in &materials {
        let Some(cif) = m.structure.as_ref().filter(|c| !c.withhold) else {
            continue;
        };
        let path = structure_dir.join(format!("{}.cif", m.id.replace(' ', "_")));
        fs::write(&path, cif_text(m, cif))
            .with_context(|| format!("writing {}", path.display()))?;
        written += 1;
    }

    println!(
        "Wrote {} materials and {written} CIF files to {}",
        materials.len(),
        dir.display()
    );
    Ok(())
}
