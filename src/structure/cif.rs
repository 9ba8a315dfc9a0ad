use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use super::{Lattice, Mat3, Site, Structure, StructureParser, Vec3};
use crate::error::DashboardError;

/// Fractional-space tolerance when merging symmetry images of a site.
const SITE_TOLERANCE: f64 = 1e-3;

const SYMOP_TAGS: [&str; 2] = [
    "_symmetry_equiv_pos_as_xyz",
    "_space_group_symop_operation_xyz",
];

#[derive(Debug, Error, PartialEq)]
pub enum CifError {
    #[error("line {line}: unterminated text field")]
    UnterminatedTextField { line: usize },

    #[error("tag {tag} has no value")]
    MissingValue { tag: String },

    #[error("value '{value}' outside of a tag or loop")]
    StrayValue { value: String },

    #[error("loop with {tags} tags has {values} values")]
    RaggedLoop { tags: usize, values: usize },

    #[error("missing {0}")]
    MissingItem(&'static str),

    #[error("invalid number '{value}' for {tag}")]
    InvalidNumber { tag: String, value: String },

    #[error("cell parameters do not describe a valid lattice")]
    InvalidCell,

    #[error("invalid symmetry operation '{0}'")]
    InvalidSymmetryOperation(String),

    #[error("no atom sites")]
    NoSites,
}

/// Reads CIF files: cell, atom sites and symmetry of the first data block
/// that describes a structure.
#[derive(Debug, Default, Clone, Copy)]
pub struct CifParser;

impl StructureParser for CifParser {
    fn parse_file(&self, path: &Path) -> Result<Structure, DashboardError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DashboardError::MissingFile {
                path: path.to_path_buf(),
            },
            _ => DashboardError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        })?;

        let structure = parse_cif(&text).map_err(|e| DashboardError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        log::info!(
            "parsed {} with {} sites ({})",
            path.display(),
            structure.sites.len(),
            structure.formula()
        );
        Ok(structure)
    }
}

/// Parse CIF text into a [`Structure`], expanding symmetry equivalents.
///
/// Blocks are tried in order and the first one that yields a structure wins,
/// so a leading metadata block (`data_global`) is skipped. When none does,
/// the error comes from the first block carrying cell or site data.
pub fn parse_cif(text: &str) -> Result<Structure, CifError> {
    let blocks = parse_blocks(&tokenize(text)?)?;

    let mut failure: Option<(bool, CifError)> = None;
    for block in &blocks {
        match block.structure() {
            Ok(structure) => return Ok(structure),
            Err(e) => {
                let relevant = block.describes_structure();
                if failure.as_ref().map_or(true, |(had, _)| relevant && !had) {
                    failure = Some((relevant, e));
                }
            }
        }
    }
    Err(failure.map_or(CifError::MissingItem("_cell_length_a"), |(_, e)| e))
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Data,
    Loop,
    Tag(String),
    Value(String),
}

fn tokenize(text: &str) -> Result<Vec<Token>, CifError> {
    let mut tokens = Vec::new();
    let mut lines = text.lines().enumerate();

    while let Some((line_no, line)) = lines.next() {
        // Semicolon text field: runs until a line starting with ';'.
        if let Some(first) = line.strip_prefix(';') {
            let mut field = vec![first.trim_end()];
            let mut closed = false;
            for (_, next) in lines.by_ref() {
                if next.starts_with(';') {
                    closed = true;
                    break;
                }
                field.push(next);
            }
            if !closed {
                return Err(CifError::UnterminatedTextField { line: line_no + 1 });
            }
            tokens.push(Token::Value(field.join("\n").trim().to_string()));
            continue;
        }

        let mut rest = line;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() || rest.starts_with('#') {
                break;
            }

            let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"');
            if let Some(q) = quote {
                // A closing quote only counts when followed by whitespace or EOL.
                let body = &rest[1..];
                let end = body
                    .char_indices()
                    .find(|(i, c)| {
                        *c == q
                            && body[i + 1..]
                                .chars()
                                .next()
                                .map_or(true, char::is_whitespace)
                    })
                    .map(|(i, _)| i)
                    .unwrap_or(body.len());
                tokens.push(Token::Value(body[..end].to_string()));
                rest = body.get(end + 1..).unwrap_or("");
                continue;
            }

            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            let word = &rest[..end];
            rest = &rest[end..];

            let lower = word.to_ascii_lowercase();
            if word.starts_with('_') {
                // `_atom_site.fract_x` (DDLm) and `_atom_site_fract_x` name the same item.
                tokens.push(Token::Tag(lower.replace('.', "_")));
            } else if lower == "loop_" {
                tokens.push(Token::Loop);
            } else if lower.starts_with("data_") {
                tokens.push(Token::Data);
            } else {
                tokens.push(Token::Value(word.to_string()));
            }
        }
    }

    Ok(tokens)
}

// ---------------------------------------------------------------------------
// Data block
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Block {
    items: HashMap<String, String>,
    loops: Vec<Loop>,
}

#[derive(Debug)]
struct Loop {
    tags: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Loop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }
}

/// Split the token stream into data blocks, collecting items and loops.
fn parse_blocks(tokens: &[Token]) -> Result<Vec<Block>, CifError> {
    let mut blocks = Vec::new();
    let mut block = Block::default();
    let mut i = 0;

    while i < tokens.len() {
        match &tokens[i] {
            Token::Data => {
                if !block.is_empty() {
                    blocks.push(std::mem::take(&mut block));
                }
                i += 1;
            }
            Token::Loop => {
                i += 1;
                let mut tags = Vec::new();
                while let Some(Token::Tag(tag)) = tokens.get(i) {
                    tags.push(tag.clone());
                    i += 1;
                }
                let mut values = Vec::new();
                while let Some(Token::Value(value)) = tokens.get(i) {
                    values.push(value.clone());
                    i += 1;
                }
                if tags.is_empty() || values.len() % tags.len() != 0 {
                    return Err(CifError::RaggedLoop {
                        tags: tags.len(),
                        values: values.len(),
                    });
                }
                let rows = values.chunks(tags.len()).map(<[String]>::to_vec).collect();
                block.loops.push(Loop { tags, rows });
            }
            Token::Tag(tag) => match tokens.get(i + 1) {
                Some(Token::Value(value)) => {
                    block.items.insert(tag.clone(), value.clone());
                    i += 2;
                }
                _ => return Err(CifError::MissingValue { tag: tag.clone() }),
            },
            Token::Value(value) => {
                return Err(CifError::StrayValue {
                    value: value.clone(),
                })
            }
        }
    }

    if !block.is_empty() || blocks.is_empty() {
        blocks.push(block);
    }
    Ok(blocks)
}

impl Block {
    fn is_empty(&self) -> bool {
        self.items.is_empty() && self.loops.is_empty()
    }

    /// Has any cell parameter or an atom-site loop.
    fn describes_structure(&self) -> bool {
        self.items.keys().any(|k| k.starts_with("_cell_length_"))
            || self.loops.iter().any(|l| l.column("_atom_site_fract_x").is_some())
    }

    fn structure(&self) -> Result<Structure, CifError> {
        let lengths = [
            self.number("_cell_length_a")?,
            self.number("_cell_length_b")?,
            self.number("_cell_length_c")?,
        ];
        let angles = [
            self.number("_cell_angle_alpha")?,
            self.number("_cell_angle_beta")?,
            self.number("_cell_angle_gamma")?,
        ];
        let lattice = Lattice::from_parameters(lengths, angles).ok_or(CifError::InvalidCell)?;

        let asymmetric = self.atom_sites()?;
        if asymmetric.is_empty() {
            return Err(CifError::NoSites);
        }

        let ops = self.symmetry_operations()?;
        let sites = expand_sites(&asymmetric, &ops);

        Ok(Structure { lattice, sites })
    }

    fn number(&self, tag: &'static str) -> Result<f64, CifError> {
        let raw = self.items.get(tag).ok_or(CifError::MissingItem(tag))?;
        parse_number(raw)
            .ok_or_else(|| CifError::InvalidNumber {
                tag: tag.to_string(),
                value: raw.clone(),
            })?
            .ok_or(CifError::MissingItem(tag))
    }

    fn atom_sites(&self) -> Result<Vec<Site>, CifError> {
        let table = self
            .loops
            .iter()
            .find(|l| l.column("_atom_site_fract_x").is_some())
            .ok_or(CifError::MissingItem("_atom_site_fract_x"))?;

        let column = |tag: &'static str| table.column(tag).ok_or(CifError::MissingItem(tag));
        let coord_cols = [
            column("_atom_site_fract_x")?,
            column("_atom_site_fract_y")?,
            column("_atom_site_fract_z")?,
        ];
        let species_col = table
            .column("_atom_site_type_symbol")
            .or_else(|| table.column("_atom_site_label"))
            .ok_or(CifError::MissingItem("_atom_site_type_symbol"))?;

        let mut sites = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let mut frac = Vec3::zeros();
            for (axis, &idx) in coord_cols.iter().enumerate() {
                let raw = &row[idx];
                frac[axis] = parse_number(raw)
                    .flatten()
                    .ok_or_else(|| CifError::InvalidNumber {
                        tag: table.tags[idx].clone(),
                        value: raw.clone(),
                    })?;
            }
            sites.push(Site {
                species: element_symbol(&row[species_col]),
                frac,
            });
        }
        Ok(sites)
    }

    fn symmetry_operations(&self) -> Result<Vec<SymOp>, CifError> {
        let from_loop = self.loops.iter().find_map(|l| {
            SYMOP_TAGS
                .iter()
                .find_map(|tag| l.column(tag))
                .map(|col| l.rows.iter().map(move |r| r[col].as_str()).collect::<Vec<_>>())
        });
        let raw: Vec<&str> = match from_loop {
            Some(ops) => ops,
            None => SYMOP_TAGS
                .iter()
                .filter_map(|tag| self.items.get(*tag).map(String::as_str))
                .collect(),
        };

        if raw.is_empty() {
            return Ok(vec![SymOp::identity()]);
        }
        raw.into_iter().map(SymOp::parse).collect()
    }
}

/// Parse a CIF number, dropping a trailing standard uncertainty `(n)`.
///
/// `Some(None)` marks the unknown/inapplicable placeholders `?` and `.`.
fn parse_number(raw: &str) -> Option<Option<f64>> {
    let raw = raw.trim();
    if raw == "?" || raw == "." {
        return Some(None);
    }
    let number = raw.split('(').next().unwrap_or(raw);
    number.parse().ok().map(Some)
}

/// `"Cu2+"` → `"Cu"`, `"O1"` → `"O"`, `"ba"` → `"Ba"`.
fn element_symbol(raw: &str) -> String {
    let mut chars = raw.trim().chars();
    let mut symbol = String::new();
    if let Some(first) = chars.next().filter(char::is_ascii_alphabetic) {
        symbol.push(first.to_ascii_uppercase());
        if let Some(second) = chars.next().filter(char::is_ascii_lowercase) {
            symbol.push(second);
        }
    }
    if symbol.is_empty() {
        raw.trim().to_string()
    } else {
        symbol
    }
}

// ---------------------------------------------------------------------------
// Symmetry
// ---------------------------------------------------------------------------

/// An affine operation on fractional coordinates: `rot · p + trans`.
#[derive(Debug, Clone, PartialEq)]
struct SymOp {
    rot: Mat3,
    trans: Vec3,
}

impl SymOp {
    fn identity() -> SymOp {
        SymOp {
            rot: Mat3::identity(),
            trans: Vec3::zeros(),
        }
    }

    /// Parse the `x,y,z` notation, e.g. `"-x+y, -x, z+1/2"`.
    fn parse(raw: &str) -> Result<SymOp, CifError> {
        let invalid = || CifError::InvalidSymmetryOperation(raw.to_string());
        let parts: Vec<&str> = raw.split(',').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let mut op = SymOp {
            rot: Mat3::zeros(),
            trans: Vec3::zeros(),
        };
        for (row, expr) in parts.iter().enumerate() {
            let (coeffs, offset) = parse_component(expr).ok_or_else(invalid)?;
            op.rot.set_row(row, &coeffs.transpose());
            op.trans[row] = offset;
        }
        Ok(op)
    }

    /// Apply and wrap the result back into the unit cell.
    fn apply(&self, p: &Vec3) -> Vec3 {
        (self.rot * p + self.trans).map(wrap_unit)
    }
}

/// One coordinate expression → (coefficients of x, y, z; constant term).
fn parse_component(expr: &str) -> Option<(Vec3, f64)> {
    let compact: String = expr
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if compact.is_empty() {
        return None;
    }

    // Split into signed terms at every '+'/'-' not at the start.
    let mut terms: Vec<(f64, String)> = Vec::new();
    let mut sign = 1.0;
    let mut current = String::new();
    for c in compact.chars() {
        match c {
            '+' | '-' => {
                if !current.is_empty() {
                    terms.push((sign, std::mem::take(&mut current)));
                }
                sign = if c == '-' { -1.0 } else { 1.0 };
            }
            _ => current.push(c),
        }
    }
    if current.is_empty() {
        return None;
    }
    terms.push((sign, current));

    let mut coeffs = Vec3::zeros();
    let mut offset = 0.0;
    for (sign, term) in terms {
        let axis = match term.chars().last() {
            Some('x') => Some(0),
            Some('y') => Some(1),
            Some('z') => Some(2),
            _ => None,
        };
        match axis {
            Some(axis) => {
                let factor = term[..term.len() - 1].trim_end_matches('*');
                let factor = if factor.is_empty() {
                    1.0
                } else {
                    parse_fraction(factor)?
                };
                coeffs[axis] += sign * factor;
            }
            None => offset += sign * parse_fraction(&term)?,
        }
    }
    Some((coeffs, offset))
}

fn parse_fraction(s: &str) -> Option<f64> {
    match s.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            (den != 0.0).then_some(num.parse::<f64>().ok()? / den)
        }
        None => s.parse().ok(),
    }
}

/// Wrap into `[0, 1)`, snapping values within tolerance of 1 to 0.
fn wrap_unit(v: f64) -> f64 {
    let w = v.rem_euclid(1.0);
    if (1.0 - w) < 1e-8 {
        0.0
    } else {
        w
    }
}

fn same_position(a: &Vec3, b: &Vec3) -> bool {
    (a - b).iter().all(|d| {
        let d = d.abs();
        d.min(1.0 - d) < SITE_TOLERANCE
    })
}

/// Apply every operation to every site, keeping unique positions per species.
fn expand_sites(asymmetric: &[Site], ops: &[SymOp]) -> Vec<Site> {
    let mut sites: Vec<Site> = Vec::new();
    for site in asymmetric {
        for op in ops {
            let frac = op.apply(&site.frac);
            let duplicate = sites
                .iter()
                .any(|s| s.species == site.species && same_position(&s.frac, &frac));
            if !duplicate {
                sites.push(Site {
                    species: site.species.clone(),
                    frac,
                });
            }
        }
    }
    sites
}

#[cfg(test)]
mod tests {
    use super::*;

    const MGB2: &str = r#"
# MgB2, P6/mmm
data_MgB2
_symmetry_space_group_name_H-M   'P 6/m m m'
_cell_length_a    3.0860(2)
_cell_length_b    3.0860(2)
_cell_length_c    3.5210(3)
_cell_angle_alpha 90
_cell_angle_beta  90
_cell_angle_gamma 120
loop_
_symmetry_equiv_pos_site_id
_symmetry_equiv_pos_as_xyz
1 'x, y, z'
2 '-y, x-y, z'
3 '-x+y, -x, z'
4 '-x, -y, -z'
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_occupancy
Mg1 Mg2+ 0 0 0 1
B1 B 0.33333 0.66667 0.5 1
"#;

    #[test]
    fn test_parse_mgb2_expands_symmetry() {
        let structure = parse_cif(MGB2).unwrap();
        let mg: Vec<_> = structure.sites.iter().filter(|s| s.species == "Mg").collect();
        let b: Vec<_> = structure.sites.iter().filter(|s| s.species == "B").collect();
        assert_eq!(mg.len(), 1);
        assert_eq!(b.len(), 2);
        assert!((structure.lattice.matrix[(0, 0)] - 3.086).abs() < 1e-9);
        assert_eq!(structure.formula(), "Mg1 B2");
    }

    #[test]
    fn test_parse_without_symmetry_uses_identity() {
        let text = "data_x\n_cell_length_a 4\n_cell_length_b 4\n_cell_length_c 4\n\
                    _cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\n\
                    loop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\n\
                    Nb1 0 0 0\nNb2 0.5 0.5 0.5\n";
        let structure = parse_cif(text).unwrap();
        assert_eq!(structure.sites.len(), 2);
        assert!(structure.sites.iter().all(|s| s.species == "Nb"));
    }

    #[test]
    fn test_missing_cell_is_error() {
        let text = "data_x\n_cell_length_a 4\nloop_\n_atom_site_label\n_atom_site_fract_x\n\
                    _atom_site_fract_y\n_atom_site_fract_z\nO1 0 0 0\n";
        assert_eq!(
            parse_cif(text).unwrap_err(),
            CifError::MissingItem("_cell_length_b")
        );
    }

    #[test]
    fn test_dotted_tag_names() {
        let text = "data_nb\n_cell.length_a 3.3\n_cell.length_b 3.3\n_cell.length_c 3.3\n\
                    _cell.angle_alpha 90\n_cell.angle_beta 90\n_cell.angle_gamma 90\n\
                    loop_\n_space_group_symop.operation_xyz\n'x,y,z'\n'x+1/2,y+1/2,z+1/2'\n\
                    loop_\n_atom_site.label\n_atom_site.fract_x\n_atom_site.fract_y\n_atom_site.fract_z\n\
                    Nb1 0 0 0\n";
        let structure = parse_cif(text).unwrap();
        assert_eq!(structure.sites.len(), 2);
        assert!(structure
            .sites
            .iter()
            .any(|s| (s.frac - Vec3::new(0.5, 0.5, 0.5)).norm() < 1e-9));
    }

    #[test]
    fn test_metadata_block_before_structure_is_skipped() {
        let text = "data_global\n_journal_name_full 'Phys. Rev. B'\n_journal_year 1992\n\
                    data_1\n_cell_length_a 4\n_cell_length_b 4\n_cell_length_c 4\n\
                    _cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\n\
                    loop_\n_atom_site_label\n_atom_site_fract_x\n_atom_site_fract_y\n_atom_site_fract_z\n\
                    Pb1 0 0 0\n";
        let structure = parse_cif(text).unwrap();
        assert_eq!(structure.formula(), "Pb1");
    }

    #[test]
    fn test_error_comes_from_structure_block() {
        let text = "data_global\n_journal_year 1992\n\
                    data_1\n_cell_length_a 4\n_cell_length_b 4\n_cell_length_c 4\n\
                    _cell_angle_alpha 90\n_cell_angle_beta 90\n_cell_angle_gamma 90\n";
        assert_eq!(
            parse_cif(text).unwrap_err(),
            CifError::MissingItem("_atom_site_fract_x")
        );
    }

    #[test]
    fn test_ragged_loop_is_error() {
        let text = "data_x\nloop_\n_a\n_b\n1 2 3\n";
        assert!(matches!(
            parse_cif(text).unwrap_err(),
            CifError::RaggedLoop { tags: 2, values: 3 }
        ));
    }

    #[test]
    fn test_text_field_and_quotes() {
        let text = "data_x\n_publ_section_title\n;\nA long\ntitle\n;\n_name 'it''s fine'\n";
        let tokens = tokenize(text).unwrap();
        assert_eq!(tokens[2], Token::Value("A long\ntitle".to_string()));
        assert_eq!(tokens[4], Token::Value("it''s fine".to_string()));
    }

    #[test]
    fn test_unterminated_text_field() {
        let text = "data_x\n_title\n;\nnever closed\n";
        assert_eq!(
            tokenize(text).unwrap_err(),
            CifError::UnterminatedTextField { line: 3 }
        );
    }

    #[test]
    fn test_parse_number_forms() {
        assert_eq!(parse_number("3.8450(2)"), Some(Some(3.845)));
        assert_eq!(parse_number("?"), Some(None));
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_symop_parse_and_apply() {
        let op = SymOp::parse("-x+y, -x, z+1/2").unwrap();
        #[rustfmt::skip]
        let rot = Mat3::new(
            -1.0, 1.0, 0.0,
            -1.0, 0.0, 0.0,
             0.0, 0.0, 1.0,
        );
        assert_eq!(op.rot, rot);
        assert_eq!(op.trans, Vec3::new(0.0, 0.0, 0.5));

        let p = op.apply(&Vec3::new(0.25, 0.5, 0.75));
        assert!((p - Vec3::new(0.25, 0.75, 0.25)).norm() < 1e-12);

        assert!(SymOp::parse("x, y").is_err());
        assert!(SymOp::parse("x, y, q").is_err());
    }

    #[test]
    fn test_element_symbol() {
        assert_eq!(element_symbol("Cu2+"), "Cu");
        assert_eq!(element_symbol("O1"), "O");
        assert_eq!(element_symbol("ba"), "Ba");
        assert_eq!(element_symbol("CU1"), "C");
        assert_eq!(element_symbol("Ba1"), "Ba");
    }

    #[test]
    fn test_parser_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = CifParser.parse_file(&dir.path().join("none.cif")).unwrap_err();
        assert!(matches!(missing, DashboardError::MissingFile { .. }));

        let bad = dir.path().join("bad.cif");
        std::fs::write(&bad, "data_bad\n_cell_length_a\n").unwrap();
        let err = CifParser.parse_file(&bad).unwrap_err();
        assert!(matches!(err, DashboardError::Parse { .. }));
    }
}
