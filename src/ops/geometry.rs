//! Internal-coordinate geometry: bond lengths, bond angles, and dihedral angles.
//!
//! Angles are returned in degrees. Functions that need a well-defined direction or plane
//! return `None` when the input is degenerate instead of producing NaN.

use crate::model::types::Point;
use nalgebra::Vector3;

/// Norm below which a vector or cross product is treated as zero.
pub const DEGENERATE_TOLERANCE: f64 = 1e-10;

/// Euclidean distance between two points.
pub fn bond_length(atom: &Point, bond: &Point) -> f64 {
    nalgebra::distance(atom, bond)
}

/// Angle at `bond` spanned by `atom` and `angle`, in `[0, 180]` degrees.
///
/// Returns `None` when either arm has zero length.
pub fn bond_angle(atom: &Point, bond: &Point, angle: &Point) -> Option<f64> {
    let v1 = atom - bond;
    let v2 = angle - bond;
    if v1.norm() < DEGENERATE_TOLERANCE || v2.norm() < DEGENERATE_TOLERANCE {
        return None;
    }
    Some(clamped_acos(v1.dot(&v2) / (v1.norm() * v2.norm())).to_degrees())
}

/// Dihedral angle of `atom` about the `bond`-`angle` axis relative to `dihedral`.
///
/// The result lies in `[0, 360)` degrees and matches the IUPAC torsion of the sequence
/// `dihedral, angle, bond, atom` taken modulo 360. A torsion of exactly zero is returned
/// as is. Returns `None` when one of the two planes is undefined (collinear triple).
pub fn dihedral(atom: &Point, bond: &Point, angle: &Point, dihedral: &Point) -> Option<f64> {
    let da = angle - dihedral;
    let ab = bond - angle;
    let bi = atom - bond;

    let n1 = da.cross(&ab);
    let n2 = ab.cross(&bi);
    if n1.norm() < DEGENERATE_TOLERANCE || n2.norm() < DEGENERATE_TOLERANCE {
        return None;
    }
    let n1 = n1.normalize();
    let n2 = n2.normalize();

    let theta = clamped_acos(n1.dot(&n2)).to_degrees();
    if theta != 0.0 && ab.dot(&n1.cross(&n2)) <= 0.0 {
        Some(360.0 - theta)
    } else {
        Some(theta)
    }
}

/// `true` when the three points lie on one line within `tolerance` (sine of the angle
/// at `b`), or when two of them coincide.
pub fn is_collinear(a: &Point, b: &Point, c: &Point, tolerance: f64) -> bool {
    let u = a - b;
    let v = c - b;
    if u.norm() < DEGENERATE_TOLERANCE || v.norm() < DEGENERATE_TOLERANCE {
        return true;
    }
    u.normalize().cross(&v.normalize()).norm() < tolerance
}

/// Places an atom from three reference positions and its internal coordinates.
///
/// Uses the natural extension reference frame: the new atom sits at distance `bond`
/// from `b`, at `angle` degrees from `a` about `b`, and at `dihedral` degrees of torsion
/// relative to `d`. Inverse of [`bond_length`], [`bond_angle`], and [`dihedral`].
///
/// Returns `None` when `d`, `a`, and `b` are collinear.
pub fn place_atom(
    b: &Point,
    a: &Point,
    d: &Point,
    bond: f64,
    angle: f64,
    dihedral: f64,
) -> Option<Point> {
    let bc = b - a;
    if bc.norm() < DEGENERATE_TOLERANCE {
        return None;
    }
    let bc = bc.normalize();
    let n = (a - d).cross(&bc);
    if n.norm() < DEGENERATE_TOLERANCE {
        return None;
    }
    let n = n.normalize();
    let m = n.cross(&bc);

    let (theta, phi) = (angle.to_radians(), dihedral.to_radians());
    let local = Vector3::new(
        -bond * theta.cos(),
        bond * theta.sin() * phi.cos(),
        bond * theta.sin() * phi.sin(),
    );

    Some(b + bc * local.x + m * local.y + n * local.z)
}

fn clamped_acos(cosine: f64) -> f64 {
    cosine.clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn p(x: f64, y: f64, z: f64) -> Point {
        Point::new(x, y, z)
    }

    #[test]
    fn bond_length_is_euclidean_distance() {
        assert!((bond_length(&p(0.0, 0.0, 0.0), &p(1.0, 2.0, 2.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn bond_angle_measures_at_middle_atom() {
        let right = bond_angle(&p(1.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(0.0, 1.0, 0.0));
        let straight = bond_angle(&p(1.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(-2.0, 0.0, 0.0));
        let folded = bond_angle(&p(1.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(3.0, 0.0, 0.0));

        assert!((right.unwrap() - 90.0).abs() < 1e-10);
        assert!((straight.unwrap() - 180.0).abs() < 1e-10);
        assert!(folded.unwrap().abs() < 1e-10);
    }

    #[test]
    fn bond_angle_rejects_zero_length_arm() {
        assert!(bond_angle(&p(0.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn dihedral_matches_reference_conformations() {
        let d = p(1.0, 0.0, 0.0);
        let a = p(0.0, 0.0, 0.0);
        let b = p(0.0, 1.0, 0.0);

        let cis = dihedral(&p(1.0, 1.0, 0.0), &b, &a, &d).unwrap();
        let trans = dihedral(&p(-1.0, 1.0, 0.0), &b, &a, &d).unwrap();
        let plus = dihedral(&p(0.0, 1.0, 1.0), &b, &a, &d).unwrap();
        let minus = dihedral(&p(0.0, 1.0, -1.0), &b, &a, &d).unwrap();

        assert!(cis.abs() < 1e-10);
        assert!((trans - 180.0).abs() < 1e-10);
        assert!((plus - 270.0).abs() < 1e-10);
        assert!((minus - 90.0).abs() < 1e-10);
    }

    #[test]
    fn dihedral_rejects_collinear_references() {
        let result = dihedral(
            &p(1.0, 1.0, 0.0),
            &p(0.0, 2.0, 0.0),
            &p(0.0, 1.0, 0.0),
            &p(0.0, 0.0, 0.0),
        );
        assert!(result.is_none());
    }

    #[test]
    fn is_collinear_detects_lines_and_coincident_points() {
        assert!(is_collinear(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(5.0, 0.0, 0.0), 1e-6));
        assert!(is_collinear(&p(0.0, 0.0, 0.0), &p(0.0, 0.0, 0.0), &p(5.0, 1.0, 0.0), 1e-6));
        assert!(!is_collinear(&p(0.0, 0.0, 0.0), &p(1.0, 0.0, 0.0), &p(1.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn place_atom_inverts_internal_coordinates() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let mut point = || {
                p(
                    rng.random_range(-3.0..3.0),
                    rng.random_range(-3.0..3.0),
                    rng.random_range(-3.0..3.0),
                )
            };
            let (atom, b, a, d) = (point(), point(), point(), point());
            let (Some(angle), Some(torsion)) =
                (bond_angle(&atom, &b, &a), dihedral(&atom, &b, &a, &d))
            else {
                continue;
            };
            let bond = bond_length(&atom, &b);

            let placed = place_atom(&b, &a, &d, bond, angle, torsion).unwrap();
            assert!((placed - atom).norm() < 1e-6, "placed {placed} expected {atom}");
        }
    }
}
