//! Rigid-body transformations of molecules.
//!
//! Translations and rotations leave every internal coordinate unchanged, so a molecule
//! moved with these functions produces the same Z-matrix values as before.

use crate::model::molecule::Molecule;
use crate::model::types::Point;
use nalgebra::{Rotation3, Vector3};

/// Collection of geometric transformation operations for molecules.
///
/// The `Transform` type groups static methods that mutate atom coordinates in place.
pub struct Transform;

impl Transform {
    /// Translates all atoms by the specified displacement vector.
    ///
    /// # Arguments
    ///
    /// * `molecule` - Mutable molecule whose atoms will be displaced.
    /// * `x` - Translation along the x-axis in ångströms.
    /// * `y` - Translation along the y-axis in ångströms.
    /// * `z` - Translation along the z-axis in ångströms.
    pub fn translate(molecule: &mut Molecule, x: f64, y: f64, z: f64) {
        Self::apply_translation(molecule, Vector3::new(x, y, z));
    }

    /// Moves the topological center (mean atom position) to `target`, or to the origin
    /// when `target` is `None`.
    pub fn center_geometry(molecule: &mut Molecule, target: Option<Point>) {
        let translation = target.unwrap_or(Point::origin()) - molecule.topologic_center();
        Self::apply_translation(molecule, translation);
    }

    /// Moves the center of mass to `target`, or to the origin when `target` is `None`.
    pub fn center_mass(molecule: &mut Molecule, target: Option<Point>) {
        let translation = target.unwrap_or(Point::origin()) - molecule.center_of_mass();
        Self::apply_translation(molecule, translation);
    }

    /// Rotates the molecule about the origin using Euler angles (XYZ convention).
    ///
    /// # Arguments
    ///
    /// * `molecule` - Mutable molecule to be rotated.
    /// * `x_rad` - Rotation about x-axis in radians.
    /// * `y_rad` - Rotation about y-axis in radians.
    /// * `z_rad` - Rotation about z-axis in radians.
    pub fn rotate_euler(molecule: &mut Molecule, x_rad: f64, y_rad: f64, z_rad: f64) {
        let rotation = Rotation3::from_euler_angles(x_rad, y_rad, z_rad);
        for atom in molecule.iter_atoms_mut() {
            atom.pos = rotation * atom.pos;
        }
    }

    fn apply_translation(molecule: &mut Molecule, translation: Vector3<f64>) {
        for atom in molecule.iter_atoms_mut() {
            atom.translate_by(&translation);
        }
    }
}
