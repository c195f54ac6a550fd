//! ctd::character — sampled character types and their continuous parameters.
//!
//! Purpose
//! -------
//! Represent one character type: an ordered list of strokes, each a sequence
//! of sub-strokes with a primitive id, a control-point shape, and an inverse
//! scale, plus a relation describing where the stroke begins. Expose the
//! continuous part through [`Parameterized`] so the type optimizer can read
//! and write it as a flat vector.
//!
//! Key behaviors
//! -------------
//! - [`Character::new`] checks the structure once: shape dimensions,
//!   inverse-scale lengths, and attachment targets.
//! - The optimizer layout has, per stroke `i`, the blocks
//!   `stroke{i}.shapes` (free), `stroke{i}.invscales` (positive), and for
//!   mid-stroke relations `stroke{i}.eval_spot` (inside `(0, ncpt)`).
//!
//! Invariants & assumptions
//! ------------------------
//! - The discrete structure (stroke count, sub-stroke counts, ids, relation
//!   kinds and attachment targets) is never changed by [`Parameterized::set_theta`].
//! - Shapes are stored `nsub × ncpt × 2`; flattening is row-major, which
//!   matches the native `(x₀, y₀, x₁, y₁, …)` order of the shape prior.
//! - Independent stroke positions are not part of the layout.
use crate::{
    ctd::errors::{TypeError, TypeResult},
    optimization::{
        errors::OptResult,
        type_optimizer::{Constraint, ParamLayout, Parameterized, Theta},
    },
};
use ndarray::{Array1, Array3, s};

/// Where a stroke begins relative to earlier strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Relation {
    /// Free position drawn from the spatial model.
    Independent { gpos: [f64; 2] },
    /// Begins at the start of stroke `attach_spot`.
    Start { attach_spot: usize },
    /// Begins at the end of stroke `attach_spot`.
    End { attach_spot: usize },
    /// Begins along sub-stroke `subid_spot` of stroke `attach_spot`, at
    /// spline position `eval_spot`.
    Mid { attach_spot: usize, subid_spot: usize, eval_spot: f64 },
}

impl Relation {
    /// Index into the relation mixture (independent, start, end, mid).
    pub fn category(&self) -> usize {
        match self {
            Relation::Independent { .. } => 0,
            Relation::Start { .. } => 1,
            Relation::End { .. } => 2,
            Relation::Mid { .. } => 3,
        }
    }

    pub fn attach_spot(&self) -> Option<usize> {
        match *self {
            Relation::Independent { .. } => None,
            Relation::Start { attach_spot }
            | Relation::End { attach_spot }
            | Relation::Mid { attach_spot, .. } => Some(attach_spot),
        }
    }
}

/// One stroke: `nsub` sub-strokes sharing a relation.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeType {
    pub ids: Vec<usize>,
    pub shapes: Array3<f64>,
    pub invscales: Array1<f64>,
    pub relation: Relation,
}

impl StrokeType {
    pub fn nsub(&self) -> usize {
        self.ids.len()
    }
}

/// A character type with `ncpt` control points per sub-stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Character {
    pub ncpt: usize,
    pub strokes: Vec<StrokeType>,
}

impl Character {
    /// Assemble a character and check its structure.
    ///
    /// # Errors
    /// - [`TypeError::StructureMismatch`] for an empty character or stroke,
    ///   shapes or inverse scales that do not match the ids, or a relation
    ///   pointing at a later stroke or a missing sub-stroke.
    pub fn new(ncpt: usize, strokes: Vec<StrokeType>) -> TypeResult<Self> {
        let c = Self { ncpt, strokes };
        c.check_structure()?;
        Ok(c)
    }

    /// Number of strokes.
    pub fn k(&self) -> usize {
        self.strokes.len()
    }

    /// Sub-stroke count of every stroke.
    pub fn nsub(&self) -> Vec<usize> {
        self.strokes.iter().map(StrokeType::nsub).collect()
    }

    /// See [`Character::new`].
    pub fn check_structure(&self) -> TypeResult<()> {
        if self.strokes.is_empty() {
            return Err(TypeError::StructureMismatch { reason: "a character needs a stroke" });
        }
        for (i, stroke) in self.strokes.iter().enumerate() {
            let nsub = stroke.nsub();
            if nsub == 0 {
                return Err(TypeError::StructureMismatch { reason: "a stroke needs a sub-stroke" });
            }
            if stroke.shapes.dim() != (nsub, self.ncpt, 2) {
                return Err(TypeError::StructureMismatch {
                    reason: "shapes must be nsub x ncpt x 2",
                });
            }
            if stroke.invscales.len() != nsub {
                return Err(TypeError::StructureMismatch {
                    reason: "one inverse scale per sub-stroke",
                });
            }
            if let Some(attach) = stroke.relation.attach_spot() {
                if attach >= i {
                    return Err(TypeError::StructureMismatch {
                        reason: "relation must attach to an earlier stroke",
                    });
                }
            }
            if let Relation::Mid { attach_spot, subid_spot, .. } = stroke.relation {
                if subid_spot >= self.strokes[attach_spot].nsub() {
                    return Err(TypeError::StructureMismatch {
                        reason: "mid relation names a missing sub-stroke",
                    });
                }
            }
        }
        Ok(())
    }
}

impl Parameterized for Character {
    fn layout(&self) -> ParamLayout {
        let mut layout = ParamLayout::new();
        for (i, stroke) in self.strokes.iter().enumerate() {
            layout.push(format!("stroke{i}.shapes"), stroke.shapes.len(), Constraint::Free);
            layout.push(
                format!("stroke{i}.invscales"),
                stroke.invscales.len(),
                Constraint::LowerBound(0.0),
            );
            if let Relation::Mid { .. } = stroke.relation {
                layout.push(
                    format!("stroke{i}.eval_spot"),
                    1,
                    Constraint::Interval { lo: 0.0, hi: self.ncpt as f64 },
                );
            }
        }
        layout
    }

    fn theta(&self) -> Theta {
        let mut theta = Vec::new();
        for stroke in &self.strokes {
            theta.extend(stroke.shapes.iter().copied());
            theta.extend(stroke.invscales.iter().copied());
            if let Relation::Mid { eval_spot, .. } = stroke.relation {
                theta.push(eval_spot);
            }
        }
        Theta::from(theta)
    }

    fn set_theta(&mut self, theta: &Theta) -> OptResult<()> {
        self.layout().check_len(theta)?;
        let mut offset = 0;
        for stroke in &mut self.strokes {
            let n = stroke.shapes.len();
            for (dst, src) in stroke.shapes.iter_mut().zip(theta.slice(s![offset..offset + n])) {
                *dst = *src;
            }
            offset += n;

            let n = stroke.invscales.len();
            stroke.invscales.assign(&theta.slice(s![offset..offset + n]));
            offset += n;

            if let Relation::Mid { ref mut eval_spot, .. } = stroke.relation {
                *eval_spot = theta[offset];
                offset += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use ndarray::{Array3, array};

    fn stroke(nsub: usize, ncpt: usize, relation: Relation, fill: f64) -> StrokeType {
        StrokeType {
            ids: vec![0; nsub],
            shapes: Array3::from_elem((nsub, ncpt, 2), fill),
            invscales: Array1::from_elem(nsub, 1.0 + fill),
            relation,
        }
    }

    fn two_strokes() -> Character {
        Character::new(
            3,
            vec![
                stroke(2, 3, Relation::Independent { gpos: [0.0, 0.0] }, 0.5),
                stroke(1, 3, Relation::Mid { attach_spot: 0, subid_spot: 1, eval_spot: 1.5 }, -0.5),
            ],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify block labels, offsets, and constraints of the layout.
    //
    // Given
    // -----
    // - Stroke 0: 2 sub-strokes, independent. Stroke 1: 1 sub-stroke, mid.
    // - ncpt = 3.
    //
    // Expect
    // ------
    // - Blocks: shapes(12), invscales(2), shapes(6), invscales(1),
    //   eval_spot(1), total 22.
    fn layout_lists_blocks_in_order() {
        // Arrange
        let c = two_strokes();

        // Act
        let layout = c.layout();

        // Assert
        let labels: Vec<&str> = layout.blocks().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            [
                "stroke0.shapes",
                "stroke0.invscales",
                "stroke1.shapes",
                "stroke1.invscales",
                "stroke1.eval_spot"
            ]
        );
        assert_eq!(layout.dim(), 22);
        assert_eq!(layout.blocks()[4].constraint, Constraint::Interval { lo: 0.0, hi: 3.0 });
        assert_eq!(layout.blocks()[1].constraint, Constraint::LowerBound(0.0));
        assert!(layout.validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `set_theta` writes exactly what `theta` reads, and leaves the discrete
    // structure alone.
    fn set_theta_inverts_theta() {
        let mut c = two_strokes();
        let theta = Theta::from_shape_fn(22, |i| i as f64 / 10.0);

        c.set_theta(&theta).unwrap();

        assert_eq!(c.theta(), theta);
        assert_eq!(c.nsub(), vec![2, 1]);
        assert_eq!(c.strokes[0].shapes[[0, 0, 1]], 0.1);
        assert_eq!(c.strokes[0].invscales, array![1.2, 1.3]);
        assert!(matches!(
            c.strokes[1].relation,
            Relation::Mid { eval_spot, attach_spot: 0, .. } if eval_spot == 2.1
        ));
    }

    #[test]
    // Purpose
    // -------
    // Wrong-length vectors are rejected without modifying the character.
    fn set_theta_rejects_wrong_length() {
        let mut c = two_strokes();
        let before = c.clone();

        let err = c.set_theta(&Theta::zeros(5)).unwrap_err();

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 22, found: 5 });
        assert_eq!(c, before);
    }

    #[test]
    // Purpose
    // -------
    // Structural checks catch forward attachments, missing sub-strokes,
    // malformed shapes, and empty characters.
    fn new_rejects_bad_structure() {
        let forward = Character::new(3, vec![stroke(1, 3, Relation::End { attach_spot: 0 }, 0.0)]);
        let missing_sub = Character::new(
            3,
            vec![
                stroke(1, 3, Relation::Independent { gpos: [0.0, 0.0] }, 0.0),
                stroke(1, 3, Relation::Mid { attach_spot: 0, subid_spot: 1, eval_spot: 1.0 }, 0.0),
            ],
        );
        let free = Relation::Independent { gpos: [0.0, 0.0] };
        let bad_shape = Character::new(4, vec![stroke(1, 3, free, 0.0)]);

        assert!(matches!(forward, Err(TypeError::StructureMismatch { .. })));
        assert!(matches!(missing_sub, Err(TypeError::StructureMismatch { .. })));
        assert!(matches!(bad_shape, Err(TypeError::StructureMismatch { .. })));
        assert!(matches!(Character::new(3, vec![]), Err(TypeError::StructureMismatch { .. })));
    }
}
