//! spatial::model — ordered collection of spatial histograms.
//!
//! A [`SpatialModel`] holds one [`SpatialHist`] per relation category, in the
//! order they were supplied (the library loads them sorted by directory
//! name). Direct indexing through [`SpatialModel::hist`] is strict: an
//! out-of-range id is an error, never wrapped.
//!
//! Stroke positions use a *clumped* id: stroke `i` uses histogram
//! `min(i, len − 1)`, so every stroke past the last histogram shares it.
use crate::{
    library::errors::{LibError, LibResult},
    spatial::hist::SpatialHist,
};
use rand::Rng;

/// Non-empty ordered list of spatial histograms.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialModel {
    hists: Vec<SpatialHist>,
}

impl SpatialModel {
    /// Build a model from `hists`, kept in the given order.
    ///
    /// # Errors
    /// - [`LibError::EmptySpatialModel`] if `hists` is empty.
    pub fn new(hists: Vec<SpatialHist>) -> LibResult<Self> {
        if hists.is_empty() {
            return Err(LibError::EmptySpatialModel);
        }
        Ok(Self { hists })
    }

    /// Replace the stored histograms with `hists`, in the given order.
    ///
    /// On error the model is left unchanged.
    ///
    /// # Errors
    /// - [`LibError::EmptySpatialModel`] if `hists` is empty.
    pub fn set_properties(&mut self, hists: Vec<SpatialHist>) -> LibResult<()> {
        *self = Self::new(hists)?;
        Ok(())
    }

    /// Histogram for relation category `rid`.
    ///
    /// # Errors
    /// - [`LibError::InvalidRelation`] if `rid >= len()`.
    pub fn hist(&self, rid: usize) -> LibResult<&SpatialHist> {
        self.hists.get(rid).ok_or(LibError::InvalidRelation { rid, len: self.hists.len() })
    }

    pub fn len(&self) -> usize {
        self.hists.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.hists.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpatialHist> {
        self.hists.iter()
    }

    /// Clumped histogram id for stroke index `part`.
    pub fn clump_id(&self, part: usize) -> usize {
        part.min(self.hists.len() - 1)
    }

    /// Log density of the start position of stroke `part`.
    pub fn score_point(&self, part: usize, point: [f64; 2]) -> f64 {
        self.hists[self.clump_id(part)].score(point)
    }

    /// Sample a start position for stroke `part`.
    pub fn sample_point<R: Rng + ?Sized>(&self, part: usize, rng: &mut R) -> [f64; 2] {
        self.hists[self.clump_id(part)].sample(rng)
    }
}
