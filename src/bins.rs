//! Histogram axes.
//!
//! [`HistogramSink`](crate::HistogramSink) needs to map an invariant mass (or
//! a transverse momentum) onto a bin. The [`BinEdges`] trait captures that
//! lookup; [`RegularBinEdges`] and [`IrregularBinEdges`] implement it and
//! [`BinEdgeSpec`] holds either one, so that the choice can be made at
//! runtime.

use crate::Error;

/// Maps values onto histogram bins.
///
/// Every bin is half-open: a value sitting exactly on an edge belongs to the
/// bin to its right, and the upper edge of the last bin is excluded.
pub trait BinEdges {
    /// `None` for values outside of the axis (including NaN)
    fn bin_index(&self, value: f64) -> Option<usize>;

    fn n_bins(&self) -> usize;

    /// the `(lower, upper)` edges of bin `index`
    fn bin_bounds(&self, index: usize) -> (f64, f64);
}

/// `n_bins` bins of equal width covering `[low, high)`
#[derive(Clone, Debug, PartialEq)]
pub struct RegularBinEdges {
    low: f64,
    high: f64,
    width: f64,
    n_bins: usize,
}

impl RegularBinEdges {
    pub fn new(low: f64, high: f64, n_bins: usize) -> Result<Self, Error> {
        const WHO: &str = "regular bin edges";
        if n_bins == 0 {
            return Err(Error::bin_edge(WHO, "the axis needs at least one bin"));
        }
        if !(low.is_finite() && high.is_finite()) {
            return Err(Error::bin_edge(WHO, "the axis range must be finite"));
        }
        if high <= low {
            return Err(Error::bin_edge(WHO, "the upper edge must exceed the lower edge"));
        }
        Ok(RegularBinEdges {
            low,
            high,
            width: (high - low) / (n_bins as f64),
            n_bins,
        })
    }

    /// For axes fixed at compile time; the caller guarantees that the
    /// arguments satisfy the checks of [`Self::new`].
    pub(crate) const fn fixed(low: f64, high: f64, n_bins: usize) -> Self {
        RegularBinEdges {
            low,
            high,
            width: (high - low) / (n_bins as f64),
            n_bins,
        }
    }
}

impl BinEdges for RegularBinEdges {
    fn bin_index(&self, value: f64) -> Option<usize> {
        if !(self.low <= value && value < self.high) {
            return None;
        }
        // round-off can land a value just below `high` in bin `n_bins`
        let index = ((value - self.low) / self.width) as usize;
        Some(index.min(self.n_bins - 1))
    }

    fn n_bins(&self) -> usize {
        self.n_bins
    }

    fn bin_bounds(&self, index: usize) -> (f64, f64) {
        let lower = self.low + (index as f64) * self.width;
        if index + 1 == self.n_bins {
            (lower, self.high)
        } else {
            (lower, lower + self.width)
        }
    }
}

/// Bins delimited by an arbitrary, strictly increasing list of edges
#[derive(Clone, Debug, PartialEq)]
pub struct IrregularBinEdges {
    edges: Vec<f64>,
}

impl IrregularBinEdges {
    pub fn new(edges: Vec<f64>) -> Result<IrregularBinEdges, Error> {
        const WHO: &str = "irregular bin edges";
        if edges.len() < 2 {
            return Err(Error::bin_edge(WHO, "at least 2 edges are needed"));
        }
        if edges.iter().any(|edge| !edge.is_finite()) {
            return Err(Error::bin_edge(WHO, "every edge must be finite"));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::bin_edge(WHO, "edges must be strictly increasing"));
        }
        Ok(IrregularBinEdges { edges })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }
}

impl BinEdges for IrregularBinEdges {
    fn bin_index(&self, value: f64) -> Option<usize> {
        let (first, last) = (self.edges[0], self.edges[self.edges.len() - 1]);
        if !(first <= value && value < last) {
            return None;
        }
        // number of edges that are <= value, minus one
        Some(self.edges.partition_point(|&edge| edge <= value) - 1)
    }

    fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    fn bin_bounds(&self, index: usize) -> (f64, f64) {
        (self.edges[index], self.edges[index + 1])
    }
}

/// Either kind of axis
#[derive(Clone, Debug, PartialEq)]
pub enum BinEdgeSpec {
    Regular(RegularBinEdges),
    Irregular(IrregularBinEdges),
}

impl BinEdges for BinEdgeSpec {
    fn bin_index(&self, value: f64) -> Option<usize> {
        match self {
            BinEdgeSpec::Regular(edges) => edges.bin_index(value),
            BinEdgeSpec::Irregular(edges) => edges.bin_index(value),
        }
    }

    fn n_bins(&self) -> usize {
        match self {
            BinEdgeSpec::Regular(edges) => edges.n_bins(),
            BinEdgeSpec::Irregular(edges) => edges.n_bins(),
        }
    }

    fn bin_bounds(&self, index: usize) -> (f64, f64) {
        match self {
            BinEdgeSpec::Regular(edges) => edges.bin_bounds(index),
            BinEdgeSpec::Irregular(edges) => edges.bin_bounds(index),
        }
    }
}

impl From<RegularBinEdges> for BinEdgeSpec {
    fn from(edges: RegularBinEdges) -> Self {
        BinEdgeSpec::Regular(edges)
    }
}

impl From<IrregularBinEdges> for BinEdgeSpec {
    fn from(edges: IrregularBinEdges) -> Self {
        BinEdgeSpec::Irregular(edges)
    }
}
