//! Named collection of the co-indexed output fields of the pycnocline diagnostics.
//!
//! Output fields are keyed by [`PycnoVar`]. A [`DatasetBuilder`] accumulates the fields and
//! returns the immutable [`OutputDataset`] once all of them are in place.

use std::fmt::Debug;
use std::rc::Rc;

use fixed_map::{Key, Map};

use crate::errors::{DiagnosticsError, Result};
use crate::field::{ArrND, Field, NumField};
use crate::grid::DIMS_2D;
use crate::mask::StratMask;
use crate::variable::{Attrs, Coords, Dim, Var};
use crate::Numeric;

/// Axes of the diagnostic output fields.
pub const DIMS_SERIES: [Dim; 3] = [Dim::Time, Dim::Row, Dim::Column];

/// Output variables of the pycnocline diagnostics.
#[derive(Copy, Clone, Key, Debug, PartialEq, Eq)]
pub enum PycnoVar {
    /// Pycnocline depth, first depth moment of stratification.
    Strat1stMom,
    /// Pycnocline thickness, second depth moment of stratification.
    Strat2ndMom,
    Strat1stMomMasked,
    Strat2ndMomMasked,
    /// 1 where the column is stratified, 0 elsewhere.
    Mask,
    /// Horizontal cell size along the column axis.
    E1,
    /// Horizontal cell size along the row axis.
    E2,
}

impl PycnoVar {
    pub const ALL: [PycnoVar; 7] = [
        PycnoVar::Strat1stMom,
        PycnoVar::Strat2ndMom,
        PycnoVar::Strat1stMomMasked,
        PycnoVar::Strat2ndMomMasked,
        PycnoVar::Mask,
        PycnoVar::E1,
        PycnoVar::E2,
    ];

    /// Name of the field in the output dataset.
    pub fn name(&self) -> &'static str {
        match self {
            PycnoVar::Strat1stMom => "strat_1st_mom",
            PycnoVar::Strat2ndMom => "strat_2nd_mom",
            PycnoVar::Strat1stMomMasked => "strat_1st_mom_masked",
            PycnoVar::Strat2ndMomMasked => "strat_2nd_mom_masked",
            PycnoVar::Mask => "mask",
            PycnoVar::E1 => "e1",
            PycnoVar::E2 => "e2",
        }
    }

    /// Look up a variable by its field name.
    ///
    /// # Examples
    /// ```
    /// use stratos::dataset::PycnoVar;
    ///
    /// assert_eq!(PycnoVar::from_name("strat_2nd_mom_masked"), Some(PycnoVar::Strat2ndMomMasked));
    /// assert_eq!(PycnoVar::from_name("rho_dz"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    /// Units and names attached to the moment fields.
    pub fn attrs(&self) -> Attrs {
        match self {
            PycnoVar::Strat1stMom => Attrs::new(
                "m",
                "pycnocline depth",
                "First depth moment of stratification",
            ),
            PycnoVar::Strat2ndMom => Attrs::new(
                "m",
                "pycnocline thickness",
                "Second depth moment of stratification",
            ),
            PycnoVar::Strat1stMomMasked => Attrs::new(
                "m",
                "masked pycnocline depth",
                "First depth moment of stratification, masked in weak stratification",
            ),
            PycnoVar::Strat2ndMomMasked => Attrs::new(
                "m",
                "masked pycnocline thickness",
                "Second depth moment of stratification, masked in weak stratification",
            ),
            PycnoVar::Mask | PycnoVar::E1 | PycnoVar::E2 => Attrs::default(),
        }
    }
}

/// A single entry of the [`OutputDataset`].
#[derive(Clone, Debug)]
pub enum DataArray {
    /// Field over (time, row, column).
    Series(Var<3>),
    /// Field over (row, column).
    Horizontal(Var<2>),
}

impl DataArray {
    pub fn name(&self) -> &str {
        match self {
            DataArray::Series(v) => v.name(),
            DataArray::Horizontal(v) => v.name(),
        }
    }

    pub fn attrs(&self) -> &Attrs {
        match self {
            DataArray::Series(v) => v.attrs(),
            DataArray::Horizontal(v) => v.attrs(),
        }
    }

    pub fn as_series(&self) -> Option<&Var<3>> {
        match self {
            DataArray::Series(v) => Some(v),
            DataArray::Horizontal(_) => None,
        }
    }

    pub fn as_horizontal(&self) -> Option<&Var<2>> {
        match self {
            DataArray::Horizontal(v) => Some(v),
            DataArray::Series(_) => None,
        }
    }
}

/// Co-indexed output fields sharing time, latitude and longitude coordinates.
pub struct OutputDataset {
    coords: Rc<Coords>,
    vars: Map<PycnoVar, DataArray>,
}

impl OutputDataset {
    pub fn coords(&self) -> &Rc<Coords> {
        &self.coords
    }

    pub fn get(&self, var: PycnoVar) -> Option<&DataArray> {
        self.vars.get(var)
    }

    /// Look up an entry by its field name, e.g. `"strat_1st_mom"`.
    pub fn get_by_name(&self, name: &str) -> Option<&DataArray> {
        PycnoVar::from_name(name).and_then(|v| self.get(v))
    }

    /// Borrow a (time, row, column) field.
    pub fn series(&self, var: PycnoVar) -> Option<&Var<3>> {
        self.get(var).and_then(DataArray::as_series)
    }

    /// Borrow a (row, column) field.
    pub fn horizontal(&self, var: PycnoVar) -> Option<&Var<2>> {
        self.get(var).and_then(DataArray::as_horizontal)
    }

    /// The stratification mask as [`StratMask`] values.
    pub fn strat_mask(&self) -> Option<ArrND<3, StratMask>> {
        self.series(PycnoVar::Mask).map(|m| {
            m.data().map(|&v| {
                if v > 0.0 {
                    StratMask::Stratified
                } else {
                    StratMask::Unstratified
                }
            })
        })
    }

    /// Mean over time of a (time, row, column) field.
    ///
    /// With `skip_missing`, missing values are ignored unless a cell is missing at all times.
    /// Without, a single missing value makes the mean of that cell missing.
    pub fn time_mean(&self, var: PycnoVar, skip_missing: bool) -> Option<ArrND<2, f64>> {
        let data = self.series(var)?.data();
        Some(if skip_missing {
            data.nanmean_axis(0)
        } else {
            data.collapse_axis(0, |lane| {
                if lane.iter().any(|v| v.is_missing()) {
                    f64::missing()
                } else {
                    lane.iter().sum::<f64>() / lane.len() as f64
                }
            })
        })
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (PycnoVar, &DataArray)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl Debug for OutputDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputDataset")
            .field("coords", &self.coords)
            .field(
                "vars",
                &self.iter().map(|(_, v)| v.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder accumulating the fields of an [`OutputDataset`].
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use stratos::dataset::{DatasetBuilder, PycnoVar};
/// use stratos::field::{ArrND, Field};
/// use stratos::variable::Coords;
///
/// let time = vec![NaiveDate::from_ymd_opt(2015, 8, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()];
/// let coords = Coords {
///     time,
///     latitude: ArrND::full(55.0, [2, 2]),
///     longitude: ArrND::full(2.5, [2, 2]),
/// };
/// let ds = DatasetBuilder::new(coords)
///     .series(PycnoVar::Strat1stMom, ArrND::full(20.0, [1, 2, 2]))
///     .horizontal(PycnoVar::E1, ArrND::full(7000.0, [2, 2]))
///     .build()
///     .unwrap();
///
/// let zd = ds.get_by_name("strat_1st_mom").unwrap();
/// assert_eq!(zd.attrs().units.as_deref(), Some("m"));
/// assert_eq!(ds.len(), 2);
/// ```
pub struct DatasetBuilder {
    coords: Rc<Coords>,
    vars: Map<PycnoVar, DataArray>,
}

impl DatasetBuilder {
    pub fn new(coords: Coords) -> Self {
        Self {
            coords: Rc::new(coords),
            vars: Map::new(),
        }
    }

    /// Add a (time, row, column) field with the attributes of `var`.
    pub fn series(mut self, var: PycnoVar, data: ArrND<3, f64>) -> Self {
        let field = Var::new(var.name(), data, DIMS_SERIES)
            .with_attrs(var.attrs())
            .with_coords(&self.coords);
        self.vars.insert(var, DataArray::Series(field));
        self
    }

    /// Add a (row, column) field with the attributes of `var`.
    pub fn horizontal(mut self, var: PycnoVar, data: ArrND<2, f64>) -> Self {
        let field = Var::new(var.name(), data, DIMS_2D)
            .with_attrs(var.attrs())
            .with_coords(&self.coords);
        self.vars.insert(var, DataArray::Horizontal(field));
        self
    }

    /// Check every field against the shared coordinates and return the dataset.
    pub fn build(self) -> Result<OutputDataset> {
        let nt = self.coords.time.len();
        let horizontal = self.coords.latitude.shape();
        if self.coords.longitude.shape() != horizontal {
            return Err(DiagnosticsError::ShapeMismatch {
                field: "longitude".to_string(),
                axis: Dim::Column,
                expected: horizontal[1],
                found: self.coords.longitude.shape()[1],
            });
        }
        for (_, entry) in self.vars.iter() {
            match entry {
                DataArray::Series(v) => {
                    v.check_size(Dim::Time, nt)?;
                    v.check_size(Dim::Row, horizontal[0])?;
                    v.check_size(Dim::Column, horizontal[1])?;
                }
                DataArray::Horizontal(v) => {
                    v.check_size(Dim::Row, horizontal[0])?;
                    v.check_size(Dim::Column, horizontal[1])?;
                }
            }
        }
        Ok(OutputDataset {
            coords: self.coords,
            vars: self.vars,
        })
    }
}
