//! Pycnocline depth and thickness from the depth moments of stratification.
//!
//! The stratification `S = d(rho)/dz` on the vertical interface grid is integrated over depth
//! with weights given by the cell thickness `E` and the level depth `D`:
//!
//! ```text
//! M0 = sum_z S E
//! M1 = sum_z S E D            Zd = M1 / M0
//! M2 = sum_z (D - Zd)^2 E S   Zt = sqrt(M2 / M0)
//! ```
//!
//! `Zd` approximates the depth of the pycnocline and `Zt` its thickness. Before integration, the
//! stratification at the top and bottom interface is set to zero. Water columns whose raw
//! stratification nowhere drops below a threshold are flagged as unstratified, and the masked
//! variants of `Zd` and `Zt` are missing there.
//!
//! All numerical degeneracies (empty columns, `M0 = 0`, negative radicands) show up as missing or
//! non-finite values in the output. Only inconsistent input shapes are reported as errors.

use log::{debug, warn};

use crate::config::DiagnosticsConfig;
use crate::dataset::{DatasetBuilder, OutputDataset, PycnoVar};
use crate::errors::Result;
use crate::field::{shape, ArrND, Field, NumField};
use crate::grid::OceanGrid;
use crate::mask::{mask_where, to_float, StratMask};
use crate::variable::{Dim, Var};
use crate::Numeric;

/// Axes of four dimensional model output.
pub const DIMS_4D: [Dim; 4] = [Dim::Time, Dim::DepthLevel, Dim::Row, Dim::Column];

/// Stratification threshold below which a water column counts as stratified.
pub const DEFAULT_STRAT_THRESHOLD: f64 = -0.01;

/// Fields the moment calculation consumes on top of the grid geometry.
#[derive(Clone, Debug)]
pub struct PycnoclineInputs {
    stratification: Var<4>,
}

impl PycnoclineInputs {
    /// Use a precomputed stratification field (`rho_dz`) on the interface grid.
    pub fn new(stratification: Var<4>) -> Self {
        Self { stratification }
    }

    /// Derive the stratification from density with the vertical derivative `differentiate`.
    ///
    /// The operator is called exactly once and must return a field on the interface grid.
    pub fn from_density<F>(density: &Var<4>, differentiate: F) -> Result<Self>
    where
        F: FnOnce(&Var<4>) -> Result<Var<4>>,
    {
        debug!("Differentiating {} to obtain stratification", density.name());
        Ok(Self::new(differentiate(density)?))
    }

    pub fn stratification(&self) -> &Var<4> {
        &self.stratification
    }
}

/// Return a copy of `strat` with the first and last depth level set to zero.
///
/// `strat` is ordered (time, depth level, row, column). Missing values stay missing, also on
/// the boundary levels.
///
/// # Examples
/// ```
/// use stratos::field::ArrND;
/// use stratos::pycnocline::clamp_boundary_levels;
///
/// let strat = ArrND::from_shape_vec([1, 4, 1, 1], vec![-3.0, -2.0, f64::NAN, -1.0]).unwrap();
/// let clamped = clamp_boundary_levels(&strat);
///
/// assert_eq!(clamped[[0, 0, 0, 0]], 0.0);
/// assert_eq!(clamped[[0, 1, 0, 0]], -2.0);
/// assert!(clamped[[0, 2, 0, 0]].is_nan());
/// assert_eq!(clamped[[0, 3, 0, 0]], 0.0);
/// ```
pub fn clamp_boundary_levels(strat: &ArrND<4, f64>) -> ArrND<4, f64> {
    let nz = strat.shape()[1];
    let mut clamped = strat.clone();
    if nz > 0 {
        clamped.fill_along(1, 0, 0.0);
        clamped.fill_along(1, nz - 1, 0.0);
    }
    clamped.zip_map(strat, |&c, raw| if raw.is_missing() { f64::missing() } else { c })
}

/// Computes pycnocline depth and thickness of every water column and time record.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use stratos::field::ArrND;
/// use stratos::grid::OceanGridBuilder;
/// use stratos::dataset::PycnoVar;
/// use stratos::pycnocline::{PycnoclineInputs, PycnoclineMomentCalculator, DIMS_4D};
/// use stratos::variable::Var;
///
/// let time = vec![NaiveDate::from_ymd_opt(2004, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()];
/// let grid = OceanGridBuilder::shape([4, 1, 1])
///     .uniform_levels(5.0)
///     .time(time)
///     .build()
///     .unwrap();
/// let rho_dz = Var::new(
///     "rho_dz",
///     ArrND::from_shape_vec([1, 4, 1, 1], vec![0.0, -2.0, -1.0, 0.0]).unwrap(),
///     DIMS_4D,
/// );
///
/// let ds = PycnoclineMomentCalculator::default()
///     .construct_pycnocline_vars(&grid, &PycnoclineInputs::new(rho_dz))
///     .unwrap();
///
/// // M0 = 5 (-2 - 1), M1 = 5 (5 * -2 + 10 * -1)
/// let depth = ds.series(PycnoVar::Strat1stMom).unwrap();
/// assert!((depth.data()[[0, 0, 0]] - 20.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
pub struct PycnoclineMomentCalculator {
    strat_threshold: f64,
}

impl Default for PycnoclineMomentCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_STRAT_THRESHOLD)
    }
}

impl PycnoclineMomentCalculator {
    /// Create a calculator flagging columns with stratification below `strat_threshold`.
    ///
    /// Stratification is negative in stably stratified water, so `strat_threshold` should be
    /// negative as well. Non-negative values are accepted but logged as a warning.
    pub fn new(strat_threshold: f64) -> Self {
        if strat_threshold >= 0.0 {
            warn!(
                "Non-negative threshold {} flags every column with negative stratification",
                strat_threshold
            );
        }
        debug!(
            "Created pycnocline calculator with threshold {}",
            strat_threshold
        );
        Self { strat_threshold }
    }

    pub fn from_config(config: &DiagnosticsConfig) -> Self {
        Self::new(config.strat_threshold)
    }

    pub fn strat_threshold(&self) -> f64 {
        self.strat_threshold
    }

    /// Compute pycnocline depth, thickness, their masked variants and the stratification mask.
    ///
    /// The stratification must have time, depth level, row and column axes whose lengths match
    /// the time axis and the shape of `grid`. The grid geometry is broadcast along time.
    /// The horizontal cell sizes of `grid` are passed on to the output.
    pub fn construct_pycnocline_vars(
        &self,
        grid: &OceanGrid,
        inputs: &PycnoclineInputs,
    ) -> Result<OutputDataset> {
        let [nz, ny, nx] = *grid.shape().as_ref();
        let shape4 = shape([grid.nt(), nz, ny, nx]);
        let source = inputs.stratification();
        debug!(
            "Computing depth moments of {} with shape {:?}",
            source.name(),
            shape4
        );

        let strat = source.broadcast_to(DIMS_4D, shape4)?;
        let depth = grid.depth_0().broadcast_to(DIMS_4D, shape4)?;
        let e3 = grid.e3_0().broadcast_to(DIMS_4D, shape4)?;

        let clamped = clamp_boundary_levels(&strat);
        let weighted = clamped.zip_map(&e3, |&s, &e| s * e);

        let m0: ArrND<3, f64> = weighted.nansum_axis(1);
        let m1: ArrND<3, f64> = weighted.zip_map(&depth, |&se, &d| se * d).nansum_axis(1);
        let strat_1st_mom = m1.zip_map(&m0, |&m1, &m0| m1 / m0);

        let spread = ArrND::from_fn(shape4, |idx: [usize; 4]| {
            let [t, _, y, x] = idx;
            let dev = depth[idx] - strat_1st_mom[[t, y, x]];
            dev * dev * weighted[idx]
        });
        let m2: ArrND<3, f64> = spread.nansum_axis(1);
        let strat_2nd_mom = m2.zip_map(&m0, |&m2, &m0| (m2 / m0).sqrt());

        let column_min: ArrND<3, f64> = strat.nanmin_axis(1);
        let mask = column_min.map(|&min| StratMask::from_column_min(min, self.strat_threshold));

        let strat_1st_mom_masked = mask_where(&strat_1st_mom, &mask);
        let strat_2nd_mom_masked = mask_where(&strat_2nd_mom, &mask);

        let ds = DatasetBuilder::new(grid.coords())
            .series(PycnoVar::Strat1stMom, strat_1st_mom)
            .series(PycnoVar::Strat2ndMom, strat_2nd_mom)
            .series(PycnoVar::Strat1stMomMasked, strat_1st_mom_masked)
            .series(PycnoVar::Strat2ndMomMasked, strat_2nd_mom_masked)
            .series(PycnoVar::Mask, to_float(&mask))
            .horizontal(PycnoVar::E1, grid.e1().clone())
            .horizontal(PycnoVar::E2, grid.e2().clone())
            .build()?;
        debug!("Finished pycnocline moments, {} output fields", ds.len());
        Ok(ds)
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    use crate::config::DiagnosticsConfig;
    use crate::dataset::{DataArray, OutputDataset, PycnoVar};
    use crate::errors::{DiagnosticsError, Result};
    use crate::field::{ArrND, Field};
    use crate::grid::{OceanGrid, OceanGridBuilder};
    use crate::variable::{Dim, Var};

    use super::{clamp_boundary_levels, PycnoclineInputs, PycnoclineMomentCalculator, DIMS_4D};

    fn grid(nt: usize, depths: &[f64], ny: usize, nx: usize) -> OceanGrid {
        let nz = depths.len();
        let start = NaiveDate::from_ymd_opt(2012, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        OceanGridBuilder::shape([nz, ny, nx])
            .time((0..nt).map(|d| start + Duration::days(d as i64)).collect())
            .cartesian_coordinates([54.0, 3.0], [0.1, 0.1])
            .levels(
                ArrND::from_fn([nz, ny, nx], |idx| depths[idx[0]]),
                ArrND::full(1.0, [nz, ny, nx]),
            )
            .horizontal_spacing(ArrND::full(1500.0, [ny, nx]), ArrND::full(1800.0, [ny, nx]))
            .build()
            .unwrap()
    }

    fn rho_dz(shape: [usize; 4], values: Vec<f64>) -> PycnoclineInputs {
        PycnoclineInputs::new(Var::new(
            "rho_dz",
            ArrND::from_shape_vec(shape, values).unwrap(),
            DIMS_4D,
        ))
    }

    fn run(grid: &OceanGrid, inputs: &PycnoclineInputs) -> OutputDataset {
        PycnoclineMomentCalculator::default()
            .construct_pycnocline_vars(grid, inputs)
            .unwrap()
    }

    fn series(ds: &OutputDataset, var: PycnoVar) -> ArrND<3, f64> {
        ds.series(var).unwrap().data().clone()
    }

    /// Deterministic, non-monotonic stratification with a few missing cells.
    fn noisy_inputs(nt: usize, nz: usize, ny: usize, nx: usize) -> PycnoclineInputs {
        let data = ArrND::from_fn([nt, nz, ny, nx], |[t, k, j, i]: [usize; 4]| {
            if (t + k + 2 * j + 3 * i) % 11 == 0 && k > 0 {
                f64::NAN
            } else {
                -0.3 * ((t + 1) as f64 * 0.7 + k as f64 * 1.3 + (j * nx + i) as f64).sin().abs()
                    + 0.05 * ((k * 7 + i) as f64).cos()
            }
        });
        PycnoclineInputs::new(Var::new("rho_dz", data, DIMS_4D))
    }

    #[test]
    fn two_level_column_is_degenerate() {
        let g = grid(1, &[0.0, 10.0], 1, 1);
        let ds = run(&g, &rho_dz([1, 2, 1, 1], vec![0.0, -1.0]));

        assert!(!series(&ds, PycnoVar::Strat1stMom)[[0, 0, 0]].is_finite());
        assert!(!series(&ds, PycnoVar::Strat2ndMom)[[0, 0, 0]].is_finite());
    }

    #[test]
    fn four_level_column_gives_expected_moments() {
        let g = grid(1, &[0.0, 5.0, 10.0, 15.0], 1, 1);
        let ds = run(&g, &rho_dz([1, 4, 1, 1], vec![0.0, -2.0, -1.0, 0.0]));

        let zd = series(&ds, PycnoVar::Strat1stMom)[[0, 0, 0]];
        let zt = series(&ds, PycnoVar::Strat2ndMom)[[0, 0, 0]];
        assert_relative_eq!(zd, 20.0 / 3.0, max_relative = 1e-12);
        // M2 = -2 (5 - 20/3)^2 - (10 - 20/3)^2 = -50/3
        assert_relative_eq!(zt, (50.0f64 / 9.0).sqrt(), max_relative = 1e-12);
    }

    #[test]
    fn boundary_values_do_not_enter_the_moments() {
        let g = grid(1, &[0.0, 5.0, 10.0, 15.0], 1, 1);
        let ds = run(&g, &rho_dz([1, 4, 1, 1], vec![-8.0, -2.0, -1.0, -4.0]));

        assert_relative_eq!(
            series(&ds, PycnoVar::Strat1stMom)[[0, 0, 0]],
            20.0 / 3.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn thickness_weights_enter_the_moments() {
        let start = NaiveDate::from_ymd_opt(2012, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let g = OceanGridBuilder::shape([4, 1, 1])
            .time(vec![start])
            .levels(
                ArrND::from_shape_vec([4, 1, 1], vec![0.0, 5.0, 10.0, 15.0]).unwrap(),
                ArrND::from_shape_vec([4, 1, 1], vec![5.0, 1.0, 3.0, 5.0]).unwrap(),
            )
            .build()
            .unwrap();
        let ds = run(&g, &rho_dz([1, 4, 1, 1], vec![0.0, -1.0, -1.0, 0.0]));

        // M0 = -4, M1 = -5 - 30
        assert_relative_eq!(
            series(&ds, PycnoVar::Strat1stMom)[[0, 0, 0]],
            35.0 / 4.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn threshold_decides_mask() {
        let g = grid(1, &[0.0, 5.0, 10.0], 1, 2);
        let ds = run(
            &g,
            &rho_dz([1, 3, 1, 2], vec![0.0, 0.0, -0.5, -0.005, 0.0, 0.0]),
        );

        let mask = series(&ds, PycnoVar::Mask);
        assert_eq!(mask[[0, 0, 0]], 1.0);
        assert_eq!(mask[[0, 0, 1]], 0.0);

        let zd = series(&ds, PycnoVar::Strat1stMom);
        let zd_masked = series(&ds, PycnoVar::Strat1stMomMasked);
        assert_eq!(zd_masked[[0, 0, 0]], zd[[0, 0, 0]]);
        assert_relative_eq!(zd[[0, 0, 1]], 5.0, max_relative = 1e-12);
        assert!(zd_masked[[0, 0, 1]].is_nan());
    }

    #[test]
    fn mask_uses_unclamped_minimum() {
        let g = grid(1, &[0.0, 5.0, 10.0, 15.0], 1, 1);
        let ds = run(&g, &rho_dz([1, 4, 1, 1], vec![-0.5, -0.001, -0.002, 0.0]));

        assert_eq!(series(&ds, PycnoVar::Mask)[[0, 0, 0]], 1.0);
        assert!(series(&ds, PycnoVar::Strat1stMomMasked)[[0, 0, 0]].is_finite());
    }

    #[test]
    fn all_missing_column_is_unstratified_and_missing() {
        let g = grid(1, &[0.0, 5.0, 10.0], 1, 2);
        let nan = f64::NAN;
        let ds = run(
            &g,
            &rho_dz([1, 3, 1, 2], vec![nan, 0.0, nan, -1.0, nan, 0.0]),
        );

        assert_eq!(series(&ds, PycnoVar::Mask)[[0, 0, 0]], 0.0);
        for var in [
            PycnoVar::Strat1stMom,
            PycnoVar::Strat2ndMom,
            PycnoVar::Strat1stMomMasked,
            PycnoVar::Strat2ndMomMasked,
        ] {
            assert!(series(&ds, var)[[0, 0, 0]].is_nan());
        }
        assert_eq!(series(&ds, PycnoVar::Strat1stMom)[[0, 0, 1]], 5.0);
    }

    #[test]
    fn clamping_keeps_missing_values() {
        let nan = f64::NAN;
        let strat = ArrND::from_shape_vec(
            [2, 3, 1, 1],
            vec![nan, -1.0, -2.0, -3.0, nan, nan],
        )
        .unwrap();
        let clamped = clamp_boundary_levels(&strat);

        assert!(clamped[[0, 0, 0, 0]].is_nan());
        assert_eq!(clamped[[0, 1, 0, 0]], -1.0);
        assert_eq!(clamped[[0, 2, 0, 0]], 0.0);
        assert_eq!(clamped[[1, 0, 0, 0]], 0.0);
        assert!(clamped[[1, 1, 0, 0]].is_nan());
        assert!(clamped[[1, 2, 0, 0]].is_nan());
    }

    #[test]
    fn negative_second_moment_gives_missing_thickness() {
        // M0 = -1, M1 = 0, M2 = 50
        let g = grid(1, &[0.0, 5.0, 10.0, 15.0], 1, 1);
        let ds = run(&g, &rho_dz([1, 4, 1, 1], vec![0.0, -2.0, 1.0, 0.0]));

        let zd = series(&ds, PycnoVar::Strat1stMom)[[0, 0, 0]];
        assert!(zd.is_finite());
        assert_eq!(zd, 0.0);
        assert_eq!(series(&ds, PycnoVar::Mask)[[0, 0, 0]], 1.0);
        assert!(series(&ds, PycnoVar::Strat2ndMom)[[0, 0, 0]].is_nan());
        assert!(series(&ds, PycnoVar::Strat2ndMomMasked)[[0, 0, 0]].is_nan());
        assert!(series(&ds, PycnoVar::Strat1stMomMasked)[[0, 0, 0]].is_finite());
    }

    #[test]
    fn thickness_is_never_negative() {
        let g = grid(3, &[0.0, 2.0, 5.0, 9.0, 14.0, 20.0], 3, 4);
        let ds = run(&g, &noisy_inputs(3, 6, 3, 4));

        let zt = series(&ds, PycnoVar::Strat2ndMom);
        assert!(zt.iter().filter(|v| !v.is_nan()).all(|&v| v >= 0.0));
    }

    #[test]
    fn masked_fields_follow_mask() {
        let g = grid(3, &[0.0, 2.0, 5.0, 9.0, 14.0, 20.0], 3, 4);
        let inputs = noisy_inputs(3, 6, 3, 4);
        let ds = PycnoclineMomentCalculator::new(-0.2)
            .construct_pycnocline_vars(&g, &inputs)
            .unwrap();

        let mask = series(&ds, PycnoVar::Mask);
        let raw = inputs.stratification().data();
        for (unmasked, masked) in [
            (PycnoVar::Strat1stMom, PycnoVar::Strat1stMomMasked),
            (PycnoVar::Strat2ndMom, PycnoVar::Strat2ndMomMasked),
        ] {
            let unmasked = series(&ds, unmasked);
            let masked = series(&ds, masked);
            for idx in mask.shape() {
                let [t, y, x] = idx;
                let column_min = (0..6)
                    .map(|k| raw[[t, k, y, x]])
                    .filter(|v| !v.is_nan())
                    .fold(f64::INFINITY, f64::min);
                assert_eq!(mask[idx] == 1.0, column_min < -0.2);
                if mask[idx] == 1.0 {
                    assert_eq!(masked[idx].to_bits(), unmasked[idx].to_bits());
                } else {
                    assert_eq!(mask[idx], 0.0);
                    assert!(masked[idx].is_nan());
                }
            }
        }
    }

    #[test]
    fn repeated_runs_are_identical_and_leave_input_untouched() {
        let g = grid(2, &[0.0, 3.0, 7.0, 12.0], 2, 2);
        let inputs = noisy_inputs(2, 4, 2, 2);
        let before: Vec<u64> = inputs
            .stratification()
            .data()
            .iter()
            .map(|v| v.to_bits())
            .collect();

        let first = run(&g, &inputs);
        let second = run(&g, &inputs);

        for var in PycnoVar::ALL {
            let (a, b) = (first.get(var).unwrap(), second.get(var).unwrap());
            let bits = |d: &DataArray| -> Vec<u64> {
                match d {
                    DataArray::Series(v) => v.data().iter().map(|x| x.to_bits()).collect(),
                    DataArray::Horizontal(v) => v.data().iter().map(|x| x.to_bits()).collect(),
                }
            };
            assert_eq!(bits(a), bits(b));
        }
        let after: Vec<u64> = inputs
            .stratification()
            .data()
            .iter()
            .map(|v| v.to_bits())
            .collect();
        assert_eq!(before, after);
    }

    #[test]
    fn output_carries_names_attributes_and_spacing() {
        let g = grid(2, &[0.0, 5.0, 10.0], 2, 3);
        let ds = run(&g, &noisy_inputs(2, 3, 2, 3));

        assert_eq!(ds.len(), 7);
        for var in PycnoVar::ALL {
            assert_eq!(ds.get_by_name(var.name()).unwrap().name(), var.name());
        }
        let zd = ds.series(PycnoVar::Strat1stMomMasked).unwrap();
        assert_eq!(zd.attrs().units.as_deref(), Some("m"));
        assert_eq!(
            zd.attrs().long_name.as_deref(),
            Some("First depth moment of stratification, masked in weak stratification")
        );
        assert_eq!(zd.dims(), &[Dim::Time, Dim::Row, Dim::Column]);
        assert_eq!(zd.coords().unwrap().time.len(), 2);
        assert_relative_eq!(
            zd.coords().unwrap().latitude[[1, 0]],
            54.1,
            max_relative = 1e-12
        );

        let e1 = ds.horizontal(PycnoVar::E1).unwrap();
        let e2 = ds.horizontal(PycnoVar::E2).unwrap();
        assert!(e1.data().iter().all(|&v| v == 1500.0));
        assert!(e2.data().iter().all(|&v| v == 1800.0));
        assert!(e1.coords().is_some());
    }

    #[test]
    fn depth_level_mismatch_is_an_error() {
        let g = grid(1, &[0.0, 5.0, 10.0, 15.0], 1, 1);
        let err = PycnoclineMomentCalculator::default()
            .construct_pycnocline_vars(&g, &rho_dz([1, 3, 1, 1], vec![0.0, -1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            DiagnosticsError::ShapeMismatch {
                axis: Dim::DepthLevel,
                expected: 4,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn time_mismatch_is_an_error() {
        let g = grid(2, &[0.0, 5.0, 10.0], 1, 1);
        let err = PycnoclineMomentCalculator::default()
            .construct_pycnocline_vars(&g, &rho_dz([1, 3, 1, 1], vec![0.0, -1.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            DiagnosticsError::ShapeMismatch { axis: Dim::Time, .. }
        ));
    }

    #[test]
    fn time_axis_labelled_as_depth_is_an_error() {
        let g = grid(1, &[0.0, 5.0, 10.0], 1, 1);
        let inputs = PycnoclineInputs::new(Var::new(
            "rho_dz",
            ArrND::full(-1.0, [1, 3, 1, 1]),
            [Dim::DepthLevel, Dim::DepthLevel, Dim::Row, Dim::Column],
        ));
        let err = PycnoclineMomentCalculator::default()
            .construct_pycnocline_vars(&g, &inputs)
            .unwrap_err();
        assert!(matches!(
            err,
            DiagnosticsError::ShapeMismatch {
                axis: Dim::DepthLevel,
                expected: 3,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn stratification_from_density_uses_the_operator_once() {
        let g = grid(1, &[0.0, 5.0, 10.0, 15.0], 1, 1);
        let density = Var::new(
            "density",
            ArrND::from_shape_vec([1, 4, 1, 1], vec![1025.0, 1025.0, 1035.0, 1040.0]).unwrap(),
            DIMS_4D,
        );
        let mut calls = 0;
        let inputs = PycnoclineInputs::from_density(&density, |rho| -> Result<Var<4>> {
            calls += 1;
            let data = rho.data();
            let dz = ArrND::from_fn(rho.shape(), |[t, k, j, i]: [usize; 4]| {
                if k == 0 {
                    0.0
                } else {
                    (data[[t, k - 1, j, i]] - data[[t, k, j, i]]) / 5.0
                }
            });
            Ok(Var::new("rho_dz", dz, *rho.dims()))
        })
        .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(inputs.stratification().name(), "rho_dz");

        // rho_dz = [0, 0, -2, -1] is clamped to [0, 0, -2, 0]
        let ds = run(&g, &inputs);
        assert_relative_eq!(series(&ds, PycnoVar::Strat1stMom)[[0, 0, 0]], 10.0);
        assert_relative_eq!(series(&ds, PycnoVar::Strat2ndMom)[[0, 0, 0]], 0.0);
        assert_eq!(series(&ds, PycnoVar::Mask)[[0, 0, 0]], 1.0);
    }

    #[test]
    fn failing_operator_is_propagated() {
        let density = Var::new("density", ArrND::full(1025.0, [1, 3, 1, 1]), DIMS_4D);
        let res = PycnoclineInputs::from_density(&density, |_| {
            Err(DiagnosticsError::InsufficientDepthLevels(1))
        });
        assert!(matches!(
            res,
            Err(DiagnosticsError::InsufficientDepthLevels(1))
        ));
    }

    #[test]
    fn non_negative_threshold_is_accepted() {
        let g = grid(1, &[0.0, 5.0, 10.0], 1, 2);
        let ds = PycnoclineMomentCalculator::new(0.0)
            .construct_pycnocline_vars(
                &g,
                &rho_dz([1, 3, 1, 2], vec![0.0, 0.0, -0.001, 0.0, 0.0, 0.0]),
            )
            .unwrap();
        let mask = series(&ds, PycnoVar::Mask);
        assert_eq!(mask[[0, 0, 0]], 1.0);
        assert_eq!(mask[[0, 0, 1]], 0.0);
    }

    #[test]
    fn threshold_from_config() {
        let config = DiagnosticsConfig::from_toml_str("strat_threshold = -0.05").unwrap();
        assert_eq!(
            PycnoclineMomentCalculator::from_config(&config).strat_threshold(),
            -0.05
        );
        assert_eq!(PycnoclineMomentCalculator::default().strat_threshold(), -0.01);
    }
}
