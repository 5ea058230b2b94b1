//! Quick-look maps of diagnostic fields.
//!
//! Only available with the `plotting` feature.

use std::path::Path;

use chrono::NaiveDateTime;
use plotters::prelude::*;

use crate::dataset::{DataArray, OutputDataset, PycnoVar};
use crate::errors::{DiagnosticsError, Result};
use crate::field::{ArrND, Field, NumField};
use crate::region::RegionMasks;

/// Lower and upper end of the colour scale, in metres.
pub const COLOR_RANGE: (f64, f64) = (0.0, 50.0);

fn plot_err<E: std::fmt::Display>(e: E) -> DiagnosticsError {
    DiagnosticsError::Plot(e.to_string())
}

/// Half the distance to the neighbouring cell along `axis`, or 0.5 for a single cell.
fn half_spacing(coord: &ArrND<2, f64>, axis: usize) -> ArrND<2, f64> {
    let shape = coord.shape();
    let n = shape[axis];
    ArrND::from_fn(shape, |idx: [usize; 2]| {
        if n < 2 {
            return 0.5;
        }
        let (mut lo, mut hi) = (idx, idx);
        if idx[axis] + 1 < n {
            hi[axis] += 1;
        } else {
            lo[axis] -= 1;
        }
        0.5 * (coord[hi] - coord[lo]).abs()
    })
}

fn title(time: Option<&NaiveDateTime>, entry: &DataArray) -> String {
    let attrs = entry.attrs();
    let label = match (&attrs.standard_name, &attrs.units) {
        (Some(name), Some(units)) => format!("{} ({})", name, units),
        (Some(name), None) => name.clone(),
        _ => entry.name().to_string(),
    };
    match time {
        Some(t) => format!("{}{}", t.format("%d %b %Y: "), label),
        None => label,
    }
}

/// Draw the first time record of `var` as a longitude/latitude map and save it to `path`.
///
/// Missing cells are left blank. Values are coloured on the fixed scale [`COLOR_RANGE`].
pub fn quick_plot<P: AsRef<Path>>(ds: &OutputDataset, var: PycnoVar, path: P) -> Result<()> {
    let entry = ds
        .get(var)
        .ok_or_else(|| DiagnosticsError::Plot(format!("{} is not in the dataset", var.name())))?;
    let value: ArrND<2, f64> = match entry {
        DataArray::Series(v) => {
            let data = v.data();
            if data.shape()[0] == 0 {
                return Err(DiagnosticsError::Plot(format!(
                    "{} has no time records",
                    var.name()
                )));
            }
            ArrND::from_fn(data.shape().remove_axis::<2>(0), |[j, i]: [usize; 2]| {
                data[[0, j, i]]
            })
        }
        DataArray::Horizontal(v) => v.data().clone(),
    };
    let time = match entry {
        DataArray::Series(_) => ds.coords().time.first(),
        DataArray::Horizontal(_) => None,
    };
    draw_map(
        path.as_ref(),
        &title(time, entry),
        &ds.coords().longitude,
        &ds.coords().latitude,
        &value,
        COLOR_RANGE,
    )
}

/// Draw how many regions cover each cell and save it to `path`.
///
/// Cells outside every region are left blank.
pub fn quick_plot_regions<P: AsRef<Path>>(masks: &RegionMasks, path: P) -> Result<()> {
    let value = masks
        .coverage()
        .map(|&n| if n > 0.0 { n } else { f64::NAN });
    draw_map(
        path.as_ref(),
        &format!("Regions: {}", masks.names().join(", ")),
        masks.longitude(),
        masks.latitude(),
        &value,
        (0.0, masks.n_regions().max(1) as f64),
    )
}

fn draw_map(
    path: &Path,
    title: &str,
    lon: &ArrND<2, f64>,
    lat: &ArrND<2, f64>,
    value: &ArrND<2, f64>,
    (vmin, vmax): (f64, f64),
) -> Result<()> {
    let dlon = half_spacing(lon, 1);
    let dlat = half_spacing(lat, 0);

    let root = BitMapBackend::new(path, (800, 640)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let root = root.margin(5, 5, 5, 5);
    let root = root
        .titled(title, ("sans-serif", 22).into_font().color(&BLACK.mix(0.8)))
        .map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(
            lon.min() - dlon.max()..lon.max() + dlon.max(),
            lat.min() - dlat.max()..lat.max() + dlat.max(),
        )
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_desc("longitude")
        .y_desc("latitude")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            value
                .shape()
                .iter()
                .filter(|&idx| !value[idx].is_nan())
                .map(|idx| {
                    let col = colorous::VIRIDIS
                        .eval_continuous(((value[idx] - vmin) / (vmax - vmin)).clamp(0.0, 1.0));
                    Rectangle::new(
                        [
                            (lon[idx] - dlon[idx], lat[idx] + dlat[idx]),
                            (lon[idx] + dlon[idx], lat[idx] - dlat[idx]),
                        ],
                        RGBColor(col.r, col.g, col.b).filled(),
                    )
                }),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}
