//! Pycnocline depth and thickness of a synthetic shelf sea
//!
//! A seasonal thermocline forms in spring, deepens over summer and is mixed away in autumn and
//! winter. The stratification is a Gaussian peak in depth whose strength follows the seasonal
//! cycle and whose centre deepens offshore. A corner of the domain is land.
//!
//! Run with `--features plotting` to also render maps of the masked pycnocline depth
//! and of the region masks.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use stratos::{
    climatology::multiyear_averages,
    config::DiagnosticsConfig,
    dataset::PycnoVar,
    field::{ArrND, Field, NumField},
    grid::OceanGridBuilder,
    pycnocline::{PycnoclineInputs, PycnoclineMomentCalculator, DIMS_4D},
    region::{make_mask_dataset, make_region_from_vertices},
    variable::Var,
};

const CONFIG: &str = r#"
strat_threshold = -0.01
season = "all"
"#;

fn main() {
    let config = DiagnosticsConfig::from_toml_str(CONFIG).expect("Invalid configuration");

    // depth levels, rows, columns
    let shape = [30, 24, 32];
    let [nz, ny, nx] = shape;

    // Monthly records over two years
    let time: Vec<NaiveDateTime> = (0..24)
        .map(|m| {
            NaiveDate::from_ymd_opt(2010 + m / 12, (m % 12) as u32 + 1, 15)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("Invalid date")
        })
        .collect();
    let nt = time.len();

    // Levels get thicker with depth
    let e3_0 = ArrND::from_fn(shape, |[k, _, _]: [usize; 3]| 1.0 + 0.1 * k as f64);
    let depth_0 = ArrND::from_fn(shape, |[k, _, _]: [usize; 3]| {
        (0..k).map(|l| 1.0 + 0.1 * l as f64).sum::<f64>()
    });

    let grid = OceanGridBuilder::shape(shape)
        .time(time.clone())
        .cartesian_coordinates([50.0, -6.0], [0.1, 0.15])
        .levels(depth_0.clone(), e3_0)
        .horizontal_spacing(ArrND::full(10_000.0, [ny, nx]), ArrND::full(11_000.0, [ny, nx]))
        .build()
        .expect("Invalid grid");

    let rho_dz = ArrND::from_fn([nt, nz, ny, nx], |[t, k, j, i]: [usize; 4]| {
        if i + j < 6 {
            return f64::NAN;
        }
        let doy = time[t].ordinal() as f64;
        let season = (2.0 * std::f64::consts::PI * (doy - 100.0) / 365.0).sin().max(0.0);
        let centre = 12.0 + 15.0 * season + 0.4 * i as f64;
        let width = 3.0 + 2.0 * season;
        let z = depth_0[[k, j, i]];
        -(0.002 + 0.2 * season) * (-((z - centre) / width).powi(2)).exp()
    });
    let inputs = PycnoclineInputs::new(Var::new("rho_dz", rho_dz, DIMS_4D));

    let now = std::time::Instant::now();
    let ds = PycnoclineMomentCalculator::from_config(&config)
        .construct_pycnocline_vars(&grid, &inputs)
        .expect("Pycnocline diagnostics failed");
    println!("Time: {} sec", now.elapsed().as_secs_f64());

    let mask = ds.series(PycnoVar::Mask).expect("Mask is missing").data();
    let zd = ds
        .series(PycnoVar::Strat1stMomMasked)
        .expect("Pycnocline depth is missing")
        .data();
    for (t, date) in time.iter().enumerate() {
        let stratified: f64 = (0..ny * nx).map(|c| mask[[t, c / nx, c % nx]]).sum();
        let record = ArrND::from_fn([ny, nx], |[j, i]: [usize; 2]| zd[[t, j, i]]);
        println!(
            "{}: {:4} stratified columns, pycnocline depth {:6.2} .. {:6.2} m",
            date.date(),
            stratified,
            record.min(),
            record.max()
        );
    }

    // Averages over an offshore region
    let coords = ds.coords();
    let offshore = make_region_from_vertices(
        &coords.longitude,
        &coords.latitude,
        &[-4.0, -4.0, -1.5, -1.5],
        &[50.5, 52.0, 52.0, 50.5],
    )
    .expect("Invalid region");
    let regions = make_mask_dataset(
        &coords.longitude,
        &coords.latitude,
        &[offshore],
        Some(&["offshore"][..]),
    )
    .expect("Invalid regions");
    let region_means = regions.region_means(zd).expect("Region means failed");
    println!(
        "Offshore pycnocline depth in August 2011: {:.2} m",
        region_means[[0, 19]]
    );

    // Seasonal means per year
    for mean in multiyear_averages::<3, 2>(&time, zd, config.season)
        .expect("Seasonal averages failed")
    {
        println!(
            "{} {}: {:2} records, mean pycnocline depth {:6.2} m",
            mean.season.name(),
            mean.year,
            mean.count,
            stratos::field::nanmean(mean.mean.as_slice())
        );
    }

    #[cfg(feature = "plotting")]
    {
        stratos::plot::quick_plot(&ds, PycnoVar::Strat1stMomMasked, "pycnocline_depth.png")
            .expect("Plotting failed");
        stratos::plot::quick_plot_regions(&regions, "regions.png").expect("Plotting failed");
    }
}
