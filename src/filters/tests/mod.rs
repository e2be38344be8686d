//! Filter tests over in-memory gridsets.


use crate::config::GridSpec;
use crate::fixtures::SHAPE;
use crate::gridset::{GridData, Gridset, Metadata};
use crate::models::{Hemisphere, Period, Temporality};
use chrono::NaiveDate;
use ndarray::Array2;
use std::path::PathBuf;

pub fn grid(values: [f64; 6]) -> Array2<f64> {
    Array2::from_shape_vec(SHAPE, values.to_vec()).unwrap()
}

/// Daily gridset with one layer per (date, values), requested for `target`
pub fn daily_gridset(target: NaiveDate, layers: &[(NaiveDate, [f64; 6])]) -> Gridset {
    let mut metadata = Metadata::new(
        Hemisphere::North,
        Temporality::Daily,
        &GridSpec::with_shape(SHAPE),
    );
    metadata.period = Some(Period::Day(target));
    metadata.files = layers
        .iter()
        .map(|(date, _)| PathBuf::from(format!("nt_{}_f17_v1.1_n.bin", date.format("%Y%m%d"))))
        .collect();
    metadata.periods = layers.iter().map(|(date, _)| Period::Day(*date)).collect();
    let data = GridData::from_layers(layers.iter().map(|(_, values)| grid(*values)).collect()).unwrap();
    Gridset::new(data, metadata)
}
