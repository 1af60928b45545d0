use std::io::Write;

use binwise::{
    aggregated_column_unique, bin_edges, calc_groupby, calc_value_counts, dtype_min_max,
    get_binwise_reduced_column, group_by, histogram, histogram_kernel, min_max, range_for,
    reduce_by_stride, reduce_min_max, reduce_min_max_with, unique_values, AggregateOp,
    BinwiseError, ChartCache, ChartConfig, Column, DType, DataFrame, Device, DeviceConfig,
    LaunchConfig, MinMaxAccumulator, Scalar,
};
use proptest::prelude::*;
use tempfile::NamedTempFile;

fn reference_column() -> Column {
    let base = [1i64, 5, 10, 15, 25, 27, 30, 23, 22, 35, 39, 99, 109, 109, 104, 11, 23];
    Column::from(base.repeat(50))
}

fn write_csv(contents: &str) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    write!(tmp, "{}", contents).unwrap();
    tmp
}

#[test]
fn test_dtype_ranges() {
    assert_eq!(
        dtype_min_max(DType::Int8),
        (Scalar::Int(-128), Scalar::Int(127))
    );
    assert_eq!(range_for("uint16").unwrap(), (Scalar::UInt(0), Scalar::UInt(65535)));
    assert_eq!(range_for("float").unwrap(), dtype_min_max(DType::Float64));
    assert!(matches!(range_for("string"), Err(BinwiseError::InvalidType(_))));
}

#[test]
fn test_min_max_reference_launch() {
    let x = Column::from(vec![1i64, 5, 10, 15, 25, 27, 30]);
    let launch = LaunchConfig::new(64, 64).unwrap();
    let acc = MinMaxAccumulator::<f32>::for_dtype(x.dtype());
    min_max(&launch, &x, &acc).unwrap();
    assert_eq!(acc.get(), [1.0, 30.0]);
}

#[test]
fn test_histogram_reference() {
    let x = reference_column();
    let launch = LaunchConfig::new(64, 64).unwrap();
    let acc = MinMaxAccumulator::<f32>::for_dtype(x.dtype());
    min_max(&launch, &x, &acc).unwrap();

    let mut counts = vec![0.0; 8];
    histogram_kernel(&launch, &x, &acc, &mut counts).unwrap();
    assert_eq!(counts, vec![200.0, 300.0, 150.0, 0.0, 0.0, 0.0, 0.0, 200.0]);
}

#[test]
fn test_results_identical_across_launches() {
    let x = reference_column();
    let shapes = [(1, 1), (64, 64), (7, 13)];
    let results: Vec<_> = shapes
        .iter()
        .map(|&(grid, block)| {
            let launch = LaunchConfig::new(grid, block).unwrap();
            let bounds = reduce_min_max_with(&launch, &x).unwrap();
            let vc = binwise::calc_value_counts_with(&launch, &x, 8).unwrap();
            (bounds, vc)
        })
        .collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0].0, (1.0, 109.0));
}

#[test]
fn test_value_counts_reference() {
    let vc = calc_value_counts(&reference_column(), 8).unwrap();
    assert_eq!(vc.bin_centers, vec![1., 14.5, 28., 41.5, 55., 68.5, 82., 109.]);
    assert_eq!(vc.counts, vec![200, 300, 150, 0, 0, 0, 0, 200]);
}

#[test]
fn test_groupby_reference() {
    let key: Vec<f64> = [0.0, 1.0, 2.0, 3.0, 4.0].repeat(5);
    let value: Vec<f64> = [10.0, 8.0, 6.0, 4.0, 2.0].repeat(5);
    let frame = DataFrame::from_columns(vec![
        ("key".to_string(), Column::from(key)),
        ("val".to_string(), Column::from(value)),
    ])
    .unwrap();

    let chart = ChartConfig::new("key", 0.0, 4.0)
        .y("val")
        .stride(1.0)
        .data_points(25);
    let count = calc_groupby(&chart, &frame).unwrap();
    assert_eq!(count.rows(), [vec![0., 1., 2., 3., 4.], vec![5., 5., 5., 5., 5.]]);

    let mean = calc_groupby(&chart.clone().aggregate(AggregateOp::Mean), &frame).unwrap();
    assert_eq!(mean.rows(), [vec![0., 1., 2., 3., 4.], vec![10., 8., 6., 4., 2.]]);
}

#[test]
fn test_group_by_bin_centers_and_fill() {
    let key = Column::from(vec![0.5f64, 0.6, 3.9]);
    let value = Column::from(vec![1i32, 3, 7]);
    let out = group_by(&key, &value, 4, 0.0, 4.0, AggregateOp::Mean).unwrap();
    assert_eq!(out.bin_centers, vec![0.5, 1.5, 2.5, 3.5]);
    assert_eq!(out.aggregates[0], 2.0);
    assert!(out.aggregates[1].is_nan());
    assert!(out.aggregates[2].is_nan());
    assert_eq!(out.aggregates[3], 7.0);

    let counts = group_by(&key, &value, 4, 0.0, 4.0, AggregateOp::Count).unwrap();
    assert_eq!(counts.aggregates, vec![2.0, 0.0, 0.0, 1.0]);

    let short = Column::from(vec![1i32]);
    assert!(matches!(
        group_by(&key, &short, 4, 0.0, 4.0, AggregateOp::Sum),
        Err(BinwiseError::ShapeMismatch { left: 3, right: 1 })
    ));
}

#[test]
fn test_unique_values_per_bin() {
    let key = Column::from(vec![0u8, 0, 1, 2, 2, 2, 3, 9]);
    let distinct = unique_values(&key, 2, (0.0, 9.0)).unwrap();
    // [0, 4.5) holds {0, 1, 2, 3}; [4.5, 9] holds {9}
    assert_eq!(distinct, vec![4, 1]);
}

#[test]
fn test_reduce_by_stride_last_of_block() {
    let x = Column::from(vec![1.0f32, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(
        reduce_by_stride(&x, 2, (1.0, 5.0)).unwrap(),
        Column::Float32(vec![2.0, 4.0, 5.0])
    );
}

#[test]
fn test_device_staging_and_env_free_config() {
    let device = Device::new(DeviceConfig {
        threads: Some(2),
        launch: LaunchConfig::new(4, 8).unwrap(),
    })
    .unwrap();
    let x = reference_column();
    {
        let staged = device.stage(&x);
        assert_eq!(device.resident_bytes(), x.byte_len());
        let (min, max) = device.run(|launch| reduce_min_max_with(launch, &staged)).unwrap();
        assert_eq!((min, max), (1.0, 109.0));
    }
    assert_eq!(device.resident_bytes(), 0);
}

#[test]
fn test_csv_to_charts() {
    let tmp = write_csv("id,key,value\n1,0.0,10\n2,1.0,8\n3,1.0,x\n4,2.0,6\n5,2.0,4\n");
    let (frame, summary) = DataFrame::load_csv(tmp.path()).unwrap();
    assert_eq!(summary.rows_processed, 4);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].row, 4);
    assert_eq!(frame.column("key").unwrap().dtype(), DType::Float64);
    assert_eq!(frame.column("value").unwrap().dtype(), DType::Int64);

    let cache = ChartCache::new();
    let chart = ChartConfig::new("key", 0.0, 2.0)
        .y("value")
        .stride(1.0)
        .aggregate(AggregateOp::Max);
    let out = cache.calc_groupby(&chart, &frame).unwrap();
    assert_eq!(out.x, vec![0.0, 1.0, 2.0]);
    assert_eq!(out.y, vec![10.0, 8.0, 6.0]);
    assert_eq!(cache.calc_groupby(&chart, &frame).unwrap(), out);

    let unique = aggregated_column_unique(&chart, &frame).unwrap();
    assert_eq!(unique.bins, vec![0, 1, 2]);
    assert_eq!(unique.distinct, vec![1, 1, 1]);

    assert!(matches!(
        calc_groupby(&ChartConfig::new("nope", 0.0, 1.0), &frame),
        Err(BinwiseError::MissingColumn(_))
    ));
}

#[test]
fn test_chart_config_json() {
    let chart: ChartConfig = serde_json::from_str(
        r#"{"x": "key", "y": "val", "min_value": 0, "max_value": 4, "stride": 1, "aggregate_fn": "sum"}"#,
    )
    .unwrap();
    assert_eq!(chart.aggregate_fn, AggregateOp::Sum);
    assert_eq!(chart.value_column(), "val");
}

proptest! {
    #[test]
    fn prop_min_max_matches_iterator(values in prop::collection::vec(-1.0e9f64..1.0e9, 1..400)) {
        let x = Column::from(values.clone());
        let expected_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let expected_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(reduce_min_max(&x).unwrap(), (expected_min, expected_max));
    }

    #[test]
    fn prop_integer_min_max_is_exact(values in prop::collection::vec(any::<i32>(), 1..400)) {
        let x = Column::from(values.clone());
        let min = *values.iter().min().unwrap() as f64;
        let max = *values.iter().max().unwrap() as f64;
        prop_assert_eq!(reduce_min_max(&x).unwrap(), (min, max));
    }

    #[test]
    fn prop_histogram_sums_to_len(
        values in prop::collection::vec(-1000.0f64..1000.0, 2..400),
        bins in 1usize..64,
    ) {
        let x = Column::from(values.clone());
        let (min, max) = reduce_min_max(&x).unwrap();
        prop_assume!(max > min);
        let counts = histogram(&x, min, max, bins).unwrap();
        prop_assert_eq!(counts.len(), bins);
        prop_assert_eq!(counts.iter().sum::<f64>(), values.len() as f64);
    }

    #[test]
    fn prop_histogram_launch_invariant(
        values in prop::collection::vec(0u16..5000, 2..300),
        grid in 1u32..16,
        block in 1u32..16,
    ) {
        let x = Column::from(values);
        let (min, max) = reduce_min_max(&x).unwrap();
        prop_assume!(max > min);
        let reference = histogram(&x, min, max, 7).unwrap();
        let launch = LaunchConfig::new(grid, block).unwrap();
        let acc = MinMaxAccumulator::<f64>::new(min, max);
        let mut counts = vec![0.0; 7];
        histogram_kernel(&launch, &x, &acc, &mut counts).unwrap();
        prop_assert_eq!(counts, reference);
    }

    #[test]
    fn prop_bin_edges_descend_from_max(
        min in -1000.0f64..1000.0,
        span in 0.001f64..1000.0,
        bins in 1usize..50,
    ) {
        let max = min + span;
        let edges = bin_edges(min, max, bins).unwrap();
        prop_assert_eq!(edges.len(), bins);
        prop_assert_eq!(edges[0], max);
        prop_assert_eq!(edges[bins - 1], max - (bins - 1) as f64 * ((max - min) / bins as f64));
        prop_assert!(edges.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn prop_stride_identity_and_length(
        values in prop::collection::vec(any::<i16>(), 0..300),
        stride in 1usize..40,
    ) {
        let x = Column::from(values.clone());
        prop_assert_eq!(reduce_by_stride(&x, 1, (0.0, 0.0)).unwrap(), x.clone());
        let reduced = get_binwise_reduced_column(&x, stride, (0.0, 0.0)).unwrap();
        prop_assert_eq!(reduced.len(), values.len().div_ceil(stride));
    }

    #[test]
    fn prop_min_max_with_infinities(
        values in prop::collection::vec(
            prop_oneof![
                4 => -1.0e6f64..1.0e6,
                1 => Just(f64::INFINITY),
                1 => Just(f64::NEG_INFINITY),
            ],
            1..200,
        ),
    ) {
        let x = Column::from(values.clone());
        let expected_min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let expected_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(reduce_min_max(&x).unwrap(), (expected_min, expected_max));
    }

    #[test]
    fn prop_any_positive_stride_is_handled(exp in -300i32..3, mantissa in 1.0f64..10.0) {
        let stride = mantissa * 10f64.powi(exp);
        // keep accepted charts small enough to allocate
        prop_assume!(stride >= 1e-4 || 1.0 / stride >= binwise::processor::bins::MAX_BINS as f64);
        let frame = DataFrame::from_columns(vec![
            ("key".to_string(), Column::from(vec![0.0f64, 0.5, 1.0])),
        ])
        .unwrap();
        let chart = ChartConfig::new("key", 0.0, 1.0).stride(stride);
        match calc_groupby(&chart, &frame) {
            Ok(out) => {
                prop_assert!(out.len() <= binwise::processor::bins::MAX_BINS);
                prop_assert_eq!(out.y.iter().sum::<f64>(), 3.0);
            }
            Err(e) => prop_assert!(matches!(e, BinwiseError::InvalidRange(_))),
        }
    }
}
