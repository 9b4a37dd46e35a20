#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use datafusion::arrow::array::{Array, Float64Array, RecordBatch};
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use tern_data::{train_test_split, Dataset};
use tern_ml::column::VectorColumn;
use tern_ml::error::MlError;
use tern_ml::{
    LinearRegression, LinearRegressionModel, Pipeline, PipelineStage, RegressionEvaluator,
    RegressionMetric, Transformer, VectorAssembler,
};
use tern_random::XorShiftRandom;

/// Synthetic listings where `price = 120 * bedrooms + 35 + noise`.
fn synthetic_listings(rows: usize, seed: i64) -> Dataset {
    let mut rng = XorShiftRandom::new(seed);
    let bedrooms = (0..rows)
        .map(|_| (rng.next_double() * 5.0).floor() + 1.0)
        .collect::<Vec<_>>();
    let prices = bedrooms
        .iter()
        .map(|b| 120.0 * b + 35.0 + (rng.next_double() - 0.5) * 40.0)
        .collect::<Vec<_>>();
    let schema = Arc::new(Schema::new(vec![
        Field::new("bedrooms", DataType::Float64, true),
        Field::new("price", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(bedrooms)),
            Arc::new(Float64Array::from(prices)),
        ],
    )
    .unwrap();
    Dataset::new(batch)
}

fn toy_listings() -> Dataset {
    let schema = Arc::new(Schema::new(vec![
        Field::new("bedrooms", DataType::Float64, true),
        Field::new("price", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Float64Array::from(vec![1.0, 2.0, 3.0])),
            Arc::new(Float64Array::from(vec![100.0, 150.0, 250.0])),
        ],
    )
    .unwrap();
    Dataset::new(batch)
}

fn float_column(dataset: &Dataset, name: &str) -> Vec<Option<f64>> {
    let column = dataset.require_column(name).unwrap();
    let column = column.as_any().downcast_ref::<Float64Array>().unwrap();
    (0..column.len())
        .map(|i| column.is_valid(i).then(|| column.value(i)))
        .collect()
}

fn assembler() -> VectorAssembler {
    VectorAssembler::new(["bedrooms"], "features")
}

fn estimator() -> LinearRegression {
    LinearRegression::new().with_label_column("price")
}

#[test]
fn assembled_vector_holds_the_bedrooms_value() {
    let data = synthetic_listings(50, 1);
    let output = assembler().transform(&data).unwrap();
    let bedrooms = float_column(&output, "bedrooms");
    let features = VectorColumn::try_new(output.require_column("features").unwrap(), "features")
        .unwrap();
    for (i, value) in bedrooms.iter().enumerate() {
        assert_eq!(features.row(i), Some([value.unwrap()].as_slice()));
    }
}

#[test]
fn prediction_is_slope_times_value_plus_intercept() {
    let model = estimator()
        .fit(&assembler().transform(&synthetic_listings(200, 2)).unwrap())
        .unwrap();
    let m = model.coefficients()[0];
    let b = model.intercept();
    for v in [-3.0, 0.0, 1.0, 2.5, 7.0, 1e3] {
        assert!((model.predict(&[v]) - (m * v + b)).abs() < 1e-9 * (1.0 + v.abs() * m.abs()));
    }
}

#[test]
fn fitted_model_recovers_the_generating_line() {
    let model = estimator()
        .fit(&assembler().transform(&synthetic_listings(2000, 3)).unwrap())
        .unwrap();
    assert!((model.coefficients()[0] - 120.0).abs() < 2.0);
    assert!((model.intercept() - 35.0).abs() < 8.0);
}

#[test]
fn pipeline_is_equivalent_to_manual_chaining() {
    let data = synthetic_listings(500, 4);
    let (train, test) = train_test_split(&data, [0.8, 0.2], 42).unwrap();

    let pipeline = Pipeline::new(vec![
        PipelineStage::transformer(assembler()),
        PipelineStage::estimator(estimator()),
    ]);
    let fitted = pipeline.fit(&train).unwrap();
    let from_pipeline = fitted.transform(&test).unwrap();

    let model = fitted.find_stage::<LinearRegressionModel>().unwrap();
    let manual = model
        .transform(&assembler().transform(&test).unwrap())
        .unwrap();

    assert_eq!(
        float_column(&from_pipeline, "prediction"),
        float_column(&manual, "prediction")
    );

    let independent = estimator()
        .fit(&assembler().transform(&train).unwrap())
        .unwrap();
    assert_eq!(independent.coefficients(), model.coefficients());
    assert_eq!(independent.intercept(), model.intercept());
}

#[test]
fn fitted_pipeline_is_reusable_without_refitting() {
    let data = synthetic_listings(300, 5);
    let (train, test) = train_test_split(&data, [0.7, 0.3], 11).unwrap();
    let fitted = Pipeline::new(vec![
        PipelineStage::transformer(assembler()),
        PipelineStage::estimator(estimator()),
    ])
    .fit(&train)
    .unwrap();
    let before = fitted
        .find_stage::<LinearRegressionModel>()
        .unwrap()
        .coefficients()
        .to_vec();
    let first = fitted.transform(&test).unwrap();
    let _ = fitted.transform(&train).unwrap();
    let second = fitted.transform(&test).unwrap();
    assert_eq!(
        float_column(&first, "prediction"),
        float_column(&second, "prediction")
    );
    assert_eq!(
        fitted
            .find_stage::<LinearRegressionModel>()
            .unwrap()
            .coefficients(),
        before.as_slice()
    );
}

#[test]
fn toy_dataset_extrapolates_the_least_squares_line() {
    let data = toy_listings();
    let (train, test) = train_test_split(&data, [1.0, 0.0], 42).unwrap();
    assert_eq!(train.num_rows(), 3);
    assert_eq!(test.num_rows(), 0);

    let fitted = Pipeline::new(vec![
        PipelineStage::transformer(assembler()),
        PipelineStage::estimator(estimator()),
    ])
    .fit(&train)
    .unwrap();
    let model = fitted.find_stage::<LinearRegressionModel>().unwrap();
    // Least squares over (1, 100), (2, 150), (3, 250): slope 75, intercept 50/3.
    assert!((model.coefficients()[0] - 75.0).abs() < 1e-6);
    assert!((model.intercept() - 50.0 / 3.0).abs() < 1e-6);
    assert!((model.predict(&[4.0]) - 950.0 / 3.0).abs() < 1e-6);

    let empty = fitted.transform(&test).unwrap();
    assert_eq!(empty.num_rows(), 0);
    assert_eq!(
        empty.column_names(),
        vec!["bedrooms", "price", "features", "prediction"]
    );
}

#[test]
fn assembling_without_the_column_fails_with_missing_column() {
    let data = toy_listings().select(&["price"]).unwrap();
    let result = assembler().transform(&data);
    assert!(matches!(result, Err(MlError::MissingColumn(name)) if name == "bedrooms"));
}

#[test]
fn evaluator_scores_held_out_predictions() {
    let data = synthetic_listings(1000, 6);
    let (train, test) = train_test_split(&data, [0.8, 0.2], 42).unwrap();
    let predictions = Pipeline::new(vec![
        PipelineStage::transformer(assembler()),
        PipelineStage::estimator(estimator()),
    ])
    .fit(&train)
    .unwrap()
    .transform(&test)
    .unwrap();
    let evaluator = RegressionEvaluator::new().with_label_column("price");
    let rmse = evaluator.evaluate(&predictions).unwrap();
    // The noise is uniform on [-20, 20], whose standard deviation is about 11.5.
    assert!(rmse > 5.0 && rmse < 20.0, "unexpected rmse {rmse}");
    let r2 = evaluator
        .with_metric(RegressionMetric::R2)
        .evaluate(&predictions)
        .unwrap();
    assert!(r2 > 0.95, "unexpected r2 {r2}");
}
