mod linear_regression;
mod model;
mod summary;

pub use linear_regression::LinearRegression;
pub use model::LinearRegressionModel;
pub use summary::TrainingSummary;
