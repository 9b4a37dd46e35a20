use log::info;
use tern_common::config::AppConfig;
use tern_data::Session;
use tern_telemetry::init_logger;

use crate::error::{WorkflowError, WorkflowResult, WorkflowStep};
use crate::workflow::{run_workflow, WorkflowReport};

pub fn main() -> WorkflowResult<()> {
    let config = AppConfig::from_env()?;
    init_logger(&config.telemetry)?;
    let session =
        Session::try_new(&config.session).map_err(WorkflowError::data(WorkflowStep::Load))?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| WorkflowError::internal(format!("failed to start runtime: {e}")))?;
    let report = runtime.block_on(run_workflow(&session, &config))?;
    info!("workflow finished");
    println!("{}", summarize(&report));
    println!(
        "{}",
        report.display(&config.output.display_columns, config.output.show_rows)?
    );
    Ok(())
}

fn summarize(report: &WorkflowReport) -> String {
    let mut lines = vec![
        format!(
            "rows: {} training, {} test",
            report.train_rows, report.test_rows
        ),
        format!("coefficients: {:?}", report.coefficients),
        format!("intercept: {}", report.intercept),
    ];
    if let Some(metrics) = &report.test_metrics {
        lines.push(format!(
            "test rmse: {:.4}, mae: {:.4}, r2: {:.4}",
            metrics.rmse, metrics.mae, metrics.r2
        ));
    }
    lines.join("\n")
}
