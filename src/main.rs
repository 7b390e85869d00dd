use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};

use pipeline_planner::cp::SolverConfig;
use pipeline_planner::models::Schedule;
use pipeline_planner::parser::{load_pipeline, TaskParser};
use pipeline_planner::report::ScheduleReport;
use pipeline_planner::scheduler::{PipelinePlanner, ScheduleKpi};
use pipeline_planner::PlanningResult;

const MIN_CORES: u8 = 1;
const MAX_CORES: u8 = 32;
const MIN_LINES: usize = 5;

/// Data Pipeline Planner
#[derive(Parser, Debug)]
#[command(name = "pipeline-planner")]
#[command(version, about, long_about = None)]
struct Cli {
    /// The number of available CPU cores (must be between 1 and 32)
    #[arg(long = "cpu_cores", value_parser = clap::value_parser!(u8).range(MIN_CORES as i64..=MAX_CORES as i64))]
    cpu_cores: u8,

    /// Path to the file containing the pipeline tasks
    #[arg(long)]
    pipeline: PathBuf,

    /// Logging level
    #[arg(long, value_enum, default_value_t = LogLevel::Info, ignore_case = true)]
    log: LogLevel,

    /// Give up after this many seconds without a proven optimum
    #[arg(long = "time-limit", value_name = "SECS")]
    time_limit: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging(level: LogLevel) {
    env_logger::Builder::from_default_env()
        .filter_level(level.into())
        .format_timestamp(Some(env_logger::fmt::TimestampPrecision::Millis))
        .init();
}

fn read_lines(cli: &Cli) -> Vec<String> {
    let path = cli.pipeline.display();
    let lines = match load_pipeline(&cli.pipeline) {
        Ok(lines) => lines,
        Err(e) => Cli::command()
            .error(
                ErrorKind::Io,
                format!("Pipeline tasks file \"{path}\" does NOT exist. Error: {e}"),
            )
            .exit(),
    };
    if lines.len() < MIN_LINES {
        Cli::command()
            .error(
                ErrorKind::InvalidValue,
                format!("Pipeline tasks file \"{path}\" needs at least {MIN_LINES} lines of content."),
            )
            .exit();
    }
    lines
}

fn run(cli: &Cli, lines: &[String]) -> PlanningResult<String> {
    let cores = usize::from(cli.cpu_cores);
    let tasks = TaskParser::new().parse(lines)?;

    let mut config = SolverConfig::default();
    if let Some(secs) = cli.time_limit {
        config = config.with_time_limit(Duration::from_secs(secs));
    }

    let planner = PipelinePlanner::new(tasks)?.with_solver_config(config);
    let scheduled = planner.plan(cores)?;

    let schedule = Schedule::new(scheduled);
    let kpi = ScheduleKpi::calculate(&schedule, cores);
    log::debug!(
        "makespan {}, total work {}, avg utilization {:.3}, parallelism {:.3}",
        kpi.makespan,
        kpi.total_work,
        kpi.avg_utilization,
        kpi.parallelism
    );

    let output = match cli.format {
        OutputFormat::Text => ScheduleReport::new().generate(&schedule.tasks),
        OutputFormat::Json => {
            let value = serde_json::json!({
                "makespan": schedule.makespan(),
                "schedule": schedule,
                "kpi": kpi,
            });
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
        }
    };
    Ok(output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log);

    let lines = read_lines(&cli);
    match run(&cli, &lines) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to generate a plan. Error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "pipeline-planner",
            "--cpu_cores",
            "2",
            "--pipeline",
            "tasks.txt",
            "--log",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.cpu_cores, 2);
        assert_eq!(cli.log, LogLevel::Debug);
        assert_eq!(cli.format, OutputFormat::Text);
        assert_eq!(cli.time_limit, None);
    }

    #[test]
    fn test_core_range() {
        for cores in ["0", "33", "-1", "x"] {
            assert!(Cli::try_parse_from([
                "pipeline-planner",
                "--cpu_cores",
                cores,
                "--pipeline",
                "tasks.txt",
            ])
            .is_err());
        }
    }

    #[test]
    fn test_missing_arguments() {
        assert!(Cli::try_parse_from(["pipeline-planner", "--cpu_cores", "2"]).is_err());
        assert!(Cli::try_parse_from(["pipeline-planner", "--pipeline", "tasks.txt"]).is_err());
    }

    #[test]
    fn test_run_text_and_json() {
        let lines: Vec<String> = ["A", "2", "feature", "", "B", "1", "model", "A", "END"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let mut cli = Cli::try_parse_from([
            "pipeline-planner",
            "--cpu_cores",
            "2",
            "--pipeline",
            "tasks.txt",
        ])
        .unwrap();

        let text = run(&cli, &lines).unwrap();
        assert!(text.starts_with("Minimum Execution Time = 3 minute(s)"));

        cli.format = OutputFormat::Json;
        let json: serde_json::Value = serde_json::from_str(&run(&cli, &lines).unwrap()).unwrap();
        assert_eq!(json["makespan"], 3);
        assert_eq!(json["schedule"]["tasks"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["kpi"]["total_work"], 3);
    }

    #[test]
    fn test_run_reports_planning_errors() {
        let lines: Vec<String> = ["A", "2", "", "B", "B", "2", "", "A", "END"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cli = Cli::try_parse_from([
            "pipeline-planner",
            "--cpu_cores",
            "1",
            "--pipeline",
            "tasks.txt",
        ])
        .unwrap();

        let err = run(&cli, &lines).unwrap_err();
        assert!(err.to_string().contains("circular dependencies"));
    }
}
