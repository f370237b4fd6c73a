//! lee2d - look-elsewhere correction for two-dimensional searches
//!
//! The main entry point for the `lee2d` binary, handling:
//! - Euler characteristics of thresholded test-statistic surfaces
//! - Calibration of the shape coefficients from background surfaces
//! - Conversion of a local significance into a global one

use clap::{Args, Parser, Subcommand};
use lee_common::{Error, OutputFormat, SCHEMA_VERSION};
use lee_config::{load_config, ConfigSnapshot, ResolvedConfig};
use lee_core::calibrate::{measure_calibration, Calibration, CalibrationPoint};
use lee_core::correct::LeeCorrector;
use lee_core::exit_codes::ExitCode;
use lee_core::log_event;
use lee_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, Stage,
};
use lee_core::output::{
    render, render_error, CalibrationReport, CheckReport, EulerReport, Render, RunInfo,
};
use lee_core::surface::Surface;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Look-elsewhere correction for 2D searches via Euler characteristics
#[derive(Parser)]
#[command(name = "lee2d")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Configuration file (overrides LEE2D_CONFIG and XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Treat advisories (negative coefficients, p-value outside [0, 1]) as errors
    #[arg(long, global = true)]
    strict: bool,

    /// Significant digits in md/summary output
    #[arg(long, global = true)]
    precision: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Euler characteristic of a surface's excursion set above a threshold
    Euler(EulerArgs),

    /// Measure E[phi] at two thresholds over background surfaces and fit n1, n2
    Calibrate(CalibrateArgs),

    /// Convert a maximum local significance into a global p-value
    Correct(CorrectArgs),

    /// Validate the resolved configuration
    Check(CheckArgs),

    /// Print version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Euler(_) => "euler",
            Commands::Calibrate(_) => "calibrate",
            Commands::Correct(_) => "correct",
            Commands::Check(_) => "check",
            Commands::Version => "version",
        }
    }
}

#[derive(Args, Debug)]
struct EulerArgs {
    /// Surface JSON file
    #[arg(long)]
    surface: PathBuf,

    /// Excursion threshold u (-2 log likelihood ratio)
    #[arg(long, short = 'u', allow_negative_numbers = true)]
    threshold: f64,
}

#[derive(Args, Debug)]
struct CalibrateArgs {
    /// Background surface JSON files (repeatable)
    #[arg(long = "surface", required = true, num_args = 1..)]
    surfaces: Vec<PathBuf>,

    /// First calibration threshold
    #[arg(long, allow_negative_numbers = true)]
    u1: f64,

    /// Second calibration threshold
    #[arg(long, allow_negative_numbers = true)]
    u2: f64,
}

#[derive(Args, Debug)]
struct CorrectArgs {
    /// Maximum local significance Z; several values correct several channels
    #[arg(
        long = "max-local-sig",
        num_args = 1..,
        allow_negative_numbers = true,
        required_unless_present = "surface"
    )]
    max_local_sig: Vec<f64>,

    /// Take Z = sqrt(max q) from an observed surface instead
    #[arg(long, conflicts_with = "max_local_sig")]
    surface: Option<PathBuf>,

    /// First calibration threshold
    #[arg(long, allow_negative_numbers = true)]
    u1: f64,

    /// Second calibration threshold
    #[arg(long, allow_negative_numbers = true)]
    u2: f64,

    /// Expected Euler characteristic at u1
    #[arg(long, allow_negative_numbers = true)]
    phi1: f64,

    /// Expected Euler characteristic at u2
    #[arg(long, allow_negative_numbers = true)]
    phi2: f64,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Print the configuration JSON Schema instead
    #[arg(long)]
    schema: bool,
}

/// Settings shared by the command handlers.
struct RunContext {
    global: GlobalOpts,
    log: LogContext,
    resolved: ResolvedConfig,
    strict: bool,
    precision: usize,
}

impl RunContext {
    fn info(&self) -> RunInfo {
        let mut config = ConfigSnapshot::new(&self.resolved);
        config.strict = self.strict;
        RunInfo {
            run_id: self.log.run_id.clone(),
            command: self.log.command.clone().unwrap_or_default(),
            config,
            precision: self.precision,
        }
    }

    fn corrector(&self) -> LeeCorrector {
        LeeCorrector::new(self.resolved.config.solver).strict(self.strict)
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError.as_i32()
            } else {
                0
            };
            std::process::exit(code);
        }
    };

    let mut log_config = LogConfig::from_env(None, cli.global.log_format);
    log_config.level = log_config.level.adjusted(cli.global.verbose, cli.global.quiet);
    init_logging(&log_config);

    let command = cli.command.name();
    let log = LogContext::new(generate_run_id()).with_command(command);
    let span = tracing::info_span!("lee2d", run_id = %log.run_id, command = command);
    let _enter = span.enter();
    log_event!(log, INFO, event_names::RUN_STARTED, Stage::Init, "Starting lee2d run");

    let format = cli.global.format;
    let exit_code = match run(cli, log.clone()) {
        Ok(code) => code,
        Err(err) => {
            log_event!(
                log,
                ERROR,
                event_names::INTERNAL_ERROR,
                Stage::Report,
                "Command failed",
                code = err.code(),
                error = %err
            );
            eprintln!("{}", render_error(format, &log.run_id, command, &err));
            ExitCode::from(&err)
        }
    };

    log_event!(
        log,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "Finished lee2d run",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

fn run(cli: Cli, log: LogContext) -> Result<ExitCode, Error> {
    if let Commands::Version = cli.command {
        print_version(cli.global.format);
        return Ok(ExitCode::Clean);
    }
    if let Commands::Check(CheckArgs { schema: true }) = cli.command {
        let schema = lee_config::LeeConfig::json_schema();
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(ExitCode::Clean);
    }

    let resolved = load(&cli.global, &log)?;
    let ctx = RunContext {
        strict: cli.global.strict || resolved.config.report.strict,
        precision: cli
            .global
            .precision
            .unwrap_or(resolved.config.report.precision),
        global: cli.global,
        log,
        resolved,
    };

    match cli.command {
        Commands::Euler(args) => run_euler(&ctx, &args),
        Commands::Calibrate(args) => run_calibrate(&ctx, &args),
        Commands::Correct(args) => run_correct(&ctx, &args),
        Commands::Check(_) => run_check(&ctx),
        Commands::Version => {
            print_version(ctx.global.format);
            Ok(ExitCode::Clean)
        }
    }
}

fn load(global: &GlobalOpts, log: &LogContext) -> Result<ResolvedConfig, Error> {
    let resolved = load_config(global.config.as_deref()).map_err(|e| {
        log_event!(
            log,
            ERROR,
            event_names::CONFIG_ERROR,
            Stage::Init,
            "Configuration invalid",
            error = %e
        );
        Error::Config(e.to_string())
    })?;

    match &resolved.path {
        Some(path) => log_event!(
            log,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "Configuration loaded",
            path = %path.display(),
            source = %resolved.source
        ),
        None => log_event!(
            log,
            INFO,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "Using built-in configuration"
        ),
    }
    Ok(resolved)
}

/// Print `value` to stdout and map advisories to the exit code.
fn emit<T: Render + Serialize>(ctx: &RunContext, value: &T) -> Result<ExitCode, Error> {
    let advisories = value.advisories();
    for advisory in &advisories {
        log_event!(
            ctx.log,
            WARN,
            event_names::ADVISORY_RAISED,
            Stage::Report,
            "Result carries an advisory",
            kind = advisory.code_name(),
            detail = %advisory
        );
    }

    println!("{}", render(ctx.global.format, &ctx.info(), value)?);
    log_event!(
        ctx.log,
        DEBUG,
        event_names::REPORT_WRITTEN,
        Stage::Report,
        "Result written",
        format = %ctx.global.format
    );

    Ok(if advisories.is_empty() {
        ExitCode::Clean
    } else {
        ExitCode::Advisory
    })
}

fn load_surface(ctx: &RunContext, path: &Path) -> Result<Surface, Error> {
    let surface = Surface::from_file(path)?;
    log_event!(
        ctx.log,
        DEBUG,
        event_names::SURFACE_LOADED,
        Stage::Calibrate,
        "Surface loaded",
        path = %path.display(),
        rows = surface.rows(),
        cols = surface.cols()
    );
    Ok(surface)
}

fn run_euler(ctx: &RunContext, args: &EulerArgs) -> Result<ExitCode, Error> {
    let surface = load_surface(ctx, &args.surface)?;
    let counts = surface.euler_counts_at(args.threshold)?;
    log_event!(
        ctx.log,
        INFO,
        event_names::EULER_MEASURED,
        Stage::Calibrate,
        "Euler characteristic measured",
        threshold = args.threshold,
        euler = counts.euler
    );

    emit(
        ctx,
        &EulerReport {
            threshold: args.threshold,
            rows: surface.rows(),
            cols: surface.cols(),
            peak: surface.peak(),
            counts,
        },
    )
}

fn run_calibrate(ctx: &RunContext, args: &CalibrateArgs) -> Result<ExitCode, Error> {
    let surfaces = args
        .surfaces
        .iter()
        .map(|path| load_surface(ctx, path))
        .collect::<Result<Vec<_>, _>>()?;

    let calibration = measure_calibration(&surfaces, args.u1, args.u2)?;
    log_event!(
        ctx.log,
        INFO,
        event_names::EULER_MEASURED,
        Stage::Calibrate,
        "Calibration measured",
        surfaces = surfaces.len(),
        phi1 = calibration.first.euler,
        phi2 = calibration.second.euler
    );

    let fit = solve(ctx, &calibration)?;
    if ctx.strict && !fit.advisories.is_empty() {
        return Err(Error::OutOfRangeResult {
            advisories: fit.advisories,
        });
    }

    emit(
        ctx,
        &CalibrationReport {
            surfaces: surfaces.len(),
            calibration,
            fit,
        },
    )
}

fn solve(
    ctx: &RunContext,
    calibration: &Calibration,
) -> Result<lee_core::CoefficientFit, Error> {
    log_event!(
        ctx.log,
        DEBUG,
        event_names::SOLVE_STARTED,
        Stage::Solve,
        "Fitting shape coefficients",
        u1 = calibration.first.threshold,
        u2 = calibration.second.threshold
    );
    match calibration.fit(&ctx.resolved.config.solver) {
        Ok(fit) => {
            log_event!(
                ctx.log,
                INFO,
                event_names::SOLVE_CONVERGED,
                Stage::Solve,
                "Shape coefficients fitted",
                n1 = fit.coefficients.n1,
                n2 = fit.coefficients.n2,
                iterations = fit.iterations
            );
            Ok(fit)
        }
        Err(err) => {
            log_event!(
                ctx.log,
                WARN,
                event_names::SOLVE_FAILED,
                Stage::Solve,
                "Coefficient fit failed",
                error = %err
            );
            Err(err)
        }
    }
}

fn run_correct(ctx: &RunContext, args: &CorrectArgs) -> Result<ExitCode, Error> {
    let calibration = Calibration::new(
        CalibrationPoint::exact(args.u1, args.phi1),
        CalibrationPoint::exact(args.u2, args.phi2),
    );
    let fit = solve(ctx, &calibration)?;

    let significances = match &args.surface {
        Some(path) => vec![load_surface(ctx, path)?.max_local_significance()],
        None => args.max_local_sig.clone(),
    };

    let corrector = ctx.corrector();
    if let [z] = significances.as_slice() {
        let correction = corrector.correct_fitted(*z, &calibration, &fit)?;
        log_event!(
            ctx.log,
            INFO,
            event_names::CORRECT_FINISHED,
            Stage::Correct,
            "Global significance computed",
            local_significance = correction.local_significance,
            global_p_value = correction.global_p_value
        );
        return emit(ctx, &correction);
    }

    let channels: Vec<(String, f64)> = significances
        .iter()
        .enumerate()
        .map(|(i, z)| (format!("channel-{}", i), *z))
        .collect();
    let batch = corrector.correct_channels_fitted(&channels, &calibration, &fit);
    log_event!(
        ctx.log,
        INFO,
        event_names::CORRECT_FINISHED,
        Stage::Correct,
        "Channels corrected",
        succeeded = batch.summary.succeeded,
        failed = batch.summary.failed
    );

    let code = emit(ctx, &batch)?;
    Ok(if batch.summary.all_succeeded {
        code
    } else {
        ExitCode::PartialFail
    })
}

fn run_check(ctx: &RunContext) -> Result<ExitCode, Error> {
    emit(
        ctx,
        &CheckReport {
            valid: true,
            snapshot: ConfigSnapshot::new(&ctx.resolved),
            report: ctx.resolved.config.report,
        },
    )
}

fn print_version(format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let version_info = serde_json::json!({
                "schema_version": SCHEMA_VERSION,
                "config_schema_version": lee_config::CONFIG_SCHEMA_VERSION,
                "lee2d_version": env!("CARGO_PKG_VERSION"),
                "rust_version": env!("CARGO_PKG_RUST_VERSION"),
            });
            println!("{:#}", version_info);
        }
        _ => {
            println!("lee2d {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", SCHEMA_VERSION);
        }
    }
}
