//! chartpl CLI - render chart templates with layered values

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod error;
mod exit_codes;
mod render;

use render::RenderRequest;

#[derive(Parser, Debug)]
#[command(name = "chartpl")]
#[command(version)]
#[command(about = "Render chart templates with layered values in strict mode", long_about = None)]
struct Cli {
    /// Chart directory
    chart: PathBuf,

    /// Values file or http(s) URL to merge (repeatable, later wins)
    #[arg(short = 'f', long = "values", value_name = "FILE|URL")]
    values: Vec<String>,

    /// Set values on command line (key=value, repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Read a YAML values document from standard input
    #[arg(long)]
    values_from_stdin: bool,

    /// Release name exposed as Release.Name
    #[arg(short = 'n', long, env = "CHARTPL_RELEASE_NAME")]
    name: Option<String>,

    /// Release namespace exposed as Release.Namespace
    #[arg(long, env = "CHARTPL_NAMESPACE")]
    namespace: Option<String>,

    /// Render only these templates, in this order (file name without .yaml)
    #[arg(long = "template", value_name = "NAME")]
    templates: Vec<String>,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

fn init_logger(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(exit_codes::USAGE_ERROR)
            } else {
                ExitCode::from(exit_codes::SUCCESS)
            };
        }
    };

    init_logger(cli.debug);

    let request = RenderRequest {
        values_files: &cli.values,
        set_values: &cli.set,
        values_from_stdin: cli.values_from_stdin,
        release_name: cli.name.clone(),
        namespace: cli.namespace.clone(),
        templates: &cli.templates,
        debug: cli.debug,
    };

    let result = render::run(
        &cli.chart,
        &request,
        &mut std::io::stdin().lock(),
        &mut std::io::stdout().lock(),
    );

    match result {
        Ok(_) => ExitCode::from(exit_codes::SUCCESS),
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(code)
        }
    }
}
