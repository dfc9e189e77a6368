// SPDX-License-Identifier: (LGPL-2.1 OR BSD-2-Clause)
use clap::Parser;
mod outf;
extern crate sofa;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Columnar,
    Csv,
    Json,
    Toml,
}

#[derive(Debug, Parser)]
#[clap(
    version,
    long_about = r#"
Resolve the run configuration for the SOFA profiling and visualization tools.

Settings are taken, lowest precedence first, from:
- Built-in defaults
- A TOML file given with '--config'
- The flags below

The resolved configuration is printed in a columnar, CSV, JSON or TOML format.
TOML output can be fed back in with '--config':
```sh
sofa-config --viz-port 9001 --cpu-filters idle:black -f toml -o /tmp/sofa.toml
sofa-config --config /tmp/sofa.toml --enable-pcm
```
"#
)]
struct Cli {
    /// TOML file to read settings from before applying flags
    #[arg(long, short)]
    config: Option<std::path::PathBuf>,
    /// CPU filters to append, as 'keyword:color,keyword:color,...'
    ///
    /// Keywords may contain '::', only the last ':' separates the color.
    #[arg(long, verbatim_doc_comment)]
    cpu_filters: Option<String>,
    /// GPU filters to append (see '--cpu-filters')
    #[arg(long)]
    gpu_filters: Option<String>,
    /// Network filters to append (see '--cpu-filters')
    #[arg(long)]
    net_filters: Option<String>,
    /// Hardware counters to sample, comma separated
    #[arg(long, short = 'e')]
    perf_events: Option<String>,
    /// Verbose debug output (also sets 'verbose' in the configuration)
    #[arg(long, short)]
    verbose: bool,
    /// Iteration count for repeated measurements
    #[arg(long)]
    num_iterations: Option<u32>,
    /// Number of parallel measurement groups
    #[arg(long)]
    num_swarms: Option<u32>,
    /// How many of the hottest CPU entries to report
    #[arg(long)]
    cpu_top_k: Option<u32>,
    /// Scaling factor for generated plots
    #[arg(long, value_parser = parse_finite)]
    plot_ratio: Option<f64>,
    /// Port for the visualization server
    #[arg(long, short = 'p')]
    viz_port: Option<u16>,
    /// Time-alignment correction added to CPU timestamps
    #[arg(long, allow_negative_numbers = true, value_parser = parse_finite)]
    cpu_time_offset: Option<f64>,
    /// Sample all CPUs
    #[arg(long)]
    profile_all_cpus: bool,
    /// Enable AISI
    #[arg(long)]
    enable_aisi: bool,
    /// Enable HSG
    #[arg(long)]
    enable_hsg: bool,
    /// Enable vmstat collection
    #[arg(long)]
    enable_vmstat: bool,
    /// Enable PCM collection
    #[arg(long)]
    enable_pcm: bool,
    /// Enable CUDA API call tracing
    #[arg(long)]
    cuda_api_tracing: bool,
    /// Path to an external script
    #[arg(long)]
    script_path: Option<String>,
    /// Some output styles are better for humans (columnar), others for machines
    ///
    /// - columnar
    ///   viz_port             8000
    /// - csv
    ///   viz_port,8000
    /// - json
    ///   {"viz_port": 8000, ...}
    /// - toml
    ///   viz_port = 8000
    #[arg(long, short = 'f', default_value = "columnar", verbatim_doc_comment)]
    output_format: OutputFormat,
    /// Write the configuration to this file, if present, or to standard output if not given
    #[arg(long, short = 'o')]
    output_file: Option<std::path::PathBuf>,
    /// Omit the header (field/value) as the first line of output
    ///
    /// Has no effect when the output format ('-f, --output-format') is json or toml.
    #[arg(long, verbatim_doc_comment)]
    no_header: bool,
}

// JSON has no spelling for nan or inf, so they would come out as null
fn parse_finite(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("'{s}' is not a finite number")),
        Err(e) => Err(e.to_string()),
    }
}

impl Cli {
    fn resolve(&self) -> Result<sofa::SofaConfig, sofa::Error> {
        use sofa::Subsystem::*;
        let mut cfg = match &self.config {
            Some(path) => sofa::SofaConfig::load(path)?,
            None => sofa::SofaConfig::default(),
        };
        for (subsystem, filters) in [
            (Cpu, &self.cpu_filters),
            (Gpu, &self.gpu_filters),
            (Net, &self.net_filters),
        ] {
            if let Some(filters) = filters {
                let filters = sofa::parse_filter_list(filters)?;
                log::debug!("Appending {} {subsystem} filter(s)", filters.len());
                cfg.filters_mut(subsystem).extend(filters);
            }
        }
        macro_rules! override_with {
            ($($field:ident),* $(,)?) => {
                $(
                    if let Some(v) = &self.$field {
                        cfg.$field = v.clone();
                    }
                )*
            };
        }
        macro_rules! enable_if {
            ($($field:ident),* $(,)?) => {
                $(
                    if self.$field {
                        cfg.$field = true;
                    }
                )*
            };
        }
        override_with!(
            perf_events,
            num_iterations,
            num_swarms,
            cpu_top_k,
            plot_ratio,
            viz_port,
            cpu_time_offset,
            script_path,
        );
        enable_if!(
            verbose,
            profile_all_cpus,
            enable_aisi,
            enable_hsg,
            enable_vmstat,
            enable_pcm,
            cuda_api_tracing,
        );
        Ok(cfg)
    }
}

fn render_columnar(cfg: &sofa::SofaConfig, header: bool) -> String {
    let mut lines = Vec::new();
    if header {
        lines.push(format!("{:<20} {}", "field", "value"));
    }
    for (name, value) in cfg.entries() {
        lines.push(format!("{name:<20} {value}").trim_end().to_string());
    }
    lines.join("\n")
}

fn render_csv(cfg: &sofa::SofaConfig, header: bool) -> Result<String, Box<dyn std::error::Error>> {
    let mut buf = Vec::new();
    {
        let mut wtr = csv::WriterBuilder::new().from_writer(&mut buf);
        if header {
            wtr.write_record(["field", "value"])?;
        }
        for (name, value) in cfg.entries() {
            wtr.write_record([name, value.as_str()])?;
        }
        wtr.flush()?;
    }
    Ok(String::from_utf8(buf)?.trim_end_matches('\n').to_string())
}

fn render(
    cfg: &sofa::SofaConfig,
    output_format: OutputFormat,
    header: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    use OutputFormat::*;
    Ok(match output_format {
        Columnar => render_columnar(cfg, header),
        Csv => render_csv(cfg, header)?,
        Json => serde_json::to_string_pretty(cfg)?,
        Toml => cfg.to_toml_string()?.trim_end_matches('\n').to_string(),
    })
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Cli::parse();
    init_logging(opts.verbose);
    let cfg = opts.resolve()?;
    log::debug!("Resolved configuration: {cfg:?}");
    outf::init(&opts.output_file)?;
    outf::outfprintln!("{}", render(&cfg, opts.output_format, !opts.no_header)?);
    Ok(())
}
