//! CLI tool for applying a PowerPoint template to a batch of presentations.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use retemplate_batch::{Jobs, Workspace};
use retemplate_core::{ProgressEvent, Settings, Stage, TemplateApplicator};
use retemplate_pptx::PptxHost;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Re-template PowerPoint decks and tidy up their title-less slides.
#[derive(Parser, Debug)]
#[command(name = "ppt-retemplate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Workspace folder for jobs (overrides the settings file)
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a template to every presentation of a folder
    Apply {
        /// Template presentation
        #[arg(short, long)]
        template: PathBuf,

        /// Folder with the source presentations
        #[arg(short, long)]
        input: PathBuf,

        /// Folder for the converted presentations
        #[arg(short, long)]
        output: PathBuf,

        /// Number of trailing slides eligible for the fallback layout
        #[arg(long)]
        window: Option<usize>,

        /// Do not use closing keywords to pick slides
        #[arg(long)]
        no_keywords: bool,
    },

    /// Submit a conversion job for a zip of presentations and wait for it
    Submit {
        /// Template presentation (.ppt or .pptx)
        #[arg(short, long)]
        template: PathBuf,

        /// Zip archive with the presentations
        #[arg(short, long)]
        archive: PathBuf,

        /// Copy the converted archive here and clean the job up
        #[arg(long)]
        collect: Option<PathBuf>,
    },

    /// Print the progress record of a job
    Progress {
        id: String,
    },

    /// Copy a finished job's archive out and clean the job up
    Collect {
        id: String,

        /// Destination folder
        #[arg(long)]
        to: PathBuf,
    },

    /// List the layouts and slides of a presentation
    Inspect {
        file: PathBuf,
    },

    /// Fill a template's slides from a `#`-separated text file
    Fill {
        /// Template presentation (.pptx)
        #[arg(short, long)]
        template: PathBuf,

        /// Text file with the sections
        #[arg(long)]
        content: PathBuf,

        /// Output presentation
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut settings = Settings::load_or_default(args.config.as_deref())
        .with_context(|| "Failed to load settings")?;
    if let Some(workspace) = &args.workspace {
        settings.workspace = workspace.clone();
    }

    match args.command {
        Command::Apply {
            template,
            input,
            output,
            window,
            no_keywords,
        } => {
            let mut options = settings.normalization.clone();
            if let Some(n) = window {
                options = options.with_trailing_window(n);
            }
            if no_keywords {
                options = options.with_keywords_enabled(false);
            }
            apply(&template, &input, &output, options, args.verbose)?;
        }
        Command::Submit {
            template,
            archive,
            collect,
        } => {
            let jobs = jobs(&settings);
            let handle = jobs
                .submit(&template, &archive)
                .with_context(|| format!("Failed to submit {}", archive.display()))?;
            let id = handle.id.clone();
            eprintln!("Submitted job {}", id);
            handle.wait();

            if let Some(record) = jobs.progress(&id)? {
                println!("{}", serde_json::to_string_pretty(&record)?);
                if let Some(dest) = collect {
                    if record.status == retemplate_batch::JobStatus::Done {
                        let path = jobs.collect(&id, &dest)?;
                        eprintln!("Written to: {}", path.display());
                    } else {
                        jobs.cleanup(&id);
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
        }
        Command::Progress { id } => match jobs(&settings).progress(&id)? {
            Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
            None => {
                println!("{}", serde_json::json!({ "status": "unknown" }));
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Collect { id, to } => {
            let path = jobs(&settings)
                .collect(&id, &to)
                .with_context(|| format!("Failed to collect job {}", id))?;
            println!("{}", path.display());
        }
        Command::Inspect { file } => {
            let report = retemplate_pptx::inspect(&file)
                .with_context(|| format!("Failed to inspect {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Fill {
            template,
            content,
            output,
        } => {
            let report = retemplate_pptx::fill_file(&template, &content, &output)
                .with_context(|| format!("Failed to fill {}", template.display()))?;
            if args.verbose {
                eprintln!("  Filled slides {:?}, skipped {} section(s)", report.filled, report.skipped);
            }
            eprintln!("Written to: {}", output.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn jobs(settings: &Settings) -> Jobs<fn() -> retemplate_core::Result<PptxHost>> {
    fn pptx_host() -> retemplate_core::Result<PptxHost> {
        Ok(PptxHost::new())
    }
    Jobs::new(
        Workspace::new(&settings.workspace),
        settings.normalization.clone(),
        pptx_host as fn() -> retemplate_core::Result<PptxHost>,
    )
}

/// Run the applicator over a folder, reporting each stage on stderr.
fn apply(
    template: &Path,
    input: &Path,
    output: &Path,
    options: retemplate_core::NormalizeOptions,
    verbose: bool,
) -> Result<()> {
    let applicator = TemplateApplicator::new().with_options(options);
    let report = |event: &ProgressEvent| match event.stage {
        Stage::Opening => eprintln!("Processing: {}", event.current_file),
        Stage::Error => eprintln!(
            "Error processing {}: {}",
            event.current_file,
            event.error.as_deref().unwrap_or("unknown error")
        ),
        stage if verbose => eprintln!("  {}", stage.as_str()),
        _ => {}
    };

    let converted = applicator
        .convert_with_progress(&mut PptxHost::new(), template, input, output, report)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    if converted.is_empty() {
        bail!("No presentation was converted");
    }
    eprintln!("Converted {} file(s) into {}", converted.len(), output.display());
    Ok(())
}
