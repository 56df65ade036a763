use clap::{Parser, Subcommand};
use simple_blog::search::{FileIndexSource, SearchWidget, WidgetState};
use simple_blog::serve::{self, ServeOptions};
use simple_blog::{config, generate, output, scan};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simple-blog")]
#[command(about = "Static site generator for technology blogs")]
#[command(long_about = "\
Static site generator for technology blogs

Markdown files with YAML front matter become a static HTML site, an RSS feed,
and a JSON search index with a small in-page search widget.

Content structure:

  content/
  ├── config.toml                       # Site config (optional)
  ├── index.md                          # Home page intro (optional)
  ├── about.md                          # Page → /about/
  ├── assets/                           # Copied verbatim to the output root
  └── _posts/
      ├── 2024-03-15-eks-ingress.md     # Post → /2024/03/15/eks-ingress/
      └── 2024-04-01-pod-identity.md

Front matter:

  ---
  title: EKS Ingress                    # Required
  date: 2024-03-15 10:30:00 +0900       # Required unless the filename has one
  tags: [kubernetes, aws]
  series: EKS Deep Dive
  series_part: 1.1                      # Required when series is set
  ---

Run 'simple-blog gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (scan manifest)
    #[arg(long, default_value = ".simple-blog-temp", global = true)]
    temp_dir: PathBuf,

    /// Log progress (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan and render the content directory into the output directory
    Build,
    /// Validate content without writing anything
    Check,
    /// Scan the content directory and write the site manifest
    Scan,
    /// Build, serve the output over HTTP, and rebuild on changes
    Serve {
        /// Port to listen on (overrides [serve] port)
        #[arg(long)]
        port: Option<u16>,
        /// Don't rebuild when content changes
        #[arg(long)]
        no_watch: bool,
    },
    /// Query the built search index
    Search {
        /// Case-insensitive substring to look for
        query: String,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build => {
            println!("==> Scanning {}", cli.source.display());
            let site = scan::scan(&cli.source)?;
            println!("==> Generating HTML → {}", cli.output.display());
            let summary = generate::generate(&site, &cli.source, &cli.output)?;
            output::print_generate_output(&site, &summary);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let site = scan::scan(&cli.source)?;
            generate::resolve_layouts(&site)?;
            output::print_check_output(&site);
        }
        Command::Scan => {
            let site = scan::scan(&cli.source)?;
            std::fs::create_dir_all(&cli.temp_dir)?;
            let manifest_path = cli.temp_dir.join("manifest.json");
            let json = serde_json::to_string_pretty(&site)?;
            std::fs::write(&manifest_path, json)?;
            output::print_scan_output(&site, &cli.source);
        }
        Command::Serve { port, no_watch } => {
            serve::serve_site(&ServeOptions {
                source: cli.source,
                output: cli.output,
                port,
                no_watch,
            })?;
        }
        Command::Search { query } => {
            let site_config = config::load_config(&cli.source)?;
            let search = &site_config.search;
            let shortcut = search.shortcut.chars().next().unwrap_or('/');
            let source = FileIndexSource::new(cli.output.join(&search.index_path));

            let mut widget = SearchWidget::new(search.max_results, shortcut);
            widget.load_from(&source);
            widget.on_input(&query);
            if let WidgetState::Errored { message } = widget.state() {
                return Err(format!(
                    "search unavailable ({}): {message}",
                    source.path().display()
                )
                .into());
            }
            output::print_search_output(&query, widget.hits());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
