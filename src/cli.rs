use crate::output::Format;
use crate::pipeline::RunConfig;
use clap::Parser;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Examples:
  permtemplate --source-dir ./app --template-file perms.json.j2 --output-file perms.json
  permtemplate -s /etc/app -t perms.yaml.j2 -o perms.yaml --output-format yaml \\
      --exclude-patterns '*.log' '!important.log' 'cache/'

Templates receive one variable, `files`: a list of
{file_path, permissions: {user, group, other, owner, group_id, mode, file_size}}.";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "permtemplate",
    version,
    about = "Generate permission templates from existing permission assignments",
    after_help = AFTER_HELP
)]
pub struct Args {
    /// Directory to analyze permissions from
    #[arg(short = 's', long = "source-dir")]
    pub source_dir: PathBuf,

    /// File to write the rendered template to
    #[arg(short = 'o', long = "output-file")]
    pub output_file: PathBuf,

    /// Jinja-style template used to render the collected records
    #[arg(short = 't', long = "template-file")]
    pub template_file: PathBuf,

    /// Gitignore-style patterns to exclude (e.g. '*.log', 'temp/')
    #[arg(
        short = 'e',
        long = "exclude-patterns",
        num_args = 0..,
        action = clap::ArgAction::Append
    )]
    pub exclude_patterns: Vec<String>,

    /// Format of the output file
    #[arg(long = "output-format", value_enum, default_value_t = Format::Json)]
    pub output_format: Format,

    /// Follow symbolic links to directories while scanning
    #[arg(short = 'f', long = "follow-symlinks")]
    pub follow_symlinks: bool,

    /// Render undefined template variables as empty instead of failing
    #[arg(long = "allow-undefined")]
    pub allow_undefined: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Args {
    /// Enforce invariants after parsing.
    pub fn validated(mut self) -> Self {
        if self.quiet {
            self.verbose = 0;
        }
        self.exclude_patterns.retain(|p| !p.trim().is_empty());
        self
    }

    /// Default tracing filter for the requested verbosity.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            source_dir: self.source_dir.clone(),
            output_file: self.output_file.clone(),
            template_file: self.template_file.clone(),
            exclude_patterns: self.exclude_patterns.clone(),
            format: self.output_format,
            follow_symlinks: self.follow_symlinks,
            strict_undefined: !self.allow_undefined,
        }
    }
}
