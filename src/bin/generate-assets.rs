#![forbid(unsafe_code)]

use anyhow::Context;
use clap::CommandFactory;
use clap_complete::{generate_to, Shell};
use clap_mangen::Man;
use permtemplate::cli::Args;
use std::fs;
use std::path::PathBuf;

/// Usage: generate-assets [OUT_DIR]   (default: dist)
fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("dist"));
    let completions_dir = out_dir.join("completions");
    let man_dir = out_dir.join("man");

    fs::create_dir_all(&completions_dir)
        .with_context(|| format!("{}: cannot create directory", completions_dir.display()))?;
    fs::create_dir_all(&man_dir)
        .with_context(|| format!("{}: cannot create directory", man_dir.display()))?;

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish, Shell::PowerShell] {
        let mut cmd = Args::command();
        generate_to(shell, &mut cmd, "permtemplate", &completions_dir)
            .with_context(|| format!("failed to generate {shell} completions"))?;
    }

    let mut buffer = Vec::new();
    Man::new(Args::command()).render(&mut buffer)?;
    fs::write(man_dir.join("permtemplate.1"), buffer)?;

    eprintln!(
        "generated shell completions and man page under {}",
        out_dir.display()
    );
    Ok(())
}
