use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::{
    fs::File,
    io::{Cursor, Write},
    path::PathBuf,
};
use tracing::info;
use yavp_archive::{
    plan::{plan, EmptyFilePolicy},
    PlanOptions, VpWriter,
};

#[derive(Args)]
pub struct PackArgs {
    /// An input directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// A target VP file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Leave empty files out instead of failing
    #[arg(long, default_value_t = false)]
    skip_empty: bool,

    /// Add entries sorted by name instead of in filesystem order
    #[arg(long, default_value_t = false)]
    sorted: bool,
}

impl PackArgs {
    pub fn handle(&self) -> Result<()> {
        info!("creating {}", &self.file.display());

        let options = PlanOptions::builder()
            .empty_files(if self.skip_empty {
                EmptyFilePolicy::Skip
            } else {
                EmptyFilePolicy::Reject
            })
            .sort_entries(self.sorted)
            .build();

        let root = plan(&self.directory, options)
            .context(format!("reading {}", &self.directory.display()))?;
        let files = root.file_count();
        let directories = root.directory_count();

        // The target is only opened once the whole archive is built
        let archive = VpWriter::new(Cursor::new(Vec::new()))
            .finish(root)
            .context("writing archive")?
            .into_inner();

        let mut out = if !self.overwrite {
            File::create_new(&self.file)
                .into_diagnostic()
                .context(format!("creating {}", &self.file.display()))?
        } else {
            File::create(&self.file)
                .into_diagnostic()
                .context(format!("creating {}", &self.file.display()))?
        };
        out.write_all(&archive)
            .into_diagnostic()
            .context(format!("writing {}", &self.file.display()))?;

        info!(files, directories, bytes = archive.len(), "packed {}", &self.file.display());

        Ok(())
    }
}
