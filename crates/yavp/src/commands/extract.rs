use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::info;
use yavp_archive::{
    extract::{extract, extract_path},
    ExtractOptions, VpArchive,
};

#[derive(Args)]
pub struct ExtractArgs {
    /// An input VP file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Only extract this entry, for example data/maps/level01.fs2
    #[arg(short, long, value_name = "PATH")]
    path: Option<String>,

    /// Allow overwriting existing files
    #[arg(long, default_value_t = false)]
    overwrite: bool,

    /// Do not restore modification times
    #[arg(long, default_value_t = false)]
    no_mtime: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let data = std::fs::read(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let vp = VpArchive::new(&data).context(format!("parsing {}", &self.file.display()))?;

        let options = ExtractOptions::builder()
            .overwrite(self.overwrite)
            .preserve_mtime(!self.no_mtime)
            .build();

        match &self.path {
            Some(path) => {
                extract_path(vp.root(), path, &self.directory, options)?;
                info!("extracted {} from {}", path, &self.file.display());
            }
            None => {
                extract(vp.root(), &self.directory, options)?;
                info!(
                    files = vp.len(),
                    directories = vp.root().directory_count(),
                    "extracted {}",
                    &self.file.display()
                );
            }
        }

        Ok(())
    }
}
