use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use yavp_archive::{extract::list, VpArchive};

#[derive(Args)]
pub struct ListArgs {
    /// An input VP file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let data = std::fs::read(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let vp = VpArchive::new(&data).context(format!("parsing {}", &self.file.display()))?;

        list(vp.root(), &mut std::io::stdout().lock())?;

        Ok(())
    }
}
