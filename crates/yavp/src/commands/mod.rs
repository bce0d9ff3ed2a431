pub mod extract;
pub mod list;
pub mod pack;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Pack a directory into a VP file
    Pack(pack::PackArgs),
    /// Extract a VP file, or a single entry of it, into a directory
    Extract(extract::ExtractArgs),
    /// Print the tree stored in a VP file
    List(list::ListArgs),
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Pack(pack) => pack.handle(),
            Commands::Extract(extract) => extract.handle(),
            Commands::List(list) => list.handle(),
        }
    }
}
