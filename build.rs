//! Build script rendering `snapwire(1)` and one page per subcommand, such as
//! `snapwire-serve(1)`, from the CLI definition.

use std::{fs, io, path::Path};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

const MAN_DIR: &str = "target/generated-man";

fn render(cmd: clap::Command, page_name: &str, dir: &Path) -> io::Result<()> {
    let file = dir.join(format!("{page_name}.1"));
    let mut page = Vec::new();
    Man::new(cmd).render(&mut page)?;
    fs::write(file, page)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let dir = Path::new(MAN_DIR);
    fs::create_dir_all(dir)?;

    let root = cli::Cli::command();
    for sub in root.get_subcommands().filter(|sub| !sub.is_hide_set()) {
        let name = format!("{}-{}", root.get_name(), sub.get_name());
        render(sub.clone().display_name(name.clone()), &name, dir)?;
    }
    let name = root.get_name().to_owned();
    render(root, &name, dir)?;
    Ok(())
}
