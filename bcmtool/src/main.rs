use clap::Parser;

mod common;
mod info;
mod merge;
mod split;

trait ToolRun {
    fn run(&self) -> anyhow::Result<()>;
}

/// Edit Broadcom-style router firmware images.
#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct ToolOptions {
    #[command(subcommand)]
    command: ToolCommand,
}

#[derive(clap::Subcommand, Debug)]
enum ToolCommand {
    /// Print the tag (header) of an image.
    Info(info::InfoOpts),
    /// Extract rootfs, kernel and postfix from an image.
    Split(split::SplitOpts),
    /// Create a new image with a custom rootfs and kernel, using the
    /// original image as base.
    Merge(merge::MergeOpts),
}

impl ToolRun for ToolCommand {
    fn run(&self) -> anyhow::Result<()> {
        use ToolCommand::*;
        match self {
            Info(o) => o.run(),
            Split(o) => o.run(),
            Merge(o) => o.run(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    ToolOptions::parse().command.run()
}
