use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct InfoOpts {
    /// Image file to inspect.
    #[arg(short, long)]
    input: PathBuf,
}

impl crate::ToolRun for InfoOpts {
    fn run(&self) -> anyhow::Result<()> {
        let image = bcmlib::FirmwareImage::new(std::fs::read(&self.input)?)?;
        let tag = image.tag();

        println!("{}", tag);

        if !tag.info1.is_zeroed() {
            println!("vendor info 1:");
            crate::common::dump("   ", tag.info1.data());
        }
        if !tag.info2.is_zeroed() {
            println!("vendor info 2:");
            crate::common::dump("   ", tag.info2.data());
        }

        if !image.check() {
            eprintln!("warning: tag CRC does not match header contents");
        }
        Ok(())
    }
}
