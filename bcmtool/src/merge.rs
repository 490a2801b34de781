use std::path::PathBuf;

#[derive(clap::Args, Debug)]
pub struct MergeOpts {
    /// Original image file.
    #[arg(short, long)]
    input: PathBuf,
    /// Replacement root filesystem.
    #[arg(short, long)]
    rootfs: PathBuf,
    /// Replacement kernel.
    #[arg(short, long)]
    kernel: PathBuf,
    /// Output image file.
    #[arg(short, long)]
    output: PathBuf,
    /// Override the signature2 field.
    #[arg(short, long)]
    signature: Option<String>,
}

impl crate::ToolRun for MergeOpts {
    fn run(&self) -> anyhow::Result<()> {
        let image = bcmlib::FirmwareImage::new(std::fs::read(&self.input)?)?;
        let rootfs = std::fs::read(&self.rootfs)?;
        let kernel = std::fs::read(&self.kernel)?;

        let signature2 = match &self.signature {
            Some(s) => Some(bcmlib::Signature::from_str(s)?),
            None => None,
        };

        println!("original image");
        println!("{}", image.tag());
        println!();

        let merged = image.merge(&rootfs, &kernel, signature2)?;

        println!("merged image");
        println!("{}", merged.tag());

        std::fs::write(&self.output, &merged[..])?;
        Ok(())
    }
}
