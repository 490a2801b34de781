use std::path::PathBuf;

use bcmlib::tag::{DTB_LEN, TAG_LEN};

#[derive(clap::Args, Debug)]
pub struct SplitOpts {
    /// Image file to split.
    #[arg(short, long)]
    input: PathBuf,
    /// Destination directory, must not exist yet.
    #[arg(short, long)]
    directory: PathBuf,
}

impl crate::ToolRun for SplitOpts {
    fn run(&self) -> anyhow::Result<()> {
        let image = bcmlib::FirmwareImage::new(std::fs::read(&self.input)?)?;

        if self.directory.exists() {
            anyhow::bail!(
                "directory {} already exists, cannot split",
                self.directory.display()
            );
        }

        let regions = image.split()?;
        let tag = image.tag();

        println!("file size:      {}", image.len());
        println!("tag length:     {}", TAG_LEN);
        println!("cfe length:     {}", tag.cfe_len);
        println!("rootfs size:    {}", regions.rootfs.len());
        println!("kernel size:    {}", regions.kernel.len());
        println!("dtb length:     {}", DTB_LEN);
        println!("postfix length: {}", regions.postfix.len());

        std::fs::create_dir_all(&self.directory)?;
        std::fs::write(self.directory.join("rootfs"), &regions.rootfs)?;
        std::fs::write(self.directory.join("kernel"), &regions.kernel)?;
        std::fs::write(self.directory.join("post"), &regions.postfix)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use crate::ToolRun;

    use super::*;

    #[test]
    fn refuses_existing_directory() {
        let dir = std::env::temp_dir().join(format!("bcmtool-split-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        // a zeroed tag followed by an empty-region body is a valid image
        let input = dir.join("image.bin");
        std::fs::write(&input, vec![0u8; TAG_LEN + DTB_LEN]).unwrap();

        let opts = SplitOpts {
            input: input.clone(),
            directory: dir.clone(),
        };
        assert!(opts.run().is_err());

        // nothing was extracted next to the image
        let entries = std::fs::read_dir(&dir).unwrap().count();
        assert_eq!(entries, 1);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
