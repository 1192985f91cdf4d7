use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "squeeze-batch",
    about = "Re-encode a batch of images at one quality and export them",
    long_about = "squeeze-batch decodes every supplied image, re-encodes it in its original format \
                  at the requested quality and reports the before/after size of each file. \
                  Results are written one file per image or bundled into a single zip archive.",
    version,
    after_help = "EXAMPLES:\n  \
    squeeze-batch compress a.jpg b.png -o ./compressed -q 70\n  \
    squeeze-batch archive photos/*.jpg -o ./out -q 60 --deflate-level 1"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short = 'v', long, global = true, help = "Show debug logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Only print errors")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress images into individual files",
        long_about = "Write one compressed_<name> file per image into the output directory. \
                      Images that fail to compress are reported and skipped."
    )]
    Compress {
        #[command(flatten)]
        batch: BatchArgs,
    },

    #[command(
        about = "Compress images into a single zip archive",
        long_about = "Write compressed_images.zip into the output directory. \
                      The archive is only written when every image compressed successfully."
    )]
    Archive {
        #[command(flatten)]
        batch: BatchArgs,

        #[arg(
            long,
            default_value_t = crate::constants::DEFAULT_DEFLATE_LEVEL,
            help = "DEFLATE level for archive entries (0-9)"
        )]
        deflate_level: u32,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct BatchArgs {
    #[arg(required = true, help = "Input files; non-image files are skipped")]
    pub inputs: Vec<PathBuf>,

    #[arg(short = 'o', long, help = "Output directory path")]
    pub output: PathBuf,

    #[arg(
        short = 'q',
        long,
        help = "Compression quality (1-100, default: 80)",
        long_help = "Compression quality from 1 (smallest) to 100 (best). \
                     Only JPEG, WebP and AVIF use it; other formats are re-encoded losslessly."
    )]
    pub quality: Option<u8>,

    #[arg(
        short = 'j',
        long,
        help = "Number of parallel threads (default: auto)",
        long_help = "Number of worker threads used to compress images. \
                     If not specified, uses number of CPU cores."
    )]
    pub threads: Option<usize>,
}
