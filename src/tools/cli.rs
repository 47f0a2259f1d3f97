use std::{fmt::Display, fmt::Formatter};

use clap::Parser;
use log::{info, LevelFilter};

use super::options::EncoderOptions;

/// Verbosity of user information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Errors,
    Warnings,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    /// The log level this verbosity lets through.
    pub fn level_filter(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::Off,
            Verbosity::Errors => LevelFilter::Error,
            Verbosity::Warnings => LevelFilter::Warn,
            Verbosity::Info => LevelFilter::Info,
            Verbosity::Debug => LevelFilter::Debug,
            Verbosity::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Define the two output channels
pub enum Output {
    File,
    Stdout,
}
impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Everything the binary needs to know to do its job.
#[derive(Debug)]
pub struct BzOpts {
    /// Vec of names of files to read for input. Empty means stdin.
    pub files: Vec<String>,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Don't remove input files after processing
    pub keep_input_files: bool,
    /// Location where output is sent
    pub output: Output,
    /// Verbosity of user information
    pub verbose: Verbosity,
    /// Thread count and block size
    pub encoder: EncoderOptions,
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    name = "pbzip2",
    version,
    about = "A parallel, block-sorting file compressor producing standard bzip2 files",
    long_about = "
    Compresses each FILE to FILE.bz2, one block per thread. With no FILE, compresses
    standard input to standard output. The output can be read by any bzip2 decoder."
)]
struct Args {
    /// Files to compress
    #[clap()]
    files: Vec<String>,

    /// Decompression is not supported by this program
    #[clap(short = 'd', long = "decompress")]
    decompress: bool,

    /// Compress (the default, accepted for compatibility)
    #[clap(short = 'z', long = "compress")]
    compress: bool,

    /// Overwrite existing output files
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Keep (don't delete) input files
    #[clap(short = 'k', long = "keep")]
    keep: bool,

    /// Send output to standard out
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    /// Maximum compression threads. Defaults to one per core
    #[clap(short = 'p', long = "threads")]
    threads: Option<usize>,

    /// Suppress noncritical messages
    #[clap(short = 'q', long = "quiet")]
    quiet: bool,

    /// Be verbose (a 2nd -v gives more)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Alias for -1
    #[clap(long = "fast")]
    fast: bool,

    /// Alias for -9
    #[clap(long = "best")]
    best: bool,

    #[clap(short = '1', hide = true)]
    l1: bool,
    #[clap(short = '2', hide = true)]
    l2: bool,
    #[clap(short = '3', hide = true)]
    l3: bool,
    #[clap(short = '4', hide = true)]
    l4: bool,
    #[clap(short = '5', hide = true)]
    l5: bool,
    #[clap(short = '6', hide = true)]
    l6: bool,
    #[clap(short = '7', hide = true)]
    l7: bool,
    #[clap(short = '8', hide = true)]
    l8: bool,
    #[clap(short = '9', hide = true)]
    l9: bool,
}

impl Args {
    /// The block size level asked for, if any. When several are given the largest wins.
    fn level(&self) -> Option<u8> {
        let levels = [
            self.l1 || self.fast,
            self.l2,
            self.l3,
            self.l4,
            self.l5,
            self.l6,
            self.l7,
            self.l8,
            self.l9 || self.best,
        ];
        levels.iter().rposition(|&set| set).map(|i| i as u8 + 1)
    }

    fn verbosity(&self) -> Verbosity {
        if self.quiet {
            return Verbosity::Quiet;
        }
        match self.verbose {
            0 => Verbosity::Warnings,
            1 => Verbosity::Info,
            2 => Verbosity::Debug,
            _ => Verbosity::Trace,
        }
    }
}

/// Parse an argument list (program name first) into BzOpts.
pub fn parse_bzopts<I, T>(args: I) -> Result<BzOpts, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = Args::try_parse_from(args)?;
    if args.decompress {
        return Err(clap::Error::raw(
            clap::ErrorKind::ArgumentConflict,
            "decompression is not supported; use bzip2 -d\n",
        ));
    }

    let mut encoder = EncoderOptions::new();
    if let Some(level) = args.level() {
        encoder = encoder.with_level(level);
    }
    if let Some(threads) = args.threads {
        encoder = encoder.with_threads(threads);
    }

    Ok(BzOpts {
        output: if args.stdout || args.files.is_empty() {
            Output::Stdout
        } else {
            Output::File
        },
        force_overwrite: args.force,
        keep_input_files: args.keep || args.stdout,
        verbose: args.verbosity(),
        files: args.files,
        encoder,
    })
}

/// Read the command line, set the log level, and report what we are about to do. Exits with a
/// usage message on bad arguments.
pub fn bzopts_init() -> BzOpts {
    let opts = match parse_bzopts(std::env::args_os()) {
        Ok(opts) => opts,
        Err(e) => e.exit(),
    };
    log::set_max_level(opts.verbose.level_filter());

    info!("---- Bzip2 Initialization Start ----",);
    info!("Verbosity set to {}", log::max_level());
    match opts.files.len() {
        0 => info!("Getting input from stdin"),
        n => info!("Compressing {} file(s)", n),
    }
    info!("Sending output to {}", opts.output);
    info!("Block size set to {}00k", opts.encoder.level());
    info!("Using up to {} threads", opts.encoder.threads());
    if opts.force_overwrite {
        info!("Forcing file overwriting")
    };
    if opts.keep_input_files {
        info!("Keeping input files")
    };
    info!("---- Bzip2 Initialization End ----\n");
    opts
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> BzOpts {
        parse_bzopts(std::iter::once("pbzip2").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_test() {
        let opts = parse(&["a.txt"]);
        assert_eq!(opts.files, vec!["a.txt"]);
        assert_eq!(opts.output, Output::File);
        assert_eq!(opts.encoder.level(), 9);
        assert_eq!(opts.verbose, Verbosity::Warnings);
        assert!(!opts.keep_input_files);
    }

    #[test]
    fn level_flags_test() {
        assert_eq!(parse(&["-3", "x"]).encoder.level(), 3);
        assert_eq!(parse(&["--fast", "x"]).encoder.level(), 1);
        assert_eq!(parse(&["--best", "x"]).encoder.level(), 9);
        assert_eq!(parse(&["-k3", "x"]).encoder.level(), 3);
    }

    #[test]
    fn threads_test() {
        assert_eq!(parse(&["-p", "3"]).encoder.threads(), 3);
        assert_eq!(parse(&["--threads", "500"]).encoder.threads(), 128);
    }

    #[test]
    fn stdin_goes_to_stdout_test() {
        let opts = parse(&[]);
        assert!(opts.files.is_empty());
        assert_eq!(opts.output, Output::Stdout);
    }

    #[test]
    fn stdout_keeps_inputs_test() {
        let opts = parse(&["-c", "a", "b"]);
        assert_eq!(opts.output, Output::Stdout);
        assert!(opts.keep_input_files);
    }

    #[test]
    fn verbosity_test() {
        assert_eq!(parse(&["-q"]).verbose, Verbosity::Quiet);
        assert_eq!(parse(&["-vv"]).verbose, Verbosity::Debug);
        assert_eq!(parse(&["-vvvv"]).verbose.level_filter(), LevelFilter::Trace);
    }

    #[test]
    fn decompress_rejected_test() {
        assert!(parse_bzopts(["pbzip2", "-d", "a.bz2"]).is_err());
    }
}
