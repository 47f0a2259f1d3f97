//Enable more cargo lint tests
#![warn(rust_2018_idioms)]
#![warn(clippy::disallowed_types)]

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
    process::exit,
};

use log::{error, info, warn, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use pbzip2::tools::cli::{bzopts_init, BzOpts, Output};
use pbzip2::ParallelBzEncoder;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() {
    // Compressed data may go to stdout, so all messages go to stderr.
    if TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .is_err()
    {
        eprintln!("pbzip2: could not start the logger");
    }

    let opts = bzopts_init();

    let failures = if opts.files.is_empty() {
        match compress_stream(io::stdin().lock(), io::stdout().lock(), &opts) {
            Ok(()) => 0,
            Err(e) => {
                error!("(stdin): {}", e);
                1
            }
        }
    } else {
        opts.files
            .iter()
            .filter(|name| {
                compress_file(name, &opts)
                    .map_err(|e| error!("{}: {}", name, e))
                    .is_err()
            })
            .count()
    };

    info!("Done.\n");
    if failures > 0 {
        exit(1);
    }
}

/// Compress everything from `input` into `output`.
fn compress_stream<R: Read, W: Write>(input: R, output: W, opts: &BzOpts) -> io::Result<()> {
    let mut encoder = ParallelBzEncoder::new(output, opts.encoder)?;
    io::copy(&mut BufReader::with_capacity(1 << 20, input), &mut encoder)?;
    let (mut output, stats) = encoder.finish_with_stats()?;
    output.flush()?;
    info!(
        "{} bytes in, {} blocks, {} randomised, queue peaked at {}.",
        stats.bytes_in, stats.blocks_written, stats.randomised_blocks, stats.peak_queue_depth
    );
    Ok(())
}

/// Compress one file to FILE.bz2 (or stdout), removing the input unless asked to keep it.
fn compress_file(name: &str, opts: &BzOpts) -> io::Result<()> {
    if name.ends_with(".bz2") {
        warn!("{}: already has .bz2 suffix, skipping", name);
        return Ok(());
    }
    let input = File::open(name)?;
    if !input.metadata()?.is_file() {
        warn!("{}: not a regular file, skipping", name);
        return Ok(());
    }

    match opts.output {
        Output::Stdout => compress_stream(input, io::stdout().lock(), opts)?,
        Output::File => {
            let out_name = format!("{}.bz2", name);
            if Path::new(&out_name).exists() && !opts.force_overwrite {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("output file {} already exists", out_name),
                ));
            }
            let output = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&out_name)?;
            info!("Compressing {} to {}", name, out_name);
            if let Err(e) = compress_stream(input, BufWriter::new(output), opts) {
                // Don't leave half a file behind
                let _ = fs::remove_file(&out_name);
                return Err(e);
            }
        }
    }

    if !opts.keep_input_files {
        fs::remove_file(name)?;
    }
    Ok(())
}
