mod args;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use args::{Cli, Command, InstanceArgs, TableOptions};
use clap::Parser;
use kt_codegen::{CodeGenError, KeccakFCodeGen};
use kt_keccak::{GeometryError, KeccakFGeometry, SliceValue};
use kt_lut::{DiskStore, KeccakF25Lut};
use thiserror::Error;
use tracing::info;
use tracing_forest::ForestLayer;
use tracing_forest::util::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    CodeGen(#[from] CodeGenError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn main() -> Result<(), CliError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    Registry::default()
        .with(env_filter)
        .with(ForestLayer::default())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Macros {
            instance,
            schedule,
            output_macros,
            lane_complementing,
            output,
        } => {
            let mut generator = generator(&instance)?;
            generator
                .set_output_macros(output_macros)
                .set_schedule_type(schedule.schedule_type())?;
            let mut out = open_output(output.as_deref())?;
            generator.gen_macro_file(&mut out, lane_complementing)?;
            out.flush()?;
        }
        Command::Display { instance, table } => {
            let generator = generator(&instance)?;
            let mut out = io::stdout().lock();
            if matches!(table, TableOptions::All | TableOptions::RoundConstants) {
                generator.display_round_constants(&mut out)?;
            }
            if matches!(table, TableOptions::All | TableOptions::RhoOffsets) {
                generator.display_rho_offsets(&mut out, instance.interleaving_factor > 1)?;
            }
            if matches!(table, TableOptions::All | TableOptions::Pi) {
                generator.display_pi(&mut out)?;
            }
        }
        Command::Lut {
            nr_rounds,
            cache_dir,
            inputs,
        } => {
            let store = DiskStore::new(cache_dir);
            let lut = KeccakF25Lut::new(nr_rounds, &store)?;
            info!(cache = %store.path(lut.key()).display(), "table ready");
            println!(
                "{}: {} entries, {}",
                lut.key(),
                lut.len(),
                if lut.is_bijective() { "bijective" } else { "not bijective" }
            );
            for input in inputs {
                println!("{} -> {}", format_slice(input), format_slice(lut.lookup(input)));
            }
        }
    }
    Ok(())
}

fn generator(instance: &InstanceArgs) -> Result<KeccakFCodeGen, CliError> {
    let geometry = KeccakFGeometry::new(instance.width, instance.nr_rounds)?;
    let mut generator = KeccakFCodeGen::new(geometry);
    generator.set_interleaving_factor(instance.interleaving_factor)?;
    Ok(generator)
}

fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    })
}

fn format_slice(value: SliceValue) -> String {
    format!("{value:#09x}")
}
