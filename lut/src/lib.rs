//! The complete truth table of Keccak-f\[25\], reduced to a given number of rounds.
//!
//! With 25-bit states, every input of Keccak-f\[25\] can be enumerated: the table holds
//! the image of each of the 2^25 inputs, in input order. Tables are expensive enough to
//! build that they are kept in a [`TableStore`] and reused across runs.

mod store;

pub use store::*;

use kt_keccak::{GeometryError, KeccakF, KeccakFGeometry, SLICE_MASK, SliceValue};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, info_span, instrument, warn};

/// Number of entries of a Keccak-f\[25\] table.
pub const TABLE_LEN: usize = 1 << 25;

/// Inputs handled by one worker at a time while building a table.
const CHUNK_LEN: usize = 1 << 16;

/// Distance between the inputs recomputed to validate a stored table.
const SAMPLE_STRIDE: usize = 4099;

/// The Keccak-f\[25\] permutation as a lookup table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeccakF25Lut {
    key: TableKey,
    table: Vec<SliceValue>,
}

impl KeccakF25Lut {
    /// Loads the table for `nr_rounds` rounds from `store`, or builds it and saves it there.
    ///
    /// A round count of zero stands for the nominal 12 rounds. A stored table is used only
    /// if it is a permutation of the 2^25 states that agrees with the reference permutation
    /// on a sample of inputs; otherwise it is rebuilt. Failing to save only costs the next
    /// run.
    #[instrument(name = "load or build Keccak-f[25] table", skip(store))]
    pub fn new<S: TableStore + ?Sized>(nr_rounds: usize, store: &S) -> Result<Self, GeometryError> {
        let keccak = KeccakF::new(KeccakFGeometry::new(25, nr_rounds)?);
        let key = TableKey::keccak_f25(keccak.geometry().nr_rounds());

        let loaded = store.load(key).and_then(|table| {
            check_table(key, &table)?;
            spot_check(&keccak, key, &table)?;
            Ok(table)
        });
        match loaded {
            Ok(table) => {
                info!(%key, "table loaded from the store");
                return Ok(Self { key, table });
            }
            Err(StoreError::Missing(_)) => debug!(%key, "table not stored yet"),
            Err(err) => warn!(%key, %err, "stored table unusable, rebuilding it"),
        }

        let lut = Self::build(&keccak);
        match store.save(key, &lut.table) {
            Ok(()) => debug!(%key, "table saved"),
            Err(err) => warn!(%key, %err, "could not save the table"),
        }
        Ok(lut)
    }

    /// Builds the table without any store.
    pub fn compute(nr_rounds: usize) -> Result<Self, GeometryError> {
        let geometry = KeccakFGeometry::new(25, nr_rounds)?;
        Ok(Self::build(&KeccakF::new(geometry)))
    }

    fn build(keccak: &KeccakF) -> Self {
        let key = TableKey::keccak_f25(keccak.geometry().nr_rounds());
        let _span = info_span!("enumerate inputs", %key).entered();

        let mut table = vec![0; TABLE_LEN];
        let fill = |(index, chunk): (usize, &mut [SliceValue])| {
            let start = (index * CHUNK_LEN) as SliceValue;
            for (input, entry) in (start..).zip(chunk.iter_mut()) {
                *entry = keccak.permute_slice(input);
            }
        };

        #[cfg(feature = "parallel")]
        table.par_chunks_mut(CHUNK_LEN).enumerate().for_each(fill);
        #[cfg(not(feature = "parallel"))]
        table.chunks_mut(CHUNK_LEN).enumerate().for_each(fill);

        Self { key, table }
    }

    pub const fn key(&self) -> TableKey {
        self.key
    }

    pub const fn nr_rounds(&self) -> usize {
        self.key.nr_rounds
    }

    /// All images, indexed by input.
    pub fn table(&self) -> &[SliceValue] {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Always false: a table has one entry per input.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The image of `input`; bits above the 25th are ignored.
    pub fn lookup(&self, input: SliceValue) -> SliceValue {
        self.table[(input & SLICE_MASK) as usize]
    }

    /// Whether every state occurs exactly once as an output.
    pub fn is_bijective(&self) -> bool {
        check_table(self.key, &self.table).is_ok()
    }

    /// The table of the inverse permutation, if the table is a permutation.
    pub fn inverse(&self) -> Option<Vec<SliceValue>> {
        if !self.is_bijective() {
            return None;
        }
        let mut inverse = vec![0; TABLE_LEN];
        for (input, &output) in (0..).zip(&self.table) {
            inverse[output as usize] = input;
        }
        Some(inverse)
    }
}

/// Recomputes every `SAMPLE_STRIDE`-th entry, and the last one, with the reference.
fn spot_check(keccak: &KeccakF, key: TableKey, table: &[SliceValue]) -> Result<(), StoreError> {
    let inputs = (0..TABLE_LEN).step_by(SAMPLE_STRIDE).chain([TABLE_LEN - 1]);
    for input in inputs.map(|input| input as SliceValue) {
        let (found, expected) = (table[input as usize], keccak.permute_slice(input));
        if found != expected {
            return Err(StoreError::WrongImage {
                key,
                input,
                found,
                expected,
            });
        }
    }
    Ok(())
}
