//! Perform the move-to-front transform and run-length-encoding phase 2 for the bzip2 block encoder.
//!
//! The move-to-front transform will increase the frequency of lower byte values. The result of this is that
//! the huffman codes can more efficiently compress those high frequency bytes.
//!
//! The run-length-encoding will compress runs of the zero byte regardless of the number of zeros found. The
//! number of zeros found is encoded in a bijective base-2 scheme (RUNA = 1, RUNB = 2, least significant digit
//! first) that is very space efficient.
//!
//! Encoding also returns a frequency table and symbol map used during the huffman stage.
//!
use log::trace;

/// Zero run digit worth 1 at its position.
pub const RUNA: u16 = 0;
/// Zero run digit worth 2 at its position.
pub const RUNB: u16 = 1;
/// Largest possible alphabet: 256 byte values, RUNA/RUNB share the slot of rank 0, plus EOB.
pub const MAX_ALPHA_SIZE: usize = 258;

const BIT_MASK: u16 = 0x8000;

/// Output of the MTF/RLE2 stage for one block.
#[derive(Debug)]
pub struct Rle2Data {
    /// Symbol stream, ending with the EOB symbol.
    pub symbols: Vec<u16>,
    /// How often each symbol occurs in the stream, EOB included.
    pub freqs: [u32; MAX_ALPHA_SIZE],
    /// The bzip2 symbol map: a 16 bit group map followed by a 16 bit word for each group in use.
    pub sym_map: Vec<u16>,
    /// End of block symbol, one more than the number of byte values in use.
    pub eob: u16,
}

impl Rle2Data {
    /// Number of symbols the huffman tables must cover.
    pub fn alpha_size(&self) -> usize {
        self.eob as usize + 1
    }
}

/// Does Move-To-Front transform and Run-Length-Encoding 2 prior to the huffman stage.
/// Receives a block of BWT data, which must not be empty.
pub fn rle2_mtf_encode(bwt: &[u8]) -> Rle2Data {
    // Find every byte value in the input.
    let mut in_use = [false; 256];
    bwt.iter().for_each(|&b| in_use[b as usize] = true);

    // The MTF list starts as the used byte values in ascending order.
    let mut mtf_index = [0_u8; 256];
    let mut n_in_use = 0;
    for (byte, _) in in_use.iter().enumerate().filter(|(_, used)| **used) {
        mtf_index[n_in_use] = byte as u8;
        n_in_use += 1;
    }
    let eob = n_in_use as u16 + 1;
    let sym_map = encode_sym_map_from_bool_map(&in_use);

    let mut symbols = Vec::with_capacity(bwt.len() + 1);
    let mut freqs = [0_u32; MAX_ALPHA_SIZE];
    let mut zeros = 0_usize;

    for &byte in bwt {
        // Find the byte, shifting everything in front of it back one place as we go.
        let mut tmp = mtf_index[0];
        let mut idx = 0;
        while tmp != byte {
            idx += 1;
            std::mem::swap(&mut tmp, &mut mtf_index[idx]);
        }
        mtf_index[0] = tmp;

        if idx == 0 {
            zeros += 1;
            continue;
        }
        // Not a zero, so output any pending zeros first
        if zeros > 0 {
            push_zero_run(zeros, &mut symbols, &mut freqs);
            zeros = 0;
        }
        symbols.push(idx as u16 + 1);
        freqs[idx + 1] += 1;
    }
    if zeros > 0 {
        push_zero_run(zeros, &mut symbols, &mut freqs);
    }
    symbols.push(eob);
    freqs[eob as usize] += 1;

    trace!(
        "\r\x1b[43mRLE2 produced {} symbols from {} bytes, eob {}.    \x1b[0m",
        symbols.len(),
        bwt.len(),
        eob
    );
    Rle2Data {
        symbols,
        freqs,
        sym_map,
        eob,
    }
}

/// Write a run of `zeros` (> 0) MTF zeros as RUNA/RUNB digits, least significant first.
fn push_zero_run(zeros: usize, out: &mut Vec<u16>, freqs: &mut [u32; MAX_ALPHA_SIZE]) {
    let mut n = zeros - 1;
    loop {
        let sym = (n & 1) as u16;
        out.push(sym);
        freqs[sym as usize] += 1;
        if n < 2 {
            break;
        }
        n = (n - 2) >> 1;
    }
}

/// Takes a map of all u8s used at the BWT stage and returns a
/// bzip2 symbol map. Assumes at least one symbol exists.
fn encode_sym_map_from_bool_map(symbols: &[bool; 256]) -> Vec<u16> {
    /*
       There are 256 possible u8s, which equals 16 sets of 16 u8s. The first word has a bit set
       for each set that has any u8 in use, and only those sets get a word of their own.
    */
    let mut sym_maps: Vec<u16> = vec![0; 17];

    symbols
        .iter()
        .enumerate()
        .filter(|(_, used)| **used)
        .for_each(|(idx, _)| {
            sym_maps[0] |= BIT_MASK >> (idx >> 4);
            sym_maps[1 + (idx >> 4)] |= BIT_MASK >> (idx & 15);
        });

    // The group map always stays, even when it is the only word with bits set.
    let groups = sym_maps[0];
    let mut maps = vec![groups];
    maps.extend(sym_maps[1..].iter().filter(|&&map| map > 0));
    maps
}
