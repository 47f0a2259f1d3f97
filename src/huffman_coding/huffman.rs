use log::{debug, trace};

use super::huffman_code_from_weights::{assign_codes, improve_code_len_from_weights, MAX_CODE_LEN};
use crate::bitstream::BitSink;
use crate::error::{Bz2Error, Result};
use crate::tools::rle2_mtf::{Rle2Data, MAX_ALPHA_SIZE};

/// Symbols coded by one table before the next selector takes over.
pub const GROUP_SIZE: usize = 50;
/// Passes made over the data to improve the tables.
pub const ITERATIONS: usize = 4;
const MAX_GROUPS: usize = 6;
/// Most selectors a decoder will accept for a block.
const MAX_SELECTORS: usize = 2 + (900_000 / GROUP_SIZE);

/// Cost given to symbols inside and outside of a table's initial range.
const LESSER_ICOST: u32 = 0;
const GREATER_ICOST: u32 = 15;

type Table = [u32; MAX_ALPHA_SIZE];

/// Encode MTF/RLE2 data using Julian's multi-table system and write everything after the block header:
/// the symbol map, table count, selectors, code lengths and finally the coded symbols.
pub fn huf_encode<S: BitSink + ?Sized>(sink: &mut S, data: &Rle2Data) -> Result<()> {
    let n_mtf = data.symbols.len();
    let alpha_size = data.alpha_size();

    // We can have 2-6 coding tables depending on how much data we have coming in.
    let table_count: usize = match n_mtf {
        0..=199 => 2,
        200..=599 => 3,
        600..=1199 => 4,
        1200..=2399 => 5,
        _ => 6,
    };

    let selector_count = (n_mtf + GROUP_SIZE - 1) / GROUP_SIZE;
    if selector_count >= 1 << 15 || selector_count > MAX_SELECTORS {
        return Err(Bz2Error::Internal("too many selectors for one block"));
    }

    let mut tables = init_tables(&data.freqs, table_count, alpha_size, n_mtf);
    let mut selectors = vec![0_usize; selector_count];

    for iter in 0..ITERATIONS {
        let mut favorites = [0; MAX_GROUPS];
        let mut total_cost = 0;
        let mut rfreq = [[0u32; MAX_ALPHA_SIZE]; MAX_GROUPS];

        for (chunk, selector) in data.symbols.chunks(GROUP_SIZE).zip(selectors.iter_mut()) {
            let mut cost = [0_u32; MAX_GROUPS];
            for &symbol in chunk {
                for (t, table) in tables.iter().enumerate() {
                    cost[t] += table[symbol as usize];
                }
            }

            // The first table with the strictly lowest cost wins.
            let mut bt = 0;
            for t in 1..table_count {
                if cost[t] < cost[bt] {
                    bt = t;
                }
            }
            total_cost += cost[bt];
            favorites[bt] += 1;
            *selector = bt;
            chunk
                .iter()
                .for_each(|&symbol| rfreq[bt][symbol as usize] += 1);
        }

        debug!(
            " pass {}: best cost is {}, grp uses are {:?}",
            iter + 1,
            total_cost / 8,
            &favorites[..table_count]
        );

        for (table, freqs) in tables.iter_mut().zip(rfreq.iter()) {
            improve_code_len_from_weights(table, freqs, alpha_size)?;
        }
    }

    for (t, table) in tables.iter().enumerate() {
        let lengths = &table[..alpha_size];
        let min = lengths.iter().copied().min().unwrap_or(0);
        let max = lengths.iter().copied().max().unwrap_or(0);
        if max > MAX_CODE_LEN || min < 1 {
            return Err(Bz2Error::Internal("huffman code length out of range"));
        }
        trace!("\n      {}: {:?}", t, lengths);
    }

    // Symbol maps: the 16 bit group map, then a 16 bit map for each group in use.
    for &word in &data.sym_map {
        sink.write_bits(16, word as u32);
    }

    // A 3 bit table count, then a 15 bit selector count
    sink.write_bits(3, table_count as u32);
    sink.write_bits(15, selector_count as u32);

    // Selectors are written after a Move-To-Front transform, in unary.
    let mut table_idx: Vec<usize> = (0..table_count).collect();
    for &sel in &selectors {
        let idx = table_idx.iter().position(|&t| t == sel).unwrap_or(0);
        table_idx[..=idx].rotate_right(1);
        sink.write_unary(idx as u32);
    }

    /*
    Code lengths. Each table starts with a five bit origin length. Every symbol's length, INCLUDING THE
    FIRST, is then written as steps from the previous length: 10 to go up one, 11 to go down one, and a
    single 0 bit to end the symbol.
     */
    for table in &tables {
        let mut curr = table[0];
        sink.write_bits(5, curr);
        for &len in &table[..alpha_size] {
            while curr < len {
                sink.write_bits(2, 2);
                curr += 1;
            }
            while curr > len {
                sink.write_bits(2, 3);
                curr -= 1;
            }
            sink.write_bool(false);
        }
    }

    // And finally the data, each group of 50 coded with its selected table.
    let codes: Vec<Vec<u32>> = tables
        .iter()
        .map(|table| assign_codes(table, alpha_size))
        .collect();
    for (chunk, &sel) in data.symbols.chunks(GROUP_SIZE).zip(&selectors) {
        let (lengths, codes) = (&tables[sel], &codes[sel]);
        for &symbol in chunk {
            let s = symbol as usize;
            sink.write_bits(lengths[s] as u8, codes[s]);
        }
    }
    Ok(())
}

/// Starting tables. The alphabet is cut into `table_count` consecutive ranges of roughly equal total
/// frequency. Each table makes its own range cheap and everything else expensive.
fn init_tables(freqs: &[u32], table_count: usize, alpha_size: usize, n_mtf: usize) -> Vec<Table> {
    let mut tables = vec![[0_u32; MAX_ALPHA_SIZE]; table_count];
    let mut n_part = table_count;
    let mut rem_f = n_mtf as u32;
    let mut gs: i32 = 0;

    while n_part > 0 {
        let t_freq = rem_f / n_part as u32;
        let mut ge: i32 = gs - 1;
        let mut a_freq = 0;
        while a_freq < t_freq && ge < alpha_size as i32 - 1 {
            ge += 1;
            a_freq += freqs[ge as usize];
        }
        // Alternate ranges give back their last symbol, which evens out the split.
        if ge > gs && n_part != table_count && n_part != 1 && (table_count - n_part) % 2 == 1 {
            a_freq -= freqs[ge as usize];
            ge -= 1;
        }

        for (v, len) in tables[n_part - 1].iter_mut().take(alpha_size).enumerate() {
            let v = v as i32;
            *len = if v >= gs && v <= ge {
                LESSER_ICOST
            } else {
                GREATER_ICOST
            };
        }
        trace!(
            "\r\x1b[43mInitial table {} covers {}..={} ({} of {}).    \x1b[0m",
            n_part - 1,
            gs,
            ge,
            a_freq,
            rem_f
        );

        n_part -= 1;
        gs = ge + 1;
        rem_f -= a_freq;
    }
    tables
}
