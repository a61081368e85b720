//! The sample-table walk: turns `stsz`/`stsc`/`stco`/`stts`/`stss` into a sequence
//! of `(timestamp, DataRef, is_sync)` triples.
//!
//! Ported from `MovBoxTrack.get_sample_data`.

use std::fs::File;
use std::sync::{Arc, Mutex};

use crate::dataref::DataRef;
use crate::mp4::boxes::StszBox;
use crate::mp4::{Error, Result};

/// Walks a track's sample tables, yielding one entry per sample in decode order.
///
/// `time_mult` converts a sample's cumulative `stts` delta sum into the caller's
/// target timescale (the builder's shared `TimecodeScale`); see
/// `MatroskaBuilder.tcs_from_secdiv`, which is what callers derive it from.
#[allow(clippy::too_many_arguments)]
pub fn sample_data(
    file: Arc<Mutex<File>>,
    stsz: &StszBox,
    stsc_pp: &[(Option<u32>, u32)],
    stco: &[u64],
    stts: &[(u32, u32)],
    stss: Option<&[u32]>,
    time_mult: f64,
) -> Result<Vec<(u64, DataRef, bool)>> {
    let s_lim = stsz.sample_count as u64;
    let mut out = Vec::with_capacity(s_lim as usize);

    let mut s: u64 = 0;
    let mut s_sublim: u64 = 0;
    let mut c: u64 = 0;
    let mut c_lim: Option<u64> = Some(0);
    let mut cblock: usize = 0;
    let mut spc: u64 = 0;
    let mut s_off: u64 = 0;

    let mut ts_i: usize = 0;
    let mut ts_lim: u64 = 0;
    let mut timeval: u64 = 0;
    let mut timedelta: u64 = 0;

    let mut ss_i: usize = 0;

    while s < s_lim {
        if s >= s_sublim {
            loop {
                let keep_going = match c_lim {
                    None => false,
                    Some(lim) => c >= lim,
                };
                if !keep_going {
                    break;
                }
                let &(cnum, this_spc) = stsc_pp.get(cblock).ok_or(Error::SampleTableMismatch)?;
                c_lim = match cnum {
                    None => None,
                    Some(n) => Some(c_lim.expect("loop condition implies Some") + n as u64),
                };
                spc = this_spc as u64;
                cblock += 1;
            }
            s_sublim += spc;
            s_off = *stco.get(c as usize).ok_or(Error::SampleTableMismatch)?;
            c += 1;
        }

        let is_sync = match stss {
            None => true,
            Some(ss) => {
                if ss_i < ss.len() && s == ss[ss_i] as u64 {
                    ss_i += 1;
                    true
                } else {
                    false
                }
            }
        };

        while s >= ts_lim {
            let &(scount, delta) = stts.get(ts_i).ok_or(Error::SampleTableMismatch)?;
            ts_lim += scount as u64;
            timedelta = delta as u64;
            ts_i += 1;
        }

        let size = stsz.get(s as usize).ok_or(Error::SampleTableMismatch)? as u64;
        let timestamp = (timeval as f64 * time_mult).round() as u64;
        out.push((timestamp, DataRef::from_file(file.clone(), s_off, size), is_sync));

        s_off += size;
        s += 1;
        timeval += timedelta;
    }

    Ok(out)
}

/// Greatest common divisor of sample deltas, used to pick a shared builder timescale
/// across tracks with different native rates. Mirrors `functools.reduce(gcd, ...)`
/// over each track's `stts` deltas.
pub fn sample_delta_gcd(stts: &[(u32, u32)]) -> u32 {
    stts.iter().map(|&(_, delta)| delta).fold(0, gcd_u32)
}

fn gcd_u32(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd_u32(b, a % b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mp4::boxes::preprocess_stsc;

    fn stsz_fixed(size: u32, count: usize) -> StszBox {
        let mut body = vec![0u8; 4];
        body.extend(size.to_be_bytes());
        body.extend((count as u32).to_be_bytes());
        StszBox::parse(&body).unwrap()
    }

    #[test]
    fn single_chunk_single_entry_walk() {
        let stsz = stsz_fixed(100, 3);
        let stsc_pp = preprocess_stsc(&[(1, 3, 1)]);
        let stco = vec![1000u64];
        let stts = vec![(3u32, 10u32)];

        let file = Arc::new(Mutex::new(tempfile()));
        let samples = sample_data(file, &stsz, &stsc_pp, &stco, &stts, None, 1.0).unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].0, 0);
        assert_eq!(samples[1].0, 10);
        assert_eq!(samples[2].0, 20);
        assert_eq!(samples[0].2, true);
        for (i, (_, dref, _)) in samples.iter().enumerate() {
            assert_eq!(dref.size(), 100);
            let _ = i;
        }
    }

    #[test]
    fn sync_samples_are_respected() {
        let stsz = stsz_fixed(10, 4);
        let stsc_pp = preprocess_stsc(&[(1, 4, 1)]);
        let stco = vec![0u64];
        let stts = vec![(4u32, 1u32)];
        let stss = vec![0u32, 2u32];

        let file = Arc::new(Mutex::new(tempfile()));
        let samples = sample_data(file, &stsz, &stsc_pp, &stco, &stts, Some(&stss), 1.0).unwrap();
        let sync_flags: Vec<bool> = samples.iter().map(|(_, _, s)| *s).collect();
        assert_eq!(sync_flags, vec![true, false, true, false]);
    }

    fn tempfile() -> File {
        let path = std::env::temp_dir().join(format!("mkremux-mp4-sampletable-{:?}", std::thread::current().id()));
        File::options().read(true).write(true).create(true).truncate(true).open(path).unwrap()
    }
}
