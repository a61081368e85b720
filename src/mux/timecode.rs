//! Timecode-scale / element-multiplier selection.
//!
//! Ported from `MatroskaBuilder.tcs_from_secdiv`: given a source media
//! timescale (ticks/second) and the GCD of one or more tracks' sample deltas
//! in that timescale, pick a Matroska `TimestampScale` (nanoseconds/tick) and
//! an element multiplier that rescales those deltas into Matroska ticks with
//! minimal rounding error.

/// Default error tolerance for [`tcs_from_secdiv`], matching
/// `MatroskaBuilder.tcs_error_lim_default`.
pub const TCS_ERROR_LIM_DEFAULT: f64 = 0.0001;

/// Picks `(tcs, elmult, error)` for a source timescale `sdiv` (ticks/second)
/// and the GCD `td_gcd` of one or more tracks' sample deltas in that timescale.
///
/// `elmult` rescales a native delta into Matroska ticks (`delta * elmult`);
/// `tcs` is the resulting `TimestampScale`, in nanoseconds. `error_lim` isn't
/// a hard limit -- results can exceed it under sufficiently bad input.
pub fn tcs_from_secdiv(sdiv: u64, td_gcd: u64, error_lim: Option<f64>) -> (u64, f64, f64) {
    let error_lim = error_lim.unwrap_or(TCS_ERROR_LIM_DEFAULT);
    let sdiv = sdiv as f64;
    let td_gcd = td_gcd as f64;

    let ival = td_gcd * 1e9 / sdiv;
    let get_error = |elmult: f64| -> f64 {
        let tcs = (1e9 / sdiv / elmult).round();
        let oval = tcs * (td_gcd * elmult).round();
        (ival - oval).abs() / ival
    };

    // Reference ival is (1e9/sdiv)*td_gcd: the task is to split that factor
    // into tcs and elmult. Rounding error on both sides is bounded by 0.5, and
    // their product is minimized by keeping both factors close to its square root.
    let mut elmult_minerr = (1e9 / sdiv * td_gcd).sqrt() / td_gcd;

    // Cluster-relative timestamps are limited to a total of 2**16-1, so small
    // elmults are preferred, but not below 1/td_gcd -- that's just inaccuracy
    // we can't track here.
    let elmult_min = 1.0 / td_gcd;

    // For sufficiently small td_gcd the all-accuracy-on-one-side case can beat
    // a balanced split; check it directly.
    if get_error(elmult_min) <= get_error(elmult_minerr) {
        elmult_minerr = elmult_min;
    }

    let mut elmult = elmult_min;
    let mut delta = (elmult_minerr - elmult_min) / 2.0;

    if delta > 0.0 && get_error(elmult) > error_lim {
        while delta > 2f64.powi(-64) {
            if get_error(elmult) < error_lim {
                elmult -= delta;
            } else {
                elmult += delta;
            }
            delta /= 2.0;
        }
    }

    let tcs = (1e9 / sdiv / elmult).round() as u64;
    (tcs, elmult, get_error(elmult))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_mp4_timescale_converges() {
        // 90kHz video timescale, 30fps sample deltas (td_gcd = 3000).
        let (tcs, elmult, err) = tcs_from_secdiv(90_000, 3_000, None);
        assert!(tcs > 0);
        assert!(elmult > 0.0);
        assert!(err < 0.01, "error {err} too large");
    }

    #[test]
    fn flv_millisecond_timescale_converges() {
        let (tcs, elmult, err) = tcs_from_secdiv(1_000, 33, None);
        assert!(tcs > 0);
        assert!(elmult > 0.0);
        assert!(err.is_finite());
    }

    #[test]
    fn identity_timescale_is_exact() {
        // sdiv == 1e9 (nanosecond-native), td_gcd == 1: tcs should land on 1ns/tick.
        let (tcs, elmult, err) = tcs_from_secdiv(1_000_000_000, 1, None);
        assert_eq!(tcs, 1);
        assert!((elmult - 1.0).abs() < 1e-6);
        assert!(err < TCS_ERROR_LIM_DEFAULT * 10.0);
    }
}
