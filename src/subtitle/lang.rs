//! ISO-639-1 → ISO-639-2 language code translation for Matroska `Language` tags.
//!
//! Ported from `YTimedTextList.ISO_693_1to2`/`DEP_LC_MAP`: a fixed table, not a
//! full CLDR dependency (see `DESIGN.md`).

/// ISO-639-1 → ISO-639-2/B translation table, sorted by source code for
/// binary search. Source: <http://www.loc.gov/standards/iso639-2/ISO-639-2_utf-8.txt>.
const ISO_639_1_TO_2: &[(&str, &str)] = &[
    ("aa", "aar"), ("ab", "abk"), ("ae", "ave"), ("af", "afr"), ("ak", "aka"),
    ("am", "amh"), ("an", "arg"), ("ar", "ara"), ("as", "asm"), ("av", "ava"),
    ("ay", "aym"), ("az", "aze"), ("ba", "bak"), ("be", "bel"), ("bg", "bul"),
    ("bh", "bih"), ("bi", "bis"), ("bm", "bam"), ("bn", "ben"), ("bo", "tib"),
    ("br", "bre"), ("bs", "bos"), ("ca", "cat"), ("ce", "che"), ("ch", "cha"),
    ("co", "cos"), ("cr", "cre"), ("cs", "cze"), ("cu", "chu"), ("cv", "chv"),
    ("cy", "wel"), ("da", "dan"), ("de", "ger"), ("dv", "div"), ("dz", "dzo"),
    ("ee", "ewe"), ("el", "gre"), ("en", "eng"), ("eo", "epo"), ("es", "spa"),
    ("et", "est"), ("eu", "baq"), ("fa", "per"), ("ff", "ful"), ("fi", "fin"),
    ("fj", "fij"), ("fo", "fao"), ("fr", "fre"), ("fy", "fry"), ("ga", "gle"),
    ("gd", "gla"), ("gl", "glg"), ("gn", "grn"), ("gu", "guj"), ("gv", "glv"),
    ("ha", "hau"), ("he", "heb"), ("hi", "hin"), ("ho", "hmo"), ("hr", "hrv"),
    ("ht", "hat"), ("hu", "hun"), ("hy", "arm"), ("hz", "her"), ("ia", "ina"),
    ("id", "ind"), ("ie", "ile"), ("ig", "ibo"), ("ii", "iii"), ("ik", "ipk"),
    ("io", "ido"), ("is", "ice"), ("it", "ita"), ("iu", "iku"), ("ja", "jpn"),
    ("jv", "jav"), ("ka", "geo"), ("kg", "kon"), ("ki", "kik"), ("kj", "kua"),
    ("kk", "kaz"), ("kl", "kal"), ("km", "khm"), ("kn", "kan"), ("ko", "kor"),
    ("kr", "kau"), ("ks", "kas"), ("ku", "kur"), ("kv", "kom"), ("kw", "cor"),
    ("ky", "kir"), ("la", "lat"), ("lb", "ltz"), ("lg", "lug"), ("li", "lim"),
    ("ln", "lin"), ("lo", "lao"), ("lt", "lit"), ("lu", "lub"), ("lv", "lav"),
    ("mg", "mlg"), ("mh", "mah"), ("mi", "mao"), ("mk", "mac"), ("ml", "mal"),
    ("mn", "mon"), ("mr", "mar"), ("ms", "may"), ("mt", "mlt"), ("my", "bur"),
    ("na", "nau"), ("nb", "nob"), ("nd", "nde"), ("ne", "nep"), ("ng", "ndo"),
    ("nl", "dut"), ("nn", "nno"), ("no", "nor"), ("nr", "nbl"), ("nv", "nav"),
    ("ny", "nya"), ("oc", "oci"), ("oj", "oji"), ("om", "orm"), ("or", "ori"),
    ("os", "oss"), ("pa", "pan"), ("pi", "pli"), ("pl", "pol"), ("ps", "pus"),
    ("pt", "por"), ("qu", "que"), ("rm", "roh"), ("rn", "run"), ("ro", "rum"),
    ("ru", "rus"), ("rw", "kin"), ("sa", "san"), ("sc", "srd"), ("sd", "snd"),
    ("se", "sme"), ("sg", "sag"), ("si", "sin"), ("sk", "slo"), ("sl", "slv"),
    ("sm", "smo"), ("sn", "sna"), ("so", "som"), ("sq", "alb"), ("sr", "srp"),
    ("ss", "ssw"), ("st", "sot"), ("su", "sun"), ("sv", "swe"), ("sw", "swa"),
    ("ta", "tam"), ("te", "tel"), ("tg", "tgk"), ("th", "tha"), ("ti", "tir"),
    ("tk", "tuk"), ("tl", "tgl"), ("tn", "tsn"), ("to", "ton"), ("tr", "tur"),
    ("ts", "tso"), ("tt", "tat"), ("tw", "twi"), ("ty", "tah"), ("ug", "uig"),
    ("uk", "ukr"), ("ur", "urd"), ("uz", "uzb"), ("ve", "ven"), ("vi", "vie"),
    ("vo", "vol"), ("wa", "wln"), ("wo", "wol"), ("xh", "xho"), ("yi", "yid"),
    ("yo", "yor"), ("za", "zha"), ("zh", "chi"), ("zu", "zul"),
];

/// Deprecated two-letter codes mapped to their preferred replacement, tried
/// before the main table when a code isn't found there directly. Source:
/// <http://www.iana.org/assignments/language-subtag-registry>.
const DEPRECATED: &[(&str, &str)] = &[("in", "id"), ("iw", "he"), ("ji", "yi"), ("jw", "jv"), ("mo", "ro")];

fn lookup(table: &[(&str, &str)], key: &str) -> Option<&'static str> {
    table.binary_search_by_key(&key, |&(k, _)| k).ok().map(|i| table[i].1)
}

/// Translates an ISO-639-1 (or `-`-subtagged, e.g. `en-US`) code into its
/// ISO-639-2/B equivalent for a Matroska `Language` element. Only the
/// top-level subtag is considered. Returns `None` for codes this crate
/// doesn't recognise, rather than guessing.
pub fn to_iso_639_2(code: &str) -> Option<&'static str> {
    let (primary, _) = code.split_once('-').unwrap_or((code, ""));
    if let Some(mapped) = lookup(ISO_639_1_TO_2, primary) {
        return Some(mapped);
    }
    let replacement = lookup(DEPRECATED, primary)?;
    lookup(ISO_639_1_TO_2, replacement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_plain_code() {
        assert_eq!(to_iso_639_2("en"), Some("eng"));
        assert_eq!(to_iso_639_2("de"), Some("ger"));
    }

    #[test]
    fn strips_region_subtag() {
        assert_eq!(to_iso_639_2("en-US"), Some("eng"));
    }

    #[test]
    fn remaps_deprecated_code() {
        assert_eq!(to_iso_639_2("iw"), Some("heb"));
        assert_eq!(to_iso_639_2("in"), Some("ind"));
    }

    #[test]
    fn unknown_code_is_none() {
        assert_eq!(to_iso_639_2("xx"), None);
    }
}
