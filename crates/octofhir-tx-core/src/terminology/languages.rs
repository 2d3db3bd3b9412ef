//! BCP-47 language tags.
//!
//! Validates tag structure (language, extlang, script, region, variants,
//! extensions, private use) and checks the primary language and region
//! against ISO 639 and ISO 3166 / UN M.49.

use super::CodeValidation;

const ISO_639_1: &[(&str, &str)] = &[
    ("aa", "Afar"), ("ab", "Abkhazian"), ("ae", "Avestan"), ("af", "Afrikaans"),
    ("ak", "Akan"), ("am", "Amharic"), ("an", "Aragonese"), ("ar", "Arabic"),
    ("as", "Assamese"), ("av", "Avaric"), ("ay", "Aymara"), ("az", "Azerbaijani"),
    ("ba", "Bashkir"), ("be", "Belarusian"), ("bg", "Bulgarian"), ("bi", "Bislama"),
    ("bm", "Bambara"), ("bn", "Bengali"), ("bo", "Tibetan"), ("br", "Breton"),
    ("bs", "Bosnian"), ("ca", "Catalan"), ("ce", "Chechen"), ("ch", "Chamorro"),
    ("co", "Corsican"), ("cr", "Cree"), ("cs", "Czech"), ("cu", "Church Slavic"),
    ("cv", "Chuvash"), ("cy", "Welsh"), ("da", "Danish"), ("de", "German"),
    ("dv", "Dhivehi"), ("dz", "Dzongkha"), ("ee", "Ewe"), ("el", "Modern Greek"),
    ("en", "English"), ("eo", "Esperanto"), ("es", "Spanish"), ("et", "Estonian"),
    ("eu", "Basque"), ("fa", "Persian"), ("ff", "Fulah"), ("fi", "Finnish"),
    ("fj", "Fijian"), ("fo", "Faroese"), ("fr", "French"), ("fy", "Western Frisian"),
    ("ga", "Irish"), ("gd", "Scottish Gaelic"), ("gl", "Galician"), ("gn", "Guarani"),
    ("gu", "Gujarati"), ("gv", "Manx"), ("ha", "Hausa"), ("he", "Hebrew"),
    ("hi", "Hindi"), ("ho", "Hiri Motu"), ("hr", "Croatian"), ("ht", "Haitian"),
    ("hu", "Hungarian"), ("hy", "Armenian"), ("hz", "Herero"), ("ia", "Interlingua"),
    ("id", "Indonesian"), ("ie", "Interlingue"), ("ig", "Igbo"), ("ii", "Sichuan Yi"),
    ("ik", "Inupiaq"), ("io", "Ido"), ("is", "Icelandic"), ("it", "Italian"),
    ("iu", "Inuktitut"), ("ja", "Japanese"), ("jv", "Javanese"), ("ka", "Georgian"),
    ("kg", "Kongo"), ("ki", "Kikuyu"), ("kj", "Kuanyama"), ("kk", "Kazakh"),
    ("kl", "Kalaallisut"), ("km", "Khmer"), ("kn", "Kannada"), ("ko", "Korean"),
    ("kr", "Kanuri"), ("ks", "Kashmiri"), ("ku", "Kurdish"), ("kv", "Komi"),
    ("kw", "Cornish"), ("ky", "Kirghiz"), ("la", "Latin"), ("lb", "Luxembourgish"),
    ("lg", "Ganda"), ("li", "Limburgan"), ("ln", "Lingala"), ("lo", "Lao"),
    ("lt", "Lithuanian"), ("lu", "Luba-Katanga"), ("lv", "Latvian"), ("mg", "Malagasy"),
    ("mh", "Marshallese"), ("mi", "Maori"), ("mk", "Macedonian"), ("ml", "Malayalam"),
    ("mn", "Mongolian"), ("mr", "Marathi"), ("ms", "Malay"), ("mt", "Maltese"),
    ("my", "Burmese"), ("na", "Nauru"), ("nb", "Norwegian Bokmal"), ("nd", "North Ndebele"),
    ("ne", "Nepali"), ("ng", "Ndonga"), ("nl", "Dutch"), ("nn", "Norwegian Nynorsk"),
    ("no", "Norwegian"), ("nr", "South Ndebele"), ("nv", "Navajo"), ("ny", "Nyanja"),
    ("oc", "Occitan"), ("oj", "Ojibwa"), ("om", "Oromo"), ("or", "Oriya"),
    ("os", "Ossetian"), ("pa", "Panjabi"), ("pi", "Pali"), ("pl", "Polish"),
    ("ps", "Pushto"), ("pt", "Portuguese"), ("qu", "Quechua"), ("rm", "Romansh"),
    ("rn", "Rundi"), ("ro", "Romanian"), ("ru", "Russian"), ("rw", "Kinyarwanda"),
    ("sa", "Sanskrit"), ("sc", "Sardinian"), ("sd", "Sindhi"), ("se", "Northern Sami"),
    ("sg", "Sango"), ("si", "Sinhala"), ("sk", "Slovak"), ("sl", "Slovenian"),
    ("sm", "Samoan"), ("sn", "Shona"), ("so", "Somali"), ("sq", "Albanian"),
    ("sr", "Serbian"), ("ss", "Swati"), ("st", "Southern Sotho"), ("su", "Sundanese"),
    ("sv", "Swedish"), ("sw", "Swahili"), ("ta", "Tamil"), ("te", "Telugu"),
    ("tg", "Tajik"), ("th", "Thai"), ("ti", "Tigrinya"), ("tk", "Turkmen"),
    ("tl", "Tagalog"), ("tn", "Tswana"), ("to", "Tonga"), ("tr", "Turkish"),
    ("ts", "Tsonga"), ("tt", "Tatar"), ("tw", "Twi"), ("ty", "Tahitian"),
    ("ug", "Uighur"), ("uk", "Ukrainian"), ("ur", "Urdu"), ("uz", "Uzbek"),
    ("ve", "Venda"), ("vi", "Vietnamese"), ("vo", "Volapuk"), ("wa", "Walloon"),
    ("wo", "Wolof"), ("xh", "Xhosa"), ("yi", "Yiddish"), ("yo", "Yoruba"),
    ("za", "Zhuang"), ("zh", "Chinese"), ("zu", "Zulu"),
];

/// Three-letter ISO 639-2/3 codes in common clinical use that have no two-letter form.
const ISO_639_3: &[(&str, &str)] = &[
    ("ace", "Achinese"), ("ady", "Adyghe"), ("ain", "Ainu"), ("ale", "Aleut"),
    ("arn", "Mapudungun"), ("ast", "Asturian"), ("ban", "Balinese"), ("bem", "Bemba"),
    ("bho", "Bhojpuri"), ("bug", "Buginese"), ("ceb", "Cebuano"), ("chr", "Cherokee"),
    ("cmn", "Mandarin Chinese"), ("crh", "Crimean Tatar"), ("dsb", "Lower Sorbian"),
    ("fil", "Filipino"), ("fur", "Friulian"), ("gsw", "Swiss German"), ("haw", "Hawaiian"),
    ("hmn", "Hmong"), ("hsb", "Upper Sorbian"), ("ilo", "Iloko"), ("jbo", "Lojban"),
    ("kab", "Kabyle"), ("kok", "Konkani"), ("lus", "Mizo"), ("mai", "Maithili"),
    ("mni", "Manipuri"), ("moh", "Mohawk"), ("nah", "Nahuatl"), ("nap", "Neapolitan"),
    ("nds", "Low German"), ("nso", "Pedi"), ("pap", "Papiamento"), ("sah", "Yakut"),
    ("sat", "Santali"), ("scn", "Sicilian"), ("sco", "Scots"), ("sgn", "Sign languages"),
    ("smn", "Inari Sami"), ("syr", "Syriac"), ("tet", "Tetum"), ("tpi", "Tok Pisin"),
    ("yue", "Cantonese"), ("zza", "Zaza"), ("und", "Undetermined"), ("mul", "Multiple languages"),
    ("zxx", "No linguistic content"), ("mis", "Uncoded languages"),
];

/// ISO 3166-1 alpha-2 region codes.
const REGIONS: &str = "AD AE AF AG AI AL AM AO AQ AR AS AT AU AW AX AZ BA BB BD BE BF BG BH BI BJ BL \
BM BN BO BQ BR BS BT BV BW BY BZ CA CC CD CF CG CH CI CK CL CM CN CO CR CU CV CW CX CY CZ DE DJ DK \
DM DO DZ EC EE EG EH ER ES ET FI FJ FK FM FO FR GA GB GD GE GF GG GH GI GL GM GN GP GQ GR GS GT GU \
GW GY HK HM HN HR HT HU ID IE IL IM IN IO IQ IR IS IT JE JM JO JP KE KG KH KI KM KN KP KR KW KY KZ \
LA LB LC LI LK LR LS LT LU LV LY MA MC MD ME MF MG MH MK ML MM MN MO MP MQ MR MS MT MU MV MW MX MY \
MZ NA NC NE NF NG NI NL NO NP NR NU NZ OM PA PE PF PG PH PK PL PM PN PR PS PT PW PY QA RE RO RS RU \
RW SA SB SC SD SE SG SH SI SJ SK SL SM SN SO SR SS ST SV SX SY SZ TC TD TF TG TH TJ TK TL TM TN TO \
TR TT TV TW TZ UA UG UM US UY UZ VA VC VE VG VI VN VU WF WS YE YT ZA ZM ZW EU UN XK";

pub(super) fn validate(code: &str) -> CodeValidation {
    match parse_tag(code) {
        Ok(name) => CodeValidation::valid_with(name),
        Err(reason) => CodeValidation::invalid(format!(
            "'{code}' is not a valid BCP-47 language tag: {reason}"
        )),
    }
}

/// Parses a tag, returning the display name of its primary language.
fn parse_tag(tag: &str) -> Result<&'static str, String> {
    let lower = tag.to_ascii_lowercase();
    let subtags: Vec<&str> = lower.split('-').collect();
    if subtags.iter().any(|s| s.is_empty() || !s.bytes().all(|b| b.is_ascii_alphanumeric())) {
        return Err("subtags must be non-empty and alphanumeric".to_string());
    }

    if subtags[0] == "x" {
        return private_use(&subtags[1..]).map(|()| "Private use");
    }

    let language = subtags[0];
    let name = language_name(language)
        .ok_or_else(|| format!("unknown primary language '{language}'"))?;

    let mut rest = &subtags[1..];

    // up to three extlang subtags
    let mut extlangs = 0;
    while let Some(s) = rest.first() {
        if extlangs < 3 && language.len() <= 3 && s.len() == 3 && is_alpha(s) {
            extlangs += 1;
            rest = &rest[1..];
        } else {
            break;
        }
    }
    if let Some(s) = rest.first()
        && s.len() == 4
        && is_alpha(s)
    {
        rest = &rest[1..];
    }
    if let Some(s) = rest.first() {
        if s.len() == 2 && is_alpha(s) {
            if !is_region(s) {
                return Err(format!("unknown region '{}'", s.to_ascii_uppercase()));
            }
            rest = &rest[1..];
        } else if s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit()) {
            rest = &rest[1..];
        }
    }
    while let Some(s) = rest.first() {
        if is_variant(s) {
            rest = &rest[1..];
        } else {
            break;
        }
    }
    while let Some(s) = rest.first() {
        if *s == "x" {
            return private_use(&rest[1..]).map(|()| name);
        }
        if s.len() != 1 {
            return Err(format!("unexpected subtag '{s}'"));
        }
        let values = rest[1..]
            .iter()
            .take_while(|v| (2..=8).contains(&v.len()))
            .count();
        if values == 0 {
            return Err(format!("extension '{s}' has no value"));
        }
        rest = &rest[1 + values..];
    }
    Ok(name)
}

fn private_use(subtags: &[&str]) -> Result<(), String> {
    if subtags.is_empty() || subtags.iter().any(|s| s.len() > 8) {
        return Err("private use subtags must be 1 to 8 characters".to_string());
    }
    Ok(())
}

fn language_name(code: &str) -> Option<&'static str> {
    let table = match code.len() {
        2 => ISO_639_1,
        3 => ISO_639_3,
        _ => return None,
    };
    table.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

fn is_region(code: &str) -> bool {
    let upper = code.to_ascii_uppercase();
    REGIONS.split_ascii_whitespace().any(|r| r == upper)
}

fn is_alpha(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_variant(s: &str) -> bool {
    (5..=8).contains(&s.len()) || (s.len() == 4 && s.as_bytes()[0].is_ascii_digit())
}
