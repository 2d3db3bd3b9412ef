//! UCUM unit expression syntax.
//!
//! Parses the case-sensitive UCUM grammar:
//!
//! ```text
//! mainTerm    := '/' term | term
//! term        := component (('.' | '/') component)*
//! component   := annotatable annotation? | annotation | factor | '(' term ')'
//! annotatable := simpleUnit exponent?
//! simpleUnit  := atom | prefix metricAtom
//! ```
//!
//! Atoms are checked against the UCUM essence tables; prefixes are only
//! accepted in front of metric atoms.

use thiserror::Error;

use super::CodeValidation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct UnitSyntaxError {
    pub position: usize,
    pub message: String,
}

const PREFIXES: &[&str] = &[
    "da", "Ki", "Mi", "Gi", "Ti", "Y", "Z", "E", "P", "T", "G", "M", "k", "h", "d", "c", "m",
    "u", "n", "p", "f", "a", "z", "y",
];

const METRIC_ATOMS: &[&str] = &[
    "m", "s", "g", "rad", "K", "C", "cd", "mol", "sr", "Hz", "N", "Pa", "J", "W", "A", "V", "F",
    "Ohm", "S", "Wb", "Cel", "T", "H", "lm", "lx", "Bq", "Gy", "Sv", "l", "L", "ar", "t", "bar",
    "u", "eV", "pc", "[c]", "[h]", "[k]", "[eps_0]", "[mu_0]", "[e]", "[m_e]", "[m_p]", "[G]",
    "[g]", "[ly]", "gf", "Ky", "Gal", "dyn", "erg", "P", "St", "Mx", "G", "Oe", "Gb", "sb", "Lmb",
    "ph", "Ci", "R", "RAD", "REM", "cal", "[iU]", "[IU]", "eq", "osm", "g%", "kat", "U", "B", "Np",
    "bit", "By", "Bd", "mho", "st", "Bi", "m[H2O]", "m[Hg]", "B[SPL]", "B[V]", "B[mV]", "B[uV]",
    "B[10.nV]", "B[W]", "B[kW]",
];

const NON_METRIC_ATOMS: &[&str] = &[
    "10*", "10^", "[pi]", "%", "[ppth]", "[ppm]", "[ppb]", "[pptr]", "mo_s", "mo_j", "mo_g", "mo",
    "wk", "a_t", "a_j", "a_g", "a", "d", "h", "min", "gon", "deg", "'", "''", "Ao", "b", "att",
    "circ", "sph", "[in_i]", "[ft_i]", "[yd_i]", "[mi_i]", "[fth_i]", "[nmi_i]", "[kn_i]",
    "[sin_i]", "[sft_i]", "[syd_i]", "[cin_i]", "[cft_i]", "[cyd_i]", "[bf_i]", "[cr_i]",
    "[mil_i]", "[cml_i]", "[hd_i]", "[ft_us]", "[yd_us]", "[in_us]", "[rd_us]", "[ch_us]",
    "[lk_us]", "[rch_us]", "[rlk_us]", "[fth_us]", "[fur_us]", "[mi_us]", "[acr_us]", "[srd_us]",
    "[smi_us]", "[sct]", "[twp]", "[mil_us]", "[in_br]", "[ft_br]", "[rd_br]", "[ch_br]",
    "[lk_br]", "[fth_br]", "[pc_br]", "[yd_br]", "[mi_br]", "[nmi_br]", "[kn_br]", "[acr_br]",
    "[gal_us]", "[bbl_us]", "[qt_us]", "[pt_us]", "[gil_us]", "[foz_us]", "[fdr_us]", "[min_us]",
    "[crd_us]", "[bu_us]", "[gal_wi]", "[pk_us]", "[dqt_us]", "[dpt_us]", "[tbs_us]", "[tsp_us]",
    "[cup_us]", "[foz_m]", "[cup_m]", "[tsp_m]", "[tbs_m]", "[gal_br]", "[pk_br]", "[bu_br]",
    "[qt_br]", "[pt_br]", "[gil_br]", "[foz_br]", "[fdr_br]", "[min_br]", "[gr]", "[lb_av]",
    "[oz_av]", "[dr_av]", "[scwt_av]", "[lcwt_av]", "[ston_av]", "[lton_av]", "[stone_av]",
    "[pwt_tr]", "[oz_tr]", "[lb_tr]", "[sc_ap]", "[dr_ap]", "[oz_ap]", "[lb_ap]", "[oz_m]",
    "[lne]", "[pnt]", "[pca]", "[pnt_pr]", "[pca_pr]", "[pied]", "[pouce]", "[ligne]", "[didot]",
    "[cicero]", "[degF]", "[degR]", "[degRe]", "cal_[15]", "cal_[20]", "cal_m", "cal_IT",
    "cal_th", "[Cal]", "[Btu_39]", "[Btu_59]", "[Btu_60]", "[Btu_m]", "[Btu_IT]", "[Btu_th]",
    "[Btu]", "[HP]", "tex", "[den]", "[in_i'H2O]", "[in_i'Hg]", "[PRU]", "[wood'U]", "[diop]",
    "[p'diop]", "%[slope]", "[mesh_i]", "[Ch]", "[drp]", "[hnsf'U]", "[MET]", "[hp'_X]",
    "[hp'_C]", "[hp'_M]", "[hp'_Q]", "[hp_X]", "[hp_C]", "[hp_M]", "[hp_Q]", "[kp_X]", "[kp_C]",
    "[kp_M]", "[kp_Q]", "[car_m]", "[car_Au]", "[smoot]", "[S]", "[HPF]", "[LPF]", "[arb'U]",
    "[USP'U]", "[GPL'U]", "[MPL'U]", "[APL'U]", "[beth'U]", "[anti'Xa'U]", "[todd'U]", "[dye'U]",
    "[smgy'U]", "[bdsk'U]", "[ka'U]", "[knk'U]", "[mclg'U]", "[tb'U]", "[CCID_50]", "[TCID_50]",
    "[EID_50]", "[PFU]", "[FFU]", "[CFU]", "[IR]", "[BAU]", "[AU]", "[Amb'a'1'U]", "[PNU]", "[Lf]",
    "[D'ag'U]", "[FEU]", "[ELU]", "[EU]", "[psi]", "[lbf_av]", "[pH]", "bit_s", "AU", "[mu]",
];

pub(super) fn validate(code: &str) -> CodeValidation {
    match parse_unit(code) {
        Ok(()) => CodeValidation::valid(),
        Err(e) => CodeValidation::invalid(format!("The unit '{code}' is not valid UCUM: {e}")),
    }
}

/// Checks that `expr` is a syntactically valid UCUM unit built from known atoms.
pub fn parse_unit(expr: &str) -> Result<(), UnitSyntaxError> {
    let mut parser = Parser { input: expr, pos: 0 };
    parser.parse_main()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> UnitSyntaxError {
        UnitSyntaxError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn parse_main(&mut self) -> Result<(), UnitSyntaxError> {
        if self.input.is_empty() {
            return Err(self.error("empty unit"));
        }
        if self.peek() == Some(b'/') {
            self.pos += 1;
        }
        self.parse_term()?;
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c as char))),
        }
    }

    fn parse_term(&mut self) -> Result<(), UnitSyntaxError> {
        self.parse_component()?;
        while let Some(b'.' | b'/') = self.peek() {
            self.pos += 1;
            self.parse_component()?;
        }
        Ok(())
    }

    fn parse_component(&mut self) -> Result<(), UnitSyntaxError> {
        match self.peek() {
            None => Err(self.error("expected a unit")),
            Some(b'(') => {
                self.pos += 1;
                self.parse_term()?;
                if self.peek() != Some(b')') {
                    return Err(self.error("missing ')'"));
                }
                self.pos += 1;
                Ok(())
            }
            Some(b'{') => self.parse_annotation(),
            Some(_) => {
                let start = self.pos;
                let symbol = self.read_symbol();
                if symbol.is_empty() {
                    return Err(self.error("expected a unit"));
                }
                if !symbol.bytes().all(|b| b.is_ascii_digit()) {
                    check_annotatable(symbol).map_err(|message| UnitSyntaxError {
                        position: start,
                        message,
                    })?;
                    if self.peek() == Some(b'{') {
                        self.parse_annotation()?;
                    }
                }
                Ok(())
            }
        }
    }

    fn parse_annotation(&mut self) -> Result<(), UnitSyntaxError> {
        let start = self.pos;
        self.pos += 1;
        while let Some(c) = self.peek() {
            match c {
                b'}' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'{' => return Err(self.error("nested annotation")),
                33..=126 => self.pos += 1,
                _ => return Err(self.error("invalid character in annotation")),
            }
        }
        Err(UnitSyntaxError {
            position: start,
            message: "unterminated annotation".to_string(),
        })
    }

    /// Reads an atom with optional prefix and exponent; brackets may contain separators.
    fn read_symbol(&mut self) -> &'a str {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'.' | b'/' | b'(' | b')' | b'{' | b'}' if depth == 0 => break,
                c if !c.is_ascii_graphic() => break,
                _ => {}
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }
}

fn check_annotatable(symbol: &str) -> Result<(), String> {
    let unit = strip_exponent(symbol);
    if unit.is_empty() {
        return Err(format!("exponent '{symbol}' without a unit"));
    }
    if is_simple_unit(unit) {
        Ok(())
    } else {
        Err(format!("unknown unit '{unit}'"))
    }
}

/// `symbol` without its trailing signed integer exponent.
fn strip_exponent(symbol: &str) -> &str {
    let digits_start = symbol.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits_start == symbol.len() {
        return symbol;
    }
    let head = &symbol[..digits_start];
    head.strip_suffix(['+', '-']).unwrap_or(head)
}

fn is_simple_unit(unit: &str) -> bool {
    if METRIC_ATOMS.contains(&unit) || NON_METRIC_ATOMS.contains(&unit) {
        return true;
    }
    PREFIXES.iter().any(|prefix| {
        unit.strip_prefix(prefix)
            .is_some_and(|atom| METRIC_ATOMS.contains(&atom))
    })
}
