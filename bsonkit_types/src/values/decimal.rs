use crate::error::{BsonError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A 96-bit scaled decimal: `(-1)^negative * mantissa / 10^scale`, with
/// `mantissa < 2^96` and `scale <= 28`.
///
/// Equality is numeric, so `1.5` equals `1.50`, while the textual form keeps
/// the scale it was built with.
#[derive(Clone, Copy, Default)]
pub struct Decimal {
    mantissa: u128,
    scale: u8,
    negative: bool,
}

const MANTISSA_LIMIT: u128 = 1 << 96;

impl Decimal {
    pub const MAX_SCALE: u8 = 28;
    pub const ZERO: Decimal = Decimal {
        mantissa: 0,
        scale: 0,
        negative: false,
    };
    pub const MAX: Decimal = Decimal {
        mantissa: MANTISSA_LIMIT - 1,
        scale: 0,
        negative: false,
    };
    pub const MIN: Decimal = Decimal {
        mantissa: MANTISSA_LIMIT - 1,
        scale: 0,
        negative: true,
    };

    pub fn new(mantissa: i128, scale: u8) -> Result<Self> {
        let negative = mantissa < 0;
        Self::from_parts(mantissa.unsigned_abs(), scale, negative)
    }

    fn from_parts(mantissa: u128, scale: u8, negative: bool) -> Result<Self> {
        if mantissa >= MANTISSA_LIMIT {
            return Err(BsonError::format("Decimal mantissa exceeds 96 bits."));
        }
        if scale > Self::MAX_SCALE {
            return Err(BsonError::format(format!(
                "Decimal scale {scale} exceeds {}.",
                Self::MAX_SCALE
            )));
        }
        Ok(Self {
            mantissa,
            scale,
            negative: negative && mantissa != 0,
        })
    }

    pub fn mantissa(&self) -> i128 {
        let m = self.mantissa as i128;
        if self.negative {
            -m
        } else {
            m
        }
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// The `[lo, mid, hi, flags]` layout, where `flags` carries the scale in
    /// bits 16..24 and the sign in bit 31.
    pub fn to_bits(&self) -> [i32; 4] {
        let lo = self.mantissa as u32;
        let mid = (self.mantissa >> 32) as u32;
        let hi = (self.mantissa >> 64) as u32;
        let mut flags = (self.scale as u32) << 16;
        if self.negative {
            flags |= 1 << 31;
        }
        [lo as i32, mid as i32, hi as i32, flags as i32]
    }

    pub fn from_bits(bits: [i32; 4]) -> Result<Self> {
        let flags = bits[3] as u32;
        if flags & 0x7F00_FFFF != 0 {
            return Err(BsonError::format(format!(
                "Invalid decimal flags 0x{flags:08x}."
            )));
        }
        let mantissa = (bits[0] as u32 as u128)
            | ((bits[1] as u32 as u128) << 32)
            | ((bits[2] as u32 as u128) << 64);
        let scale = ((flags >> 16) & 0xFF) as u8;
        let negative = flags & (1 << 31) != 0;
        Self::from_parts(mantissa, scale, negative)
    }

    pub fn from_i128(value: i128) -> Option<Self> {
        Self::new(value, 0).ok()
    }

    /// The integral part, rounding toward zero.
    pub fn trunc_to_i128(&self) -> i128 {
        let int = (self.mantissa / 10u128.pow(self.scale as u32)) as i128;
        if self.negative {
            -int
        } else {
            int
        }
    }

    pub fn is_integral(&self) -> bool {
        self.mantissa % 10u128.pow(self.scale as u32) == 0
    }

    pub fn to_f64(&self) -> f64 {
        self.to_string().parse().unwrap_or(f64::NAN)
    }

    /// Converts through the shortest round-trip text of `value`. Digits beyond
    /// the maximum scale are rounded half away from zero. `None` when the value
    /// is not finite or its magnitude does not fit.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        parse(&value.to_string(), true).ok()
    }

    fn normalized(&self) -> (u128, u8, bool) {
        let (mut mantissa, mut scale) = (self.mantissa, self.scale);
        while scale > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        (mantissa, scale, self.negative)
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Self::from(value as i64)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Self {
            mantissa: value.unsigned_abs() as u128,
            scale: 0,
            negative: value < 0,
        }
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.normalized() == other.normalized()
    }
}
impl Eq for Decimal {}

impl Hash for Decimal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => return Ordering::Greater,
            (true, false) => return Ordering::Less,
            _ => {}
        }
        // Integral parts first; rescaled fractions stay below 10^28.
        let pow = |s: u8| 10u128.pow(s as u32);
        let (a_int, a_frac) = (self.mantissa / pow(self.scale), self.mantissa % pow(self.scale));
        let (b_int, b_frac) = (other.mantissa / pow(other.scale), other.mantissa % pow(other.scale));
        let magnitude = a_int.cmp(&b_int).then_with(|| {
            let scale = self.scale.max(other.scale);
            let a = a_frac * pow(scale - self.scale);
            let b = b_frac * pow(scale - other.scale);
            a.cmp(&b)
        });
        if self.negative {
            magnitude.reverse()
        } else {
            magnitude
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.mantissa.to_string();
        let scale = self.scale as usize;
        let sign = if self.negative { "-" } else { "" };
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let digits = format!("{digits:0>width$}", width = scale + 1);
        let (int, frac) = digits.split_at(digits.len() - scale);
        write!(f, "{sign}{int}.{frac}")
    }
}

impl fmt::Debug for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decimal({self})")
    }
}

impl FromStr for Decimal {
    type Err = BsonError;
    fn from_str(s: &str) -> Result<Self> {
        parse(s, false)
    }
}

fn parse(s: &str, round_excess: bool) -> Result<Decimal> {
    let invalid = || BsonError::format(format!("'{s}' is not a valid decimal."));
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (int, frac) = body.split_once('.').unwrap_or((body, ""));
    if int.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let max_scale = Decimal::MAX_SCALE as usize;
    let (frac, rounding_digit) = if frac.len() > max_scale {
        if !round_excess {
            return Err(invalid());
        }
        (&frac[..max_scale], frac.as_bytes()[max_scale] - b'0')
    } else {
        (frac, 0)
    };

    let mut mantissa: u128 = 0;
    for b in int.bytes().chain(frac.bytes()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add((b - b'0') as u128))
            .ok_or_else(invalid)?;
    }
    if rounding_digit >= 5 {
        mantissa += 1;
    }
    Decimal::from_parts(mantissa, frac.len() as u8, negative).map_err(|_| invalid())
}
