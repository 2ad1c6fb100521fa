//! RK numbers: the 32-bit compressed numeric format used by RK and MULRK cells.
//!
//! Bit 0 (`fX100`) divides the decoded value by 100; bit 1 (`fInt`) selects a signed 30-bit
//! integer instead of the high 30 bits of an IEEE754 double. See [MS-XLS] 2.5.217.

const RK_FLAG_X100: u32 = 0x01;
const RK_FLAG_INT: u32 = 0x02;

const RK_INT_MIN: f64 = -(1i64 << 29) as f64;
const RK_INT_MAX: f64 = ((1i64 << 29) - 1) as f64;

const LOW_34_MASK: u64 = (1u64 << 34) - 1;

pub fn decode_rk_number(rk: u32) -> f64 {
    let is_integer = (rk & RK_FLAG_INT) != 0;
    let is_x100 = (rk & RK_FLAG_X100) != 0;

    let mut value = if is_integer {
        // Signed 30-bit integer.
        let i = (rk as i32) >> 2;
        i as f64
    } else {
        // High 30 bits of an IEEE754 f64, low 34 bits are zero.
        let bits = (rk & 0xFFFF_FFFC) as u64;
        f64::from_bits(bits << 32)
    };

    if is_x100 {
        value /= 100.0;
    }
    value
}

/// Encode `value` as an RK number, or `None` if no RK form decodes back to exactly the same bits.
pub fn encode_rk_number(value: f64) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }

    let candidates = [
        encode_int(value),
        encode_float(value),
        encode_int(value * 100.0).map(|raw| raw | RK_FLAG_X100),
        encode_float(value * 100.0).map(|raw| raw | RK_FLAG_X100),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|&raw| decode_rk_number(raw).to_bits() == value.to_bits())
}

fn encode_int(value: f64) -> Option<u32> {
    if value.fract() != 0.0 || !(RK_INT_MIN..=RK_INT_MAX).contains(&value) {
        return None;
    }
    let i = value as i32;
    Some(((i as u32) << 2) | RK_FLAG_INT)
}

fn encode_float(value: f64) -> Option<u32> {
    if !value.is_finite() {
        return None;
    }
    let bits = value.to_bits();
    if bits & LOW_34_MASK != 0 {
        return None;
    }
    Some((bits >> 32) as u32)
}
