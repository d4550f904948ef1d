use std::ops::BitAnd;

pub fn has_flag<U, T: Into<U>>(value: U, flag: T) -> bool
    where U: BitAnd<Output = U> + PartialEq + Copy {
    let flag = flag.into();

    value & flag == flag
}

/// Splits a 64 bit value into the (low, high) halves stored in two consecutive slots.
#[inline(always)]
pub fn split_u64(v: u64) -> (i32, i32) {
    (v as u32 as i32, (v >> 32) as u32 as i32)
}

#[inline(always)]
pub fn join_u64(low: i32, high: i32) -> u64 {
    (low as u32 as u64) | ((high as u32 as u64) << 32)
}

#[inline(always)]
pub fn ftoi(f: f32) -> i32 {
    f.to_bits() as i32
}

#[inline(always)]
pub fn itof(i: i32) -> f32 {
    f32::from_bits(i as u32)
}

#[inline(always)]
pub fn dtou(d: f64) -> u64 {
    d.to_bits()
}

#[inline(always)]
pub fn utod(u: u64) -> f64 {
    f64::from_bits(u)
}

/// Package part of an internal class name, `java/lang` for `java/lang/Object`.
pub fn package_name(class_name: &str) -> &str {
    match class_name.rfind('/') {
        Some(i) => &class_name[..i],
        None => ""
    }
}

#[cfg(test)]
mod test {
    use crate::helper::{dtou, ftoi, itof, join_u64, package_name, split_u64, utod};

    #[test]
    pub fn float_converter() {
        let a: f64 = -3.141592654;
        let b = dtou(a);
        let a2 = utod(b);

        assert_eq!(a, a2);
    }

    #[test]
    fn split_and_join() {
        let v = 0x8000_0001_ffff_fffe_u64;
        let (low, high) = split_u64(v);
        assert_eq!(low, -2);
        assert_eq!(high, i32::MIN + 1);
        assert_eq!(join_u64(low, high), v);
    }

    #[test]
    fn nan_payload_survives() {
        let nan = f32::from_bits(0x7fc0_1234);
        assert_eq!(itof(ftoi(nan)).to_bits(), 0x7fc0_1234);

        let nan = f64::from_bits(0x7ff8_dead_beef_0001);
        assert_eq!(utod(dtou(nan)).to_bits(), 0x7ff8_dead_beef_0001);
    }

    #[test]
    fn packages() {
        assert_eq!(package_name("java/lang/Object"), "java/lang");
        assert_eq!(package_name("Main"), "");
    }
}
