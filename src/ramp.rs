// Copyright (c) 2026 rezky_nightky

/// Ordered characters from emptiest to densest.
///
/// Cells store a level (index into the ramp), so whatever a grid displays is
/// always a ramp member. Level 0 is the blank entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DensityRamp {
    chars: Vec<char>,
}

pub const CLASSIC: &str = " .,-+(/*#&%@";
pub const SIMPLE: &str = " .:-=+*#@";
pub const BLOCKS: &str = " ░▒▓█";
pub const DOTS: &str = " ·•●";
pub const BLINK: &str = " *";

impl DensityRamp {
    pub fn new(chars: Vec<char>) -> Result<Self, String> {
        if chars.len() < 2 {
            return Err("ramp needs at least 2 characters".to_string());
        }
        if chars.len() > u8::MAX as usize {
            return Err(format!("ramp too long: {} (max {})", chars.len(), u8::MAX));
        }
        for (i, ch) in chars.iter().enumerate() {
            if chars[..i].contains(ch) {
                return Err(format!("duplicate ramp character {:?} at index {}", ch, i + 1));
            }
        }
        Ok(Self { chars })
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        Self::new(s.chars().collect())
    }

    pub fn classic() -> Self {
        Self {
            chars: CLASSIC.chars().collect(),
        }
    }

    pub fn blink() -> Self {
        Self {
            chars: BLINK.chars().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn last_level(&self) -> u8 {
        (self.chars.len() - 1) as u8
    }

    pub fn char_at(&self, level: u8) -> char {
        let i = (level as usize).min(self.chars.len() - 1);
        self.chars[i]
    }

    /// Dark pixels land toward the dense end, light ones toward blank.
    pub fn symbol_index(&self, brightness: f32) -> u8 {
        let b = brightness.clamp(0.0, 255.0);
        let last = self.last_level() as f32;
        ((1.0 - b / 255.0) * last).round().clamp(0.0, last) as u8
    }

    /// Saturates at the densest entry.
    pub fn next(&self, level: u8) -> Option<u8> {
        if level < self.last_level() {
            Some(level + 1)
        } else {
            None
        }
    }
}

pub fn ramp_from_str(name: &str) -> Result<DensityRamp, String> {
    let chars = match name.trim().to_ascii_lowercase().as_str() {
        "classic" | "default" => CLASSIC,
        "simple" => SIMPLE,
        "blocks" | "block" => BLOCKS,
        "dots" => DOTS,
        "blink" | "binary" => BLINK,
        other => return Err(format!("unsupported ramp: {} (see --list-ramps)", other)),
    };
    DensityRamp::parse(chars)
}

pub fn print_list_ramps() {
    println!("AVAILABLE DENSITY RAMPS:");
    println!("NOTE: Use only the VALUE (left side) with --ramp.");
    println!();
    println!("VALUE        CHARACTERS (emptiest to densest)");
    for (name, chars) in [
        ("classic", CLASSIC),
        ("simple", SIMPLE),
        ("blocks", BLOCKS),
        ("dots", DOTS),
        ("blink", BLINK),
    ] {
        println!("{:<12} \"{}\"", name, chars);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_rejects_duplicates_and_short_ramps() {
        assert!(DensityRamp::parse(" ").is_err());
        assert!(DensityRamp::parse(" .. ").is_err());
        assert!(DensityRamp::parse(" .").is_ok());
    }

    #[test]
    fn symbol_index_endpoints() {
        let ramp = ramp_from_str("classic").unwrap();
        assert_eq!(ramp.symbol_index(0.0), ramp.last_level());
        assert_eq!(ramp.symbol_index(255.0), 0);
        assert_eq!(ramp.char_at(ramp.symbol_index(0.0)), '@');
    }

    #[test]
    fn next_saturates_at_densest() {
        let ramp = ramp_from_str("blink").unwrap();
        assert_eq!(ramp.next(0), Some(1));
        assert_eq!(ramp.next(1), None);
    }

    proptest! {
        #[test]
        fn symbol_index_is_non_increasing_and_in_range(a in 0u8..=255, b in 0u8..=255) {
            let ramp = ramp_from_str("classic").unwrap();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let i_lo = ramp.symbol_index(lo as f32);
            let i_hi = ramp.symbol_index(hi as f32);
            prop_assert!(i_hi <= i_lo);
            prop_assert!((i_lo as usize) < ramp.len());
        }
    }
}
