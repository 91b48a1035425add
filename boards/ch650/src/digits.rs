use std::fmt::Debug;

/// Decimal digits of a value, right-aligned into the three digit slots of a panel.
///
/// Leading slots that the value does not reach stay zero, so `45` is `[0, 4, 5]`
/// and `7` is `[0, 0, 7]`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Digits([u8; 3]);

impl Digits {
    /// Largest value the three digit slots can show
    pub const MAX_VALUE: u16 = 999;
    /// 999
    pub const MAX: Digits = Digits([9, 9, 9]);

    /// Split a value into its digits, or `None` if it needs more than three.
    pub fn new(value: u16) -> Option<Self> {
        if value > Self::MAX_VALUE {
            return None;
        }

        let mut slots = [0u8; 3];
        let mut rest = value;
        for slot in slots.iter_mut().rev() {
            *slot = (rest % 10) as u8;
            rest /= 10;
        }
        Some(Self(slots))
    }

    /// Split a value into its digits, saturating at 999
    pub fn saturating(value: u16) -> Self {
        Self::new(value).unwrap_or(Self::MAX)
    }

    /// The three slot bytes, most significant first.
    #[inline(always)]
    pub fn to_bytes(&self) -> [u8; 3] {
        self.0
    }
}

impl Debug for Digits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c] = self.0;
        f.debug_tuple("Digits").field(&format!("{a}{b}{c}")).finish()
    }
}
