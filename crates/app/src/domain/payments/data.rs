//! Payments Data

/// New Card Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    pub brand: String,
    pub last_four: String,
    pub expiry_month: u8,
    pub expiry_year: u16,

    /// Make this the default card. The buyer's first card is always default.
    pub make_default: bool,
}

impl NewCard {
    pub(crate) fn is_well_formed(&self) -> bool {
        self.last_four.len() == 4
            && self.last_four.chars().all(|c| c.is_ascii_digit())
            && (1..=12).contains(&self.expiry_month)
            && !self.brand.trim().is_empty()
    }
}
