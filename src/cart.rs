//! Cart
//!
//! The buyer's cart as a set of seller groups. Every mutation is total: a
//! missing seller or product is a silent no-op, so a repeated tap on "delete"
//! can never fail. The only rejected mutation is adding a line priced in a
//! different currency to the cart.

use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    ids::{ProductUuid, SellerUuid},
    prices::Price,
};

/// Errors related to cart construction.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// A line's currency differs from the cart currency (product, line currency, cart currency).
    #[error("Line for product {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(ProductUuid, &'static str, &'static str),
}

/// A single product entry in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem {
    /// Product being bought.
    pub product: ProductUuid,

    /// Seller offering the product.
    pub seller: SellerUuid,

    /// Seller display name.
    pub seller_name: String,

    /// Product display name.
    pub name: String,

    /// Unit price in the seller's currency.
    pub price: Price,

    /// Number of units, at least one once the line is in a cart.
    pub quantity: u32,

    /// Optional image reference.
    pub image: Option<String>,

    /// Whether the line takes part in "checkout selected".
    pub selected: bool,
}

impl CartLineItem {
    /// Create an unselected line without an image.
    pub fn new(
        seller: SellerUuid,
        seller_name: impl Into<String>,
        product: ProductUuid,
        name: impl Into<String>,
        price: Price,
        quantity: u32,
    ) -> Self {
        Self {
            product,
            seller,
            seller_name: seller_name.into(),
            name: name.into(),
            price,
            quantity,
            image: None,
            selected: false,
        }
    }

    /// Attach an image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Mark the line as selected.
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    /// Unit price multiplied by quantity, saturating at the minor-unit range.
    pub fn line_total(&self) -> Price {
        Money::from_minor(
            self.price
                .to_minor_units()
                .saturating_mul(i64::from(self.quantity)),
            self.price.currency(),
        )
    }
}

/// All lines from one seller.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerGroup {
    seller: SellerUuid,
    seller_name: String,
    items: SmallVec<[CartLineItem; 4]>,
    selected: bool,
}

impl SellerGroup {
    fn new(first: CartLineItem) -> Self {
        let mut group = Self {
            seller: first.seller,
            seller_name: first.seller_name.clone(),
            items: SmallVec::new(),
            selected: false,
        };

        group.items.push(first);
        group.refresh_selected();

        group
    }

    /// Seller identifier.
    pub fn seller(&self) -> SellerUuid {
        self.seller
    }

    /// Seller display name.
    pub fn seller_name(&self) -> &str {
        &self.seller_name
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// True iff every line in the group is selected.
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Look up a line by product.
    pub fn item(&self, product: ProductUuid) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product == product)
    }

    fn item_mut(&mut self, product: ProductUuid) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|item| item.product == product)
    }

    fn refresh_selected(&mut self) {
        self.selected = !self.items.is_empty() && self.items.iter().all(|item| item.selected);
    }

    fn set_selected(&mut self, selected: bool) {
        for item in &mut self.items {
            item.selected = selected;
        }

        self.refresh_selected();
    }
}

/// Cart
#[derive(Debug, Clone, PartialEq)]
pub struct Cart {
    currency: &'static Currency,
    groups: Vec<SellerGroup>,
}

impl Cart {
    /// Create an empty cart priced in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            groups: Vec::new(),
        }
    }

    /// Rebuild a cart from a flat list of lines, merging duplicates.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if any line is priced in another currency.
    pub fn from_lines(
        currency: &'static Currency,
        lines: impl IntoIterator<Item = CartLineItem>,
    ) -> Result<Self, CartError> {
        let mut cart = Self::new(currency);

        for line in lines {
            cart.add_item(line)?;
        }

        Ok(cart)
    }

    /// Cart currency.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Seller groups in display order.
    pub fn groups(&self) -> &[SellerGroup] {
        &self.groups
    }

    /// Look up a seller group.
    pub fn group(&self, seller: SellerUuid) -> Option<&SellerGroup> {
        self.groups.iter().find(|group| group.seller == seller)
    }

    /// Look up a line.
    pub fn item(&self, seller: SellerUuid, product: ProductUuid) -> Option<&CartLineItem> {
        self.group(seller).and_then(|group| group.item(product))
    }

    /// Every line, grouped by seller, in display order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLineItem> {
        self.groups.iter().flat_map(|group| group.items.iter())
    }

    /// Lines currently selected for checkout.
    pub fn selected_lines(&self) -> impl Iterator<Item = &CartLineItem> {
        self.lines().filter(|item| item.selected)
    }

    /// Number of distinct lines.
    pub fn line_count(&self) -> usize {
        self.groups.iter().map(|group| group.items.len()).sum()
    }

    /// Number of units across all lines.
    pub fn item_count(&self) -> u64 {
        self.lines().map(|item| u64::from(item.quantity)).sum()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Add a line, accumulating quantity onto an existing line for the same
    /// seller and product. Lines with zero quantity are ignored.
    ///
    /// Returns whether the cart changed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the line is priced in another currency.
    pub fn add_item(&mut self, line: CartLineItem) -> Result<bool, CartError> {
        let line_currency = line.price.currency();

        if line_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                line.product,
                line_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        if line.quantity == 0 {
            return Ok(false);
        }

        let Some(group) = self.group_mut(line.seller) else {
            self.groups.push(SellerGroup::new(line));
            return Ok(true);
        };

        if let Some(existing) = group.item_mut(line.product) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            group.items.push(line);
            group.refresh_selected();
        }

        Ok(true)
    }

    /// Replace a line's quantity. Quantities below one are ignored.
    ///
    /// Returns whether the cart changed.
    pub fn set_quantity(&mut self, seller: SellerUuid, product: ProductUuid, quantity: i64) -> bool {
        let Ok(quantity) = u32::try_from(quantity) else {
            return false;
        };

        if quantity == 0 {
            return false;
        }

        let Some(item) = self
            .group_mut(seller)
            .and_then(|group| group.item_mut(product))
        else {
            return false;
        };

        if item.quantity == quantity {
            return false;
        }

        item.quantity = quantity;

        true
    }

    /// Remove a line, dropping its seller group if it was the last one.
    ///
    /// Returns whether the cart changed.
    pub fn remove_item(&mut self, seller: SellerUuid, product: ProductUuid) -> bool {
        let Some(group) = self.group_mut(seller) else {
            return false;
        };

        let before = group.items.len();
        group.items.retain(|item| item.product != product);
        let removed = group.items.len() != before;

        group.refresh_selected();
        self.drop_empty_groups();

        removed
    }

    /// Flip a line's selection and recompute its group flag.
    pub fn toggle_item_selection(&mut self, seller: SellerUuid, product: ProductUuid) {
        let Some(group) = self.group_mut(seller) else {
            return;
        };

        if let Some(item) = group.item_mut(product) {
            item.selected = !item.selected;
        }

        group.refresh_selected();
    }

    /// Flip a whole group: every line takes the group's new value.
    pub fn toggle_group_selection(&mut self, seller: SellerUuid) {
        if let Some(group) = self.group_mut(seller) {
            let selected = !group.selected;
            group.set_selected(selected);
        }
    }

    /// Set every line in every group to `selected`.
    pub fn set_all_selected(&mut self, selected: bool) {
        for group in &mut self.groups {
            group.set_selected(selected);
        }
    }

    /// Select every line.
    pub fn select_all(&mut self) {
        self.set_all_selected(true);
    }

    /// Deselect every line.
    pub fn deselect_all(&mut self) {
        self.set_all_selected(false);
    }

    /// Sum of `price × quantity` over selected lines.
    pub fn total_for_selected(&self) -> Price {
        let minor = self
            .selected_lines()
            .map(|item| item.line_total().to_minor_units())
            .fold(0_i64, i64::saturating_add);

        Money::from_minor(minor, self.currency)
    }

    /// Remove every selected line, dropping groups left empty.
    ///
    /// Returns whether the cart changed.
    pub fn remove_selected(&mut self) -> bool {
        let before = self.line_count();

        for group in &mut self.groups {
            group.items.retain(|item| !item.selected);
            group.refresh_selected();
        }

        self.drop_empty_groups();

        self.line_count() != before
    }

    fn group_mut(&mut self, seller: SellerUuid) -> Option<&mut SellerGroup> {
        self.groups.iter_mut().find(|group| group.seller == seller)
    }

    fn drop_empty_groups(&mut self) {
        self.groups.retain(|group| !group.items.is_empty());
    }
}
