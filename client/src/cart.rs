//! The cart: line items from a single stall, with derived totals.
//!
//! Invariants upheld by [`CartReducer`]:
//!
//! - the cart has a stall if and only if it has items, and every item belongs
//!   to that stall
//! - a menu item appears on at most one line; adding it again merges quantities
//! - `total` and `item_count` are recomputed from the lines after every
//!   accepted mutation and cannot be set independently
//!
//! Adding an item from another stall is a no-op. Callers that want to switch
//! stalls check [`CartState::conflicts_with`], confirm with the user, then
//! dispatch [`CartAction::Clear`] followed by [`CartAction::Add`].

use crate::types::{MenuItemId, StallId};
use hawker_core::{SmallVec, effect::Effect, reducer::Reducer};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One menu item in the cart
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Menu item
    pub menu_item_id: MenuItemId,
    /// Display name, copied when added
    pub name: String,
    /// Unit price
    pub price: Decimal,
    /// Number of units
    pub quantity: u32,
    /// Free-text customisation ("no chilli")
    #[serde(default)]
    pub special_requests: Option<String>,
    /// Stall selling the item
    pub stall_id: StallId,
    /// Stall name, copied when added
    pub stall_name: String,
}

impl CartLineItem {
    /// `price × quantity`, saturating
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Contents of the cart
///
/// Serialises to the snapshot handed to cart storage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartState {
    items: Vec<CartLineItem>,
    stall_id: Option<StallId>,
    stall_name: Option<String>,
    total: Decimal,
    item_count: u64,
}

impl CartState {
    /// Creates an empty cart
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a consistent cart from line items
    ///
    /// # Errors
    ///
    /// Returns [`CartInconsistency`] if the items span several stalls or
    /// repeat a menu item.
    pub fn from_items(items: Vec<CartLineItem>) -> Result<Self, CartInconsistency> {
        let (stall_id, stall_name) = items
            .first()
            .map(|item| (Some(item.stall_id), Some(item.stall_name.clone())))
            .unwrap_or_default();

        let mut cart = Self {
            items,
            stall_id,
            stall_name,
            total: Decimal::ZERO,
            item_count: 0,
        };
        cart.recompute();
        cart.validate()?;
        Ok(cart)
    }

    /// Line items in insertion order
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// The line for a menu item
    #[must_use]
    pub fn line(&self, menu_item_id: MenuItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.menu_item_id == menu_item_id)
    }

    /// Stall every item belongs to; `None` exactly when the cart is empty
    #[must_use]
    pub const fn stall_id(&self) -> Option<StallId> {
        self.stall_id
    }

    /// Name of the cart's stall
    #[must_use]
    pub fn stall_name(&self) -> Option<&str> {
        self.stall_name.as_deref()
    }

    /// Sum of `price × quantity` over all lines
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Sum of quantities over all lines
    #[must_use]
    pub const fn item_count(&self) -> u64 {
        self.item_count
    }

    /// Whether the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether adding `item` would be refused because it comes from another stall
    #[must_use]
    pub fn conflicts_with(&self, item: &CartLineItem) -> bool {
        self.stall_id.is_some_and(|stall_id| stall_id != item.stall_id)
    }

    /// Checks every cart invariant
    ///
    /// Carts produced by [`CartReducer`] always pass; this guards snapshots
    /// read back from storage.
    ///
    /// # Errors
    ///
    /// Returns the first [`CartInconsistency`] found.
    pub fn validate(&self) -> Result<(), CartInconsistency> {
        match (self.items.first(), self.stall_id, &self.stall_name) {
            (None, None, None) => {},
            (None, _, _) => return Err(CartInconsistency::StallWithoutItems),
            (Some(_), None, _) | (Some(_), _, None) => {
                return Err(CartInconsistency::ItemsWithoutStall);
            },
            (Some(_), Some(expected), Some(_)) => {
                if let Some(item) = self.items.iter().find(|item| item.stall_id != expected) {
                    return Err(CartInconsistency::MixedStalls {
                        expected,
                        found: item.stall_id,
                    });
                }
            },
        }

        for (index, item) in self.items.iter().enumerate() {
            if self.items[..index]
                .iter()
                .any(|earlier| earlier.menu_item_id == item.menu_item_id)
            {
                return Err(CartInconsistency::DuplicateItem(item.menu_item_id));
            }
        }

        let (total, item_count) = totals(&self.items);
        if total != self.total {
            return Err(CartInconsistency::TotalMismatch {
                stored: self.total,
                computed: total,
            });
        }
        if item_count != self.item_count {
            return Err(CartInconsistency::ItemCountMismatch {
                stored: self.item_count,
                computed: item_count,
            });
        }

        Ok(())
    }

    fn line_mut(&mut self, menu_item_id: MenuItemId) -> Option<&mut CartLineItem> {
        self.items
            .iter_mut()
            .find(|item| item.menu_item_id == menu_item_id)
    }

    fn remove(&mut self, menu_item_id: MenuItemId) {
        self.items.retain(|item| item.menu_item_id != menu_item_id);
    }

    /// Re-derives totals and drops the stall once the last line is gone
    fn recompute(&mut self) {
        (self.total, self.item_count) = totals(&self.items);
        if self.items.is_empty() {
            self.stall_id = None;
            self.stall_name = None;
        }
    }
}

fn totals(items: &[CartLineItem]) -> (Decimal, u64) {
    items
        .iter()
        .fold((Decimal::ZERO, 0_u64), |(total, count), item| {
            (
                total.saturating_add(item.subtotal()),
                count.saturating_add(u64::from(item.quantity)),
            )
        })
}

/// A broken cart invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CartInconsistency {
    /// Stall fields set on an empty cart
    #[error("empty cart has a stall")]
    StallWithoutItems,

    /// Items present but stall fields missing
    #[error("cart has items but no stall")]
    ItemsWithoutStall,

    /// An item belongs to a stall other than the cart's
    #[error("item from stall {found} in a cart for stall {expected}")]
    MixedStalls {
        /// The cart's stall
        expected: StallId,
        /// The offending item's stall
        found: StallId,
    },

    /// A menu item appears on more than one line
    #[error("menu item {0} appears on more than one line")]
    DuplicateItem(MenuItemId),

    /// Stored total differs from the lines
    #[error("stored total {stored} does not match computed total {computed}")]
    TotalMismatch {
        /// Total in the snapshot
        stored: Decimal,
        /// Total derived from the lines
        computed: Decimal,
    },

    /// Stored item count differs from the lines
    #[error("stored item count {stored} does not match computed count {computed}")]
    ItemCountMismatch {
        /// Count in the snapshot
        stored: u64,
        /// Count derived from the lines
        computed: u64,
    },
}

/// Cart mutations
///
/// All of them are synchronous and total; inapplicable ones are no-ops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CartAction {
    /// Add an item, merging with an existing line for the same menu item
    Add(CartLineItem),
    /// Remove a line
    Remove {
        /// Line to remove
        menu_item_id: MenuItemId,
    },
    /// Set a line's quantity; zero or less removes the line
    SetQuantity {
        /// Line to change
        menu_item_id: MenuItemId,
        /// New absolute quantity
        quantity: i64,
    },
    /// Set a line's special requests verbatim
    SetSpecialRequests {
        /// Line to change
        menu_item_id: MenuItemId,
        /// New text
        special_requests: String,
    },
    /// Empty the cart
    Clear,
    /// Substitute the whole cart; the new state is trusted as-is
    ReplaceAll(CartState),
}

/// Reducer of the cart
#[derive(Clone, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CartAction::Add(item) => {
                if state.conflicts_with(&item) {
                    tracing::debug!(
                        cart_stall = ?state.stall_id,
                        item_stall = %item.stall_id,
                        menu_item_id = %item.menu_item_id,
                        "Ignoring item from another stall"
                    );
                    return SmallVec::new();
                }

                if state.is_empty() {
                    state.stall_id = Some(item.stall_id);
                    state.stall_name = Some(item.stall_name.clone());
                }

                if let Some(line) = state.line_mut(item.menu_item_id) {
                    line.quantity = line.quantity.saturating_add(item.quantity);
                } else {
                    state.items.push(item);
                }
                state.recompute();
            },
            CartAction::Remove { menu_item_id } => {
                state.remove(menu_item_id);
                state.recompute();
            },
            CartAction::SetQuantity {
                menu_item_id,
                quantity,
            } => {
                let Some(line) = state.line_mut(menu_item_id) else {
                    return SmallVec::new();
                };
                if quantity > 0 {
                    line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
                } else {
                    state.remove(menu_item_id);
                }
                state.recompute();
            },
            CartAction::SetSpecialRequests {
                menu_item_id,
                special_requests,
            } => {
                if let Some(line) = state.line_mut(menu_item_id) {
                    line.special_requests = Some(special_requests);
                }
            },
            CartAction::Clear => *state = CartState::default(),
            CartAction::ReplaceAll(replacement) => *state = replacement,
        }

        SmallVec::new()
    }
}
