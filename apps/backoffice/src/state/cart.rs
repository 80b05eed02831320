//! # Cart State
//!
//! The counter's in-progress sale. Line pricing and merge rules live in
//! `lustre_core::cart`; this module only owns the shared, lockable cart.
//!
//! ## Locking
//! ```text
//! command ──► fetch product + rates (await) ──► lock ──► mutate ──► unlock
//!                                               └── never held across .await
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use lustre_core::cart::Cart;

/// Thread-safe wrapper around the current cart.
#[derive(Debug, Clone, Default)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.lock();
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.lock();
        f(&mut cart)
    }

    /// A copy of the cart as it is right now.
    pub fn snapshot(&self) -> Cart {
        self.lock().clone()
    }

    // Cart operations are pure and leave the cart consistent even if a
    // closure panics, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Cart> {
        self.cart.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
