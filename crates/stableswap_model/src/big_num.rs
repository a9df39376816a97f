//! Wide unsigned integers for intermediate curve products
//!
//! Kept in its own module: the `construct_uint!` expansion spells out
//! two-parameter `Result` in its generated impls, so it must not share
//! a scope with the crate's single-parameter `Result` alias.

use uint::construct_uint;

construct_uint! {
    /// 256-bit unsigned integer for intermediate products.
    pub struct U256(4);
}
