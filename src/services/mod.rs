// Storefront reads
pub mod catalog;

// Customer state
pub mod cart;
pub mod wishlist;

// Checkout
pub mod orders;
pub mod payments;
