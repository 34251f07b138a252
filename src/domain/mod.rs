//! Storefront rules that do not touch the database: cart arithmetic, stock
//! checks, catalog invariants and the order status machine.

pub mod cart;
pub mod catalog;
pub mod order_status;
pub mod payment;
pub mod role;
pub mod stock;
