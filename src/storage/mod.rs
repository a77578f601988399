//! Storage layer - heap files, pages, tuples, and the catalog.
//!
//! This module handles persistent storage:
//! - [`HeapFile`] - one table's page-addressed backing file
//! - [`HeapPage`] - the slotted on-disk page format
//! - [`Tuple`] / [`Schema`] - fixed-width records and their shape
//! - [`Catalog`] - table identity → heap file / schema lookup

mod catalog;
mod heap_file;
mod heap_page;
mod tuple;

pub use catalog::Catalog;
pub use heap_file::{HeapFile, TableScan};
pub use heap_page::HeapPage;
pub use tuple::{Field, FieldType, Schema, Tuple};
