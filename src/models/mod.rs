pub mod product;

pub use product::{IngestOutcome, Product, ProductCreate};
