pub mod scanner;

pub use scanner::{ScanVerdict, ScannerService};
