pub use sctpx_core::*;
