pub mod stub;

pub use stub::{StubOutcome, StubProvider, StubScript};
