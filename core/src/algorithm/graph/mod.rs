//! Graph isomorphism by colour refinement and individualization
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod refinement;
pub mod labeller;
pub mod isomorphism;

pub use self::refinement::{ColourRefiner, Partition, RefinementOutcome};
pub use self::labeller::{GraphLabeller, LabellerState};
pub use self::isomorphism::{
    Decision, GraphIsomorphism, IsomorphismMapping, IsomorphismResult, IsomorphismStatistics,
};
